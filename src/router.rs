//! Two-route request classification.
//!
//! The router looks only at the request line: if it contains the telemetry
//! marker (`GET /data`) the request is [`Route::Telemetry`], otherwise it is
//! [`Route::Dashboard`]. The fallback is total. Unknown paths, other methods
//! and garbage bytes all get the dashboard instead of a 404.
//!
//! # Single Delivery
//!
//! Classification sees only the bytes of one delivery. The shipped
//! transports read the socket once, so a request line split across TCP
//! segments (`GET /da` then `ta HTTP/1.1`) is classified from its first
//! part and gets the dashboard. Clients that write the request in one
//! call, which includes browsers and `curl`, are unaffected.

/// Substring that selects the telemetry route.
pub const TELEMETRY_MARKER: &[u8] = b"GET /data";

/// Path the dashboard polls for telemetry.
pub const TELEMETRY_PATH: &str = "/data";

/// The routes this server answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Route {
    /// JSON sensor reading.
    Telemetry,
    /// Static HTML dashboard. Also the fallback for anything unrecognized.
    #[default]
    Dashboard,
}

impl Route {
    /// Pick the route for a raw request.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_compass::Route;
    ///
    /// assert_eq!(Route::from_request(b"GET /data HTTP/1.1\r\n\r\n"), Route::Telemetry);
    /// assert_eq!(Route::from_request(b"GET / HTTP/1.1\r\n\r\n"), Route::Dashboard);
    /// assert_eq!(Route::from_request(b"\xff\xfe"), Route::Dashboard);
    /// ```
    pub fn from_request(request: &[u8]) -> Self {
        if contains(request_line(request), TELEMETRY_MARKER) {
            Route::Telemetry
        } else {
            Route::Dashboard
        }
    }

    /// Short label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Route::Telemetry => "telemetry",
            Route::Dashboard => "dashboard",
        }
    }
}

/// Bytes up to (not including) the first line feed.
pub fn request_line(request: &[u8]) -> &[u8] {
    match request.iter().position(|&b| b == b'\n') {
        Some(end) => &request[..end],
        None => request,
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_request_line() {
        assert_eq!(
            Route::from_request(b"GET /data HTTP/1.1\r\nHost: 192.168.0.7\r\n\r\n"),
            Route::Telemetry
        );
    }

    #[test]
    fn root_is_dashboard() {
        assert_eq!(
            Route::from_request(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"),
            Route::Dashboard
        );
    }

    #[test]
    fn unknown_path_falls_back_to_dashboard() {
        assert_eq!(
            Route::from_request(b"GET /favicon.ico HTTP/1.1\r\n\r\n"),
            Route::Dashboard
        );
        assert_eq!(
            Route::from_request(b"POST /data HTTP/1.1\r\n\r\n"),
            Route::Dashboard
        );
    }

    #[test]
    fn marker_is_a_substring_match() {
        // Permissive: anything starting with the marker counts.
        assert_eq!(
            Route::from_request(b"GET /data?t=1712 HTTP/1.1\r\n\r\n"),
            Route::Telemetry
        );
        assert_eq!(
            Route::from_request(b"GET /database HTTP/1.1\r\n\r\n"),
            Route::Telemetry
        );
    }

    #[test]
    fn marker_in_headers_is_ignored() {
        let req = b"GET / HTTP/1.1\r\nReferer: http://host/GET /data\r\n\r\n";
        assert_eq!(Route::from_request(req), Route::Dashboard);
    }

    #[test]
    fn request_without_newline_is_one_line() {
        assert_eq!(Route::from_request(b"GET /data"), Route::Telemetry);
        assert_eq!(request_line(b"GET /data"), b"GET /data");
    }

    #[test]
    fn truncated_request_line_gets_dashboard() {
        assert_eq!(Route::from_request(b"GET /da"), Route::Dashboard);
        assert_eq!(Route::from_request(b"ta HTTP/1.1\r\n\r\n"), Route::Dashboard);
    }

    #[test]
    fn empty_and_binary_requests() {
        assert_eq!(Route::from_request(b""), Route::Dashboard);
        assert_eq!(Route::from_request(&[0u8, 159, 146, 150]), Route::Dashboard);
    }

    #[test]
    fn route_labels() {
        assert_eq!(Route::Telemetry.as_str(), "telemetry");
        assert_eq!(Route::Dashboard.as_str(), "dashboard");
        assert_eq!(Route::default(), Route::Dashboard);
    }
}
