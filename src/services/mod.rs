//! Socket transports that drive the [`RequestDispatcher`].
//!
//! - `transport`: blocking `std::net` loop (desktop and ESP-IDF)
//! - `web` feature: tokio loop on a current-thread runtime
//!
//! Both serve connections strictly one at a time. The dispatcher is borrowed
//! mutably for the whole loop, so there is never a second writer to its
//! response buffer.
//!
//! [`RequestDispatcher`]: crate::RequestDispatcher

pub mod transport;

#[cfg(feature = "web")]
pub mod web;

// Re-exports
pub use transport::*;

#[cfg(feature = "web")]
pub use web::*;
