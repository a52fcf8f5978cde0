//! # Tracekit
//!
//! Permission-gated device location acquisition.
//!
//! Tracekit packages the flow behind a "show my location" screen: check the
//! runtime permission, request it if missing, optionally verify device
//! location settings, query the last known fix, and fall back to continuous
//! updates or a user notice when no cached fix exists. Platform services are
//! reached through traits so the orchestration runs (and tests) off-device.
//!
//! ## Features
//!
//! - `permission`: location permission kinds, status, and the platform seam.
//! - `location`: fix/config types, the location service seam, and the
//!   acquisition flow itself. Implies `permission`.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! tracekit = { version = "0.1", features = ["location"] }
//! ```

#[cfg(feature = "location")]
pub use tracekit_location as location;

#[cfg(feature = "permission")]
pub use tracekit_permission as permission;
