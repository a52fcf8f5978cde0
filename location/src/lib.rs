//! Permission-gated location acquisition.
//!
//! This crate implements the flow behind a "show my location" screen:
//! check the runtime permission, request it if missing, optionally verify
//! device location settings, query the last known fix, and fall back to
//! continuous updates (or a "cannot trace location" notice) when no cached
//! fix exists.
//!
//! The platform location service and permission subsystem are reached
//! through the [`LocationBackend`] and
//! [`PermissionBackend`](tracekit_permission::PermissionBackend) traits;
//! the UI collaborator receives results through [`AcquisitionDelegate`].
//! All of it is driven from a single logical thread: platform calls only
//! start work, and their results re-enter the flow through the `on_*`
//! methods of [`LocationAcquisitionFlow`].

#![warn(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod backend;
pub mod channel;
mod config;
mod flow;

/// Android backend bridging to a host-side Kotlin/Java object via JNI.
#[cfg(target_os = "android")]
pub mod android;

pub use tracekit_permission::{
    Permission, PermissionBackend, PermissionError, PermissionStatus, RequestId,
};

pub use backend::{LocationBackend, ResolutionHandle, SettingsCheck, UpdatesSubscription};
pub use config::{AccuracyPriority, LocationRequestConfig};
pub use flow::{
    AcquisitionDelegate, AcquisitionEvent, AcquisitionOptions, FlowState, LocationAcquisitionFlow,
    NoFixPolicy,
};

/// A geographic fix produced by the platform location service.
///
/// Immutable once obtained; the flow reports it to the UI collaborator
/// exactly as the platform delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Timestamp as Unix epoch milliseconds, if the platform reported one.
    pub timestamp: Option<u64>,
}

impl fmt::Display for LocationFix {
    /// Renders `"{latitude}\n{longitude}"` at full float precision.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.latitude, self.longitude)
    }
}

/// Errors that can occur when talking to the platform location service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// An error occurred in the underlying platform implementation.
    #[error("platform error: {message}")]
    Platform {
        /// Platform-reported description.
        message: String,
    },
    /// A bridge payload could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization {
        /// Decoder/encoder description.
        message: String,
    },
    /// The location service is not usable right now.
    #[error("location not available")]
    Unavailable,
}

/// Convenience alias for location results.
pub type LocationResult<T> = Result<T, LocationError>;
