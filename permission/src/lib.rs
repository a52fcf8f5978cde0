//! Location permission handling.
//!
//! This crate models the two runtime capability kinds a location screen
//! cares about (fine and coarse accuracy) and the platform seam through
//! which they are checked and requested. Status is always derived from the
//! platform at call time; nothing here caches it.

#![warn(missing_docs)]

use thiserror::Error;

/// Runtime permission kinds covering device location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Permission {
    /// Precise (GPS-grade) location access.
    FineLocation,
    /// Approximate (network-grade) location access.
    CoarseLocation,
}

/// The current status of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    /// Permission has been granted by the user.
    Granted,
    /// Permission has been denied by the user.
    Denied,
    /// Permission has not been requested yet.
    NotDetermined,
}

impl PermissionStatus {
    /// Returns `true` when the permission is usable right now.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Correlation identifier for asynchronous platform requests.
///
/// The caller picks the value; the platform echoes it back alongside the
/// result so a flow can tell its own responses apart from unrelated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u32);

impl RequestId {
    /// Wraps a raw request code.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw request code.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Errors that can occur when requesting permissions.
#[derive(Error, Debug, Clone)]
pub enum PermissionError {
    /// The permission type is not supported on this platform.
    #[error("permission not supported on this platform")]
    NotSupported,
    /// An error occurred in the underlying platform implementation.
    #[error("platform error: {0}")]
    Platform(String),
}

/// Platform seam for permission checks and requests.
///
/// `status` is synchronous; `request` only starts the platform prompt. The
/// grant/deny outcome arrives later through whatever callback the host
/// wires up, correlated by the supplied [`RequestId`].
pub trait PermissionBackend: Send + Sync {
    /// Reports the current status of `permission` without prompting.
    fn status(&self, permission: Permission) -> PermissionStatus;

    /// Asks the platform to prompt the user for the given permissions.
    ///
    /// # Errors
    /// Returns an error if the prompt could not be started at all. A user
    /// denial is not an error; it is delivered with the async result.
    fn request(&self, permissions: &[Permission], request_id: RequestId)
    -> Result<(), PermissionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granted_is_the_only_usable_status() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
        assert!(!PermissionStatus::NotDetermined.is_granted());
    }

    #[test]
    fn request_ids_round_trip() {
        assert_eq!(RequestId::new(100).raw(), 100);
        assert_eq!(RequestId::new(100), RequestId::new(100));
        assert_ne!(RequestId::new(100), RequestId::new(101));
    }
}
