//! The platform location service seam.

use serde::{Deserialize, Serialize};

use crate::config::LocationRequestConfig;
use crate::{LocationResult, RequestId};

/// Opaque token identifying a resolvable settings condition.
///
/// Issued by the platform when a settings check fails in a way the user
/// can fix through a system dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionHandle(u64);

impl ResolutionHandle {
    /// Wraps a raw platform token.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw platform token.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to an active continuous-update registration.
///
/// Deliberately neither `Copy` nor `Clone`: releasing the registration
/// consumes the handle, so a subscription cannot be released twice and at
/// most one live handle exists per flow instance.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct UpdatesSubscription(u64);

impl UpdatesSubscription {
    /// Wraps a raw platform registration id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw platform registration id.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Outcome of a device settings check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCheck {
    /// Current settings satisfy the request; location queries may proceed.
    Satisfied,
    /// Settings are unsatisfied but the user can fix them through a
    /// system dialog started with [`LocationBackend::start_resolution`].
    Resolvable(ResolutionHandle),
    /// Settings are unsatisfied and cannot be fixed; the attempt is over.
    Unresolvable,
}

/// Platform seam for the location service.
///
/// Every method only starts work; results arrive later on the same logical
/// thread and re-enter the flow through its `on_*` methods:
///
/// - [`check_settings`](Self::check_settings) →
///   [`LocationAcquisitionFlow::on_settings_result`](crate::LocationAcquisitionFlow::on_settings_result)
/// - [`start_resolution`](Self::start_resolution) →
///   [`LocationAcquisitionFlow::on_resolution_result`](crate::LocationAcquisitionFlow::on_resolution_result)
/// - [`request_last_known`](Self::request_last_known) →
///   [`LocationAcquisitionFlow::on_last_known`](crate::LocationAcquisitionFlow::on_last_known)
/// - [`subscribe`](Self::subscribe) →
///   [`LocationAcquisitionFlow::on_update`](crate::LocationAcquisitionFlow::on_update), zero or more times
pub trait LocationBackend: Send + Sync {
    /// Starts a check of the device location settings against `config`.
    ///
    /// # Errors
    /// Returns an error if the check could not be started.
    fn check_settings(&self, config: &LocationRequestConfig) -> LocationResult<()>;

    /// Starts the user-driven resolution dialog for an unsatisfied but
    /// resolvable settings condition.
    ///
    /// # Errors
    /// Returns an error if the dialog could not be started. The flow
    /// swallows this failure: no retry, no user notification.
    fn start_resolution(
        &self,
        handle: ResolutionHandle,
        request_id: RequestId,
    ) -> LocationResult<()>;

    /// Starts a query for the last known location.
    ///
    /// The result is a fix or an explicit "no cached fix" signal; the
    /// latter is a valid outcome, not an error.
    ///
    /// # Errors
    /// Returns an error if the query could not be started.
    fn request_last_known(&self) -> LocationResult<()>;

    /// Registers for continuous location updates.
    ///
    /// # Errors
    /// Returns an error if the registration could not be created.
    fn subscribe(&self, config: &LocationRequestConfig) -> LocationResult<UpdatesSubscription>;

    /// Releases a continuous-update registration.
    ///
    /// Must tolerate a registration that already stopped delivering.
    fn unsubscribe(&self, subscription: UpdatesSubscription);
}
