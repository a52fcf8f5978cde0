//! The permission-gated acquisition flow.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use tracekit_permission::{Permission, PermissionBackend, PermissionStatus, RequestId};

use crate::LocationFix;
use crate::backend::{LocationBackend, SettingsCheck, UpdatesSubscription};
use crate::config::LocationRequestConfig;

/// Events delivered to the UI collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionEvent {
    /// A fix was obtained, from the cache or from a continuous update.
    ///
    /// The fix is passed through unmodified; render it with its `Display`
    /// impl (`"{latitude}\n{longitude}"`).
    Fix(LocationFix),
    /// No fix can currently be traced and the [`NoFixPolicy::Notify`]
    /// policy is active.
    Unavailable,
    /// The permission request came back denied. Terminal for this attempt;
    /// a new user trigger starts over.
    PermissionDenied,
}

/// UI collaborator receiving acquisition outcomes.
pub trait AcquisitionDelegate: Send + Sync {
    /// Called once per reportable outcome, on the flow's logical thread.
    fn on_event(&self, event: AcquisitionEvent);
}

/// What to do when the platform reports no cached fix.
///
/// Both behaviors are common for this kind of screen, so the choice is
/// explicit configuration rather than a baked-in default path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoFixPolicy {
    /// Report [`AcquisitionEvent::Unavailable`] and stop.
    Notify,
    /// Subscribe to continuous updates and report the first fix the same
    /// way as a cached one.
    #[default]
    Subscribe,
}

/// Tunables for one flow instance. Constructed once, read-only thereafter.
#[derive(Debug, Clone)]
pub struct AcquisitionOptions {
    /// Update request passed to the settings check and the subscription.
    pub request: LocationRequestConfig,
    /// Verify device location settings before querying the last known
    /// fix. Off by default.
    pub verify_settings: bool,
    /// Behavior when no cached fix exists.
    pub no_fix_policy: NoFixPolicy,
    /// Request code correlating the permission prompt result.
    pub permission_request_id: RequestId,
    /// Request code correlating the settings resolution result.
    pub settings_request_id: RequestId,
}

impl Default for AcquisitionOptions {
    fn default() -> Self {
        Self {
            request: LocationRequestConfig::default(),
            verify_settings: false,
            no_fix_policy: NoFixPolicy::default(),
            permission_request_id: RequestId::new(100),
            settings_request_id: RequestId::new(101),
        }
    }
}

/// Observable state of a flow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// No acquisition in progress.
    Idle,
    /// Waiting for the permission prompt result.
    PermissionPending,
    /// Waiting for the settings check result or the user's resolution.
    SettingsCheckPending,
    /// Waiting for the last-known-location query result.
    FixPending,
    /// Subscribed to continuous updates, waiting for the first fix.
    UpdatesSubscribed,
    /// A fix was reported. Terminal until the next trigger.
    FixReceived,
    /// The permission request was denied. Terminal until the next trigger.
    PermissionDenied,
    /// Unavailability was reported. Terminal until the next trigger.
    UnavailableReported,
}

impl FlowState {
    /// States with an unresolved platform call outstanding. A new trigger
    /// is ignored in these states so no duplicate request is issued.
    const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::PermissionPending
                | Self::SettingsCheckPending
                | Self::FixPending
                | Self::UpdatesSubscribed
        )
    }
}

/// Orchestrates one screen's location acquisition.
///
/// Single-threaded and event-driven: every platform call is started here
/// and its result re-enters through the matching `on_*` method on the same
/// logical thread, so the flow needs no internal locking. The hosting
/// screen forwards its lifecycle to [`activate`](Self::activate) and
/// [`deactivate`](Self::deactivate) so a continuous-update subscription
/// never outlives the visible screen.
pub struct LocationAcquisitionFlow {
    permissions: Arc<dyn PermissionBackend>,
    backend: Arc<dyn LocationBackend>,
    delegate: Arc<dyn AcquisitionDelegate>,
    options: AcquisitionOptions,
    state: FlowState,
    subscription: Option<UpdatesSubscription>,
    updates_requested: bool,
    resolution_pending: bool,
}

impl fmt::Debug for LocationAcquisitionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationAcquisitionFlow")
            .field("state", &self.state)
            .field("subscription", &self.subscription)
            .field("updates_requested", &self.updates_requested)
            .finish_non_exhaustive()
    }
}

impl LocationAcquisitionFlow {
    /// Creates a flow wired to its three collaborators.
    #[must_use]
    pub fn new(
        permissions: Arc<dyn PermissionBackend>,
        backend: Arc<dyn LocationBackend>,
        delegate: Arc<dyn AcquisitionDelegate>,
        options: AcquisitionOptions,
    ) -> Self {
        Self {
            permissions,
            backend,
            delegate,
            options,
            state: FlowState::Idle,
            subscription: None,
            updates_requested: false,
            resolution_pending: false,
        }
    }

    /// Current flow state.
    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Whether a continuous-update subscription is currently active.
    #[must_use]
    pub fn updates_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Starts an acquisition attempt from a user trigger.
    ///
    /// Ignored while a prior attempt still has a platform call
    /// outstanding; terminal states start over.
    pub fn acquire(&mut self) {
        if self.state.is_pending() {
            debug!("acquisition already in flight ({:?}), ignoring trigger", self.state);
            return;
        }

        if self.any_location_permission_granted() {
            self.proceed_granted();
        } else {
            debug!("requesting fine location permission");
            self.state = FlowState::PermissionPending;
            if let Err(err) = self
                .permissions
                .request(&[Permission::FineLocation], self.options.permission_request_id)
            {
                warn!("permission request failed to start: {err}");
                self.state = FlowState::Idle;
            }
        }
    }

    /// Delivers the result of a permission prompt.
    ///
    /// Results for a foreign request id, or arriving while no prompt is
    /// outstanding, are ignored.
    pub fn on_permission_result(
        &mut self,
        request_id: RequestId,
        results: &[(Permission, PermissionStatus)],
    ) {
        if self.state != FlowState::PermissionPending
            || request_id != self.options.permission_request_id
        {
            debug!("ignoring permission result for {request_id:?} in {:?}", self.state);
            return;
        }

        if results.iter().any(|(_, status)| status.is_granted()) {
            self.proceed_granted();
        } else {
            debug!("location permission denied");
            self.state = FlowState::PermissionDenied;
            self.delegate.on_event(AcquisitionEvent::PermissionDenied);
        }
    }

    /// Delivers the outcome of a settings check.
    pub fn on_settings_result(&mut self, outcome: SettingsCheck) {
        if self.state != FlowState::SettingsCheckPending || self.resolution_pending {
            debug!("ignoring settings result in {:?}", self.state);
            return;
        }

        match outcome {
            SettingsCheck::Satisfied => self.query_last_known(),
            SettingsCheck::Resolvable(handle) => {
                self.resolution_pending = true;
                if let Err(err) = self
                    .backend
                    .start_resolution(handle, self.options.settings_request_id)
                {
                    // Swallowed: no retry, no user notification.
                    debug!("settings resolution failed to start: {err}");
                    self.resolution_pending = false;
                    self.state = FlowState::Idle;
                }
            }
            SettingsCheck::Unresolvable => {
                warn!("location settings cannot be satisfied");
                self.state = FlowState::Idle;
            }
        }
    }

    /// Delivers the outcome of the user-driven settings resolution.
    pub fn on_resolution_result(&mut self, request_id: RequestId, resolved: bool) {
        if self.state != FlowState::SettingsCheckPending
            || !self.resolution_pending
            || request_id != self.options.settings_request_id
        {
            debug!("ignoring resolution result for {request_id:?} in {:?}", self.state);
            return;
        }

        self.resolution_pending = false;
        if resolved {
            self.query_last_known();
        } else {
            debug!("settings resolution declined by user");
            self.state = FlowState::Idle;
        }
    }

    /// Delivers the result of a last-known-location query.
    ///
    /// `None` is the platform's explicit "no cached fix" signal and is
    /// handled per the configured [`NoFixPolicy`].
    pub fn on_last_known(&mut self, fix: Option<LocationFix>) {
        if self.state != FlowState::FixPending {
            debug!("ignoring last known location in {:?}", self.state);
            return;
        }

        match fix {
            Some(fix) => self.report_fix(fix),
            None => match self.options.no_fix_policy {
                NoFixPolicy::Notify => {
                    debug!("no cached fix, reporting unavailability");
                    self.state = FlowState::UnavailableReported;
                    self.delegate.on_event(AcquisitionEvent::Unavailable);
                }
                NoFixPolicy::Subscribe => self.start_updates(),
            },
        }
    }

    /// Delivers one fix from the continuous-update subscription.
    ///
    /// Every fix received while subscribed is reported, so the display
    /// keeps tracking the device after the first one.
    pub fn on_update(&mut self, fix: LocationFix) {
        if self.subscription.is_none() {
            debug!("dropping update with no active subscription");
            return;
        }
        self.report_fix(fix);
    }

    /// Screen became visible again.
    ///
    /// Re-subscribes when a prior session had updates enabled and the
    /// permission is still granted; a revoked permission clears the flag
    /// instead of resubscribing blind.
    pub fn activate(&mut self) {
        if !self.updates_requested || self.subscription.is_some() {
            return;
        }

        if self.any_location_permission_granted() {
            self.start_updates();
        } else {
            warn!("location permission revoked while inactive, not resuming updates");
            self.updates_requested = false;
        }
    }

    /// Screen is no longer visible.
    ///
    /// Unconditionally releases any active subscription so background
    /// polling never outlives the screen. Safe to call with none active.
    pub fn deactivate(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!("releasing update subscription {}", subscription.raw());
            self.backend.unsubscribe(subscription);
            if self.state == FlowState::UpdatesSubscribed {
                self.state = FlowState::Idle;
            }
        }
    }

    fn any_location_permission_granted(&self) -> bool {
        self.permissions.status(Permission::FineLocation).is_granted()
            || self.permissions.status(Permission::CoarseLocation).is_granted()
    }

    fn proceed_granted(&mut self) {
        if self.options.verify_settings {
            self.state = FlowState::SettingsCheckPending;
            if let Err(err) = self.backend.check_settings(&self.options.request) {
                warn!("settings check failed to start: {err}");
                self.state = FlowState::Idle;
            }
        } else {
            self.query_last_known();
        }
    }

    fn query_last_known(&mut self) {
        self.state = FlowState::FixPending;
        if let Err(err) = self.backend.request_last_known() {
            warn!("last known location query failed to start: {err}");
            self.state = FlowState::Idle;
        }
    }

    fn start_updates(&mut self) {
        self.updates_requested = true;
        if self.subscription.is_some() {
            // Invariant: at most one active subscription per flow.
            self.state = FlowState::UpdatesSubscribed;
            return;
        }

        match self.backend.subscribe(&self.options.request) {
            Ok(subscription) => {
                debug!("update subscription {} active", subscription.raw());
                self.subscription = Some(subscription);
                self.state = FlowState::UpdatesSubscribed;
            }
            Err(err) => {
                warn!("update subscription failed: {err}");
                self.state = FlowState::UnavailableReported;
                self.delegate.on_event(AcquisitionEvent::Unavailable);
            }
        }
    }

    fn report_fix(&mut self, fix: LocationFix) {
        self.state = FlowState::FixReceived;
        self.delegate.on_event(AcquisitionEvent::Fix(fix));
    }
}
