//! Android backend.
//!
//! Bridges the flow to a host-side Kotlin/Java `FlowBridge` object: Rust
//! starts platform calls through JNI method calls on the bridge, and the
//! bridge delivers asynchronous results back as JSON events through the
//! `dispatchEvent` native method, correlated to a flow by handle.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use jni::objects::{JClass, JObject, JString, JValue, GlobalRef};
use jni::sys::{jint, jlong};
use jni::{JNIEnv, JavaVM};
use log::error;
use serde::Deserialize;
use tracekit_permission::{
    Permission, PermissionBackend, PermissionError, PermissionStatus, RequestId,
};

use crate::backend::{LocationBackend, ResolutionHandle, SettingsCheck, UpdatesSubscription};
use crate::config::LocationRequestConfig;
use crate::flow::LocationAcquisitionFlow;
use crate::{LocationError, LocationFix, LocationResult};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
static FLOWS: OnceLock<Mutex<HashMap<u64, Arc<Mutex<LocationAcquisitionFlow>>>>> = OnceLock::new();

fn flows() -> &'static Mutex<HashMap<u64, Arc<Mutex<LocationAcquisitionFlow>>>> {
    FLOWS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Permission kind codes (must match Kotlin).
const KIND_FINE_LOCATION: jint = 0;
const KIND_COARSE_LOCATION: jint = 1;

/// Status codes (must match Kotlin).
const STATUS_NOT_DETERMINED: jint = 0;
const STATUS_DENIED: jint = 1;
const STATUS_GRANTED: jint = 2;

const fn permission_to_code(permission: Permission) -> jint {
    match permission {
        Permission::FineLocation => KIND_FINE_LOCATION,
        Permission::CoarseLocation => KIND_COARSE_LOCATION,
    }
}

const fn permission_from_code(code: jint) -> Option<Permission> {
    match code {
        KIND_FINE_LOCATION => Some(Permission::FineLocation),
        KIND_COARSE_LOCATION => Some(Permission::CoarseLocation),
        _ => None,
    }
}

const fn status_from_code(code: jint) -> PermissionStatus {
    match code {
        STATUS_GRANTED => PermissionStatus::Granted,
        STATUS_DENIED => PermissionStatus::Denied,
        _ => PermissionStatus::NotDetermined,
    }
}

/// Backend implementation backed by a Kotlin/Java `FlowBridge` via JNI.
///
/// One bridge object fronts the whole capability table, so this type
/// implements both [`LocationBackend`] and [`PermissionBackend`].
pub struct AndroidLocationBackend {
    vm: JavaVM,
    bridge: GlobalRef,
    handle: u64,
}

impl fmt::Debug for AndroidLocationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndroidLocationBackend")
            .field("handle", &self.handle)
            .finish()
    }
}

impl AndroidLocationBackend {
    /// Creates a backend from a host-side `FlowBridge` object.
    ///
    /// # Errors
    /// Returns an error if the JVM reference or the global ref cannot be
    /// obtained.
    pub fn new(env: &JNIEnv<'_>, bridge: JObject<'_>) -> LocationResult<Self> {
        let vm = env.get_java_vm().map_err(map_jni_error)?;
        let global = env.new_global_ref(bridge).map_err(map_jni_error)?;
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);

        Ok(Self {
            vm,
            bridge: global,
            handle,
        })
    }

    /// Native handle identifying this backend in bridge callbacks.
    #[must_use]
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Registers the flow that bridge events for this handle re-enter.
    ///
    /// # Errors
    /// Returns an error if the handle cannot be announced to the bridge.
    pub fn register_flow(&self, flow: Arc<Mutex<LocationAcquisitionFlow>>) -> LocationResult<()> {
        {
            let mut map = flows().lock().expect("flow map mutex poisoned");
            map.insert(self.handle, flow);
        }

        self.with_bridge(|env, bridge| {
            #[allow(clippy::cast_possible_wrap)]
            let args = [JValue::Long(self.handle as jlong)];
            env.call_method(bridge, "registerNativeHandle", "(J)V", &args)?;
            Ok(())
        })
    }

    fn with_bridge<R, F>(&self, action: F) -> LocationResult<R>
    where
        F: FnOnce(&mut JNIEnv<'_>, &JObject<'_>) -> jni::errors::Result<R>,
    {
        let mut env = self.vm.attach_current_thread().map_err(map_jni_error)?;
        action(&mut env, self.bridge.as_obj()).map_err(map_jni_error)
    }

    fn call_with_json(&self, method: &str, signature: &str, json: &str) -> LocationResult<()> {
        self.with_bridge(|env, bridge| {
            let j_string = env.new_string(json)?;
            let j_object = JObject::from(j_string);
            let args = [JValue::Object(&j_object)];
            env.call_method(bridge, method, signature, &args)?;
            Ok(())
        })
    }
}

impl LocationBackend for AndroidLocationBackend {
    fn check_settings(&self, config: &LocationRequestConfig) -> LocationResult<()> {
        let json = to_json(config)?;
        self.call_with_json("checkSettings", "(Ljava/lang/String;)V", &json)
    }

    fn start_resolution(
        &self,
        handle: ResolutionHandle,
        request_id: RequestId,
    ) -> LocationResult<()> {
        self.with_bridge(|env, bridge| {
            #[allow(clippy::cast_possible_wrap)]
            let args = [
                JValue::Long(handle.raw() as jlong),
                JValue::Int(request_id.raw() as jint),
            ];
            env.call_method(bridge, "startResolution", "(JI)V", &args)?;
            Ok(())
        })
    }

    fn request_last_known(&self) -> LocationResult<()> {
        self.with_bridge(|env, bridge| {
            env.call_method(bridge, "requestLastKnownLocation", "()V", &[])?;
            Ok(())
        })
    }

    fn subscribe(&self, config: &LocationRequestConfig) -> LocationResult<UpdatesSubscription> {
        let json = to_json(config)?;
        let raw = self.with_bridge(|env, bridge| {
            let j_string = env.new_string(json.as_str())?;
            let j_object = JObject::from(j_string);
            let args = [JValue::Object(&j_object)];
            env.call_method(bridge, "requestLocationUpdates", "(Ljava/lang/String;)J", &args)?
                .j()
        })?;

        #[allow(clippy::cast_sign_loss)]
        Ok(UpdatesSubscription::new(raw as u64))
    }

    fn unsubscribe(&self, subscription: UpdatesSubscription) {
        if let Err(err) = self.with_bridge(|env, bridge| {
            #[allow(clippy::cast_possible_wrap)]
            let args = [JValue::Long(subscription.raw() as jlong)];
            env.call_method(bridge, "removeLocationUpdates", "(J)V", &args)?;
            Ok(())
        }) {
            error!("failed to remove Android location updates: {err}");
        }
    }
}

impl PermissionBackend for AndroidLocationBackend {
    fn status(&self, permission: Permission) -> PermissionStatus {
        let result = self.with_bridge(|env, bridge| {
            let args = [JValue::Int(permission_to_code(permission))];
            env.call_method(bridge, "checkPermission", "(I)I", &args)?.i()
        });

        match result {
            Ok(code) => status_from_code(code),
            Err(err) => {
                error!("failed to check Android permission: {err}");
                PermissionStatus::NotDetermined
            }
        }
    }

    fn request(
        &self,
        permissions: &[Permission],
        request_id: RequestId,
    ) -> Result<(), PermissionError> {
        let codes: Vec<jint> = permissions.iter().copied().map(permission_to_code).collect();
        let json = serde_json::to_string(&codes)
            .map_err(|err| PermissionError::Platform(err.to_string()))?;

        self.with_bridge(|env, bridge| {
            let j_string = env.new_string(json.as_str())?;
            let j_object = JObject::from(j_string);
            #[allow(clippy::cast_possible_wrap)]
            let args = [
                JValue::Object(&j_object),
                JValue::Int(request_id.raw() as jint),
            ];
            env.call_method(bridge, "requestPermissions", "(Ljava/lang/String;I)V", &args)?;
            Ok(())
        })
        .map_err(|err| PermissionError::Platform(err.to_string()))
    }
}

impl Drop for AndroidLocationBackend {
    fn drop(&mut self) {
        if let Some(map) = FLOWS.get() {
            let mut guard = map.lock().expect("flow map mutex poisoned");
            guard.remove(&self.handle);
        }
    }
}

/// Asynchronous result delivered by the bridge as a JSON payload.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BridgeEvent {
    PermissionResult {
        request_id: u32,
        granted: Vec<jint>,
        denied: Vec<jint>,
    },
    SettingsResult {
        outcome: BridgeSettings,
    },
    ResolutionResult {
        request_id: u32,
        resolved: bool,
    },
    LastKnown {
        fix: Option<LocationFix>,
    },
    Update {
        fix: LocationFix,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BridgeSettings {
    Satisfied,
    Resolvable { handle: u64 },
    Unresolvable,
}

#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_tracekit_location_FlowBridge_dispatchEvent(
    mut env: JNIEnv<'_>,
    _class: JClass<'_>,
    handle: jlong,
    json_event: JString<'_>,
) {
    #[allow(clippy::cast_sign_loss)]
    let handle = handle as u64;
    let json = match env.get_string(&json_event) {
        Ok(value) => value.to_string_lossy().into_owned(),
        Err(err) => {
            error!("failed to read Android event payload: {err}");
            return;
        }
    };

    dispatch_event(handle, &json);
}

fn dispatch_event(handle: u64, json: &str) {
    let event: BridgeEvent = match serde_json::from_str(json) {
        Ok(event) => event,
        Err(err) => {
            error!("malformed Android event payload: {err}");
            return;
        }
    };

    let flow = {
        let map = flows().lock().expect("flow map mutex poisoned");
        map.get(&handle).cloned()
    };

    let Some(flow) = flow else {
        error!("received Android location event for unknown handle {handle}");
        return;
    };

    let mut flow = flow.lock().expect("flow mutex poisoned");
    apply_event(&mut flow, event);
}

fn apply_event(flow: &mut LocationAcquisitionFlow, event: BridgeEvent) {
    match event {
        BridgeEvent::PermissionResult {
            request_id,
            granted,
            denied,
        } => {
            let mut results = Vec::with_capacity(granted.len() + denied.len());
            for code in granted {
                if let Some(permission) = permission_from_code(code) {
                    results.push((permission, PermissionStatus::Granted));
                }
            }
            for code in denied {
                if let Some(permission) = permission_from_code(code) {
                    results.push((permission, PermissionStatus::Denied));
                }
            }
            flow.on_permission_result(RequestId::new(request_id), &results);
        }
        BridgeEvent::SettingsResult { outcome } => {
            let outcome = match outcome {
                BridgeSettings::Satisfied => SettingsCheck::Satisfied,
                BridgeSettings::Resolvable { handle } => {
                    SettingsCheck::Resolvable(ResolutionHandle::new(handle))
                }
                BridgeSettings::Unresolvable => SettingsCheck::Unresolvable,
            };
            flow.on_settings_result(outcome);
        }
        BridgeEvent::ResolutionResult {
            request_id,
            resolved,
        } => flow.on_resolution_result(RequestId::new(request_id), resolved),
        BridgeEvent::LastKnown { fix } => flow.on_last_known(fix),
        BridgeEvent::Update { fix } => flow.on_update(fix),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> LocationResult<String> {
    serde_json::to_string(value).map_err(|err| LocationError::Serialization {
        message: err.to_string(),
    })
}

#[allow(clippy::needless_pass_by_value)]
fn map_jni_error(err: jni::errors::Error) -> LocationError {
    LocationError::Platform {
        message: err.to_string(),
    }
}
