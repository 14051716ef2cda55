#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

pub mod error;
pub mod protocol;
pub mod sdk;
pub mod transport;

pub use error::{Error, NativeError, Result};
pub use protocol::{CallEvent, CallState, NativeCallError, NativeCallPayload, NativeNotification};
pub use sdk::{
    Call, CallError, CallSnapshot, EventHandlers, Listener, ListenerHandle, Voice, VoiceBuilder,
    VoiceConfig, VoiceStatus,
};
pub use transport::{
    ConnectParams, NativeEmitter, NativeEventSource, NativeListener, NativeModule, NativeSubscription,
    Permission, PermissionRationale, PermissionRequester, PermissionStatus,
};

/// Version of this crate, reported by [`Voice::version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
