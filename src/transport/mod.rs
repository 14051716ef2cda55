//! Seams to the native telephony layer.
//!
//! Nothing here talks to a network. Embedders implement these traits over
//! whatever FFI or platform bridge hosts the telephony SDK.

pub mod emitter;
pub mod native;
pub mod permissions;

pub use emitter::{NativeEmitter, NativeEventSource, NativeListener, NativeSubscription};
pub use native::{ConnectParams, NativeModule};
pub use permissions::{Permission, PermissionRationale, PermissionRequester, PermissionStatus};
