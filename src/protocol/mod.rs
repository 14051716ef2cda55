//! Wire-level shapes exchanged with the native telephony bridge.

pub mod events;
pub mod payload;

pub use events::{CallEvent, UnknownCallEvent};
pub use payload::{CallState, NativeCallError, NativeCallPayload, NativeNotification};
