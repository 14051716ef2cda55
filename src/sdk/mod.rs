//! Call controller built on top of the native bridge traits.
//!
//! [`Voice`] owns the single current call, routes native notifications to typed
//! listeners, and forwards outbound commands to the [`NativeModule`](crate::transport::NativeModule).

mod bridge;
mod builder;
pub mod call;
mod config;
pub mod handlers;
mod reconciler;
mod voice;

pub use builder::VoiceBuilder;
pub use call::{Call, CallError, CallSnapshot};
pub use config::VoiceConfig;
pub use handlers::{CallErrorHandler, CallHandler, EventHandlers, Listener, ListenerHandle};
pub use voice::{Voice, VoiceStatus};
