use super::events::CallEvent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    #[serde(alias = "CONNECTING")]
    Connecting,
    #[serde(alias = "RINGING")]
    Ringing,
    #[serde(alias = "CONNECTED")]
    Connected,
    #[serde(alias = "RECONNECTING")]
    Reconnecting,
    #[serde(alias = "DISCONNECTED")]
    Disconnected,
    #[default]
    #[serde(other)]
    Unknown,
}

/// The optional `error` object attached to call notifications.
///
/// Every field may be absent; a missing `code` reads as `0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NativeCallError {
    pub message: String,
    pub code: i64,
    pub reason: String,
}

/// Raw call object as delivered by the bridge.
///
/// Known fields are typed; anything else the native SDK adds is kept in `extra`
/// so it survives a merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NativeCallPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CallState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on_hold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<NativeCallError>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NativeCallPayload {
    /// Parse a raw bridge payload.
    ///
    /// # Errors
    /// Returns an error if the value is not an object or a known field has the wrong type.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// A single notification pulled off the native channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeNotification {
    pub event: CallEvent,
    pub payload: Value,
}

impl NativeNotification {
    #[must_use]
    pub const fn new(event: CallEvent, payload: Value) -> Self {
        Self { event, payload }
    }
}
