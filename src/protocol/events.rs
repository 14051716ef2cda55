use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Call lifecycle notifications emitted by the native layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum CallEvent {
    Connect,
    Disconnect,
    ConnectFailure,
    Reconnect,
    Reconnecting,
    Ringing,
}

impl CallEvent {
    /// Every event the bridge subscribes to, in subscription order.
    pub const ALL: [Self; 6] = [
        Self::Connect,
        Self::Disconnect,
        Self::ConnectFailure,
        Self::Reconnect,
        Self::Reconnecting,
        Self::Ringing,
    ];

    /// Channel name used by the native event emitter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::ConnectFailure => "connectFailure",
            Self::Reconnect => "reconnect",
            Self::Reconnecting => "reconnecting",
            Self::Ringing => "ringing",
        }
    }

    /// Whether listeners for this event receive an optional `CallError`.
    #[must_use]
    pub const fn carries_error(self) -> bool {
        matches!(self, Self::ConnectFailure | Self::Reconnecting | Self::Disconnect)
    }

    /// Whether the current call is cleared once this event has been dispatched.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ConnectFailure | Self::Disconnect)
    }
}

impl fmt::Display for CallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown call event: {0}")]
pub struct UnknownCallEvent(pub String);

impl FromStr for CallEvent {
    type Err = UnknownCallEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownCallEvent(s.to_string()))
    }
}
