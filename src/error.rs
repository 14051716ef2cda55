use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection reported by the native telephony layer for a command.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Error)]
#[error("native error {code:?}: {message}")]
pub struct NativeError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

impl NativeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Can't call connect on a destroyed Voice instance")]
    Destroyed,

    #[error("Can't call connect while a call is still going on")]
    Busy,

    #[error("No access token configured; call set_token first")]
    MissingToken,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Native module rejected the command: {0}")]
    Native(#[from] NativeError),

    #[error("Failed to parse or serialize JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
