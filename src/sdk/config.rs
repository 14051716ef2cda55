use crate::transport::PermissionRationale;
use serde::{Deserialize, Serialize};

/// Per-instance settings for a [`super::Voice`] controller.
///
/// Identity and token are last-write-wins; the token is only read when a
/// connect is issued without an explicit one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceConfig {
    pub identity: Option<String>,
    pub token: Option<String>,
    pub rationale: PermissionRationale,
}

impl VoiceConfig {
    /// Parse a config from JSON, filling absent fields with defaults.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
