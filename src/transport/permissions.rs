use crate::error::NativeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Permission {
    RecordAudio,
}

impl Permission {
    /// Android manifest name of the permission.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordAudio => "android.permission.RECORD_AUDIO",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    NeverAskAgain,
}

impl PermissionStatus {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Text shown in the platform's permission prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionRationale {
    pub title: String,
    pub message: String,
    pub button_neutral: Option<String>,
    pub button_negative: Option<String>,
    pub button_positive: String,
}

impl Default for PermissionRationale {
    fn default() -> Self {
        Self {
            title: "Microphone access".to_string(),
            message: "This app needs access to your microphone to make calls".to_string(),
            button_neutral: Some("Ask Me Later".to_string()),
            button_negative: Some("Cancel".to_string()),
            button_positive: "OK".to_string(),
        }
    }
}

#[async_trait]
pub trait PermissionRequester: Send + Sync {
    async fn request(
        &self,
        permission: Permission,
        rationale: &PermissionRationale,
    ) -> Result<PermissionStatus, NativeError>;
}
