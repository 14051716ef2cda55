use crate::transport::{NativeEventSource, NativeModule, PermissionRationale, PermissionRequester};
use crate::{Error, Result};
use std::sync::Arc;

use super::config::VoiceConfig;
use super::voice::Voice;

pub struct VoiceBuilder {
    native: Option<Arc<dyn NativeModule>>,
    events: Option<Arc<dyn NativeEventSource>>,
    permissions: Option<Arc<dyn PermissionRequester>>,
    config: VoiceConfig,
}

impl VoiceBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            native: None,
            events: None,
            permissions: None,
            config: VoiceConfig::default(),
        }
    }

    #[must_use]
    pub fn native(mut self, native: Arc<dyn NativeModule>) -> Self {
        self.native = Some(native);
        self
    }

    #[must_use]
    pub fn events(mut self, events: Arc<dyn NativeEventSource>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: Arc<dyn PermissionRequester>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    #[must_use]
    pub fn config(mut self, config: VoiceConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.config.identity = Some(identity.into());
        self
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn rationale(mut self, rationale: PermissionRationale) -> Self {
        self.config.rationale = rationale;
        self
    }

    /// Build the controller and subscribe it to the native event source.
    ///
    /// # Errors
    /// Returns an error if the native module or the event source is missing.
    pub fn build(self) -> Result<Voice> {
        let native = self
            .native
            .ok_or_else(|| Error::InvalidConfig("native module required".to_string()))?;
        let events = self
            .events
            .ok_or_else(|| Error::InvalidConfig("native event source required".to_string()))?;
        let voice = Voice::from_parts(native, events, self.permissions, self.config);
        voice.setup();
        Ok(voice)
    }
}

impl Default for VoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
