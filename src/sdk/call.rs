use crate::protocol::{CallState, NativeCallError, NativeCallPayload};
use crate::transport::NativeModule;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Error reported by the native SDK alongside a call notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code}, reason: {reason})")]
pub struct CallError {
    pub message: String,
    pub reason: String,
    pub code: i64,
}

impl CallError {
    #[must_use]
    pub fn new(message: impl Into<String>, reason: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            reason: reason.into(),
            code,
        }
    }

    /// Build the error carried by `payload`, if any.
    #[must_use]
    pub fn from_payload(payload: &NativeCallPayload) -> Option<Self> {
        payload.error.as_ref().map(Self::from)
    }
}

impl From<&NativeCallError> for CallError {
    fn from(err: &NativeCallError) -> Self {
        Self::new(err.message.clone(), err.reason.clone(), err.code)
    }
}

/// Point-in-time copy of a call's fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSnapshot {
    pub call_sid: Option<String>,
    pub state: CallState,
    pub from: Option<String>,
    pub to: Option<String>,
    pub is_muted: bool,
    pub is_on_hold: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallSnapshot {
    fn from_payload(payload: &NativeCallPayload) -> Self {
        let mut snapshot = Self::default();
        snapshot.merge(payload);
        snapshot
    }

    /// Overwrite every field the payload carries; absent fields keep their value.
    fn merge(&mut self, payload: &NativeCallPayload) {
        if let Some(sid) = &payload.call_sid {
            self.call_sid = Some(sid.clone());
        }
        if let Some(state) = payload.state {
            self.state = state;
        }
        if let Some(from) = &payload.from {
            self.from = Some(from.clone());
        }
        if let Some(to) = &payload.to {
            self.to = Some(to.clone());
        }
        if let Some(muted) = payload.is_muted {
            self.is_muted = muted;
        }
        if let Some(on_hold) = payload.is_on_hold {
            self.is_on_hold = on_hold;
        }
        for (key, value) in &payload.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// The in-progress call.
///
/// A single `Call` lives for the whole logical call: later notifications are
/// merged into it, so `Arc::ptr_eq` holds across updates.
pub struct Call {
    fields: RwLock<CallSnapshot>,
    native: Arc<dyn NativeModule>,
}

impl Call {
    pub(crate) fn from_native(payload: &NativeCallPayload, native: Arc<dyn NativeModule>) -> Self {
        Self {
            fields: RwLock::new(CallSnapshot::from_payload(payload)),
            native,
        }
    }

    pub(crate) fn update_from_native(&self, payload: &NativeCallPayload) {
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(payload);
    }

    fn read(&self) -> RwLockReadGuard<'_, CallSnapshot> {
        self.fields.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn sid(&self) -> Option<String> {
        self.read().call_sid.clone()
    }

    #[must_use]
    pub fn state(&self) -> CallState {
        self.read().state
    }

    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.read().from.clone()
    }

    #[must_use]
    pub fn to(&self) -> Option<String> {
        self.read().to.clone()
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.read().is_muted
    }

    #[must_use]
    pub fn is_on_hold(&self) -> bool {
        self.read().is_on_hold
    }

    /// Any native field without a typed accessor.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<Value> {
        self.read().extra.get(key).cloned()
    }

    #[must_use]
    pub fn snapshot(&self) -> CallSnapshot {
        self.read().clone()
    }

    /// Ask the native layer to hang up this call.
    ///
    /// # Errors
    /// Returns an error if the native module rejects the request.
    pub async fn disconnect(&self) -> Result<()> {
        let sid = self.sid();
        tracing::debug!(call_sid = ?sid, "requesting native disconnect");
        self.native.disconnect(sid.as_deref()).await?;
        Ok(())
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call").field("fields", &*self.read()).finish_non_exhaustive()
    }
}
