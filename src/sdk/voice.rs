use crate::protocol::{CallEvent, NativeCallPayload};
use crate::transport::{
    ConnectParams, NativeEventSource, NativeModule, Permission, PermissionRequester, PermissionStatus,
};
use crate::{Error, Result};

use super::bridge::NativeBridge;
use super::builder::VoiceBuilder;
use super::call::{Call, CallError};
use super::config::VoiceConfig;
use super::handlers::{EventHandlers, Listener, ListenerHandle};
use super::reconciler::Reconciler;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceStatus {
    Offline,
    Busy,
}

/// Controller for the current call.
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct Voice {
    inner: Arc<VoiceInner>,
}

struct VoiceInner {
    native: Arc<dyn NativeModule>,
    permissions: Option<Arc<dyn PermissionRequester>>,
    handlers: EventHandlers,
    reconciler: Arc<Reconciler>,
    bridge: Mutex<NativeBridge>,
    config: Mutex<VoiceConfig>,
    native_version: OnceCell<String>,
}

impl Voice {
    #[must_use]
    pub fn builder() -> VoiceBuilder {
        VoiceBuilder::new()
    }

    pub(super) fn from_parts(
        native: Arc<dyn NativeModule>,
        events: Arc<dyn NativeEventSource>,
        permissions: Option<Arc<dyn PermissionRequester>>,
        config: VoiceConfig,
    ) -> Self {
        let handlers = EventHandlers::new();
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&native), handlers.clone()));
        Self {
            inner: Arc::new(VoiceInner {
                native,
                permissions,
                handlers,
                reconciler,
                bridge: Mutex::new(NativeBridge::new(events)),
                config: Mutex::new(config),
                native_version: OnceCell::new(),
            }),
        }
    }

    /// Subscribe to native call events and accept connects.
    ///
    /// Called by [`VoiceBuilder::build`]; calling it again re-arms a destroyed
    /// controller and is otherwise a no-op.
    pub fn setup(&self) {
        lock(&self.inner.bridge).subscribe(&self.inner.reconciler);
        self.inner.reconciler.set_up(true);
        tracing::info!("voice controller set up");
    }

    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.inner.reconciler.is_set_up()
    }

    /// Version of this crate.
    #[must_use]
    pub const fn version(&self) -> &'static str {
        crate::VERSION
    }

    /// Native SDK version, if it has been fetched.
    ///
    /// Building a controller does not query the native module; this stays
    /// `None` until [`Voice::get_native_version`] has resolved once.
    #[must_use]
    pub fn native_version(&self) -> Option<String> {
        self.inner.native_version.get().cloned()
    }

    /// Fetch the native SDK version. Only the first successful answer is
    /// requested from the native module; later calls reuse it.
    ///
    /// # Errors
    /// Returns an error if the native module rejects the query.
    pub async fn get_native_version(&self) -> Result<String> {
        let version = self
            .inner
            .native_version
            .get_or_try_init(|| async {
                let version = self.inner.native.get_version().await?;
                tracing::debug!(%version, "native version fetched");
                Ok::<_, Error>(version)
            })
            .await?;
        Ok(version.clone())
    }

    #[must_use]
    pub fn status(&self) -> VoiceStatus {
        if self.inner.reconciler.current().is_some() {
            VoiceStatus::Busy
        } else {
            VoiceStatus::Offline
        }
    }

    #[must_use]
    pub const fn available_events(&self) -> &'static [CallEvent] {
        &CallEvent::ALL
    }

    #[must_use]
    pub fn current_call(&self) -> Option<Arc<Call>> {
        self.inner.reconciler.current()
    }

    pub fn set_identity(&self, identity: impl Into<String>) {
        lock(&self.inner.config).identity = Some(identity.into());
    }

    #[must_use]
    pub fn identity(&self) -> Option<String> {
        lock(&self.inner.config).identity.clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        lock(&self.inner.config).token = Some(token.into());
    }

    pub fn on(&self, listener: Listener) -> ListenerHandle {
        self.inner.handlers.on(listener)
    }

    pub fn on_connect<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>) + Send + Sync + 'static,
    {
        self.inner.handlers.on_connect(handler)
    }

    pub fn on_reconnect<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>) + Send + Sync + 'static,
    {
        self.inner.handlers.on_reconnect(handler)
    }

    pub fn on_ringing<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>) + Send + Sync + 'static,
    {
        self.inner.handlers.on_ringing(handler)
    }

    pub fn on_connect_failure<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>, Option<&CallError>) + Send + Sync + 'static,
    {
        self.inner.handlers.on_connect_failure(handler)
    }

    pub fn on_reconnecting<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>, Option<&CallError>) + Send + Sync + 'static,
    {
        self.inner.handlers.on_reconnecting(handler)
    }

    pub fn on_disconnect<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>, Option<&CallError>) + Send + Sync + 'static,
    {
        self.inner.handlers.on_disconnect(handler)
    }

    pub fn remove_all_listeners(&self) {
        self.inner.handlers.remove_all();
    }

    /// Place an outgoing call.
    ///
    /// Fails immediately, without touching state, if the controller has been
    /// destroyed or a call is active or already being connected.
    ///
    /// # Errors
    /// Returns `Error::Destroyed`, `Error::Busy`, the native rejection, or a
    /// parse error for a malformed native reply.
    pub async fn connect(&self, token: &str, params: ConnectParams) -> Result<Arc<Call>> {
        let _reservation = self.inner.reconciler.begin_connect()?;
        tracing::debug!("issuing native connect");
        let raw = self.inner.native.connect(token, &params).await?;
        let payload = NativeCallPayload::from_value(raw)?;
        let call = self.inner.reconciler.create_or_update(&payload);
        tracing::info!(call_sid = ?call.sid(), "call connect accepted");
        Ok(call)
    }

    /// [`Voice::connect`] with the token set through `set_token` or the builder.
    ///
    /// # Errors
    /// Returns `Error::MissingToken` if no token is configured, otherwise as
    /// [`Voice::connect`].
    pub async fn connect_with_token(&self, params: ConnectParams) -> Result<Arc<Call>> {
        let token = lock(&self.inner.config).token.clone().ok_or(Error::MissingToken)?;
        self.connect(&token, params).await
    }

    /// Hang up the current call, if any. The slot is cleared before the native
    /// request is awaited and no event is dispatched.
    pub async fn disconnect_all(&self) {
        hang_up(self.inner.reconciler.take_current()).await;
    }

    /// Hang up, drop every listener, and unsubscribe from the native layer.
    ///
    /// The controller is torn down before the native hangup is awaited, so a
    /// connect or native event racing with `destroy` finds it already destroyed.
    pub async fn destroy(&self) {
        let call = self.inner.reconciler.take_current();
        self.inner.handlers.remove_all();
        self.inner.reconciler.set_up(false);
        lock(&self.inner.bridge).teardown();
        tracing::info!("voice controller destroyed");
        hang_up(call).await;
    }

    /// Ask the platform for microphone access.
    ///
    /// Platform failures are logged and reported as `None`.
    pub async fn request_microphone_permission(&self) -> Option<PermissionStatus> {
        let Some(requester) = &self.inner.permissions else {
            tracing::warn!("no permission requester configured");
            return None;
        };
        let rationale = lock(&self.inner.config).rationale.clone();
        match requester.request(Permission::RecordAudio, &rationale).await {
            Ok(status) => {
                if status.is_granted() {
                    tracing::info!("microphone permission granted");
                } else {
                    tracing::info!(?status, "microphone permission not granted");
                }
                Some(status)
            }
            Err(err) => {
                tracing::warn!("microphone permission request failed: {err}");
                None
            }
        }
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("status", &self.status())
            .field("set_up", &self.is_set_up())
            .field("native_version", &self.native_version())
            .finish_non_exhaustive()
    }
}

async fn hang_up(call: Option<Arc<Call>>) {
    let Some(call) = call else {
        return;
    };
    if let Err(err) = call.disconnect().await {
        tracing::warn!(call_sid = ?call.sid(), "native disconnect failed: {err}");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
