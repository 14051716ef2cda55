use super::call::{Call, CallError};
use super::handlers::EventHandlers;
use crate::protocol::{CallEvent, NativeCallPayload};
use crate::transport::NativeModule;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct SlotState {
    current: Option<Arc<Call>>,
    set_up: bool,
    connecting: bool,
}

/// Owns the current-call slot and turns native payloads into listener dispatches.
pub(crate) struct Reconciler {
    native: Arc<dyn NativeModule>,
    handlers: EventHandlers,
    state: Mutex<SlotState>,
}

impl Reconciler {
    pub(crate) fn new(native: Arc<dyn NativeModule>, handlers: EventHandlers) -> Self {
        Self {
            native,
            handlers,
            state: Mutex::new(SlotState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one native notification: update the slot, dispatch, then clear
    /// the slot for terminal events.
    pub(crate) fn apply(&self, event: CallEvent, payload: &NativeCallPayload) {
        let call = {
            let mut state = self.lock();
            if !state.set_up {
                tracing::debug!(%event, "ignoring native event on a destroyed controller");
                return;
            }
            self.create_or_update_locked(&mut state, payload)
        };

        let error = CallError::from_payload(payload);
        let error = if event.carries_error() { error.as_ref() } else { None };
        self.handlers.dispatch(event, &call, error);

        if event.is_terminal() {
            let cleared = self.lock().current.take();
            tracing::debug!(%event, call_sid = ?cleared.and_then(|c| c.sid()), "current call cleared");
        }
    }

    pub(crate) fn create_or_update(&self, payload: &NativeCallPayload) -> Arc<Call> {
        let mut state = self.lock();
        self.create_or_update_locked(&mut state, payload)
    }

    fn create_or_update_locked(&self, state: &mut SlotState, payload: &NativeCallPayload) -> Arc<Call> {
        if let Some(call) = &state.current {
            call.update_from_native(payload);
            return Arc::clone(call);
        }
        let call = Arc::new(Call::from_native(payload, Arc::clone(&self.native)));
        tracing::debug!(call_sid = ?call.sid(), "current call created");
        state.current = Some(Arc::clone(&call));
        call
    }

    pub(crate) fn current(&self) -> Option<Arc<Call>> {
        self.lock().current.clone()
    }

    pub(crate) fn take_current(&self) -> Option<Arc<Call>> {
        self.lock().current.take()
    }

    pub(crate) fn set_up(&self, set_up: bool) {
        self.lock().set_up = set_up;
    }

    pub(crate) fn is_set_up(&self) -> bool {
        self.lock().set_up
    }

    /// Reserve the slot for an outgoing connect.
    ///
    /// The reservation is released when the guard drops, whether the connect
    /// resolved, failed, or was abandoned.
    pub(crate) fn begin_connect(&self) -> Result<ConnectGuard<'_>> {
        let mut state = self.lock();
        if !state.set_up {
            return Err(Error::Destroyed);
        }
        if state.current.is_some() || state.connecting {
            return Err(Error::Busy);
        }
        state.connecting = true;
        Ok(ConnectGuard { reconciler: self })
    }
}

pub(crate) struct ConnectGuard<'a> {
    reconciler: &'a Reconciler,
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        self.reconciler.lock().connecting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NativeError;
    use crate::transport::ConnectParams;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct NullNative;

    #[async_trait]
    impl NativeModule for NullNative {
        async fn connect(&self, _: &str, _: &ConnectParams) -> std::result::Result<Value, NativeError> {
            Err(NativeError::new("unused"))
        }
        async fn get_version(&self) -> std::result::Result<String, NativeError> {
            Ok(String::new())
        }
        async fn disconnect(&self, _: Option<&str>) -> std::result::Result<(), NativeError> {
            Ok(())
        }
    }

    fn reconciler() -> (Reconciler, EventHandlers) {
        let handlers = EventHandlers::new();
        let reconciler = Reconciler::new(Arc::new(NullNative), handlers.clone());
        reconciler.set_up(true);
        (reconciler, handlers)
    }

    fn payload(value: Value) -> NativeCallPayload {
        NativeCallPayload::from_value(value).unwrap()
    }

    #[test]
    fn non_terminal_events_keep_call_identity() {
        let (reconciler, _) = reconciler();
        reconciler.apply(CallEvent::Ringing, &payload(json!({ "callSid": "CA1", "state": "ringing" })));
        let first = reconciler.current().unwrap();

        reconciler.apply(CallEvent::Connect, &payload(json!({ "callSid": "CA1", "state": "connected" })));
        let second = reconciler.current().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.state(), crate::protocol::CallState::Connected);
    }

    #[test]
    fn terminal_event_clears_after_dispatch() {
        let (reconciler, handlers) = reconciler();
        let seen = Arc::new(Mutex::new(None));
        let seen_cb = Arc::clone(&seen);
        handlers.on_connect_failure(move |call, err| {
            *seen_cb.lock().unwrap() = Some((call.sid(), err.cloned()));
        });

        reconciler.apply(
            CallEvent::ConnectFailure,
            &payload(json!({ "callSid": "CA2", "error": { "message": "m", "code": 31005, "reason": "r" } })),
        );

        assert!(reconciler.current().is_none());
        let (sid, err) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(sid.as_deref(), Some("CA2"));
        assert_eq!(err, Some(CallError::new("m", "r", 31005)));
    }

    #[test]
    fn error_is_withheld_from_non_error_events() {
        let (reconciler, handlers) = reconciler();
        let calls = Arc::new(Mutex::new(0));
        let calls_cb = Arc::clone(&calls);
        handlers.on_connect(move |_| *calls_cb.lock().unwrap() += 1);

        reconciler.apply(
            CallEvent::Connect,
            &payload(json!({ "callSid": "CA3", "error": { "message": "m", "code": 1, "reason": "r" } })),
        );

        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(reconciler.current().is_some());
    }

    #[test]
    fn begin_connect_rejects_when_busy_or_destroyed() {
        let (reconciler, _) = reconciler();
        let guard = reconciler.begin_connect().unwrap();
        assert!(matches!(reconciler.begin_connect(), Err(Error::Busy)));
        drop(guard);
        assert!(reconciler.begin_connect().is_ok());

        reconciler.set_up(false);
        assert!(matches!(reconciler.begin_connect(), Err(Error::Destroyed)));
    }

    #[test]
    fn events_after_teardown_are_ignored() {
        let (reconciler, _) = reconciler();
        reconciler.set_up(false);
        reconciler.apply(CallEvent::Ringing, &payload(json!({ "callSid": "CA4" })));
        assert!(reconciler.current().is_none());
    }
}
