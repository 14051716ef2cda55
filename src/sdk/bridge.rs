use super::reconciler::Reconciler;
use crate::protocol::{CallEvent, NativeCallPayload};
use crate::transport::{NativeEventSource, NativeSubscription};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Keeps exactly one native subscription per call event while set up.
pub(crate) struct NativeBridge {
    source: Arc<dyn NativeEventSource>,
    subscriptions: BTreeMap<CallEvent, Box<dyn NativeSubscription>>,
}

impl NativeBridge {
    pub(crate) fn new(source: Arc<dyn NativeEventSource>) -> Self {
        Self {
            source,
            subscriptions: BTreeMap::new(),
        }
    }

    /// Subscribe every call event that is not already subscribed.
    pub(crate) fn subscribe(&mut self, reconciler: &Arc<Reconciler>) {
        for event in CallEvent::ALL {
            if self.subscriptions.contains_key(&event) {
                continue;
            }
            let target = Arc::downgrade(reconciler);
            let subscription = self
                .source
                .add_listener(event, Arc::new(move |raw| forward(&target, event, raw)));
            self.subscriptions.insert(event, subscription);
        }
        tracing::debug!(subscriptions = self.subscriptions.len(), "native bridge subscribed");
    }

    pub(crate) fn teardown(&mut self) {
        for (_, subscription) in std::mem::take(&mut self.subscriptions) {
            subscription.remove();
        }
        tracing::debug!("native bridge torn down");
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }
}

fn forward(target: &Weak<Reconciler>, event: CallEvent, raw: Value) {
    let Some(reconciler) = target.upgrade() else {
        return;
    };
    tracing::trace!(%event, payload = %raw, "native call event");
    match NativeCallPayload::from_value(raw) {
        Ok(payload) => reconciler.apply(event, &payload),
        Err(err) if event.is_terminal() && reconciler.current().is_some() => {
            tracing::warn!(%event, "unparsable terminal payload, ending current call: {err}");
            reconciler.apply(event, &NativeCallPayload::default());
        }
        Err(err) => tracing::warn!(%event, "dropping unparsable native payload: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NativeError;
    use crate::sdk::handlers::EventHandlers;
    use crate::transport::{ConnectParams, NativeEmitter, NativeModule};
    use async_trait::async_trait;
    use serde_json::json;

    struct NullNative;

    #[async_trait]
    impl NativeModule for NullNative {
        async fn connect(&self, _: &str, _: &ConnectParams) -> Result<Value, NativeError> {
            Err(NativeError::new("unused"))
        }
        async fn get_version(&self) -> Result<String, NativeError> {
            Ok(String::new())
        }
        async fn disconnect(&self, _: Option<&str>) -> Result<(), NativeError> {
            Ok(())
        }
    }

    fn setup() -> (NativeEmitter, NativeBridge, Arc<Reconciler>) {
        let emitter = NativeEmitter::new();
        let reconciler = Arc::new(Reconciler::new(Arc::new(NullNative), EventHandlers::new()));
        reconciler.set_up(true);
        let bridge = NativeBridge::new(Arc::new(emitter.clone()));
        (emitter, bridge, reconciler)
    }

    #[test]
    fn subscribe_is_idempotent_per_event() {
        let (emitter, mut bridge, reconciler) = setup();
        bridge.subscribe(&reconciler);
        bridge.subscribe(&reconciler);

        assert_eq!(bridge.len(), CallEvent::ALL.len());
        for event in CallEvent::ALL {
            assert_eq!(emitter.listener_count(event), 1);
        }
    }

    #[test]
    fn teardown_removes_every_subscription() {
        let (emitter, mut bridge, reconciler) = setup();
        bridge.subscribe(&reconciler);
        bridge.teardown();

        assert_eq!(bridge.len(), 0);
        for event in CallEvent::ALL {
            assert_eq!(emitter.listener_count(event), 0);
        }
        assert_eq!(emitter.emit(CallEvent::Ringing, json!({ "callSid": "CA1" })), 0);
        assert!(reconciler.current().is_none());
    }

    #[test]
    fn emitted_payload_reaches_reconciler() {
        let (emitter, mut bridge, reconciler) = setup();
        bridge.subscribe(&reconciler);

        emitter.emit(CallEvent::Ringing, json!({ "callSid": "CA1", "state": "ringing" }));
        assert_eq!(reconciler.current().and_then(|c| c.sid()).as_deref(), Some("CA1"));
    }

    #[test]
    fn unparsable_payload_is_dropped() {
        let (emitter, mut bridge, reconciler) = setup();
        bridge.subscribe(&reconciler);

        emitter.emit(CallEvent::Ringing, json!(["not", "an", "object"]));
        assert!(reconciler.current().is_none());
    }

    #[test]
    fn unparsable_terminal_payload_still_ends_call() {
        let (emitter, mut bridge, reconciler) = setup();
        bridge.subscribe(&reconciler);

        emitter.emit(CallEvent::Ringing, json!({ "callSid": "CA1" }));
        emitter.emit(CallEvent::Disconnect, json!({ "callSid": 42 }));
        assert!(reconciler.current().is_none());
    }

    #[test]
    fn unparsable_terminal_payload_without_call_creates_nothing() {
        let (emitter, mut bridge, reconciler) = setup();
        bridge.subscribe(&reconciler);

        emitter.emit(CallEvent::ConnectFailure, json!("garbage"));
        assert!(reconciler.current().is_none());
    }

    #[test]
    fn dropped_reconciler_is_not_called() {
        let (emitter, mut bridge, reconciler) = setup();
        bridge.subscribe(&reconciler);
        drop(reconciler);

        assert_eq!(emitter.emit(CallEvent::Connect, json!({})), 1);
    }
}
