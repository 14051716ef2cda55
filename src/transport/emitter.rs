use crate::protocol::{CallEvent, NativeNotification};
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub type NativeListener = Arc<dyn Fn(Value) + Send + Sync>;

/// A live registration on a native channel.
pub trait NativeSubscription: Send + Sync {
    fn remove(self: Box<Self>);
}

/// Source of raw native call notifications.
pub trait NativeEventSource: Send + Sync {
    fn add_listener(&self, event: CallEvent, listener: NativeListener) -> Box<dyn NativeSubscription>;
}

#[derive(Default)]
struct EmitterState {
    next_id: u64,
    listeners: BTreeMap<CallEvent, Vec<(u64, NativeListener)>>,
}

/// In-process event source.
///
/// Delivery is synchronous and in registration order. Bridges that receive
/// callbacks on another thread push them through a channel and drive
/// [`NativeEmitter::pump`].
#[derive(Clone, Default)]
pub struct NativeEmitter {
    state: Arc<Mutex<EmitterState>>,
}

impl NativeEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every listener on `event`. Returns the number of
    /// listeners reached.
    pub fn emit(&self, event: CallEvent, payload: Value) -> usize {
        let listeners: Vec<NativeListener> = {
            let state = lock(&self.state);
            state
                .listeners
                .get(&event)
                .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default()
        };
        tracing::trace!(%event, listeners = listeners.len(), "emitting native event");
        for listener in &listeners {
            listener(payload.clone());
        }
        listeners.len()
    }

    #[must_use]
    pub fn listener_count(&self, event: CallEvent) -> usize {
        lock(&self.state).listeners.get(&event).map_or(0, Vec::len)
    }

    /// Emit every notification from `stream` until it ends.
    pub async fn pump<S>(&self, stream: S)
    where
        S: Stream<Item = NativeNotification>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(notification) = stream.next().await {
            self.emit(notification.event, notification.payload);
        }
        tracing::debug!("native notification stream ended");
    }
}

impl NativeEventSource for NativeEmitter {
    fn add_listener(&self, event: CallEvent, listener: NativeListener) -> Box<dyn NativeSubscription> {
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.entry(event).or_default().push((id, listener));
            id
        };
        Box::new(EmitterSubscription {
            state: Arc::downgrade(&self.state),
            event,
            id,
        })
    }
}

struct EmitterSubscription {
    state: Weak<Mutex<EmitterState>>,
    event: CallEvent,
    id: u64,
}

impl NativeSubscription for EmitterSubscription {
    fn remove(self: Box<Self>) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = lock(&state);
        if let Some(entries) = state.listeners.get_mut(&self.event) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                state.listeners.remove(&self.event);
            }
        }
    }
}

fn lock(state: &Mutex<EmitterState>) -> MutexGuard<'_, EmitterState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
