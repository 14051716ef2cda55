use super::call::{Call, CallError};
use crate::protocol::CallEvent;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub type CallHandler = Arc<dyn Fn(&Arc<Call>) + Send + Sync>;
pub type CallErrorHandler = Arc<dyn Fn(&Arc<Call>, Option<&CallError>) + Send + Sync>;

/// A listener bound to the event it was registered for.
#[derive(Clone)]
pub enum Listener {
    Connect(CallHandler),
    Reconnect(CallHandler),
    Ringing(CallHandler),
    ConnectFailure(CallErrorHandler),
    Reconnecting(CallErrorHandler),
    Disconnect(CallErrorHandler),
}

impl Listener {
    #[must_use]
    pub const fn event(&self) -> CallEvent {
        match self {
            Self::Connect(_) => CallEvent::Connect,
            Self::Reconnect(_) => CallEvent::Reconnect,
            Self::Ringing(_) => CallEvent::Ringing,
            Self::ConnectFailure(_) => CallEvent::ConnectFailure,
            Self::Reconnecting(_) => CallEvent::Reconnecting,
            Self::Disconnect(_) => CallEvent::Disconnect,
        }
    }

    fn invoke(&self, call: &Arc<Call>, error: Option<&CallError>) {
        match self {
            Self::Connect(h) | Self::Reconnect(h) | Self::Ringing(h) => h(call),
            Self::ConnectFailure(h) | Self::Reconnecting(h) | Self::Disconnect(h) => h(call, error),
        }
    }
}

#[derive(Default)]
struct Table {
    next_id: u64,
    entries: BTreeMap<CallEvent, Vec<(u64, Listener)>>,
}

/// Ordered listener lists, one per call event.
#[derive(Clone, Default)]
pub struct EventHandlers {
    table: Arc<Mutex<Table>>,
}

impl EventHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the list for its event.
    pub fn on(&self, listener: Listener) -> ListenerHandle {
        let event = listener.event();
        let id = {
            let mut table = lock(&self.table);
            let id = table.next_id;
            table.next_id += 1;
            table.entries.entry(event).or_default().push((id, listener));
            id
        };
        ListenerHandle {
            table: Arc::downgrade(&self.table),
            event,
            id,
        }
    }

    pub fn on_connect<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>) + Send + Sync + 'static,
    {
        self.on(Listener::Connect(Arc::new(handler)))
    }

    pub fn on_reconnect<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>) + Send + Sync + 'static,
    {
        self.on(Listener::Reconnect(Arc::new(handler)))
    }

    pub fn on_ringing<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>) + Send + Sync + 'static,
    {
        self.on(Listener::Ringing(Arc::new(handler)))
    }

    pub fn on_connect_failure<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>, Option<&CallError>) + Send + Sync + 'static,
    {
        self.on(Listener::ConnectFailure(Arc::new(handler)))
    }

    pub fn on_reconnecting<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>, Option<&CallError>) + Send + Sync + 'static,
    {
        self.on(Listener::Reconnecting(Arc::new(handler)))
    }

    pub fn on_disconnect<F>(&self, handler: F) -> ListenerHandle
    where
        F: Fn(&Arc<Call>, Option<&CallError>) + Send + Sync + 'static,
    {
        self.on(Listener::Disconnect(Arc::new(handler)))
    }

    /// Invoke every listener registered for `event`, in registration order.
    ///
    /// Runs against a snapshot of the list, so listeners may register or remove
    /// listeners; those changes apply from the next dispatch. A panicking
    /// listener is logged and skipped. Returns how many listeners completed.
    pub fn dispatch(&self, event: CallEvent, call: &Arc<Call>, error: Option<&CallError>) -> usize {
        let listeners: Vec<Listener> = {
            let table = lock(&self.table);
            match table.entries.get(&event) {
                Some(entries) => entries.iter().map(|(_, l)| l.clone()).collect(),
                None => return 0,
            }
        };

        tracing::debug!(%event, listeners = listeners.len(), "dispatching call event");
        let mut completed = 0;
        for listener in &listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.invoke(call, error)));
            match outcome {
                Ok(()) => completed += 1,
                Err(payload) => {
                    tracing::error!(%event, "call event listener panicked: {}", panic_message(payload.as_ref()));
                }
            }
        }
        completed
    }

    pub fn remove_all(&self) {
        lock(&self.table).entries.clear();
    }

    #[must_use]
    pub fn len(&self, event: CallEvent) -> usize {
        lock(&self.table).entries.get(&event).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.table).entries.values().all(Vec::is_empty)
    }
}

/// Removal capability returned by every registration.
///
/// Dropping the handle leaves the listener registered.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    table: Weak<Mutex<Table>>,
    event: CallEvent,
    id: u64,
}

impl ListenerHandle {
    #[must_use]
    pub const fn event(&self) -> CallEvent {
        self.event
    }

    /// Remove this registration. Calling it again is a no-op.
    pub fn remove(&self) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        let mut table = lock(&table);
        if let Some(entries) = table.entries.get_mut(&self.event) {
            entries.retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
