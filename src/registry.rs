// file: src/registry.rs
// description: listener bookkeeping and panic-isolated dispatch

use crate::events::{EventKind, StreamEvent};
use crate::monitoring::LISTENER_FAILURE_COUNTER;
use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::error;

/// Callback handle. Identity is the `Arc` allocation, so keep a clone to unregister.
pub type Listener = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&StreamEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<EventKind, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends; duplicates are kept and each fires once per dispatch.
    pub fn register(&mut self, kind: EventKind, listener: Listener) {
        self.listeners.entry(kind).or_default().push(listener);
    }

    /// Removes every registration of `listener` under `kind` and returns how many.
    pub fn unregister(&mut self, kind: EventKind, listener: &Listener) -> usize {
        let Some(registered) = self.listeners.get_mut(&kind) else {
            return 0;
        };

        let before = registered.len();
        registered.retain(|l| !same_listener(l, listener));
        let removed = before - registered.len();

        if registered.is_empty() {
            self.listeners.remove(&kind);
        }
        removed
    }

    /// Listeners for `kind` in registration order.
    pub fn snapshot(&self, kind: EventKind) -> Vec<Listener> {
        self.listeners.get(&kind).cloned().unwrap_or_default()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(&kind.as_str(), &self.count(kind));
        }
        map.finish()
    }
}

/// Invokes `listeners` in order. A panicking listener is logged and skipped.
///
/// Returns the number of listeners that panicked.
pub fn dispatch(listeners: &[Listener], event: &StreamEvent) -> usize {
    let mut failures = 0;

    for (position, listener) in listeners.iter().enumerate() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
            failures += 1;
            LISTENER_FAILURE_COUNTER.increment(1);
            error!(
                event = %event.kind(),
                position,
                reason = panic_message(payload.as_ref()),
                "listener panicked during dispatch"
            );
        }
    }

    failures
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
