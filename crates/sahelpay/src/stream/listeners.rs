use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::event::{GatewayConfigEvent, GatewayEventType};

/// Error a listener may return; it is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Listener = Arc<dyn Fn(&GatewayConfigEvent) -> Result<(), ListenerError> + Send + Sync>;

#[derive(Default)]
struct Listeners {
    by_type: HashMap<GatewayEventType, Vec<Listener>>,
    all: Vec<Listener>,
}

/// Instance-owned listener table shared between the caller and the stream task.
///
/// Dispatch snapshots the relevant listeners and releases the lock before
/// calling them, so a listener may register further listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    inner: Mutex<Listeners>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        // A panicking listener never holds this lock, but stay usable regardless.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_event<F>(&self, kind: GatewayEventType, listener: F)
    where
        F: Fn(&GatewayConfigEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.lock()
            .by_type
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    pub fn on_all<F>(&self, listener: F)
    where
        F: Fn(&GatewayConfigEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.lock().all.push(Arc::new(listener));
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        let listeners = self.lock();
        listeners.all.len() + listeners.by_type.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to its type-specific listeners, then to the catch-all
    /// listeners, each group in registration order. Returns how many
    /// listeners were invoked.
    pub fn emit(&self, event: &GatewayConfigEvent) -> usize {
        self.emit_while(event, || true)
    }

    /// Like [`emit`](Self::emit), but checks `keep_going` before each listener
    /// and stops as soon as it returns `false`.
    pub(crate) fn emit_while(
        &self,
        event: &GatewayConfigEvent,
        keep_going: impl Fn() -> bool,
    ) -> usize {
        let snapshot: Vec<Listener> = {
            let listeners = self.lock();
            listeners
                .by_type
                .get(&event.kind)
                .into_iter()
                .flatten()
                .chain(listeners.all.iter())
                .cloned()
                .collect()
        };

        let mut invoked = 0;
        for listener in snapshot {
            if !keep_going() {
                break;
            }
            invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(event = %event.kind, error = %e, "gateway stream listener failed")
                }
                Err(_) => tracing::error!(event = %event.kind, "gateway stream listener panicked"),
            }
        }
        invoked
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
