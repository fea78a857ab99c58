use crate::store::snapshot::Snapshot;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct Table {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback>,
}

/// Registry of snapshot callbacks, notified in registration order.
#[derive(Clone, Default)]
pub struct Listeners {
    table: Arc<Mutex<Table>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let id = table.next_id;
        table.next_id += 1;
        table.callbacks.insert(id, Arc::new(listener));
        Subscription {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Calls every registered listener with `snapshot`.
    ///
    /// The table lock is released first, so a listener may subscribe or
    /// unsubscribe from inside its callback.
    pub fn notify(&self, snapshot: &Snapshot) {
        let callbacks: Vec<Callback> = {
            let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.callbacks.values().cloned().collect()
        };
        for callback in callbacks {
            callback(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`Listeners::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    table: Weak<Mutex<Table>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks
                .remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn listener_stops_after_unsubscribe() {
        let listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = listeners.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        listeners.notify(&Snapshot::default());
        subscription.unsubscribe();
        listeners.notify(&Snapshot::default());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn listener_receives_current_snapshot() {
        let listeners = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = listeners.subscribe(move |snapshot| {
            sink.lock().unwrap().push(snapshot.connected);
        });

        let snapshot = Snapshot {
            connected: true,
            ..Default::default()
        };
        listeners.notify(&snapshot);

        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }
}
