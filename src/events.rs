//! Ordered listener registry shared by the bridge client and the wallet
//! standard adapter.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, Weak};

pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

type ListenerMap<K, E> = HashMap<K, Vec<Listener<E>>>;

/// Maps an event name to its listeners in subscription order.
pub struct EventEmitter<K, E> {
    listeners: Arc<Mutex<ListenerMap<K, E>>>,
}

impl<K, E> EventEmitter<K, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    E: 'static,
{
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe `listener` to `event`. The same `Arc` may be added more
    /// than once; each subscription is delivered.
    pub fn on(&self, event: K, listener: Listener<E>) -> Unsubscribe<K, E> {
        {
            let mut map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(event.clone()).or_default().push(Arc::clone(&listener));
        }
        Unsubscribe {
            listeners: Arc::downgrade(&self.listeners),
            event,
            listener,
        }
    }

    /// Remove every subscription of `listener` (by pointer identity).
    pub fn off(&self, event: &K, listener: &Listener<E>) {
        remove_listener(&self.listeners, event, listener);
    }

    /// Deliver `payload` to a snapshot of the listeners for `event`.
    ///
    /// Listeners may subscribe or unsubscribe while the emission runs; that
    /// only affects later emissions.
    pub fn emit(&self, event: &K, payload: &E) -> usize {
        let snapshot: Vec<Listener<E>> = {
            let map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            map.get(event).cloned().unwrap_or_default()
        };
        for listener in &snapshot {
            listener(payload);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, event: &K) -> usize {
        let map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        map.get(event).map_or(0, Vec::len)
    }
}

impl<K, E> Default for EventEmitter<K, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    E: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn remove_listener<K: Eq + Hash, E>(
    listeners: &Mutex<ListenerMap<K, E>>,
    event: &K,
    listener: &Listener<E>,
) {
    let mut map = listeners.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(list) = map.get_mut(event) {
        list.retain(|existing| !Arc::ptr_eq(existing, listener));
        if list.is_empty() {
            map.remove(event);
        }
    }
}

/// Handle returned by [`EventEmitter::on`]. Dropping it keeps the
/// subscription alive; call [`Unsubscribe::unsubscribe`] to remove it.
pub struct Unsubscribe<K, E> {
    listeners: Weak<Mutex<ListenerMap<K, E>>>,
    event: K,
    listener: Listener<E>,
}

impl<K: Eq + Hash, E> Unsubscribe<K, E> {
    /// Safe to call repeatedly, and after the emitter is gone.
    pub fn unsubscribe(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            remove_listener(&listeners, &self.event, &self.listener);
        }
    }
}
