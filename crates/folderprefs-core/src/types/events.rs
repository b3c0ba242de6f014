//! Listener registration and disposal handles

use std::sync::Arc;

use parking_lot::Mutex;

/// Handle for a registered listener or resource
///
/// Disposing (or dropping) the handle runs its release action exactly once.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release
    pub fn empty() -> Self {
        Self { release: None }
    }

    pub fn dispose(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Listener callback type
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct EmitterState<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// A simple synchronous event emitter
///
/// Listeners run on the firing thread, in registration order. The listener
/// list is copied before dispatch, so listeners may subscribe or unsubscribe
/// while an event is being delivered.
pub struct Emitter<T> {
    state: Arc<Mutex<EmitterState<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EmitterState {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener; it stays registered until the handle is disposed
    pub fn subscribe(&self, listener: Listener<T>) -> Subscription {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, listener));
            id
        };
        let weak = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state.lock().listeners.retain(|(other, _)| *other != id);
            }
        })
    }

    pub fn fire(&self, event: &T) {
        let listeners: Vec<Listener<T>> = self
            .state
            .lock()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Drop every registered listener
    pub fn clear(&self) {
        self.state.lock().listeners.clear();
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_releases_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let counter = count.clone();
        {
            let _sub = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emitter_fire_and_unsubscribe() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let sub = emitter.subscribe(Arc::new(move |v: &u32| sink.lock().push(*v)));
        emitter.fire(&1);
        emitter.fire(&2);
        assert_eq!(emitter.listener_count(), 1);

        sub.dispose();
        emitter.fire(&3);
        assert_eq!(*seen.lock(), vec![1, 2]);
        assert_eq!(emitter.listener_count(), 0);
    }
}
