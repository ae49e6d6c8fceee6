//! Fan-out of raw key events to the active listeners.
//!
//! The platform delivers one global stream of key-downs and key-ups. The
//! hotkey watcher subscribes for the lifetime of the process; a capture
//! session subscribes while it listens and unsubscribes when it ends.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::key::RawKey;

/// A single raw key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(RawKey),
    Up(RawKey),
}

impl KeyEvent {
    pub fn key(&self) -> &RawKey {
        match self {
            KeyEvent::Down(key) | KeyEvent::Up(key) => key,
        }
    }
}

/// Handle returned by [`KeyBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&KeyEvent) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

/// Cloneable hub that publishes key events to every subscriber.
#[derive(Clone, Default)]
pub struct KeyBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl KeyBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        let mut subs = self.subscribers.lock();
        let id = SubscriptionId(subs.next_id);
        subs.next_id += 1;
        subs.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.lock();
        let before = subs.handlers.len();
        subs.handlers.retain(|(sub, _)| *sub != id);
        subs.handlers.len() != before
    }

    /// Deliver an event to every current subscriber.
    ///
    /// Handlers run outside the lock, so they may subscribe or unsubscribe.
    /// A handler removed concurrently can still see this one event.
    pub fn publish(&self, event: &KeyEvent) {
        let handlers: Vec<Handler> = {
            let subs = self.subscribers.lock();
            subs.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        trace!(?event, subscribers = handlers.len(), "publishing key event");
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().handlers.len()
    }
}
