//! Global start/stop hotkey detection.
//!
//! The watcher keeps its own set of held keys, separate from any capture
//! session, and fires its toggle callback once per press of the hotkey.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::bus::{KeyBus, KeyEvent, SubscriptionId};
use crate::combo::{is_satisfied, ComboSpec, HeldKeySet};
use crate::key::RawKey;

/// Held keys plus the edge-trigger latch.
#[derive(Debug, Default)]
pub struct WatcherState {
    held: HeldKeySet,
    pressed_last: bool,
}

impl WatcherState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down. Returns true when the hotkey has just become
    /// satisfied; holding it (including OS key repeat) never fires twice.
    pub fn key_down(&mut self, raw: RawKey, hotkey: &ComboSpec) -> bool {
        self.held.insert(raw);
        if is_satisfied(hotkey, &self.held) && !self.pressed_last {
            self.pressed_last = true;
            return true;
        }
        false
    }

    /// Record a key-up. Releasing any key re-arms the latch.
    pub fn key_up(&mut self, raw: &RawKey) {
        self.held.remove(raw);
        self.pressed_last = false;
    }

    pub fn held(&self) -> &HeldKeySet {
        &self.held
    }

    pub fn is_latched(&self) -> bool {
        self.pressed_last
    }
}

/// Process-lifetime subscriber that turns hotkey presses into toggles.
pub struct HotkeyWatcher {
    state: Arc<Mutex<WatcherState>>,
    bus: KeyBus,
    subscription: Option<SubscriptionId>,
}

impl HotkeyWatcher {
    /// Subscribe to `bus`. `hotkey` is consulted on every key-down so a newly
    /// confirmed hotkey applies immediately; `on_toggle` runs outside the
    /// watcher's lock.
    pub fn start<H, T>(bus: &KeyBus, hotkey: H, on_toggle: T) -> Self
    where
        H: Fn() -> ComboSpec + Send + Sync + 'static,
        T: Fn() + Send + Sync + 'static,
    {
        let state = Arc::new(Mutex::new(WatcherState::new()));
        let handler_state = Arc::clone(&state);

        let subscription = bus.subscribe(move |event| match *event {
            KeyEvent::Down(raw) => {
                let combo = hotkey();
                let fire = handler_state.lock().key_down(raw, &combo);
                if fire {
                    debug!(hotkey = %combo, "hotkey pressed");
                    on_toggle();
                }
            }
            KeyEvent::Up(raw) => handler_state.lock().key_up(&raw),
        });

        Self {
            state,
            bus: bus.clone(),
            subscription: Some(subscription),
        }
    }

    pub fn held_count(&self) -> usize {
        self.state.lock().held().len()
    }
}

impl Drop for HotkeyWatcher {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(id);
        }
    }
}
