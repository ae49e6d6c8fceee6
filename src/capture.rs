//! Interactive capture of the hotkey and of the key to repeat.
//!
//! [`CaptureSession`] is the pure state machine. [`CaptureListener`] wires a
//! session to the [`KeyBus`] for as long as it is listening.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bus::{KeyBus, KeyEvent, SubscriptionId};
use crate::combo::{ComboSpec, HeldKeySet, PLACEHOLDER};
use crate::error::{AutoclickError, Result};
use crate::key::{KeyIdentity, Modifier, RawKey};

/// What a capture session configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTarget {
    /// The start/stop hotkey combo.
    Hotkey,
    /// The key pressed repeatedly in keyboard mode.
    TargetKey,
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTarget::Hotkey => write!(f, "hotkey"),
            CaptureTarget::TargetKey => write!(f, "target key"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening,
    Confirmed,
    Cancelled,
}

/// Value produced by a confirmed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Hotkey(ComboSpec),
    TargetKey(KeyIdentity),
}

impl CaptureResult {
    pub fn canonical(&self) -> String {
        match self {
            CaptureResult::Hotkey(spec) => spec.canonical(),
            CaptureResult::TargetKey(key) => key.canonical(),
        }
    }
}

/// State machine for one capture: `Idle -> Listening -> Confirmed | Cancelled`.
///
/// Key-ups are tracked but never shrink the captured combo; only a fresh
/// [`begin`](Self::begin) clears it.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    target: CaptureTarget,
    state: CaptureState,
    held: HeldKeySet,
    /// Distinct keys pressed since `begin`, most recent last.
    pressed: Vec<KeyIdentity>,
}

impl CaptureSession {
    pub fn new(target: CaptureTarget) -> Self {
        Self {
            target,
            state: CaptureState::Idle,
            held: HeldKeySet::new(),
            pressed: Vec::new(),
        }
    }

    pub fn target(&self) -> CaptureTarget {
        self.target
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    /// Start listening. Returns false if the session already listens.
    pub fn begin(&mut self) -> bool {
        if self.is_listening() {
            return false;
        }
        self.held.clear();
        self.pressed.clear();
        self.state = CaptureState::Listening;
        true
    }

    /// Record a key-down. Returns the new live display if it changed.
    pub fn key_down(&mut self, raw: RawKey) -> Option<String> {
        if !self.is_listening() {
            return None;
        }
        self.held.insert(raw);

        let identity = KeyIdentity::from_raw(&raw)?.normalized();

        let before = self.live_display();
        self.pressed.retain(|k| *k != identity);
        self.pressed.push(identity);
        let after = self.live_display();

        (after != before).then_some(after)
    }

    pub fn key_up(&mut self, raw: RawKey) {
        if self.is_listening() {
            self.held.remove(&raw);
        }
    }

    /// Keys physically held right now, per this session's own listener.
    pub fn held(&self) -> &HeldKeySet {
        &self.held
    }

    /// Non-modifier keys pressed since `begin`, in press order.
    fn keys(&self) -> impl Iterator<Item = &KeyIdentity> {
        self.pressed.iter().filter(|k| !k.is_modifier())
    }

    /// Modifiers in fixed order, then every non-modifier key in press order.
    fn hotkey_parts(&self) -> Vec<String> {
        Modifier::ALL
            .into_iter()
            .filter(|m| self.pressed.iter().any(|k| k.modifier() == Some(*m)))
            .map(|m| m.name().to_string())
            .chain(self.keys().map(KeyIdentity::canonical))
            .collect()
    }

    /// Combo built from everything pressed. A hotkey holds at most one
    /// non-modifier key, so pressing two of them is an `InvalidCombo`.
    pub fn combo(&self) -> Result<ComboSpec> {
        let mut keys = self.keys();
        let key = keys.next().copied();
        if keys.next().is_some() {
            return Err(AutoclickError::invalid_combo(
                self.hotkey_parts().join("+"),
                "a hotkey takes at most one non-modifier key",
            ));
        }
        let modifiers = self.pressed.iter().filter_map(KeyIdentity::modifier);
        Ok(ComboSpec::new(modifiers, key))
    }

    /// Most recent non-modifier key, or the most recent modifier if none.
    pub fn target_key(&self) -> Option<KeyIdentity> {
        self.pressed
            .iter()
            .rev()
            .find(|k| !k.is_modifier())
            .or_else(|| self.pressed.last())
            .copied()
    }

    /// Uppercased text for the input box, `"..."` while empty.
    pub fn live_display(&self) -> String {
        match self.target {
            CaptureTarget::Hotkey => {
                let parts = self.hotkey_parts();
                if parts.is_empty() {
                    PLACEHOLDER.to_string()
                } else {
                    parts.join("+").to_uppercase()
                }
            }
            CaptureTarget::TargetKey => self
                .target_key()
                .map(|k| k.display().to_uppercase())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }

    fn result(&self) -> Result<Option<CaptureResult>> {
        Ok(match self.target {
            CaptureTarget::Hotkey => {
                let combo = self.combo()?;
                (!combo.is_unset()).then_some(CaptureResult::Hotkey(combo))
            }
            CaptureTarget::TargetKey => self.target_key().map(CaptureResult::TargetKey),
        })
    }

    /// Finish the session. An empty capture, or a hotkey with more than one
    /// non-modifier key, is rejected and the session keeps listening.
    pub fn confirm(&mut self) -> Result<CaptureResult> {
        if !self.is_listening() {
            return Err(AutoclickError::NotCapturing {
                target: self.target,
            });
        }
        let result = self.result()?.ok_or(AutoclickError::EmptyCapture {
            target: self.target,
        })?;
        self.state = CaptureState::Confirmed;
        Ok(result)
    }

    /// Abandon the session. Returns false if it was not listening.
    pub fn cancel(&mut self) -> bool {
        if !self.is_listening() {
            return false;
        }
        self.state = CaptureState::Cancelled;
        true
    }
}

/// A [`CaptureSession`] subscribed to the key bus while it listens.
pub struct CaptureListener {
    session: Arc<Mutex<CaptureSession>>,
    bus: KeyBus,
    subscription: Option<SubscriptionId>,
}

impl CaptureListener {
    /// Begin a new session and subscribe it. `on_update` receives every
    /// change of the live display.
    pub fn start<F>(bus: &KeyBus, target: CaptureTarget, on_update: F) -> Self
    where
        F: Fn(CaptureTarget, String) + Send + Sync + 'static,
    {
        let mut session = CaptureSession::new(target);
        session.begin();
        let session = Arc::new(Mutex::new(session));

        let handler_session = Arc::clone(&session);
        let subscription = bus.subscribe(move |event| {
            let update = {
                let mut session = handler_session.lock();
                match *event {
                    KeyEvent::Down(raw) => session.key_down(raw),
                    KeyEvent::Up(raw) => {
                        session.key_up(raw);
                        None
                    }
                }
            };
            if let Some(live) = update {
                debug!(%target, %live, "capture updated");
                on_update(target, live);
            }
        });

        Self {
            session,
            bus: bus.clone(),
            subscription: Some(subscription),
        }
    }

    pub fn target(&self) -> CaptureTarget {
        self.session.lock().target()
    }

    pub fn is_listening(&self) -> bool {
        self.session.lock().is_listening()
    }

    pub fn live_display(&self) -> String {
        self.session.lock().live_display()
    }

    /// Confirm the session and drop the temporary subscription on success.
    pub fn confirm(&mut self) -> Result<CaptureResult> {
        let result = self.session.lock().confirm()?;
        self.detach();
        Ok(result)
    }

    pub fn cancel(&mut self) -> bool {
        let cancelled = self.session.lock().cancel();
        self.detach();
        cancelled
    }

    fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(id);
        }
    }
}

impl Drop for CaptureListener {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Modifier, NamedKey, Side};

    fn ctrl() -> RawKey {
        RawKey::Modifier(Modifier::Ctrl, Side::Left)
    }

    fn shift() -> RawKey {
        RawKey::Modifier(Modifier::Shift, Side::Right)
    }

    #[test]
    fn test_begin_only_from_not_listening() {
        let mut session = CaptureSession::new(CaptureTarget::Hotkey);
        assert_eq!(session.state(), CaptureState::Idle);
        assert!(session.begin());
        assert!(!session.begin());
        assert!(session.is_listening());
    }

    #[test]
    fn test_hotkey_canonical_in_any_order() {
        let orders = [
            [ctrl(), shift(), RawKey::Char('a')],
            [RawKey::Char('A'), shift(), ctrl()],
            [shift(), RawKey::Char('a'), ctrl()],
        ];
        for order in orders {
            let mut session = CaptureSession::new(CaptureTarget::Hotkey);
            session.begin();
            for raw in order {
                session.key_down(raw);
            }
            assert_eq!(session.live_display(), "CTRL+SHIFT+A");
            let result = session.confirm().unwrap();
            assert_eq!(result.canonical(), "ctrl+shift+a");
        }
    }

    #[test]
    fn test_release_does_not_shrink_display() {
        let mut session = CaptureSession::new(CaptureTarget::Hotkey);
        session.begin();
        session.key_down(ctrl());
        session.key_down(RawKey::Named(NamedKey::F6));
        session.key_up(ctrl());
        session.key_up(RawKey::Named(NamedKey::F6));
        assert_eq!(session.live_display(), "CTRL+F6");
        assert!(session.held().is_empty());
    }

    #[test]
    fn test_key_down_reports_only_changes() {
        let mut session = CaptureSession::new(CaptureTarget::Hotkey);
        session.begin();
        assert_eq!(session.key_down(ctrl()), Some("CTRL".to_string()));
        assert_eq!(session.key_down(ctrl()), None);
        assert_eq!(session.key_down(RawKey::Unknown(7)), None);
    }

    #[test]
    fn test_confirm_empty_stays_listening() {
        let mut session = CaptureSession::new(CaptureTarget::Hotkey);
        session.begin();
        assert_eq!(session.live_display(), PLACEHOLDER);
        assert!(matches!(
            session.confirm(),
            Err(AutoclickError::EmptyCapture {
                target: CaptureTarget::Hotkey
            })
        ));
        assert!(session.is_listening());
    }

    #[test]
    fn test_hotkey_display_shows_every_key_pressed() {
        let mut session = CaptureSession::new(CaptureTarget::Hotkey);
        session.begin();
        session.key_down(RawKey::Char('a'));
        session.key_down(ctrl());
        assert_eq!(session.key_down(RawKey::Char('b')), Some("CTRL+A+B".to_string()));
        // A re-press moves the key to the end.
        assert_eq!(session.key_down(RawKey::Char('a')), Some("CTRL+B+A".to_string()));
    }

    #[test]
    fn test_confirm_two_keys_stays_listening() {
        let mut session = CaptureSession::new(CaptureTarget::Hotkey);
        session.begin();
        session.key_down(ctrl());
        session.key_down(RawKey::Char('a'));
        session.key_down(RawKey::Char('b'));

        let err = session.confirm().unwrap_err();
        assert!(matches!(err, AutoclickError::InvalidCombo { ref combo, .. } if combo == "ctrl+a+b"));
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(session.is_listening());
        assert_eq!(session.live_display(), "CTRL+A+B");
    }

    #[test]
    fn test_confirm_freezes_session() {
        let mut session = CaptureSession::new(CaptureTarget::Hotkey);
        session.begin();
        session.key_down(RawKey::Named(NamedKey::F8));
        assert!(session.confirm().is_ok());
        assert_eq!(session.state(), CaptureState::Confirmed);

        assert_eq!(session.key_down(RawKey::Char('q')), None);
        assert_eq!(session.live_display(), "F8");
        assert!(matches!(
            session.confirm(),
            Err(AutoclickError::NotCapturing { .. })
        ));
    }

    #[test]
    fn test_target_key_prefers_latest_non_modifier() {
        let mut session = CaptureSession::new(CaptureTarget::TargetKey);
        session.begin();
        session.key_down(RawKey::Char('x'));
        session.key_down(shift());
        assert_eq!(session.live_display(), "X");
        session.key_down(RawKey::Named(NamedKey::Space));
        assert_eq!(session.live_display(), "SPACE");
        assert_eq!(
            session.confirm().unwrap(),
            CaptureResult::TargetKey(KeyIdentity::Named(NamedKey::Space))
        );
    }

    #[test]
    fn test_target_key_falls_back_to_modifier() {
        let mut session = CaptureSession::new(CaptureTarget::TargetKey);
        session.begin();
        session.key_down(ctrl());
        session.key_down(shift());
        assert_eq!(session.live_display(), "SHIFT");
        assert_eq!(
            session.confirm().unwrap(),
            CaptureResult::TargetKey(KeyIdentity::Named(NamedKey::Shift))
        );
    }

    #[test]
    fn test_cancel() {
        let mut session = CaptureSession::new(CaptureTarget::TargetKey);
        assert!(!session.cancel());
        session.begin();
        assert!(session.cancel());
        assert_eq!(session.state(), CaptureState::Cancelled);
        assert!(session.begin());
        assert_eq!(session.live_display(), PLACEHOLDER);
    }

    #[test]
    fn test_listener_subscribes_until_confirmed() {
        let bus = KeyBus::new();
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        let mut listener = CaptureListener::start(&bus, CaptureTarget::Hotkey, move |_, display| {
            sink.lock().push(display);
        });
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(&KeyEvent::Down(ctrl()));
        bus.publish(&KeyEvent::Down(RawKey::Char('k')));
        assert_eq!(*updates.lock(), vec!["CTRL".to_string(), "CTRL+K".to_string()]);

        let result = listener.confirm().unwrap();
        assert_eq!(result.canonical(), "ctrl+k");
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(&KeyEvent::Down(RawKey::Char('z')));
        assert_eq!(updates.lock().len(), 2);
    }

    #[test]
    fn test_listener_drop_unsubscribes() {
        let bus = KeyBus::new();
        {
            let _listener = CaptureListener::start(&bus, CaptureTarget::TargetKey, |_, _| {});
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }
}
