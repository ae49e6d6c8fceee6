//! The single entry point for the presentation layer.
//!
//! All toggles, whether from a button or from the global hotkey, pass
//! through [`Controller::toggle`] under one lock, so run-state transitions
//! never interleave.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::action_loop::{ActionLoop, SharedActuator};
use crate::bus::KeyBus;
use crate::capture::{CaptureListener, CaptureResult, CaptureTarget};
use crate::config::{ActionMode, Configuration, Interval, MouseButton};
use crate::error::{AutoclickError, ErrorKind, Result};
use crate::events::StatusEvent;
use crate::watcher::HotkeyWatcher;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
        }
    }
}

/// Where a toggle request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleSource {
    /// A button or command in the front end.
    User,
    /// The global hotkey watcher.
    Hotkey,
}

struct Inner {
    action_loop: ActionLoop,
    capture: Option<CaptureListener>,
}

impl Inner {
    fn listening_target(&self) -> Option<CaptureTarget> {
        self.capture
            .as_ref()
            .filter(|capture| capture.is_listening())
            .map(CaptureListener::target)
    }
}

pub struct Controller {
    config: Arc<Mutex<Configuration>>,
    inner: Mutex<Inner>,
    bus: KeyBus,
    actuator: SharedActuator,
    runtime: Handle,
    events: broadcast::Sender<StatusEvent>,
    _watcher: HotkeyWatcher,
}

impl Controller {
    /// Build the controller and start its hotkey watcher on `bus`.
    ///
    /// Action runs are spawned on `runtime`; toggles may come from any thread.
    pub fn new(
        config: Configuration,
        bus: KeyBus,
        actuator: SharedActuator,
        runtime: Handle,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let config = Arc::new(Mutex::new(config));

        Arc::new_cyclic(|weak: &Weak<Controller>| {
            let weak = weak.clone();
            let hotkey_config = Arc::clone(&config);
            let watcher = HotkeyWatcher::start(
                &bus,
                move || hotkey_config.lock().hotkey.clone(),
                move || {
                    if let Some(controller) = weak.upgrade() {
                        controller.hotkey_pressed();
                    }
                },
            );

            Self {
                config,
                inner: Mutex::new(Inner {
                    action_loop: ActionLoop::new(),
                    capture: None,
                }),
                bus,
                actuator,
                runtime,
                events,
                _watcher: watcher,
            }
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    pub fn configuration(&self) -> Configuration {
        self.config.lock().clone()
    }

    pub fn run_state(&self) -> RunState {
        if self.inner.lock().action_loop.is_running() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Target of the capture session currently listening, if any.
    pub fn capturing(&self) -> Option<CaptureTarget> {
        self.inner.lock().listening_target()
    }

    /// Live text of the listening capture session.
    pub fn capture_display(&self) -> Option<String> {
        let inner = self.inner.lock();
        inner
            .capture
            .as_ref()
            .filter(|capture| capture.is_listening())
            .map(CaptureListener::live_display)
    }

    pub fn is_hotkey_confirmed(&self) -> bool {
        self.capturing() != Some(CaptureTarget::Hotkey)
    }

    pub fn is_target_key_confirmed(&self) -> bool {
        self.capturing() != Some(CaptureTarget::TargetKey)
    }

    fn emit(&self, event: StatusEvent) {
        debug!(%event, "status");
        let _ = self.events.send(event);
    }

    /// Emit the status event for `err` and hand it back to the caller.
    fn fail<T>(&self, err: AutoclickError) -> Result<T> {
        warn!(%err, "operation rejected");
        let event = match err.kind() {
            ErrorKind::Validation => StatusEvent::ValidationFailed {
                message: err.to_string(),
            },
            _ => StatusEvent::Rejected {
                reason: err.to_string(),
            },
        };
        self.emit(event);
        Err(err)
    }

    /// Flip between idle and running.
    pub fn toggle(&self) -> Result<RunState> {
        self.toggle_from(ToggleSource::User)
    }

    fn hotkey_pressed(&self) {
        // Errors were already emitted as status events.
        let _ = self.toggle_from(ToggleSource::Hotkey);
    }

    pub fn toggle_from(&self, source: ToggleSource) -> Result<RunState> {
        let mut inner = self.inner.lock();
        let listening = inner.listening_target();

        if source == ToggleSource::Hotkey && listening.is_some() {
            debug!("hotkey ignored while capturing");
            return Ok(if inner.action_loop.is_running() {
                RunState::Running
            } else {
                RunState::Idle
            });
        }

        if listening == Some(CaptureTarget::Hotkey) {
            return self.fail(AutoclickError::HotkeyUnconfirmed);
        }
        let mode = self.config.lock().mode;
        if mode == ActionMode::Keyboard && listening == Some(CaptureTarget::TargetKey) {
            return self.fail(AutoclickError::TargetKeyUnconfirmed);
        }

        if inner.action_loop.is_running() {
            inner.action_loop.stop();
            info!(?source, "stopped");
            self.emit(StatusEvent::Stopped);
            Ok(RunState::Idle)
        } else {
            info!(?source, config = %self.config.lock().summary(), "starting");
            self.emit(StatusEvent::Started);
            inner.action_loop.start(
                &self.runtime,
                Arc::clone(&self.config),
                Arc::clone(&self.actuator),
                self.events.clone(),
            );
            Ok(RunState::Running)
        }
    }

    /// Start listening for `target`. Returns false if a session for the
    /// same target is already listening; a session for the other target
    /// is cancelled and replaced.
    pub fn begin_capture(&self, target: CaptureTarget) -> bool {
        let mut inner = self.inner.lock();
        match inner.listening_target() {
            Some(current) if current == target => return false,
            Some(current) => {
                if let Some(mut old) = inner.capture.take() {
                    old.cancel();
                }
                self.emit(StatusEvent::CaptureCancelled { target: current });
            }
            None => {}
        }

        let events = self.events.clone();
        let listener = CaptureListener::start(&self.bus, target, move |target, display| {
            let _ = events.send(StatusEvent::CaptureUpdated { target, display });
        });
        inner.capture = Some(listener);

        info!(%target, "capture started");
        self.emit(StatusEvent::CaptureStarted { target });
        true
    }

    pub fn begin_capture_hotkey(&self) -> bool {
        self.begin_capture(CaptureTarget::Hotkey)
    }

    pub fn begin_capture_key(&self) -> bool {
        self.begin_capture(CaptureTarget::TargetKey)
    }

    /// Confirm the listening session for `target` and store its value.
    /// An empty capture is rejected and the session keeps listening.
    pub fn confirm_capture(&self, target: CaptureTarget) -> Result<CaptureResult> {
        let mut inner = self.inner.lock();
        if inner.listening_target() != Some(target) {
            return self.fail(AutoclickError::NotCapturing { target });
        }
        let Some(listener) = inner.capture.as_mut() else {
            return self.fail(AutoclickError::NotCapturing { target });
        };

        let result = match listener.confirm() {
            Ok(result) => result,
            Err(err) => return self.fail(err),
        };
        inner.capture = None;

        {
            let mut config = self.config.lock();
            match &result {
                CaptureResult::Hotkey(spec) => config.hotkey = spec.clone(),
                CaptureResult::TargetKey(key) => config.target_key = Some(*key),
            }
        }

        let value = result.canonical();
        info!(%target, %value, "capture confirmed");
        self.emit(StatusEvent::CaptureConfirmed { target, value });
        Ok(result)
    }

    pub fn confirm_capture_hotkey(&self) -> Result<CaptureResult> {
        self.confirm_capture(CaptureTarget::Hotkey)
    }

    pub fn confirm_capture_key(&self) -> Result<CaptureResult> {
        self.confirm_capture(CaptureTarget::TargetKey)
    }

    /// Abandon the listening session, keeping the previous value.
    pub fn cancel_capture(&self) -> Option<CaptureTarget> {
        let mut inner = self.inner.lock();
        let target = inner.listening_target()?;
        if let Some(mut listener) = inner.capture.take() {
            listener.cancel();
        }
        info!(%target, "capture cancelled");
        self.emit(StatusEvent::CaptureCancelled { target });
        Some(target)
    }

    /// Replace the interval from raw field text. Invalid input leaves the
    /// configuration untouched.
    pub fn set_interval_fields(
        &self,
        hours: &str,
        minutes: &str,
        seconds: &str,
        millis: &str,
    ) -> Result<Interval> {
        match Interval::from_fields(hours, minutes, seconds, millis) {
            Ok(interval) => {
                self.set_interval(interval);
                Ok(interval)
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn set_interval(&self, interval: Interval) {
        self.update_config(|config| config.interval = interval);
    }

    pub fn set_mode(&self, mode: ActionMode) {
        self.update_config(|config| config.mode = mode);
    }

    pub fn set_button(&self, button: MouseButton) {
        self.update_config(|config| config.button = button);
    }

    fn update_config(&self, apply: impl FnOnce(&mut Configuration)) {
        let summary = {
            let mut config = self.config.lock();
            apply(&mut config);
            config.summary()
        };
        info!(%summary, "configuration changed");
        self.emit(StatusEvent::ConfigChanged { summary });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_loop::Actuator;
    use crate::bus::KeyEvent;
    use crate::key::{KeyIdentity, Modifier, NamedKey, RawKey, Side};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingActuator {
        clicks: Arc<Mutex<usize>>,
    }

    impl Actuator for CountingActuator {
        fn click(&mut self, _button: MouseButton) -> Result<()> {
            *self.clicks.lock() += 1;
            Ok(())
        }

        fn press(&mut self, _key: &KeyIdentity) -> Result<()> {
            Ok(())
        }

        fn release(&mut self, _key: &KeyIdentity) -> Result<()> {
            Ok(())
        }
    }

    fn controller(config: Configuration) -> (Arc<Controller>, KeyBus, Arc<Mutex<usize>>) {
        let bus = KeyBus::new();
        let clicks = Arc::new(Mutex::new(0));
        let actuator: SharedActuator = Arc::new(Mutex::new(CountingActuator {
            clicks: Arc::clone(&clicks),
        }));
        let controller = Controller::new(config, bus.clone(), actuator, Handle::current());
        (controller, bus, clicks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_starts_and_stops() {
        let (controller, _bus, clicks) = controller(Configuration::default());
        let mut events = controller.subscribe();

        assert_eq!(controller.toggle().unwrap(), RunState::Running);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*clicks.lock(), 1);
        assert_eq!(controller.run_state(), RunState::Running);

        assert_eq!(controller.toggle().unwrap(), RunState::Idle);
        assert_eq!(events.try_recv().unwrap(), StatusEvent::Started);
        assert_eq!(events.try_recv().unwrap(), StatusEvent::Stopped);
    }

    #[tokio::test]
    async fn test_toggle_rejected_while_capturing_hotkey() {
        let (controller, _bus, _) = controller(Configuration::default());
        let mut events = controller.subscribe();

        assert!(controller.begin_capture_hotkey());
        assert!(!controller.is_hotkey_confirmed());
        assert!(matches!(
            controller.toggle(),
            Err(AutoclickError::HotkeyUnconfirmed)
        ));
        assert_eq!(controller.run_state(), RunState::Idle);

        assert!(matches!(
            events.try_recv().unwrap(),
            StatusEvent::CaptureStarted { .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            StatusEvent::Rejected { .. }
        ));
    }

    #[tokio::test]
    async fn test_target_key_capture_only_blocks_keyboard_mode() {
        let (controller, _bus, _) = controller(Configuration::default());
        controller.begin_capture_key();

        assert_eq!(controller.toggle().unwrap(), RunState::Running);
        assert_eq!(controller.toggle().unwrap(), RunState::Idle);

        controller.set_mode(ActionMode::Keyboard);
        assert!(matches!(
            controller.toggle(),
            Err(AutoclickError::TargetKeyUnconfirmed)
        ));
    }

    #[tokio::test]
    async fn test_capture_confirm_updates_hotkey() {
        let (controller, bus, _) = controller(Configuration::default());
        controller.begin_capture_hotkey();
        assert!(!controller.begin_capture_hotkey());

        bus.publish(&KeyEvent::Down(RawKey::Modifier(Modifier::Ctrl, Side::Left)));
        bus.publish(&KeyEvent::Down(RawKey::Named(NamedKey::F9)));
        assert_eq!(controller.capture_display().as_deref(), Some("CTRL+F9"));

        let result = controller.confirm_capture_hotkey().unwrap();
        assert_eq!(result.canonical(), "ctrl+f9");
        assert_eq!(controller.configuration().hotkey.canonical(), "ctrl+f9");
        assert!(controller.is_hotkey_confirmed());
        assert_eq!(controller.capturing(), None);
    }

    #[tokio::test]
    async fn test_empty_confirm_keeps_listening() {
        let (controller, _bus, _) = controller(Configuration::default());
        let mut events = controller.subscribe();
        controller.begin_capture_hotkey();

        assert!(matches!(
            controller.confirm_capture_hotkey(),
            Err(AutoclickError::EmptyCapture { .. })
        ));
        assert_eq!(controller.capturing(), Some(CaptureTarget::Hotkey));
        assert_eq!(controller.configuration().hotkey.canonical(), "f6");

        events.try_recv().unwrap();
        assert!(matches!(
            events.try_recv().unwrap(),
            StatusEvent::ValidationFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_two_key_hotkey_rejected_on_confirm() {
        let (controller, bus, _) = controller(Configuration::default());
        controller.begin_capture_hotkey();
        bus.publish(&KeyEvent::Down(RawKey::Char('a')));
        bus.publish(&KeyEvent::Down(RawKey::Char('b')));
        assert_eq!(controller.capture_display().as_deref(), Some("A+B"));
        let mut events = controller.subscribe();

        assert!(matches!(
            controller.confirm_capture_hotkey(),
            Err(AutoclickError::InvalidCombo { .. })
        ));
        assert_eq!(controller.capturing(), Some(CaptureTarget::Hotkey));
        assert_eq!(controller.configuration().hotkey.canonical(), "f6");
        assert!(matches!(
            events.try_recv().unwrap(),
            StatusEvent::ValidationFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_new_capture_replaces_other_target() {
        let (controller, bus, _) = controller(Configuration::default());
        controller.begin_capture_hotkey();
        controller.begin_capture_key();
        assert_eq!(controller.capturing(), Some(CaptureTarget::TargetKey));
        // Watcher plus the one live capture.
        assert_eq!(bus.subscriber_count(), 2);

        assert!(matches!(
            controller.confirm_capture_hotkey(),
            Err(AutoclickError::NotCapturing { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_keeps_previous_value() {
        let (controller, bus, _) = controller(Configuration::default());
        controller.begin_capture_key();
        bus.publish(&KeyEvent::Down(RawKey::Char('z')));

        assert_eq!(controller.cancel_capture(), Some(CaptureTarget::TargetKey));
        assert_eq!(controller.cancel_capture(), None);
        assert_eq!(
            controller.configuration().target_key,
            Some(KeyIdentity::Character('a'))
        );
    }

    #[tokio::test]
    async fn test_invalid_interval_leaves_config() {
        let (controller, _bus, _) = controller(Configuration::default());
        assert!(controller.set_interval_fields("0", "0", "abc", "0").is_err());
        assert!(controller.set_interval_fields("24", "0", "0", "0").is_err());
        assert_eq!(controller.configuration().interval, Interval::default());

        let interval = controller.set_interval_fields("0", "0", "0", "250").unwrap();
        assert_eq!(controller.configuration().interval, interval);
    }
}
