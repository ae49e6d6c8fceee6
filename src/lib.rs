//! # autoclick
//!
//! An autoclicker engine: repeats a mouse click or a key press at a fixed
//! interval, started and stopped by a global hotkey or by the front end.
//!
//! ## Features
//!
//! - Interval in hours, minutes, seconds and milliseconds (1 ms minimum)
//! - Mouse mode (left or right button) and keyboard mode (any injectable key)
//! - Start/stop hotkey combos such as `f6` or `ctrl+alt+r`, edge-triggered
//! - Interactive capture of the hotkey and of the key to repeat
//! - Status events on a broadcast channel, serializable as JSON
//!
//! The OS backends (rdev for listening, enigo for synthesis) live behind the
//! `platform` feature; everything else runs against any [`Actuator`] and any
//! source of [`KeyEvent`]s.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use autoclick::{Actuator, Configuration, Controller, KeyBus, KeyIdentity, MouseButton};
//!
//! struct Printer;
//!
//! impl Actuator for Printer {
//!     fn click(&mut self, button: MouseButton) -> autoclick::Result<()> {
//!         println!("click {button}");
//!         Ok(())
//!     }
//!     fn press(&mut self, key: &KeyIdentity) -> autoclick::Result<()> {
//!         println!("press {key}");
//!         Ok(())
//!     }
//!     fn release(&mut self, _key: &KeyIdentity) -> autoclick::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> autoclick::Result<()> {
//! let bus = KeyBus::new();
//! let controller = Controller::new(
//!     Configuration::default(),
//!     bus.clone(),
//!     Arc::new(Mutex::new(Printer)),
//!     tokio::runtime::Handle::current(),
//! );
//! controller.toggle()?;
//! # Ok(())
//! # }
//! ```

pub mod action_loop;
pub mod bus;
pub mod capture;
pub mod combo;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod events;
pub mod key;
#[cfg(feature = "platform")]
pub mod platform;
pub mod watcher;

pub use action_loop::{ActionLoop, Actuator, SharedActuator};
pub use bus::{KeyBus, KeyEvent, SubscriptionId};
pub use capture::{CaptureListener, CaptureResult, CaptureSession, CaptureState, CaptureTarget};
pub use combo::{is_satisfied, ComboSpec, HeldKeySet};
pub use config::{Action, ActionMode, Configuration, Interval, MouseButton};
pub use controller::{Controller, RunState, ToggleSource};
pub use error::{AutoclickError, ErrorKind, Result};
pub use events::StatusEvent;
pub use key::{KeyIdentity, Modifier, NamedKey, RawKey, Side};
pub use watcher::{HotkeyWatcher, WatcherState};
