//! Click interval, action mode and hotkey configuration.
//!
//! Everything lives in memory; the engine starts from [`Configuration::default`]
//! or from command-line overrides and is edited through the controller.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combo::ComboSpec;
use crate::error::{AutoclickError, Result};
use crate::key::{KeyIdentity, NamedKey};

/// Shortest interval the action loop will ever sleep.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Time between two actions, kept as the four fields the user edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub millis: u32,
}

impl Default for Interval {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            seconds: 1,
            millis: 0,
        }
    }
}

impl Interval {
    /// Build an interval, checking every field against its range.
    pub fn new(hours: i64, minutes: i64, seconds: i64, millis: i64) -> Result<Self> {
        Ok(Self {
            hours: check_range("hours", hours, 23)?,
            minutes: check_range("minutes", minutes, 59)?,
            seconds: check_range("seconds", seconds, 59)?,
            millis: check_range("milliseconds", millis, 999)?,
        })
    }

    /// Build an interval from the raw text of the four input fields.
    pub fn from_fields(hours: &str, minutes: &str, seconds: &str, millis: &str) -> Result<Self> {
        Self::new(
            parse_field("hours", hours)?,
            parse_field("minutes", minutes)?,
            parse_field("seconds", seconds)?,
            parse_field("milliseconds", millis)?,
        )
    }

    fn total_millis(&self) -> u64 {
        u64::from(self.hours) * 3_600_000
            + u64::from(self.minutes) * 60_000
            + u64::from(self.seconds) * 1_000
            + u64::from(self.millis)
    }

    /// Interval in seconds, never below 0.001.
    pub fn as_secs_f64(&self) -> f64 {
        self.duration().as_secs_f64()
    }

    /// Interval as a duration, never below [`MIN_INTERVAL`].
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.total_millis()).max(MIN_INTERVAL)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}h {}m {}s {}ms",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AutoclickError::invalid_interval(field, value, "not a whole number"))
}

fn check_range(field: &'static str, value: i64, max: u32) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| {
            AutoclickError::invalid_interval(
                field,
                value.to_string(),
                format!("must be between 0 and {max}"),
            )
        })
}

/// Mouse button to click in mouse mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Right => write!(f, "right"),
        }
    }
}

impl FromStr for MouseButton {
    type Err = AutoclickError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            _ => Err(AutoclickError::invalid_command(format!(
                "unknown mouse button '{s}', expected left or right"
            ))),
        }
    }
}

/// Whether the loop clicks the mouse or presses a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMode {
    #[default]
    Mouse,
    Keyboard,
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionMode::Mouse => write!(f, "mouse"),
            ActionMode::Keyboard => write!(f, "keyboard"),
        }
    }
}

impl FromStr for ActionMode {
    type Err = AutoclickError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mouse" => Ok(ActionMode::Mouse),
            "keyboard" | "key" => Ok(ActionMode::Keyboard),
            _ => Err(AutoclickError::invalid_command(format!(
                "unknown mode '{s}', expected mouse or keyboard"
            ))),
        }
    }
}

/// One resolved action, ready for the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Click(MouseButton),
    Press(KeyIdentity),
}

/// Everything the engine needs to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub interval: Interval,
    pub mode: ActionMode,
    pub button: MouseButton,
    /// Key pressed in keyboard mode; `None` when never set.
    pub target_key: Option<KeyIdentity>,
    pub hotkey: ComboSpec,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            interval: Interval::default(),
            mode: ActionMode::Mouse,
            button: MouseButton::Left,
            target_key: Some(KeyIdentity::Character('a')),
            hotkey: ComboSpec::single(KeyIdentity::Named(NamedKey::F6)),
        }
    }
}

impl Configuration {
    /// Resolve the action to dispatch for the current mode.
    ///
    /// Fails with [`AutoclickError::UnresolvableKey`] in keyboard mode when
    /// the target key is missing or cannot be synthesized.
    pub fn action(&self) -> Result<Action> {
        match self.mode {
            ActionMode::Mouse => Ok(Action::Click(self.button)),
            ActionMode::Keyboard => match self.target_key {
                Some(key) if key.is_injectable() => Ok(Action::Press(key)),
                Some(key) => Err(AutoclickError::unresolvable_key(key.canonical())),
                None => Err(AutoclickError::unresolvable_key("")),
            },
        }
    }

    /// One-line description for status output.
    pub fn summary(&self) -> String {
        let action = match self.mode {
            ActionMode::Mouse => format!("{} click", self.button),
            ActionMode::Keyboard => match &self.target_key {
                Some(key) => format!("press {}", key.display().to_uppercase()),
                None => "press <unset>".to_string(),
            },
        };
        format!(
            "{action} every {}, hotkey {}",
            self.interval,
            self.hotkey.display()
        )
    }
}
