//! Status notifications for the presentation layer.
//!
//! The engine never renders anything itself. It broadcasts these events and
//! the front end decides how to show them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureTarget;

/// Events emitted by the controller and the action loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// The action loop started.
    Started,

    /// The action loop was stopped by a toggle.
    Stopped,

    /// An operation was refused because a precondition was not met.
    Rejected { reason: String },

    /// User input was invalid; nothing changed.
    ValidationFailed { message: String },

    /// The keyboard target cannot be injected; the run ended.
    ResolutionFailed { key: String },

    /// The actuator failed mid-run; the run ended.
    ActionFailed { reason: String },

    /// A capture session started listening.
    CaptureStarted { target: CaptureTarget },

    /// The live combo of a capture session changed.
    CaptureUpdated {
        target: CaptureTarget,
        display: String,
    },

    /// A capture session was confirmed and its value stored.
    CaptureConfirmed {
        target: CaptureTarget,
        value: String,
    },

    /// A capture session was abandoned.
    CaptureCancelled { target: CaptureTarget },

    /// Interval, mode or button changed.
    ConfigChanged { summary: String },
}

impl StatusEvent {
    /// Whether this event reports a failure or refusal.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StatusEvent::Rejected { .. }
                | StatusEvent::ValidationFailed { .. }
                | StatusEvent::ResolutionFailed { .. }
                | StatusEvent::ActionFailed { .. }
        )
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Started => write!(f, "Running... Press hotkey or button to stop."),
            StatusEvent::Stopped => write!(f, "Stopped."),
            StatusEvent::Rejected { reason } => write!(f, "{reason}"),
            StatusEvent::ValidationFailed { message } => write!(f, "{message}"),
            StatusEvent::ResolutionFailed { .. } => {
                write!(f, "Invalid keyboard key set. Stopping.")
            }
            StatusEvent::ActionFailed { reason } => write!(f, "Action failed: {reason}. Stopping."),
            StatusEvent::CaptureStarted { target } => match target {
                CaptureTarget::Hotkey => {
                    write!(f, "Press desired hotkey combination for start/stop...")
                }
                CaptureTarget::TargetKey => write!(f, "Press the key to repeat... Then confirm."),
            },
            StatusEvent::CaptureUpdated { display, .. } => write!(f, "{display}"),
            StatusEvent::CaptureConfirmed { target, value } => match target {
                CaptureTarget::Hotkey => {
                    write!(f, "Start/Stop Hotkey set to: {}", value.to_uppercase())
                }
                CaptureTarget::TargetKey => {
                    write!(f, "Key to press repeatedly set to: {}", value.to_uppercase())
                }
            },
            StatusEvent::CaptureCancelled { target } => write!(f, "Stopped listening for {target}."),
            StatusEvent::ConfigChanged { summary } => write!(f, "{summary}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = StatusEvent::CaptureConfirmed {
            target: CaptureTarget::Hotkey,
            value: "ctrl+f6".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"capture_confirmed\""));
        assert!(json.contains("\"target\":\"hotkey\""));
        assert!(json.contains("ctrl+f6"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"resolution_failed","key":""}"#;
        let event: StatusEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, StatusEvent::ResolutionFailed { .. }));
        assert!(event.is_error());
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            StatusEvent::Started.to_string(),
            "Running... Press hotkey or button to stop."
        );
        let event = StatusEvent::CaptureConfirmed {
            target: CaptureTarget::TargetKey,
            value: "a".to_string(),
        };
        assert_eq!(event.to_string(), "Key to press repeatedly set to: A");
    }
}
