//! Custom error types for autoclick.
//!
//! Every rejected operation in the engine returns one of these, so callers
//! always get an observable reason rather than a silent no-op.

use std::io;
use thiserror::Error;

use crate::capture::CaptureTarget;

/// Main error type for autoclick operations.
#[derive(Error, Debug)]
pub enum AutoclickError {
    /// An interval field was non-numeric or out of range.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidInterval {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The specified key is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Error parsing a key combination.
    #[error("invalid key combination '{combo}': {reason}")]
    InvalidCombo { combo: String, reason: String },

    /// Confirm was requested before any key was pressed.
    #[error("no {target} captured yet, press a key before confirming")]
    EmptyCapture { target: CaptureTarget },

    /// Confirm or cancel was requested with no matching capture in progress.
    #[error("not capturing a {target}")]
    NotCapturing { target: CaptureTarget },

    /// Toggle attempted while the start/stop hotkey is unconfirmed.
    #[error("please confirm your start/stop hotkey before starting")]
    HotkeyUnconfirmed,

    /// Toggle attempted in keyboard mode while the target key is unconfirmed.
    #[error("please confirm the keyboard key to press before starting")]
    TargetKeyUnconfirmed,

    /// The configured keyboard key cannot be synthesized.
    #[error("cannot press key '{key}': not an injectable key")]
    UnresolvableKey { key: String },

    /// The actuator failed to perform a click or key press.
    #[error("actuator error: {0}")]
    Actuator(String),

    /// The global key listener failed.
    #[error("key listener error: {0}")]
    Listener(String),

    /// A console command could not be parsed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`AutoclickError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input; the operation was rejected and nothing changed.
    Validation,
    /// The engine is not configured enough to perform the operation.
    Precondition,
    /// The configured key cannot be injected; the current run stops.
    Resolution,
    /// The OS-level input layer failed.
    Platform,
}

/// Result type alias for autoclick operations.
pub type Result<T> = std::result::Result<T, AutoclickError>;

impl AutoclickError {
    /// Create a new InvalidInterval error.
    pub fn invalid_interval(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInterval {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidKey error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidCombo error.
    pub fn invalid_combo(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCombo {
            combo: combo.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnresolvableKey error.
    pub fn unresolvable_key(key: impl Into<String>) -> Self {
        Self::UnresolvableKey { key: key.into() }
    }

    /// Create a new Actuator error.
    pub fn actuator(message: impl Into<String>) -> Self {
        Self::Actuator(message.into())
    }

    /// Create a new Listener error.
    pub fn listener(message: impl Into<String>) -> Self {
        Self::Listener(message.into())
    }

    /// Create a new InvalidCommand error.
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInterval { .. }
            | Self::InvalidKey { .. }
            | Self::InvalidCombo { .. }
            | Self::EmptyCapture { .. }
            | Self::InvalidCommand(_) => ErrorKind::Validation,
            Self::NotCapturing { .. } | Self::HotkeyUnconfirmed | Self::TargetKeyUnconfirmed => {
                ErrorKind::Precondition
            }
            Self::UnresolvableKey { .. } => ErrorKind::Resolution,
            Self::Actuator(_) | Self::Listener(_) | Self::Io(_) | Self::Json(_) => {
                ErrorKind::Platform
            }
        }
    }
}
