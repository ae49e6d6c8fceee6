//! Global key listener built on rdev.
//!
//! rdev::listen blocks for the life of the process, so it gets its own thread
//! and forwards every key-down and key-up into the KeyBus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use rdev::{listen, Event, EventType, Key};
use tracing::{debug, error, info};

use crate::bus::{KeyBus, KeyEvent};
use crate::key::{Modifier, NamedKey, RawKey, Side};

// Codes for rdev keys that have no named counterpart. Kept above the range
// rdev reports in Key::Unknown.
const UNMODELLED_BASE: u32 = 0x0001_0000;

/// Handle to the listener thread.
pub struct KeyListener {
    running: Arc<AtomicBool>,
    _handle: JoinHandle<()>,
}

impl KeyListener {
    /// Start listening and publish every key event to `bus`.
    pub fn spawn(bus: KeyBus) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("key-listener".to_string())
            .spawn(move || {
                info!("key listener started");
                let callback = move |event: Event| {
                    if let Some(key_event) = key_event(&event) {
                        debug!(?key_event, "key");
                        bus.publish(&key_event);
                    }
                };

                // Only returns on failure.
                if let Err(err) = listen(callback) {
                    error!(?err, "key listener stopped");
                }
                thread_running.store(false, Ordering::SeqCst);
            })
            .context("failed to spawn key listener thread")?;

        Ok(Self {
            running,
            _handle: handle,
        })
    }

    /// False once rdev has given up, e.g. when the OS denied access.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn key_event(event: &Event) -> Option<KeyEvent> {
    match event.event_type {
        EventType::KeyPress(key) => Some(KeyEvent::Down(raw_key(key))),
        EventType::KeyRelease(key) => Some(KeyEvent::Up(raw_key(key))),
        _ => None,
    }
}

/// Map an rdev key to the engine's raw key. Letters map to lowercase
/// characters and the number row to digits, following a US layout.
pub fn raw_key(key: Key) -> RawKey {
    let named = |named| RawKey::Named(named);
    let modifier = |modifier, side| RawKey::Modifier(modifier, side);

    match key {
        Key::ControlLeft => modifier(Modifier::Ctrl, Side::Left),
        Key::ControlRight => modifier(Modifier::Ctrl, Side::Right),
        Key::ShiftLeft => modifier(Modifier::Shift, Side::Left),
        Key::ShiftRight => modifier(Modifier::Shift, Side::Right),
        Key::Alt => modifier(Modifier::Alt, Side::Left),
        Key::AltGr => modifier(Modifier::Alt, Side::Right),
        Key::MetaLeft => modifier(Modifier::Cmd, Side::Left),
        Key::MetaRight => modifier(Modifier::Cmd, Side::Right),

        Key::Space => named(NamedKey::Space),
        Key::Return | Key::KpReturn => named(NamedKey::Enter),
        Key::Backspace => named(NamedKey::Backspace),
        Key::Tab => named(NamedKey::Tab),
        Key::Escape => named(NamedKey::Esc),
        Key::UpArrow => named(NamedKey::Up),
        Key::DownArrow => named(NamedKey::Down),
        Key::LeftArrow => named(NamedKey::Left),
        Key::RightArrow => named(NamedKey::Right),
        Key::Delete | Key::KpDelete => named(NamedKey::Delete),
        Key::Home => named(NamedKey::Home),
        Key::End => named(NamedKey::End),
        Key::PageUp => named(NamedKey::PageUp),
        Key::PageDown => named(NamedKey::PageDown),
        Key::F1 => named(NamedKey::F1),
        Key::F2 => named(NamedKey::F2),
        Key::F3 => named(NamedKey::F3),
        Key::F4 => named(NamedKey::F4),
        Key::F5 => named(NamedKey::F5),
        Key::F6 => named(NamedKey::F6),
        Key::F7 => named(NamedKey::F7),
        Key::F8 => named(NamedKey::F8),
        Key::F9 => named(NamedKey::F9),
        Key::F10 => named(NamedKey::F10),
        Key::F11 => named(NamedKey::F11),
        Key::F12 => named(NamedKey::F12),

        Key::KeyA => RawKey::Char('a'),
        Key::KeyB => RawKey::Char('b'),
        Key::KeyC => RawKey::Char('c'),
        Key::KeyD => RawKey::Char('d'),
        Key::KeyE => RawKey::Char('e'),
        Key::KeyF => RawKey::Char('f'),
        Key::KeyG => RawKey::Char('g'),
        Key::KeyH => RawKey::Char('h'),
        Key::KeyI => RawKey::Char('i'),
        Key::KeyJ => RawKey::Char('j'),
        Key::KeyK => RawKey::Char('k'),
        Key::KeyL => RawKey::Char('l'),
        Key::KeyM => RawKey::Char('m'),
        Key::KeyN => RawKey::Char('n'),
        Key::KeyO => RawKey::Char('o'),
        Key::KeyP => RawKey::Char('p'),
        Key::KeyQ => RawKey::Char('q'),
        Key::KeyR => RawKey::Char('r'),
        Key::KeyS => RawKey::Char('s'),
        Key::KeyT => RawKey::Char('t'),
        Key::KeyU => RawKey::Char('u'),
        Key::KeyV => RawKey::Char('v'),
        Key::KeyW => RawKey::Char('w'),
        Key::KeyX => RawKey::Char('x'),
        Key::KeyY => RawKey::Char('y'),
        Key::KeyZ => RawKey::Char('z'),

        Key::Num0 | Key::Kp0 => RawKey::Char('0'),
        Key::Num1 | Key::Kp1 => RawKey::Char('1'),
        Key::Num2 | Key::Kp2 => RawKey::Char('2'),
        Key::Num3 | Key::Kp3 => RawKey::Char('3'),
        Key::Num4 | Key::Kp4 => RawKey::Char('4'),
        Key::Num5 | Key::Kp5 => RawKey::Char('5'),
        Key::Num6 | Key::Kp6 => RawKey::Char('6'),
        Key::Num7 | Key::Kp7 => RawKey::Char('7'),
        Key::Num8 | Key::Kp8 => RawKey::Char('8'),
        Key::Num9 | Key::Kp9 => RawKey::Char('9'),

        Key::BackQuote => RawKey::Char('`'),
        Key::Minus | Key::KpMinus => RawKey::Char('-'),
        Key::Equal => RawKey::Char('='),
        Key::KpPlus => RawKey::Char('+'),
        Key::KpMultiply => RawKey::Char('*'),
        Key::KpDivide | Key::Slash => RawKey::Char('/'),
        Key::LeftBracket => RawKey::Char('['),
        Key::RightBracket => RawKey::Char(']'),
        Key::SemiColon => RawKey::Char(';'),
        Key::Quote => RawKey::Char('\''),
        Key::BackSlash | Key::IntlBackslash => RawKey::Char('\\'),
        Key::Comma => RawKey::Char(','),
        Key::Dot => RawKey::Char('.'),

        Key::CapsLock => RawKey::Unknown(UNMODELLED_BASE + 1),
        Key::PrintScreen => RawKey::Unknown(UNMODELLED_BASE + 2),
        Key::ScrollLock => RawKey::Unknown(UNMODELLED_BASE + 3),
        Key::Pause => RawKey::Unknown(UNMODELLED_BASE + 4),
        Key::NumLock => RawKey::Unknown(UNMODELLED_BASE + 5),
        Key::Insert => RawKey::Unknown(UNMODELLED_BASE + 6),
        Key::Function => RawKey::Unknown(UNMODELLED_BASE + 7),
        Key::Unknown(code) => RawKey::Unknown(code),
    }
}
