//! Input synthesis built on enigo.
//!
//! The Enigo handle lives on its own thread; callers send requests over a
//! channel and block on the reply.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context};
use enigo::{Button, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use tracing::{debug, info};

use crate::action_loop::Actuator;
use crate::config::MouseButton;
use crate::error::{AutoclickError, Result};
use crate::key::{KeyIdentity, NamedKey};

#[derive(Debug, Clone, Copy)]
enum Request {
    Click(MouseButton),
    Press(KeyIdentity),
    Release(KeyIdentity),
}

struct Job {
    request: Request,
    reply: mpsc::Sender<Result<()>>,
}

pub struct EnigoActuator {
    jobs: mpsc::Sender<Job>,
    _thread: JoinHandle<()>,
}

impl EnigoActuator {
    /// Start the actuator thread and wait until enigo has connected.
    pub fn spawn() -> anyhow::Result<Self> {
        let (jobs, rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<(), String>>();

        let thread = thread::Builder::new()
            .name("actuator".to_string())
            .spawn(move || {
                let mut enigo = match Enigo::new(&Settings::default()) {
                    Ok(enigo) => {
                        let _ = ready_tx.send(Ok(()));
                        enigo
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };
                info!("actuator ready");

                for job in rx {
                    debug!(request = ?job.request, "actuate");
                    let _ = job.reply.send(perform(&mut enigo, job.request));
                }
            })
            .context("failed to spawn actuator thread")?;

        ready_rx
            .recv()
            .context("actuator thread exited during startup")?
            .map_err(|err| anyhow!("failed to initialize input synthesis: {err}"))?;

        Ok(Self {
            jobs,
            _thread: thread,
        })
    }

    fn request(&self, request: Request) -> Result<()> {
        let (reply, response) = mpsc::channel();
        self.jobs
            .send(Job { request, reply })
            .map_err(|_| AutoclickError::actuator("actuator thread has stopped"))?;
        response
            .recv()
            .map_err(|_| AutoclickError::actuator("actuator thread has stopped"))?
    }
}

impl Actuator for EnigoActuator {
    fn click(&mut self, button: MouseButton) -> Result<()> {
        self.request(Request::Click(button))
    }

    fn press(&mut self, key: &KeyIdentity) -> Result<()> {
        self.request(Request::Press(*key))
    }

    fn release(&mut self, key: &KeyIdentity) -> Result<()> {
        self.request(Request::Release(*key))
    }
}

fn perform(enigo: &mut Enigo, request: Request) -> Result<()> {
    let outcome = match request {
        Request::Click(button) => enigo.button(enigo_button(button), Direction::Click),
        Request::Press(key) => enigo.key(enigo_key(&key), Direction::Press),
        Request::Release(key) => enigo.key(enigo_key(&key), Direction::Release),
    };
    outcome.map_err(|err| AutoclickError::actuator(err.to_string()))
}

fn enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
    }
}

fn enigo_key(key: &KeyIdentity) -> Key {
    match key {
        KeyIdentity::Character(c) => Key::Unicode(*c),
        KeyIdentity::Named(named) => match named {
            NamedKey::Ctrl => Key::Control,
            NamedKey::Shift => Key::Shift,
            NamedKey::Alt => Key::Alt,
            NamedKey::Cmd => Key::Meta,
            NamedKey::Space => Key::Space,
            NamedKey::Enter => Key::Return,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Tab => Key::Tab,
            NamedKey::Esc => Key::Escape,
            NamedKey::Up => Key::UpArrow,
            NamedKey::Down => Key::DownArrow,
            NamedKey::Left => Key::LeftArrow,
            NamedKey::Right => Key::RightArrow,
            NamedKey::Delete => Key::Delete,
            NamedKey::Home => Key::Home,
            NamedKey::End => Key::End,
            NamedKey::PageUp => Key::PageUp,
            NamedKey::PageDown => Key::PageDown,
            NamedKey::F1 => Key::F1,
            NamedKey::F2 => Key::F2,
            NamedKey::F3 => Key::F3,
            NamedKey::F4 => Key::F4,
            NamedKey::F5 => Key::F5,
            NamedKey::F6 => Key::F6,
            NamedKey::F7 => Key::F7,
            NamedKey::F8 => Key::F8,
            NamedKey::F9 => Key::F9,
            NamedKey::F10 => Key::F10,
            NamedKey::F11 => Key::F11,
            NamedKey::F12 => Key::F12,
        },
    }
}
