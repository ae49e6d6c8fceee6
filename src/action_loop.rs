//! The repeating action scheduler.
//!
//! A run is one tokio task that dispatches the configured action, sleeps for
//! the configured interval, and repeats until it is told to stop. Stopping
//! is cooperative: the task wakes from its sleep as soon as the stop signal
//! arrives and never dispatches again afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Action, Configuration, MouseButton};
use crate::error::{AutoclickError, Result};
use crate::events::StatusEvent;
use crate::key::KeyIdentity;

/// Performs the physical click or key press.
pub trait Actuator: Send {
    fn click(&mut self, button: MouseButton) -> Result<()>;
    fn press(&mut self, key: &KeyIdentity) -> Result<()>;
    fn release(&mut self, key: &KeyIdentity) -> Result<()>;
}

pub type SharedActuator = Arc<Mutex<dyn Actuator>>;

struct Run {
    stop_tx: watch::Sender<bool>,
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Owner of at most one running action task.
#[derive(Default)]
pub struct ActionLoop {
    run: Option<Run>,
}

impl ActionLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// True from `start` until `stop` or until the run ends on its own.
    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| run.active.load(Ordering::SeqCst))
    }

    /// Spawn the action task. Returns false, doing nothing, if a run is
    /// already active.
    ///
    /// The configuration is read again at the top of every iteration.
    pub fn start(
        &mut self,
        runtime: &Handle,
        config: Arc<Mutex<Configuration>>,
        actuator: SharedActuator,
        events: broadcast::Sender<StatusEvent>,
    ) -> bool {
        if self.is_running() {
            debug!("action loop already running, start ignored");
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let active = Arc::new(AtomicBool::new(true));
        let task = runtime.spawn(run_actions(
            config,
            actuator,
            events,
            stop_rx,
            Arc::clone(&active),
        ));

        self.run = Some(Run {
            stop_tx,
            active,
            task,
        });
        true
    }

    /// Signal the current run to stop. Returns the task handle so callers
    /// can wait for it to finish; dropping the handle is fine.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        let run = self.run.take()?;
        run.active.store(false, Ordering::SeqCst);
        run.stop_tx.send_replace(true);
        Some(run.task)
    }
}

impl Drop for ActionLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn dispatch(actuator: &SharedActuator, action: Action) -> Result<()> {
    let mut actuator = actuator.lock();
    match action {
        Action::Click(button) => actuator.click(button),
        Action::Press(key) => {
            actuator.press(&key)?;
            actuator.release(&key)
        }
    }
}

/// Run the actuator on the blocking pool; it may wait on the OS.
async fn dispatch_blocking(actuator: &SharedActuator, action: Action) -> Result<()> {
    let actuator = Arc::clone(actuator);
    tokio::task::spawn_blocking(move || dispatch(&actuator, action))
        .await
        .map_err(|err| AutoclickError::actuator(format!("dispatch task failed: {err}")))?
}

async fn run_actions(
    config: Arc<Mutex<Configuration>>,
    actuator: SharedActuator,
    events: broadcast::Sender<StatusEvent>,
    mut stop_rx: watch::Receiver<bool>,
    active: Arc<AtomicBool>,
) {
    info!("action loop started");
    let mut dispatched: u64 = 0;

    loop {
        if *stop_rx.borrow() {
            break;
        }

        let (action, interval) = {
            let config = config.lock();
            (config.action(), config.interval.duration())
        };

        let outcome = match action {
            Ok(action) => dispatch_blocking(&actuator, action).await,
            Err(err) => Err(err),
        };
        if let Err(err) = outcome {
            warn!(%err, dispatched, "action loop stopping on error");
            active.store(false, Ordering::SeqCst);
            let event = match err {
                AutoclickError::UnresolvableKey { key } => StatusEvent::ResolutionFailed { key },
                other => StatusEvent::ActionFailed {
                    reason: other.to_string(),
                },
            };
            let _ = events.send(event);
            return;
        }
        dispatched += 1;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    active.store(false, Ordering::SeqCst);
    info!(dispatched, "action loop stopped");
}
