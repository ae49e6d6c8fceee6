//! autoclick: repeat a mouse click or key press, toggled by a global hotkey.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use autoclick::console::{self, Reply};
use autoclick::platform::{EnigoActuator, KeyListener};
use autoclick::{
    ActionMode, AutoclickError, ComboSpec, Configuration, Controller, Interval, KeyBus,
    KeyIdentity, MouseButton, RunState, SharedActuator, StatusEvent,
};

#[derive(Parser, Debug)]
#[command(name = "autoclick")]
#[command(about = "Repeats mouse clicks or key presses at a fixed interval")]
#[command(version)]
struct Args {
    /// Hours between actions
    #[arg(long, default_value = "0")]
    hours: String,

    /// Minutes between actions
    #[arg(long, default_value = "0")]
    minutes: String,

    /// Seconds between actions
    #[arg(long, default_value = "1")]
    seconds: String,

    /// Milliseconds between actions
    #[arg(long, default_value = "0")]
    millis: String,

    /// What to repeat: mouse or keyboard
    #[arg(long, default_value = "mouse")]
    mode: ActionMode,

    /// Mouse button to click: left or right
    #[arg(long, default_value = "left")]
    button: MouseButton,

    /// Key to press in keyboard mode (e.g. "a", "space", "f5")
    #[arg(long, default_value = "a")]
    key: KeyIdentity,

    /// Start/stop hotkey (e.g. "f6", "ctrl+alt+r")
    #[arg(long, default_value = "f6")]
    hotkey: ComboSpec,

    /// Print status events as JSON lines
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn configuration(&self) -> Result<Configuration> {
        let interval = Interval::from_fields(&self.hours, &self.minutes, &self.seconds, &self.millis)
            .context("invalid interval")?;
        if self.hotkey.is_unset() {
            anyhow::bail!("the start/stop hotkey cannot be empty");
        }
        Ok(Configuration {
            interval,
            mode: self.mode,
            button: self.button,
            target_key: Some(self.key),
            hotkey: self.hotkey.clone(),
        })
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn print_event(event: &StatusEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    let line = event.to_string();
    let line = match event {
        _ if event.is_error() => line.red().bold(),
        StatusEvent::Started => line.green().bold(),
        StatusEvent::Stopped => line.yellow(),
        StatusEvent::CaptureStarted { .. }
        | StatusEvent::CaptureUpdated { .. }
        | StatusEvent::CaptureConfirmed { .. }
        | StatusEvent::CaptureCancelled { .. } => line.cyan(),
        _ => line.normal(),
    };
    println!("{line}");
    Ok(())
}

/// Run one console line. Returns true when the user asked to quit.
fn handle_line(controller: &Controller, line: &str) -> bool {
    let result = console::parse(line).and_then(|command| match command {
        Some(command) => console::apply(controller, command).map(Some),
        None => Ok(None),
    });

    match result {
        Ok(Some(Reply::Quit)) => return true,
        Ok(Some(Reply::Text(text))) => println!("{text}"),
        Ok(_) => {}
        Err(err @ AutoclickError::InvalidCommand(_)) => eprintln!("{}", err.to_string().red()),
        // Controller rejections arrive as status events.
        Err(err) => debug!(%err, "command rejected"),
    }
    false
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.configuration()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config.summary(),
        "autoclick starting"
    );

    let bus = KeyBus::new();
    let actuator: SharedActuator = Arc::new(Mutex::new(
        EnigoActuator::spawn().context("failed to start input synthesis")?,
    ));
    let controller = Controller::new(config, bus.clone(), actuator, Handle::current());
    let mut events = controller.subscribe();

    let mut listener = match KeyListener::spawn(bus) {
        Ok(listener) => Some(listener),
        Err(err) => {
            error!(?err, "failed to start key listener");
            warn!("continuing without the global hotkey, use 'toggle' instead");
            None
        }
    };

    println!("{}", "autoclick".bold());
    println!("{}", controller.configuration().summary());
    println!("Type 'help' for commands, Ctrl-C to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        if handle_line(&controller, &line) {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed, hotkey only");
                        stdin_open = false;
                    }
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, args.json)?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }

        if listener.as_ref().is_some_and(|l| !l.is_running()) {
            warn!("key listener stopped, the hotkey no longer works");
            listener = None;
        }
    }

    if controller.run_state() == RunState::Running {
        let _ = controller.toggle();
    }
    info!("autoclick stopped");
    Ok(())
}
