//! Line-oriented front end for the controller.
//!
//! [`parse`] turns one input line into a [`Command`]; [`apply`] runs it.

use crate::capture::CaptureTarget;
use crate::config::{ActionMode, MouseButton};
use crate::controller::Controller;
use crate::error::{AutoclickError, Result};

pub const HELP: &str = "\
Commands:
  toggle, t              start or stop clicking
  hotkey                 record a new start/stop hotkey
  key                    record the key to press in keyboard mode
  confirm                keep the recorded hotkey or key
  cancel                 discard the recording
  interval H M S MS      set the interval, e.g. 'interval 0 0 0 250'
  mode mouse|keyboard    choose what to repeat
  button left|right      choose the mouse button
  status                 show the current settings
  help                   show this message
  quit                   exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Capture(CaptureTarget),
    Confirm,
    Cancel,
    Interval {
        hours: String,
        minutes: String,
        seconds: String,
        millis: String,
    },
    Mode(ActionMode),
    Button(MouseButton),
    Status,
    Help,
    Quit,
}

/// What the front end should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Done,
    Text(String),
    Quit,
}

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match name.to_lowercase().as_str() {
        "toggle" | "t" => Command::Toggle,
        "hotkey" => Command::Capture(CaptureTarget::Hotkey),
        "key" => Command::Capture(CaptureTarget::TargetKey),
        "confirm" | "ok" => Command::Confirm,
        "cancel" => Command::Cancel,
        "interval" => match args.as_slice() {
            [hours, minutes, seconds, millis] => Command::Interval {
                hours: hours.to_string(),
                minutes: minutes.to_string(),
                seconds: seconds.to_string(),
                millis: millis.to_string(),
            },
            _ => {
                return Err(AutoclickError::invalid_command(
                    "interval takes four numbers: hours minutes seconds milliseconds",
                ))
            }
        },
        "mode" => Command::Mode(single_arg(name, &args)?.parse()?),
        "button" => Command::Button(single_arg(name, &args)?.parse()?),
        "status" | "s" => Command::Status,
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            return Err(AutoclickError::invalid_command(format!(
                "unknown command '{other}', type 'help' for a list"
            )))
        }
    };
    Ok(Some(command))
}

fn single_arg<'a>(name: &str, args: &[&'a str]) -> Result<&'a str> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(AutoclickError::invalid_command(format!(
            "{name} takes exactly one argument"
        ))),
    }
}

/// Run `command` against `controller`.
pub fn apply(controller: &Controller, command: Command) -> Result<Reply> {
    match command {
        Command::Toggle => {
            controller.toggle()?;
        }
        Command::Capture(target) => {
            if !controller.begin_capture(target) {
                return Ok(Reply::Text(format!("Already recording the {target}.")));
            }
            return Ok(Reply::Text(format!(
                "Press the {target}, then type 'confirm' or 'cancel'."
            )));
        }
        Command::Confirm => {
            let target = controller
                .capturing()
                .ok_or_else(|| AutoclickError::invalid_command("nothing is being recorded"))?;
            controller.confirm_capture(target)?;
        }
        Command::Cancel => {
            if controller.cancel_capture().is_none() {
                return Err(AutoclickError::invalid_command("nothing is being recorded"));
            }
        }
        Command::Interval {
            hours,
            minutes,
            seconds,
            millis,
        } => {
            controller.set_interval_fields(&hours, &minutes, &seconds, &millis)?;
        }
        Command::Mode(mode) => controller.set_mode(mode),
        Command::Button(button) => controller.set_button(button),
        Command::Status => return Ok(Reply::Text(status_text(controller))),
        Command::Help => return Ok(Reply::Text(HELP.to_string())),
        Command::Quit => return Ok(Reply::Quit),
    }
    Ok(Reply::Done)
}

fn status_text(controller: &Controller) -> String {
    let mut text = format!(
        "{}: {}",
        controller.run_state(),
        controller.configuration().summary()
    );
    if let (Some(target), Some(display)) = (controller.capturing(), controller.capture_display())
    {
        text.push_str(&format!("\nrecording {target}: {display}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("t").unwrap(), Some(Command::Toggle));
        assert_eq!(parse("  TOGGLE ").unwrap(), Some(Command::Toggle));
        assert_eq!(
            parse("hotkey").unwrap(),
            Some(Command::Capture(CaptureTarget::Hotkey))
        );
        assert_eq!(
            parse("key").unwrap(),
            Some(Command::Capture(CaptureTarget::TargetKey))
        );
        assert_eq!(
            parse("mode keyboard").unwrap(),
            Some(Command::Mode(ActionMode::Keyboard))
        );
        assert_eq!(
            parse("button right").unwrap(),
            Some(Command::Button(MouseButton::Right))
        );
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_interval_keeps_raw_fields() {
        assert_eq!(
            parse("interval 0 1 x 5").unwrap(),
            Some(Command::Interval {
                hours: "0".into(),
                minutes: "1".into(),
                seconds: "x".into(),
                millis: "5".into(),
            })
        );
        assert!(parse("interval 1 2").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse("jump"),
            Err(AutoclickError::InvalidCommand(_))
        ));
        assert!(parse("mode").is_err());
        assert!(parse("mode fast").is_err());
        assert!(parse("button left right").is_err());
    }
}
