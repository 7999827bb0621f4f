//! Operator input.
//!
//! The headless console takes its pointer, tool and teleop input as text,
//! one command per line:
//!
//! ```text
//! down <x> <y>        press at a screen pixel
//! move <x> <y>        drag to a screen pixel
//! up                  release; publishes the pose estimate or goal
//! cancel              abort the gesture
//! tool pose|goal      select the gesture tool
//! nav on|off          toggle navigation mode
//! drive forward|backward|left|right|stop
//! resize <w> <h>      resize the drawing surface
//! ```
//!
//! Lines are parsed on a reader thread and sent over a bounded channel; the
//! main thread applies them with [`apply`], next to the inbound bus events.

use std::io::BufRead;
use std::str::FromStr;
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::console::MapConsole;
use crate::error::{DrishtiError, Result};
use crate::interaction::{Direction, NavTool};
use crate::io::outbound::{CommandPublisher, CommandSink, SendOutcome};

/// Parsed lines waiting for the main thread.
pub const INPUT_CHANNEL_CAPACITY: usize = 32;

/// One operator command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorInput {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    Cancel,
    Tool(NavTool),
    Navigation(bool),
    Drive(Direction),
    Resize { width: u32, height: u32 },
}

fn invalid(line: &str, reason: &str) -> DrishtiError {
    DrishtiError::Input(format!("{:?}: {}", line, reason))
}

fn coordinate(line: &str, word: &str) -> Result<f64> {
    match word.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(line, "coordinates must be finite numbers")),
    }
}

fn dimension(line: &str, word: &str) -> Result<u32> {
    match word.parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(invalid(line, "sizes must be positive integers")),
    }
}

impl FromStr for OperatorInput {
    type Err = DrishtiError;

    fn from_str(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((verb, args)) = words.split_first() else {
            return Err(invalid(line, "empty command"));
        };

        let input = match (verb.to_lowercase().as_str(), args) {
            ("down", [x, y]) => OperatorInput::PointerDown {
                x: coordinate(line, x)?,
                y: coordinate(line, y)?,
            },
            ("move", [x, y]) => OperatorInput::PointerMove {
                x: coordinate(line, x)?,
                y: coordinate(line, y)?,
            },
            ("up", []) => OperatorInput::PointerUp,
            ("cancel", []) => OperatorInput::Cancel,
            ("tool", [tool]) => OperatorInput::Tool(match *tool {
                "pose" => NavTool::SetPose,
                "goal" => NavTool::SetGoal,
                _ => return Err(invalid(line, "tool is pose or goal")),
            }),
            ("nav", [state]) => OperatorInput::Navigation(match *state {
                "on" => true,
                "off" => false,
                _ => return Err(invalid(line, "nav is on or off")),
            }),
            ("drive", [direction]) => OperatorInput::Drive(match *direction {
                "forward" => Direction::Forward,
                "backward" => Direction::Backward,
                "left" => Direction::Left,
                "right" => Direction::Right,
                "stop" => Direction::Stop,
                _ => return Err(invalid(line, "unknown direction")),
            }),
            ("resize", [width, height]) => OperatorInput::Resize {
                width: dimension(line, width)?,
                height: dimension(line, height)?,
            },
            _ => return Err(invalid(line, "unknown command or wrong argument count")),
        };
        Ok(input)
    }
}

/// Apply one input to the console, publishing whatever command it yields.
///
/// Returns the publish outcome when the input produced a command.
pub fn apply<S: CommandSink>(
    input: OperatorInput,
    console: &mut MapConsole,
    publisher: &mut CommandPublisher<S>,
) -> Option<SendOutcome> {
    match input {
        OperatorInput::PointerDown { x, y } => {
            if !console.pointer_down(x, y) {
                tracing::debug!("Press at ({:.0}, {:.0}) started no gesture", x, y);
            }
            None
        }
        OperatorInput::PointerMove { x, y } => {
            console.pointer_move(x, y);
            None
        }
        OperatorInput::PointerUp => console
            .pointer_up()
            .map(|command| publisher.send_nav(&command)),
        OperatorInput::Cancel => {
            console.cancel_gesture();
            None
        }
        OperatorInput::Tool(tool) => {
            console.set_tool(tool);
            tracing::info!("Tool {:?}", tool);
            None
        }
        OperatorInput::Navigation(enabled) => {
            console.set_navigation_enabled(enabled);
            publisher.set_navigation_enabled(enabled);
            tracing::info!(
                "Navigation {}",
                if enabled { "enabled" } else { "disabled" }
            );
            None
        }
        OperatorInput::Drive(direction) => Some(publisher.send_direction(direction)),
        OperatorInput::Resize { width, height } => {
            console.handle_resize(width, height);
            None
        }
    }
}

/// Parse lines from `reader` and forward them until EOF or until the
/// channel closes. Blank lines and `#` comments are skipped. Returns the
/// number of inputs forwarded.
pub fn forward_lines<R: BufRead>(reader: R, tx: &Sender<OperatorInput>) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Operator input read failed: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<OperatorInput>() {
            Ok(input) => {
                if tx.send(input).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }
    forwarded
}

/// Start reading operator commands from stdin.
///
/// The thread is detached: it blocks on stdin and ends at EOF or when the
/// returned receiver is dropped and the next line arrives.
pub fn spawn_stdin_reader() -> Result<Receiver<OperatorInput>> {
    let (tx, rx) = bounded(INPUT_CHANNEL_CAPACITY);
    thread::Builder::new()
        .name("operator-input".into())
        .spawn(move || {
            let forwarded = forward_lines(std::io::stdin().lock(), &tx);
            tracing::debug!("Operator input ended after {} commands", forwarded);
        })?;
    Ok(rx)
}
