//! Session scripts for `folio-lightbox replay`.
//!
//! One step per line; blank lines and `#` comments are skipped:
//!
//! ```text
//! open p1          # activate a project card
//! settle           # deliver every probe and timer
//! next
//! prev
//! thumb 2          # click the third thumbnail
//! key Tab shift    # Shift+Tab
//! swipe 300 120    # touch start x, touch end x
//! reveal           # every thumbnail scrolls into view
//! probes           # deliver probes only, no timers
//! click-main
//! backdrop
//! close
//! ```

use crate::gallery::GalleryState;
use crate::input::{Key, KeyInput};
use crate::lazy::IntersectionEntry;
use crate::page::{Page, PageEvent};
use crate::sim::{RecordedOp, SimPlatform, run_until_idle, settle_probes};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Open(String),
    Next,
    Previous,
    Thumbnail(usize),
    Key(KeyInput),
    Swipe { from: f64, to: f64 },
    Reveal,
    ClickMain,
    Close,
    Backdrop,
    Probes,
    Settle,
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStep::Open(id) => write!(f, "open {id}"),
            ScriptStep::Next => f.write_str("next"),
            ScriptStep::Previous => f.write_str("prev"),
            ScriptStep::Thumbnail(i) => write!(f, "thumb {i}"),
            ScriptStep::Key(input) => {
                let name = match &input.key {
                    Key::Escape => "Escape",
                    Key::ArrowLeft => "ArrowLeft",
                    Key::ArrowRight => "ArrowRight",
                    Key::Tab => "Tab",
                    Key::Other(other) => other.as_str(),
                };
                if input.shift {
                    write!(f, "key {name} shift")
                } else {
                    write!(f, "key {name}")
                }
            }
            ScriptStep::Swipe { from, to } => write!(f, "swipe {from} {to}"),
            ScriptStep::Reveal => f.write_str("reveal"),
            ScriptStep::ClickMain => f.write_str("click-main"),
            ScriptStep::Close => f.write_str("close"),
            ScriptStep::Backdrop => f.write_str("backdrop"),
            ScriptStep::Probes => f.write_str("probes"),
            ScriptStep::Settle => f.write_str("settle"),
        }
    }
}

/// A parsed step with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub step: ScriptStep,
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptLine>, ScriptError> {
    let content = fs::read_to_string(path)?;
    parse_script(&content)
}

pub fn parse_script(content: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut steps = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let text = raw.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let step = parse_step(text).map_err(|message| ScriptError::Parse { line, message })?;
        steps.push(ScriptLine { line, step });
    }
    Ok(steps)
}

fn parse_step(text: &str) -> Result<ScriptStep, String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let step = match words.as_slice() {
        ["open", id] => ScriptStep::Open(id.to_string()),
        ["next"] => ScriptStep::Next,
        ["prev"] | ["previous"] => ScriptStep::Previous,
        ["thumb", index] => ScriptStep::Thumbnail(
            index
                .parse()
                .map_err(|_| format!("thumbnail index must be a number, got '{index}'"))?,
        ),
        ["key", name] => ScriptStep::Key(KeyInput::new(Key::from_dom(name))),
        ["key", name, "shift"] => ScriptStep::Key(KeyInput::shifted(Key::from_dom(name))),
        ["swipe", from, to] => ScriptStep::Swipe {
            from: parse_coord(from)?,
            to: parse_coord(to)?,
        },
        ["reveal"] => ScriptStep::Reveal,
        ["click-main"] => ScriptStep::ClickMain,
        ["close"] => ScriptStep::Close,
        ["backdrop"] => ScriptStep::Backdrop,
        ["probes"] => ScriptStep::Probes,
        ["settle"] => ScriptStep::Settle,
        [command, ..] => return Err(format!("unknown or malformed step '{command}'")),
        [] => return Err("empty step".to_string()),
    };
    Ok(step)
}

fn parse_coord(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("swipe coordinate must be a number, got '{value}'"))
}

/// What one step did.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub line: usize,
    pub step: ScriptStep,
    pub ops: Vec<RecordedOp>,
    pub state: GalleryState,
    pub index: Option<usize>,
}

/// Play `steps` against `page`, collecting the platform calls of each step.
pub fn run_script(page: &mut Page<SimPlatform>, steps: &[ScriptLine]) -> Vec<StepReport> {
    page.platform_mut().take_ops();
    steps
        .iter()
        .map(|entry| {
            apply_step(page, &entry.step);
            StepReport {
                line: entry.line,
                step: entry.step.clone(),
                ops: page.platform_mut().take_ops(),
                state: page.gallery().state(),
                index: page.gallery().current_index(),
            }
        })
        .collect()
}

fn apply_step(page: &mut Page<SimPlatform>, step: &ScriptStep) {
    match step {
        ScriptStep::Open(id) => {
            page.dispatch(PageEvent::ProjectActivated(id.clone()));
        }
        ScriptStep::Next => {
            page.dispatch(PageEvent::NextClicked);
        }
        ScriptStep::Previous => {
            page.dispatch(PageEvent::PreviousClicked);
        }
        ScriptStep::Thumbnail(index) => {
            page.dispatch(PageEvent::ThumbnailClicked(*index));
        }
        ScriptStep::Key(input) => {
            page.dispatch(PageEvent::Key(input.clone()));
        }
        ScriptStep::Swipe { from, to } => {
            page.dispatch(PageEvent::TouchStart { x: *from });
            page.dispatch(PageEvent::TouchEnd { x: *to });
        }
        ScriptStep::Reveal => {
            let entries = page
                .platform()
                .thumbnails()
                .iter()
                .map(|key| IntersectionEntry {
                    key: *key,
                    is_intersecting: true,
                })
                .collect();
            page.dispatch(PageEvent::Intersections(entries));
        }
        ScriptStep::ClickMain => {
            page.dispatch(PageEvent::MainImageClicked);
        }
        ScriptStep::Close => {
            page.dispatch(PageEvent::CloseClicked);
        }
        ScriptStep::Backdrop => {
            page.dispatch(PageEvent::BackdropClicked);
        }
        ScriptStep::Probes => {
            settle_probes(page);
        }
        ScriptStep::Settle => {
            run_until_idle(page);
        }
    }
}
