//! Host-side contracts
//!
//! The host environment (a browser page, a WebView bridge, a native form) owns
//! the input element and the clock. It attaches a logger once on initialization
//! and then pushes events to it, one at a time, in the order they happen.
//!
//! Recorded host events can be stored as NDJSON or as a JSON array and replayed
//! through a fresh logger:
//!
//! ```json
//! {"event": "key_down", "key": "a", "now": 1021.5}
//! {"event": "value_changed", "value": "a", "now": 1022.1}
//! {"event": "key_up", "key": "a", "now": 1090.0}
//! {"event": "submit"}
//! ```

use crate::error::{CaptureError, FeedError};
use crate::types::Millis;
use serde::{Deserialize, Serialize};

/// The input element a logger is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSurface {
    /// Name attribute of the input
    pub name: String,
}

impl InputSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A form-like host that can look up its inputs by name
pub trait FormHost {
    fn find_input(&self, name: &str) -> Option<InputSurface>;
}

impl FormHost for [InputSurface] {
    fn find_input(&self, name: &str) -> Option<InputSurface> {
        self.iter().find(|input| input.name == name).cloned()
    }
}

impl FormHost for Vec<InputSurface> {
    fn find_input(&self, name: &str) -> Option<InputSurface> {
        self.as_slice().find_input(name)
    }
}

/// One event pushed by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    KeyDown { key: String, now: Millis },
    KeyUp { key: String, now: Millis },
    ValueChanged { value: String, now: Millis },
    /// The form is being submitted and wants the current summary
    Submit,
}

impl HostEvent {
    /// Clock reading carried by the event, if any
    pub fn now(&self) -> Option<Millis> {
        match self {
            HostEvent::KeyDown { now, .. }
            | HostEvent::KeyUp { now, .. }
            | HostEvent::ValueChanged { now, .. } => Some(*now),
            HostEvent::Submit => None,
        }
    }

    /// Check the clock reading of this event on its own
    pub fn validate(&self) -> Result<(), FeedError> {
        match self.now() {
            Some(now) if !now.is_finite() => Err(FeedError::NonFiniteTimestamp(now)),
            Some(now) if now < 0.0 => Err(FeedError::NegativeTimestamp(now)),
            _ => Ok(()),
        }
    }
}

/// A feed contract violation at a given position
#[derive(Debug, Clone, PartialEq)]
pub struct FeedIssue {
    pub index: usize,
    pub error: FeedError,
}

/// Parse newline-delimited host events, skipping blank lines
pub fn parse_ndjson(input: &str) -> Result<Vec<HostEvent>, CaptureError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line.trim()).map_err(|e| {
                CaptureError::ParseError(format!("Line {}: {}", number + 1, e))
            })
        })
        .collect()
}

/// Parse a JSON array of host events
pub fn parse_array(input: &str) -> Result<Vec<HostEvent>, CaptureError> {
    serde_json::from_str(input)
        .map_err(|e| CaptureError::ParseError(format!("Failed to parse event array: {}", e)))
}

/// Check a recorded feed against the host contract.
///
/// Every clock reading must be finite and non-negative, and readings must not
/// decrease across the feed.
pub fn validate_feed(events: &[HostEvent]) -> Vec<FeedIssue> {
    let mut issues = Vec::new();
    let mut previous: Option<Millis> = None;

    for (index, event) in events.iter().enumerate() {
        if let Err(error) = event.validate() {
            issues.push(FeedIssue { index, error });
            continue;
        }

        if let Some(now) = event.now() {
            if let Some(prev) = previous {
                if now < prev {
                    issues.push(FeedIssue {
                        index,
                        error: FeedError::ClockWentBackwards {
                            previous: prev,
                            now,
                        },
                    });
                    continue;
                }
            }
            previous = Some(now);
        }
    }

    issues
}
