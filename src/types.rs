//! Core types for keystroke capture
//!
//! This module defines the events recorded during a typing session and the
//! immutable summary handed to the form-submission collaborator. The serde
//! representation is the wire format consumed by the authentication server:
//!
//! ```json
//! {
//!   "keystrokes": [
//!     { "type": "down", "timestamp": 0.0, "down_down": null },
//!     { "type": "up", "timestamp": 50.0, "dwellTime": 50.0 },
//!     { "type": "insert", "timestamp": 80.0, "len": 1 }
//!   ],
//!   "totalTime": 80.0
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Milliseconds read from a monotonic high-resolution clock
pub type Millis = f64;

/// Marker used as the first-down timestamp when a session has no down or insert event
pub const NO_FIRST_DOWN: Millis = -0.01;

/// A single recorded keystroke event.
///
/// Timestamps are relative to the start of typing in the current session and
/// are rounded to four decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KeystrokeEvent {
    /// A printable key was pressed
    #[serde(rename = "down")]
    KeyDown {
        timestamp: Millis,
        /// Time since the previous key-down, printable or not
        #[serde(rename = "down_down")]
        inter_key_down: Option<Millis>,
    },

    /// A printable key was released
    #[serde(rename = "up")]
    KeyUp {
        timestamp: Millis,
        /// How long the key was held, if its key-down was observed
        #[serde(rename = "dwellTime")]
        dwell_time: Option<Millis>,
    },

    /// The input value grew, whatever produced the growth (typing, paste, autofill, IME)
    #[serde(rename = "insert")]
    Insertion {
        timestamp: Millis,
        #[serde(rename = "len")]
        inserted_len: usize,
    },
}

impl KeystrokeEvent {
    /// Relative timestamp of the event
    pub fn timestamp(&self) -> Millis {
        match self {
            KeystrokeEvent::KeyDown { timestamp, .. }
            | KeystrokeEvent::KeyUp { timestamp, .. }
            | KeystrokeEvent::Insertion { timestamp, .. } => *timestamp,
        }
    }

    /// Wire name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            KeystrokeEvent::KeyDown { .. } => "down",
            KeystrokeEvent::KeyUp { .. } => "up",
            KeystrokeEvent::Insertion { .. } => "insert",
        }
    }

    /// Whether this event can mark the beginning of typing
    pub fn starts_typing(&self) -> bool {
        matches!(
            self,
            KeystrokeEvent::KeyDown { .. } | KeystrokeEvent::Insertion { .. }
        )
    }
}

/// Immutable summary of a typing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeSummary {
    /// All recorded events, in the order they occurred
    pub keystrokes: Vec<KeystrokeEvent>,
    /// Span from the first down/insert event to the last event
    #[serde(rename = "totalTime")]
    pub total_time: Millis,
}

impl KeystrokeSummary {
    /// The summary of a session with nothing recorded
    pub fn empty() -> Self {
        Self {
            keystrokes: Vec::new(),
            total_time: 0.0,
        }
    }

    /// Number of events of each kind as (down, up, insert)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.keystrokes
            .iter()
            .fold((0, 0, 0), |(down, up, insert), event| match event {
                KeystrokeEvent::KeyDown { .. } => (down + 1, up, insert),
                KeystrokeEvent::KeyUp { .. } => (down, up + 1, insert),
                KeystrokeEvent::Insertion { .. } => (down, up, insert + 1),
            })
    }

    /// Encode to the JSON string placed in the hidden form field
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for KeystrokeSummary {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_wire_format() {
        let summary = KeystrokeSummary {
            keystrokes: vec![
                KeystrokeEvent::KeyDown {
                    timestamp: 0.0,
                    inter_key_down: None,
                },
                KeystrokeEvent::KeyUp {
                    timestamp: 50.0,
                    dwell_time: Some(50.0),
                },
                KeystrokeEvent::Insertion {
                    timestamp: 52.5,
                    inserted_len: 1,
                },
            ],
            total_time: 52.5,
        };

        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "keystrokes": [
                    { "type": "down", "timestamp": 0.0, "down_down": null },
                    { "type": "up", "timestamp": 50.0, "dwellTime": 50.0 },
                    { "type": "insert", "timestamp": 52.5, "len": 1 }
                ],
                "totalTime": 52.5
            })
        );
    }

    #[test]
    fn test_deserialize_wire_format() {
        let json = r#"{
            "keystrokes": [
                { "type": "down", "timestamp": 0, "down_down": null },
                { "type": "up", "timestamp": 61.2, "dwellTime": null }
            ],
            "totalTime": 61.2
        }"#;

        let summary: KeystrokeSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.counts(), (1, 1, 0));
        assert_eq!(
            summary.keystrokes[1],
            KeystrokeEvent::KeyUp {
                timestamp: 61.2,
                dwell_time: None
            }
        );
    }

    #[test]
    fn test_event_accessors() {
        let insert = KeystrokeEvent::Insertion {
            timestamp: 3.0,
            inserted_len: 4,
        };
        assert_eq!(insert.timestamp(), 3.0);
        assert_eq!(insert.kind(), "insert");
        assert!(insert.starts_typing());

        let up = KeystrokeEvent::KeyUp {
            timestamp: 1.0,
            dwell_time: None,
        };
        assert!(!up.starts_typing());
    }

    #[test]
    fn test_empty_summary() {
        let empty = KeystrokeSummary::default();
        assert!(empty.keystrokes.is_empty());
        assert_eq!(empty.total_time, 0.0);
        assert_eq!(empty.to_json().unwrap(), r#"{"keystrokes":[],"totalTime":0.0}"#);
    }
}
