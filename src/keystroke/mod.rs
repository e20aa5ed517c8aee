//! Keystroke capture
//!
//! Host-facing engine that turns raw key and input events from a single login
//! input into a [`KeystrokeSummary`](crate::types::KeystrokeSummary).

pub mod host;
pub mod logger;
pub mod session;
pub mod submission;

pub use host::{parse_array, parse_ndjson, validate_feed, FeedIssue, FormHost, HostEvent, InputSurface};
pub use logger::{is_printable, ClockedLogger, KeystrokeLogger};
pub use session::Session;
pub use submission::{prepare_submission, HiddenField};
