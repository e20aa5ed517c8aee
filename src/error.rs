//! Error types for keystroke capture
//!
//! The capture engine itself never fails: a missing input, an orphan key-up or an
//! empty session all degrade to well-defined values. Errors only surface at the
//! edges, when configuration or recorded host events are parsed and validated.

use thiserror::Error;

/// Errors that can occur around the capture engine
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid host event feed: {0}")]
    InvalidFeed(#[from] FeedError),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Violations of the host event feed contract
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    #[error("Timestamp is not a finite number: {0}")]
    NonFiniteTimestamp(f64),

    #[error("Timestamp is negative: {0}")]
    NegativeTimestamp(f64),

    #[error("Clock went backwards: {now} after {previous}")]
    ClockWentBackwards { previous: f64, now: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_wraps_into_capture_error() {
        let err: CaptureError = FeedError::ClockWentBackwards {
            previous: 20.0,
            now: 10.0,
        }
        .into();

        assert!(matches!(err, CaptureError::InvalidFeed(_)));
        assert_eq!(
            err.to_string(),
            "Invalid host event feed: Clock went backwards: 10 after 20"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: CaptureError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }
}
