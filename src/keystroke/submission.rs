//! Form-submission collaborator
//!
//! On submit the host asks for the summary and places it, JSON-encoded, in a
//! hidden field next to the credentials. A missing or inert logger never blocks
//! the submission: the form is simply sent without keystroke data.

use crate::error::CaptureError;
use crate::keystroke::logger::KeystrokeLogger;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A hidden form field to be submitted alongside the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenField {
    pub name: String,
    pub value: String,
}

/// Build the hidden field carrying the current summary.
///
/// Returns `Ok(None)` when there is no logger or the logger is inert.
/// The session is left running.
pub fn prepare_submission(
    logger: Option<&KeystrokeLogger>,
) -> Result<Option<HiddenField>, CaptureError> {
    let Some(logger) = logger.filter(|logger| logger.is_attached()) else {
        debug!("No attached keystroke logger; submitting without keystroke data");
        return Ok(None);
    };

    let summary = logger.summary();
    let value = summary
        .to_json()
        .map_err(|e| CaptureError::EncodingError(e.to_string()))?;

    debug!(
        session = %logger.session_id(),
        field = %logger.config().field,
        events = summary.keystrokes.len(),
        "Prepared keystroke data for submission"
    );

    Ok(Some(HiddenField {
        name: logger.config().field.payload_field().to_string(),
        value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaptureConfig, CaptureField};
    use crate::keystroke::host::InputSurface;
    use crate::types::KeystrokeSummary;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_logger_submits_without_data() {
        assert_eq!(prepare_submission(None).unwrap(), None);
    }

    #[test]
    fn test_inert_logger_submits_without_data() {
        let logger = KeystrokeLogger::attach(None, CaptureConfig::default());
        assert_eq!(prepare_submission(Some(&logger)).unwrap(), None);
    }

    #[test]
    fn test_hidden_field_carries_summary() {
        let mut logger = KeystrokeLogger::attach(
            Some(InputSurface::new("extraWord")),
            CaptureConfig::for_field(CaptureField::ExtraWord),
        );
        logger.key_down("a", 0.0);
        logger.key_up("a", 50.0);

        let field = prepare_submission(Some(&logger)).unwrap().unwrap();
        assert_eq!(field.name, "keystrokeData");

        let decoded: KeystrokeSummary = serde_json::from_str(&field.value).unwrap();
        assert_eq!(decoded, logger.summary());

        // Submitting does not end the session
        assert_eq!(logger.summary().keystrokes.len(), 2);
    }

    #[test]
    fn test_empty_session_submits_empty_summary() {
        let logger = KeystrokeLogger::attach(
            Some(InputSurface::new("password")),
            CaptureConfig::default(),
        );

        let field = prepare_submission(Some(&logger)).unwrap().unwrap();
        assert_eq!(field.value, r#"{"keystrokes":[],"totalTime":0.0}"#);
    }
}
