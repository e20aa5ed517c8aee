//! Configuration for a capture engine
//!
//! Hosts usually pass configuration as JSON (through the C ABI or the CLI's
//! `--config` flag). Everything has a default, so an empty object is valid.

use crate::error::CaptureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hidden form field that carries the encoded summary on submission
pub const PAYLOAD_FIELD: &str = "keystrokeData";

/// Which login input a logger is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureField {
    /// The password input of the login form
    #[default]
    Password,
    /// The extra-word typing challenge shown when the password entry looked automated
    ExtraWord,
}

impl CaptureField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureField::Password => "password",
            CaptureField::ExtraWord => "extra_word",
        }
    }

    /// Name attribute of the input element the logger attaches to
    pub fn input_name(&self) -> &'static str {
        match self {
            CaptureField::Password => "password",
            CaptureField::ExtraWord => "extraWord",
        }
    }

    /// Id of the form that owns the input
    pub fn form_id(&self) -> &'static str {
        match self {
            CaptureField::Password => "kc-form-login",
            CaptureField::ExtraWord => "kc-form-extra-word",
        }
    }

    /// Name of the hidden field the summary is submitted under
    pub fn payload_field(&self) -> &'static str {
        PAYLOAD_FIELD
    }
}

impl fmt::Display for CaptureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureField {
    type Err = CaptureError;

    /// Accepts the config name, the input name, or the kebab-case CLI spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "password" => Ok(CaptureField::Password),
            "extra_word" | "extraWord" | "extra-word" => Ok(CaptureField::ExtraWord),
            other => Err(CaptureError::InvalidConfig(format!(
                "Unknown capture field: {other}"
            ))),
        }
    }
}

/// Configuration for a [`KeystrokeLogger`](crate::keystroke::KeystrokeLogger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Field the logger is bound to
    pub field: CaptureField,
    /// Emit a warning when the logger has to run without an input
    pub warn_when_inert: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            field: CaptureField::Password,
            warn_when_inert: true,
        }
    }
}

impl CaptureConfig {
    /// Configuration for the given field with all other settings at their defaults
    pub fn for_field(field: CaptureField) -> Self {
        Self {
            field,
            ..Self::default()
        }
    }

    /// Parse configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        serde_json::from_str(json)
            .map_err(|e| CaptureError::InvalidConfig(format!("Failed to parse config: {e}")))
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, CaptureError> {
        serde_json::to_string_pretty(self).map_err(|e| CaptureError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.field, CaptureField::Password);
        assert!(config.warn_when_inert);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = CaptureConfig::from_json(r#"{ "field": "extra_word" }"#).unwrap();
        assert_eq!(config.field, CaptureField::ExtraWord);
        assert!(config.warn_when_inert);

        let empty = CaptureConfig::from_json("{}").unwrap();
        assert_eq!(empty, CaptureConfig::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let result = CaptureConfig::from_json(r#"{ "field": "password", "decimals": 2 }"#);
        assert!(matches!(result, Err(CaptureError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = CaptureConfig {
            field: CaptureField::ExtraWord,
            warn_when_inert: false,
        };
        let json = config.to_json().unwrap();
        assert_eq!(CaptureConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(CaptureField::Password.input_name(), "password");
        assert_eq!(CaptureField::ExtraWord.input_name(), "extraWord");
        assert_eq!(CaptureField::Password.form_id(), "kc-form-login");
        assert_eq!(CaptureField::ExtraWord.form_id(), "kc-form-extra-word");
        assert_eq!(CaptureField::ExtraWord.payload_field(), "keystrokeData");
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("password".parse::<CaptureField>().unwrap(), CaptureField::Password);
        assert_eq!("extraWord".parse::<CaptureField>().unwrap(), CaptureField::ExtraWord);
        assert_eq!("extra-word".parse::<CaptureField>().unwrap(), CaptureField::ExtraWord);
        assert!("username".parse::<CaptureField>().is_err());
    }
}
