//! Keystroke Capture - Keystroke timing engine for behavioral-biometric login signals
//!
//! The engine observes key and input events on a single login input (the
//! password field, or the extra-word challenge) and produces a compact timing
//! record for the server: per-key dwell times, inter-key-down intervals, and
//! value insertions, all relative to the start of typing.
//!
//! ## Modules
//!
//! - **Capture engine**: [`KeystrokeLogger`] bound to one input, fed by the host
//! - **Host contracts**: attach-on-init lookup, recorded event feeds, form submission
//! - **C ABI**: opaque logger handles for browser, WebView and native hosts

pub mod clock;
pub mod config;
pub mod error;
pub mod keystroke;
pub mod precision;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{CaptureConfig, CaptureField, PAYLOAD_FIELD};
pub use error::{CaptureError, FeedError};
pub use keystroke::{
    prepare_submission, ClockedLogger, FormHost, HiddenField, HostEvent, InputSurface,
    KeystrokeLogger,
};
pub use types::{KeystrokeEvent, KeystrokeSummary, Millis};

/// Library version embedded in CLI reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI reports
pub const PRODUCER_NAME: &str = "keystroke-capture";
