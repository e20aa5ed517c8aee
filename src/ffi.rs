//! FFI bindings for Keystroke Capture
//!
//! This module provides C-compatible functions for driving a keystroke logger
//! from a browser bridge, a WebView or a native host. All functions use C strings
//! (null-terminated). Strings returned by the library are newly allocated and
//! must be freed by the caller using `kcap_free_string`.
//!
//! Clock readings (`now`) are milliseconds from the host's monotonic clock.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::CaptureConfig;
use crate::error::FeedError;
use crate::keystroke::{InputSurface, KeystrokeLogger};
use crate::types::Millis;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Reject clock readings the engine cannot do interval arithmetic on
fn check_now(now: Millis) -> Result<(), FeedError> {
    if !now.is_finite() {
        return Err(FeedError::NonFiniteTimestamp(now));
    }
    if now < 0.0 {
        return Err(FeedError::NegativeTimestamp(now));
    }
    Ok(())
}

// ============================================================================
// Logger Lifecycle
// ============================================================================

/// Opaque handle to a KeystrokeLogger
pub struct KcapLoggerHandle {
    logger: KeystrokeLogger,
}

/// Attach a logger to the input named `input_name`, with default configuration.
///
/// # Safety
/// - `input_name` must be a valid null-terminated C string, or NULL.
/// - A NULL `input_name` means the input was not found; the returned logger is
///   inert and reports empty summaries.
/// - Returns a pointer that must be freed with `kcap_logger_free`.
/// - Returns NULL on error; call `kcap_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_attach(input_name: *const c_char) -> *mut KcapLoggerHandle {
    kcap_logger_attach_with_config(input_name, ptr::null())
}

/// Attach a logger to the input named `input_name`, configured from JSON.
///
/// # Safety
/// - `input_name` must be a valid null-terminated C string, or NULL (inert logger).
/// - `config_json` must be a valid null-terminated C string, or NULL for defaults.
/// - Returns a pointer that must be freed with `kcap_logger_free`.
/// - Returns NULL on error; call `kcap_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_attach_with_config(
    input_name: *const c_char,
    config_json: *const c_char,
) -> *mut KcapLoggerHandle {
    clear_last_error();

    let surface = if input_name.is_null() {
        None
    } else {
        match cstr_to_string(input_name) {
            Some(name) => Some(InputSurface::new(name)),
            None => {
                set_last_error("Invalid input name string");
                return ptr::null_mut();
            }
        }
    };

    let config = if config_json.is_null() {
        CaptureConfig::default()
    } else {
        let json_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string");
                return ptr::null_mut();
            }
        };
        match CaptureConfig::from_json(&json_str) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let logger = KeystrokeLogger::attach(surface, config);
    Box::into_raw(Box::new(KcapLoggerHandle { logger }))
}

/// Free a logger.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `kcap_logger_attach*`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_free(handle: *mut KcapLoggerHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// ============================================================================
// Event API
// ============================================================================

/// Report a key being pressed.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `kcap_logger_attach*`.
/// - `key` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error; call `kcap_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_key_down(
    handle: *mut KcapLoggerHandle,
    key: *const c_char,
    now: f64,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null logger pointer");
        return -1;
    }

    let handle = &mut *handle;

    let key_str = match cstr_to_string(key) {
        Some(s) => s,
        None => {
            set_last_error("Invalid key string pointer");
            return -1;
        }
    };

    if let Err(e) = check_now(now) {
        set_last_error(&e.to_string());
        return -1;
    }

    handle.logger.key_down(&key_str, now);
    0
}

/// Report a key being released.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `kcap_logger_attach*`.
/// - `key` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error; call `kcap_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_key_up(
    handle: *mut KcapLoggerHandle,
    key: *const c_char,
    now: f64,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null logger pointer");
        return -1;
    }

    let handle = &mut *handle;

    let key_str = match cstr_to_string(key) {
        Some(s) => s,
        None => {
            set_last_error("Invalid key string pointer");
            return -1;
        }
    };

    if let Err(e) = check_now(now) {
        set_last_error(&e.to_string());
        return -1;
    }

    handle.logger.key_up(&key_str, now);
    0
}

/// Report the new value of the input after it changed.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `kcap_logger_attach*`.
/// - `value` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error; call `kcap_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_value_changed(
    handle: *mut KcapLoggerHandle,
    value: *const c_char,
    now: f64,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null logger pointer");
        return -1;
    }

    let handle = &mut *handle;

    let value_str = match cstr_to_string(value) {
        Some(s) => s,
        None => {
            set_last_error("Invalid value string pointer");
            return -1;
        }
    };

    if let Err(e) = check_now(now) {
        set_last_error(&e.to_string());
        return -1;
    }

    handle.logger.value_changed(&value_str, now);
    0
}

/// Get the current summary as JSON, without ending the session.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `kcap_logger_attach*`.
/// - Returns a newly allocated string that must be freed with `kcap_free_string`.
/// - Returns NULL on error; call `kcap_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_summary(handle: *mut KcapLoggerHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null logger pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;

    match handle.logger.summary().to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Discard the current session.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `kcap_logger_attach*`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn kcap_logger_reset(handle: *mut KcapLoggerHandle) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null logger pointer");
        return -1;
    }

    let handle = &mut *handle;
    handle.logger.reset();
    0
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Keystroke Capture functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a `kcap_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn kcap_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `kcap_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn kcap_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn kcap_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeystrokeEvent, KeystrokeSummary};
    use pretty_assertions::assert_eq;

    unsafe fn summary_of(handle: *mut KcapLoggerHandle) -> KeystrokeSummary {
        let json = kcap_logger_summary(handle);
        assert!(!json.is_null());
        let summary = serde_json::from_str(CStr::from_ptr(json).to_str().unwrap()).unwrap();
        kcap_free_string(json);
        summary
    }

    unsafe fn last_error() -> String {
        let error = kcap_last_error();
        assert!(!error.is_null());
        CStr::from_ptr(error).to_str().unwrap().to_string()
    }

    #[test]
    fn test_ffi_logger_lifecycle() {
        let name = CString::new("password").unwrap();
        let a = CString::new("a").unwrap();
        let value = CString::new("a").unwrap();

        unsafe {
            let handle = kcap_logger_attach(name.as_ptr());
            assert!(!handle.is_null());

            assert_eq!(kcap_logger_key_down(handle, a.as_ptr(), 100.0), 0);
            assert_eq!(kcap_logger_value_changed(handle, value.as_ptr(), 101.0), 0);
            assert_eq!(kcap_logger_key_up(handle, a.as_ptr(), 150.0), 0);
            assert!(kcap_last_error().is_null());

            let summary = summary_of(handle);
            assert_eq!(
                summary.keystrokes,
                vec![
                    KeystrokeEvent::KeyDown {
                        timestamp: 0.0,
                        inter_key_down: None
                    },
                    KeystrokeEvent::Insertion {
                        timestamp: 1.0,
                        inserted_len: 1
                    },
                    KeystrokeEvent::KeyUp {
                        timestamp: 50.0,
                        dwell_time: Some(50.0)
                    },
                ]
            );
            assert_eq!(summary.total_time, 50.0);

            // Reading the summary does not end the session
            assert_eq!(summary_of(handle), summary);

            assert_eq!(kcap_logger_reset(handle), 0);
            assert_eq!(summary_of(handle), KeystrokeSummary::empty());

            kcap_logger_free(handle);
        }
    }

    #[test]
    fn test_ffi_inert_logger() {
        let a = CString::new("a").unwrap();

        unsafe {
            let handle = kcap_logger_attach(ptr::null());
            assert!(!handle.is_null());

            assert_eq!(kcap_logger_key_down(handle, a.as_ptr(), 0.0), 0);
            assert_eq!(kcap_logger_key_up(handle, a.as_ptr(), 10.0), 0);
            assert_eq!(summary_of(handle), KeystrokeSummary::empty());

            kcap_logger_free(handle);
        }
    }

    #[test]
    fn test_ffi_attach_with_config() {
        let name = CString::new("extraWord").unwrap();
        let config = CString::new(r#"{"field": "extra_word", "warn_when_inert": false}"#).unwrap();
        let bad_config = CString::new(r#"{"field": "username"}"#).unwrap();

        unsafe {
            let handle = kcap_logger_attach_with_config(name.as_ptr(), config.as_ptr());
            assert!(!handle.is_null());
            kcap_logger_free(handle);

            let handle = kcap_logger_attach_with_config(name.as_ptr(), bad_config.as_ptr());
            assert!(handle.is_null());
            assert!(last_error().contains("Invalid configuration"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let name = CString::new("password").unwrap();
        let a = CString::new("a").unwrap();

        unsafe {
            assert_eq!(kcap_logger_key_down(ptr::null_mut(), a.as_ptr(), 0.0), -1);
            assert_eq!(last_error(), "Null logger pointer");

            assert!(kcap_logger_summary(ptr::null_mut()).is_null());
            assert_eq!(kcap_logger_reset(ptr::null_mut()), -1);

            let handle = kcap_logger_attach(name.as_ptr());

            assert_eq!(kcap_logger_key_up(handle, ptr::null(), 0.0), -1);
            assert_eq!(last_error(), "Invalid key string pointer");

            assert_eq!(kcap_logger_key_down(handle, a.as_ptr(), f64::NAN), -1);
            assert!(last_error().contains("not a finite number"));

            assert_eq!(kcap_logger_value_changed(handle, a.as_ptr(), -5.0), -1);
            assert!(last_error().contains("negative"));

            // Rejected events leave the session untouched
            assert_eq!(summary_of(handle), KeystrokeSummary::empty());

            kcap_logger_free(handle);
            kcap_logger_free(ptr::null_mut());
            kcap_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = kcap_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::VERSION);
        }
    }
}
