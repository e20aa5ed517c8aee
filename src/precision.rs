//! Fixed-precision rounding for emitted timings
//!
//! Every timestamp and duration leaving the engine carries exactly four decimal
//! places of milliseconds. A missing duration stays missing; it is never
//! rounded to zero.

use crate::types::Millis;

/// Number of decimal places kept on emitted timings
pub const DECIMAL_PLACES: i32 = 4;

const SCALE: f64 = 10_000.0;

/// Round a millisecond value to four decimal places
pub fn round_ms(value: Millis) -> Millis {
    (value * SCALE).round() / SCALE
}

/// Round an optional millisecond value, keeping `None` as `None`
pub fn round_opt_ms(value: Option<Millis>) -> Option<Millis> {
    value.map(round_ms)
}
