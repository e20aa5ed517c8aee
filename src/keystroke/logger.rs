//! Keystroke timing capture engine
//!
//! The logger is a session-scoped state machine bound to one input. The host
//! pushes three kinds of events into it (key-down, key-up, value-changed) and
//! reads a [`KeystrokeSummary`] when the form is submitted.
//!
//! Feature derivation rules:
//! - Only printable keys (a single character) produce `down`/`up` events, but
//!   every accepted key-down moves the baseline for the next inter-key-down interval.
//! - A key-down for a key that is already held (auto-repeat) is ignored entirely.
//! - Value growth produces one `insert` event with the number of added characters,
//!   whatever produced it. Shrinking or same-length changes produce nothing.
//! - A value going from non-empty to empty resets the whole session.
//!
//! Diagnostics never include key identifiers or input values.

use crate::clock::Clock;
use crate::config::CaptureConfig;
use crate::keystroke::host::{FormHost, HostEvent, InputSurface};
use crate::keystroke::session::Session;
use crate::precision::{round_ms, round_opt_ms};
use crate::types::{KeystrokeEvent, KeystrokeSummary, Millis, NO_FIRST_DOWN};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Whether a key identifier stands for a printable character.
///
/// Named keys such as `Shift`, `Backspace` or `Tab` are longer than one character.
pub fn is_printable(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some() && chars.next().is_none()
}

/// Capture engine bound to a single input
#[derive(Debug, Clone)]
pub struct KeystrokeLogger {
    surface: Option<InputSurface>,
    config: CaptureConfig,
    session: Session,
}

impl KeystrokeLogger {
    /// Bind a logger to an input.
    ///
    /// Without an input the logger is inert: it ignores every event and always
    /// reports an empty summary. This is not an error, since a form may
    /// legitimately lack the field.
    pub fn attach(surface: Option<InputSurface>, config: CaptureConfig) -> Self {
        let session = Session::new();

        match &surface {
            Some(input) => debug!(
                session = %session.id(),
                field = %config.field,
                input = %input.name,
                "Keystroke logger attached"
            ),
            None if config.warn_when_inert => warn!(
                field = %config.field,
                input = config.field.input_name(),
                "Input not found for keystroke logging; logger is inert"
            ),
            None => {}
        }

        Self {
            surface,
            config,
            session,
        }
    }

    /// Look up the configured field on `host` and attach to it
    pub fn attach_to<H: FormHost + ?Sized>(host: &H, config: CaptureConfig) -> Self {
        let surface = host.find_input(config.field.input_name());
        Self::attach(surface, config)
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&InputSurface> {
        self.surface.as_ref()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Id of the current session, regenerated on every reset
    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    /// Number of keys currently held down
    pub fn held_key_count(&self) -> usize {
        self.session.held_count()
    }

    /// Handle a key being pressed at clock reading `now`
    pub fn key_down(&mut self, key: &str, now: Millis) {
        if !self.is_attached() || self.session.is_held(key) {
            return;
        }

        let start = self.session.mark_activity(now);
        self.session.press(key, now);

        // Only measured once something has been recorded, so a stray early
        // key-down cannot seed a bogus interval
        let interval = match self.session.last_key_down() {
            Some(previous) if self.session.has_events() => Some(now - previous),
            _ => None,
        };

        if is_printable(key) {
            self.record(KeystrokeEvent::KeyDown {
                timestamp: round_ms(now - start),
                inter_key_down: round_opt_ms(interval),
            });
        }

        self.session.set_last_key_down(now);
    }

    /// Handle a key being released at clock reading `now`
    pub fn key_up(&mut self, key: &str, now: Millis) {
        if !self.is_attached() {
            return;
        }

        // A key-up without a matching key-down (focus moved mid-press) has no dwell time
        let dwell = self.session.release(key).map(|down| now - down);

        if is_printable(key) {
            let start = self.session.mark_activity(now);
            self.record(KeystrokeEvent::KeyUp {
                timestamp: round_ms(now - start),
                dwell_time: round_opt_ms(dwell),
            });
        }
    }

    /// Handle the input value changing to `value` at clock reading `now`
    pub fn value_changed(&mut self, value: &str, now: Millis) {
        if !self.is_attached() {
            return;
        }

        if !self.session.previous_value().is_empty() && value.is_empty() {
            debug!(
                session = %self.session.id(),
                field = %self.config.field,
                "Input cleared; resetting keystroke session"
            );
            self.session.clear();
        }

        let previous_len = self.session.previous_value().chars().count();
        let current_len = value.chars().count();

        if current_len > previous_len {
            let start = self.session.mark_activity(now);
            self.record(KeystrokeEvent::Insertion {
                timestamp: round_ms(now - start),
                inserted_len: current_len - previous_len,
            });
        }

        self.session.set_previous_value(value);
    }

    /// Summarize the session so far.
    ///
    /// Non-destructive: the session keeps running and may be summarized again.
    pub fn summary(&self) -> KeystrokeSummary {
        let events = self.session.events();

        let Some(last) = events.last() else {
            return KeystrokeSummary::empty();
        };

        let first_down = events
            .iter()
            .find(|event| event.starts_typing())
            .map(KeystrokeEvent::timestamp)
            .unwrap_or(NO_FIRST_DOWN);

        KeystrokeSummary {
            keystrokes: events.to_vec(),
            total_time: round_ms(last.timestamp() - first_down),
        }
    }

    /// Discard the session and start over
    pub fn reset(&mut self) {
        debug!(
            session = %self.session.id(),
            field = %self.config.field,
            events = self.session.events().len(),
            "Keystroke session reset"
        );
        self.session.clear();
    }

    /// Route a host event to its handler.
    ///
    /// Returns the current summary for [`HostEvent::Submit`].
    pub fn apply(&mut self, event: &HostEvent) -> Option<KeystrokeSummary> {
        match event {
            HostEvent::KeyDown { key, now } => self.key_down(key, *now),
            HostEvent::KeyUp { key, now } => self.key_up(key, *now),
            HostEvent::ValueChanged { value, now } => self.value_changed(value, *now),
            HostEvent::Submit => return Some(self.summary()),
        }
        None
    }

    fn record(&mut self, event: KeystrokeEvent) {
        trace!(
            session = %self.session.id(),
            kind = event.kind(),
            timestamp = event.timestamp(),
            "Keystroke recorded"
        );
        self.session.record(event);
    }
}

/// A logger that reads its timestamps from a [`Clock`]
#[derive(Debug)]
pub struct ClockedLogger<C: Clock> {
    logger: KeystrokeLogger,
    clock: C,
}

impl<C: Clock> ClockedLogger<C> {
    pub fn new(logger: KeystrokeLogger, clock: C) -> Self {
        Self { logger, clock }
    }

    pub fn key_down(&mut self, key: &str) {
        let now = self.clock.now_ms();
        self.logger.key_down(key, now);
    }

    pub fn key_up(&mut self, key: &str) {
        let now = self.clock.now_ms();
        self.logger.key_up(key, now);
    }

    pub fn value_changed(&mut self, value: &str) {
        let now = self.clock.now_ms();
        self.logger.value_changed(value, now);
    }

    pub fn summary(&self) -> KeystrokeSummary {
        self.logger.summary()
    }

    pub fn reset(&mut self) {
        self.logger.reset();
    }

    pub fn logger(&self) -> &KeystrokeLogger {
        &self.logger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_inner(self) -> KeystrokeLogger {
        self.logger
    }
}
