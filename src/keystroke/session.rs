//! Mutable state of one typing session
//!
//! A session lives from the moment a logger attaches until the next reset,
//! whether explicit or triggered by the input being cleared. Held keys are
//! tracked in a single map from key identifier to key-down time: a key is held
//! exactly when it is present in the map.

use crate::types::{KeystrokeEvent, Millis};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    /// Correlation id for diagnostics, regenerated on every reset
    id: Uuid,
    /// Recorded events in arrival order
    events: Vec<KeystrokeEvent>,
    /// Clock reading of the first activity, if any
    typing_start: Option<Millis>,
    /// Clock reading of the most recent accepted key-down, printable or not
    last_key_down: Option<Millis>,
    /// Keys currently held, with their key-down readings
    held: HashMap<String, Millis>,
    /// Last observed input value, used only for length diffs
    previous_value: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            events: Vec::new(),
            typing_start: None,
            last_key_down: None,
            held: HashMap::new(),
            previous_value: String::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn events(&self) -> &[KeystrokeEvent] {
        &self.events
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn typing_start(&self) -> Option<Millis> {
        self.typing_start
    }

    /// Note activity at `now`, fixing the typing start on first call.
    ///
    /// Returns the typing start of the session.
    pub fn mark_activity(&mut self, now: Millis) -> Millis {
        *self.typing_start.get_or_insert(now)
    }

    pub fn record(&mut self, event: KeystrokeEvent) {
        self.events.push(event);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains_key(key)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Mark `key` as held since `now`
    pub fn press(&mut self, key: &str, now: Millis) {
        self.held.insert(key.to_string(), now);
    }

    /// Release `key`, returning its key-down reading if it was held
    pub fn release(&mut self, key: &str) -> Option<Millis> {
        self.held.remove(key)
    }

    pub fn last_key_down(&self) -> Option<Millis> {
        self.last_key_down
    }

    pub fn set_last_key_down(&mut self, now: Millis) {
        self.last_key_down = Some(now);
    }

    pub fn previous_value(&self) -> &str {
        &self.previous_value
    }

    pub fn set_previous_value(&mut self, value: &str) {
        self.previous_value.clear();
        self.previous_value.push_str(value);
    }

    /// Drop all state and start a fresh session
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_start_is_set_once() {
        let mut session = Session::new();
        assert_eq!(session.typing_start(), None);

        assert_eq!(session.mark_activity(120.0), 120.0);
        assert_eq!(session.mark_activity(300.0), 120.0);
        assert_eq!(session.typing_start(), Some(120.0));
    }

    #[test]
    fn test_press_and_release() {
        let mut session = Session::new();
        session.press("a", 10.0);
        session.press("Shift", 12.0);

        assert!(session.is_held("a"));
        assert_eq!(session.held_count(), 2);

        assert_eq!(session.release("a"), Some(10.0));
        assert_eq!(session.release("a"), None);
        assert!(!session.is_held("a"));
        assert_eq!(session.held_count(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = Session::new();
        let id = session.id();

        session.mark_activity(5.0);
        session.press("a", 5.0);
        session.set_last_key_down(5.0);
        session.set_previous_value("abc");
        session.record(KeystrokeEvent::Insertion {
            timestamp: 0.0,
            inserted_len: 3,
        });

        session.clear();

        assert_ne!(session.id(), id);
        assert!(!session.has_events());
        assert_eq!(session.typing_start(), None);
        assert_eq!(session.last_key_down(), None);
        assert_eq!(session.held_count(), 0);
        assert_eq!(session.previous_value(), "");
    }
}
