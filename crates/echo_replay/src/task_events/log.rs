//! Append-only event log with a half-open replay window.

use serde::Serialize;

use crate::replay_error::ReplayAnomaly;

/// Cursor value of a fresh or cleared log. Negative infinity so that an event
/// stamped at exactly 0.0 (first frame of a scene) still falls inside the
/// first window.
pub const INITIAL_CURSOR: f32 = f32::NEG_INFINITY;

pub trait Timestamped {
    fn timestamp(&self) -> f32;
}

/// Events in producer order plus the time already applied.
#[derive(Debug, Clone, Serialize)]
pub struct EventLog<E> {
    events: Vec<E>,
    #[serde(skip)]
    cursor: f32,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            cursor: INITIAL_CURSOR,
        }
    }
}

impl<E: Timestamped + Copy> EventLog<E> {
    /// Append `event`. Producers are trusted to append in non-decreasing time
    /// order; a violation is reported but the event is still kept as given.
    pub fn append(&mut self, event: E) -> Option<ReplayAnomaly> {
        let out_of_order = self
            .events
            .last()
            .map(Timestamped::timestamp)
            .filter(|previous| event.timestamp() < *previous)
            .map(|previous| ReplayAnomaly::OutOfOrder {
                timestamp: event.timestamp(),
                previous,
            });
        self.events.push(event);
        out_of_order
    }

    /// Drop every event and rewind the cursor.
    pub fn clear(&mut self) {
        self.events.clear();
        self.cursor = INITIAL_CURSOR;
    }

    /// Rewind the cursor, keeping the events.
    pub fn rewind(&mut self) {
        self.cursor = INITIAL_CURSOR;
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }

    /// Events with `cursor < timestamp <= now`, in log order, then advance the
    /// cursor to `now`. A `now` behind the cursor yields nothing and leaves
    /// the cursor where it is.
    pub fn take_window(&mut self, now: f32) -> Vec<E> {
        if now < self.cursor {
            return Vec::new();
        }
        let cursor = self.cursor;
        let window = self
            .events
            .iter()
            .filter(|e| e.timestamp() > cursor && e.timestamp() <= now)
            .copied()
            .collect();
        self.cursor = now;
        window
    }
}
