//! Bounded, newest-first buffer of plate events.

use std::collections::VecDeque;

use anpr_console_core::constants::EVENT_BUFFER_CAPACITY;

use crate::event::PlateEvent;

/// What a merge did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// An entry with the same id was overlaid in place.
    Updated(usize),
    /// The event was prepended as the newest entry.
    Inserted,
}

/// Newest-first event list that never grows past its capacity.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<PlateEvent>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUFFER_CAPACITY)
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Merges one incoming event.
    ///
    /// An event whose id matches a buffered entry overlays that entry without
    /// moving it. Anything else, including every event without an id, is
    /// prepended. The oldest entries are dropped past capacity.
    pub fn merge(&mut self, event: PlateEvent) -> MergeOutcome {
        let existing = event
            .id
            .and_then(|id| self.events.iter().position(|e| e.id == Some(id)));

        let outcome = match existing {
            Some(index) => {
                self.events[index].overlay(event);
                MergeOutcome::Updated(index)
            }
            None => {
                self.events.push_front(event);
                MergeOutcome::Inserted
            }
        };
        self.events.truncate(self.capacity);
        outcome
    }

    /// Installs a fresh list verbatim, keeping server order.
    pub fn replace(&mut self, events: impl IntoIterator<Item = PlateEvent>) {
        self.events.clear();
        self.events.extend(events.into_iter().take(self.capacity));
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn get(&self, index: usize) -> Option<&PlateEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlateEvent> {
        self.events.iter()
    }

    /// Owned copy, newest first.
    pub fn snapshot(&self) -> Vec<PlateEvent> {
        self.events.iter().cloned().collect()
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new()
    }
}
