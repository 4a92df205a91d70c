//! Windowed pool of text groups being reconstructed from the mapping
//! stream.
//!
//! Mappings arrive roughly grouped by document, but ungrouping range
//! records can interleave a handful of neighbouring groups. The pool
//! therefore holds every group open until the stream has moved several
//! group-change events past its last touch, then releases it for output.

use std::collections::HashMap;

use core_mapping::Mapping;

/// Group-change events a group must stay untouched before it may flush.
pub const DEFAULT_READY_WINDOW: i64 = 3;

/// A reconstructed list of mappings belonging to one document.
pub struct TextGroup {
    pub id: String,
    mappings: Vec<Mapping>,
    step_found: i64,
    step_last: i64,
}

impl TextGroup {
    fn new(id: &str, mapping: Mapping, step: i64) -> Self {
        Self {
            id: id.to_string(),
            mappings: vec![mapping],
            step_found: step,
            step_last: step,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

pub struct TextGroupPool {
    data: HashMap<String, TextGroup>,
    last_group: String,
    num_switches: i64,
    ready_window: i64,
}

impl TextGroupPool {
    pub fn new() -> Self {
        Self::with_ready_window(DEFAULT_READY_WINDOW)
    }

    pub fn with_ready_window(ready_window: i64) -> Self {
        Self {
            data: HashMap::new(),
            last_group: String::new(),
            num_switches: -1,
            ready_window,
        }
    }

    /// Appends a mapping to its group, creating the group on first sight,
    /// and counts group-change events.
    pub fn add(&mut self, group_id: &str, mapping: Mapping) {
        if group_id != self.last_group {
            self.num_switches += 1;
            self.last_group = group_id.to_string();
        }
        match self.data.get_mut(group_id) {
            Some(group) => {
                group.mappings.push(mapping);
                group.step_last = self.num_switches;
            }
            None => {
                self.data.insert(
                    group_id.to_string(),
                    TextGroup::new(group_id, mapping, self.num_switches),
                );
            }
        }
    }

    /// Removes and returns the oldest group whose last touch is at least
    /// the ready window behind the stream, or `None` when every group is
    /// still within the window.
    pub fn pop_next_ready(&mut self) -> Option<TextGroup> {
        let mut min_found = self.num_switches;
        let mut min_key: Option<String> = None;
        for (key, group) in &self.data {
            if self.num_switches - group.step_last >= self.ready_window
                && group.step_found <= min_found
            {
                min_found = group.step_found;
                min_key = Some(key.clone());
            }
        }
        min_key.and_then(|key| self.data.remove(&key))
    }

    /// Removes and returns the oldest group unconditionally; used to drain
    /// the pool at end of stream.
    pub fn pop_oldest(&mut self) -> Option<TextGroup> {
        let key = self
            .data
            .iter()
            .min_by_key(|(_, group)| group.step_found)
            .map(|(key, _)| key.clone())?;
        self.data.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for TextGroupPool {
    fn default() -> Self {
        Self::new()
    }
}
