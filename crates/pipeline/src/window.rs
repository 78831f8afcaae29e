//! Bounded FIFO of recent fingerprints for cross-message dedup.

use std::collections::VecDeque;

use crate::dedup::{is_duplicate, DUPLICATE_THRESHOLD};

/// Default number of recent fingerprints retained.
pub const DEFAULT_WINDOW_SIZE: usize = 1000;

/// A bounded FIFO of recently accepted simhash fingerprints.
///
/// Lookup is a linear scan; the window is small by design, so a
/// locality-sensitive index would be unwarranted here.
#[derive(Debug)]
pub struct DedupWindow {
    window: VecDeque<String>,
    capacity: usize,
}

impl DedupWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// True when any stored fingerprint is a near-duplicate of `simhash`.
    pub fn contains(&self, simhash: &str) -> bool {
        self.window
            .iter()
            .any(|seen| is_duplicate(simhash, seen, DUPLICATE_THRESHOLD))
    }

    /// Record a fingerprint, evicting the oldest at capacity.
    pub fn push(&mut self, simhash: String) {
        if self.capacity == 0 {
            return;
        }
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(simhash);
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
