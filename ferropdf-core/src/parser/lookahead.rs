//! Indirect-reference lookahead
//!
//! `12 0 R` is only distinguishable from two integers and a keyword by
//! looking ahead, so integers parsed in document contexts are staged in a
//! small FIFO until the following token settles what they were. The buffer
//! is bounded at three slots: once a third integer arrives, the oldest can
//! no longer be the start of a reference and is released. Content-stream
//! grammar never goes through this buffer.

use std::collections::VecDeque;

/// Maximum number of staged integers.
pub const LOOKAHEAD_CAPACITY: usize = 3;

/// Bounded FIFO of integers pending reference disambiguation.
#[derive(Debug, Default)]
pub struct LookaheadBuffer {
    pending: VecDeque<i64>,
}

impl LookaheadBuffer {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(LOOKAHEAD_CAPACITY),
        }
    }

    /// Stage an integer. Returns the force-flushed oldest entry when the
    /// buffer reaches capacity.
    pub fn push(&mut self, value: i64) -> Option<i64> {
        self.pending.push_back(value);
        if self.pending.len() == LOOKAHEAD_CAPACITY {
            self.pending.pop_front()
        } else {
            None
        }
    }

    /// Number of staged integers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the two most recent entries as (object number, generation)
    /// when an `R` keyword arrives. Older entries stay staged.
    pub fn take_reference_pair(&mut self) -> Option<(i64, i64)> {
        if self.pending.len() < 2 {
            return None;
        }
        let generation = self.pending.pop_back().expect("len checked");
        let number = self.pending.pop_back().expect("len checked");
        Some((number, generation))
    }

    /// Release exactly the oldest staged integer. A disambiguating token
    /// flushes one element at a time, not the whole buffer.
    pub fn flush_oldest(&mut self) -> Option<i64> {
        self.pending.pop_front()
    }

    /// Take the most recently staged integer. Used when staged numbers
    /// are returned to the token stream during resynchronization.
    pub fn take_newest(&mut self) -> Option<i64> {
        self.pending.pop_back()
    }

    /// Drop all staged integers (context teardown).
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
