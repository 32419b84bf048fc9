//! Cross-segment timeline
//!
//! Word boundary offsets arrive relative to each segment's own audio. To
//! present one continuous timeline, every segment's events are shifted by
//! the total duration of the segments before it.

use parking_lot::Mutex;

/// Pad added after a segment's last word when measuring its total
/// duration, in 100 ns ticks.
pub(crate) const WORD_BOUNDARY_PAD: u64 = 8_750_000;

/// Shared duration accumulator, one per request.
///
/// Every session writes only its own slot and sums only slots before it, so
/// a single lock over the whole table is enough. A slot that has not seen
/// its first word boundary yet contributes zero to later segments' shifts;
/// a segment's shift is computed once, at its first word boundary, and
/// reused for the rest of its events.
#[derive(Debug)]
pub(crate) struct Timeline {
    durations: Mutex<Vec<u64>>,
}

impl Timeline {
    pub fn new(segments: usize) -> Self {
        Self {
            durations: Mutex::new(vec![0; segments]),
        }
    }

    /// Records the running duration of `segment`: its last word's offset
    /// plus duration plus [`WORD_BOUNDARY_PAD`]. Overwritten on every word
    /// boundary so the final write is the segment's total.
    pub fn record(&self, segment: usize, end: u64) {
        self.durations.lock()[segment] = end;
    }

    /// Sum of the recorded durations of all segments before `segment`.
    pub fn shift_before(&self, segment: usize) -> u64 {
        self.durations.lock()[..segment].iter().sum()
    }
}
