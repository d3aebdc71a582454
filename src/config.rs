//! Timing and channel policy for a stack.
//!
//! The latch (`R_CLK`) line must be held low for at least 40 ms before new data
//! is clocked in, otherwise the cards ignore the following rising edge. The
//! settle delay after latching gives the relay contacts time to close before the
//! fault line is sampled; it is recommended but not required by the hardware.

use fugit::MillisDurationU32;

/// Shortest latch-low period the cards accept.
pub const LATCH_LOW_MIN: MillisDurationU32 = MillisDurationU32::millis(40);

/// Default relay settle time after latching.
pub const SETTLE_DEFAULT: MillisDurationU32 = MillisDurationU32::millis(5);

/// Delays applied by the commit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitTiming {
    pub(crate) latch_low: MillisDurationU32,
    pub(crate) settle: MillisDurationU32,
}

impl Default for CommitTiming {
    fn default() -> Self {
        Self {
            latch_low: LATCH_LOW_MIN,
            settle: SETTLE_DEFAULT,
        }
    }
}

impl CommitTiming {
    /// Create a new `CommitTiming`.
    ///
    /// A `latch_low` shorter than [`LATCH_LOW_MIN`] is raised to the minimum.
    pub fn new(latch_low: MillisDurationU32, settle: MillisDurationU32) -> Self {
        Self {
            latch_low: latch_low.max(LATCH_LOW_MIN),
            settle,
        }
    }

    /// Time the latch lines are held low before the payload is shifted in,
    /// never less than [`LATCH_LOW_MIN`].
    pub fn latch_low(&self) -> MillisDurationU32 {
        self.latch_low.max(LATCH_LOW_MIN)
    }

    /// Time allowed for the relays to settle before the fault line is sampled.
    pub fn settle(&self) -> MillisDurationU32 {
        self.settle
    }
}

/// Configuration of a [`MuxStack`](crate::stack::MuxStack).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MuxConfig {
    pub(crate) timing: CommitTiming,
    pub(crate) reject_unrecognized: bool,
}

impl MuxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch-low period, never below [`LATCH_LOW_MIN`].
    pub fn with_latch_low(mut self, latch_low: MillisDurationU32) -> Self {
        self.timing = CommitTiming::new(latch_low, self.timing.settle);
        self
    }

    /// Set the relay settle time. Zero skips the wait.
    pub fn with_settle(mut self, settle: MillisDurationU32) -> Self {
        self.timing.settle = settle;
        self
    }

    pub fn with_timing(mut self, timing: CommitTiming) -> Self {
        self.timing = CommitTiming::new(timing.latch_low, timing.settle);
        self
    }

    /// Refuse pin pairs that do not select a channel instead of clearing the card.
    ///
    /// Off by default: an unrecognised pair clears the addressed card and only a
    /// warning is logged.
    pub fn reject_unrecognized(mut self, reject: bool) -> Self {
        self.reject_unrecognized = reject;
        self
    }

    pub fn timing(&self) -> CommitTiming {
        self.timing
    }

    /// Whether unrecognised pin pairs are refused with an error.
    pub fn rejects_unrecognized(&self) -> bool {
        self.reject_unrecognized
    }
}
