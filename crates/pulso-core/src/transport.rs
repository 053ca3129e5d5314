//! Host transport snapshots and playback continuity tracking.
//!
//! The host hands the engine one [`PositionSnapshot`] per audio block.
//! Every field the host might not know is optional; the engine degrades
//! rather than failing when fields are absent.

use crate::meter::TimeSignature;

/// Transport state captured from the host at the start of a block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionSnapshot {
    /// Transport is playing.
    pub is_playing: bool,
    /// Transport is recording. Recording counts as rolling.
    pub is_recording: bool,
    /// Host tempo in BPM, if known.
    pub bpm: Option<f64>,
    /// Host time signature, if known.
    pub time_signature: Option<TimeSignature>,
    /// Musical position in quarter notes since timeline zero. Negative
    /// during count-in pre-roll.
    pub ppq_position: Option<f64>,
    /// Musical position of the most recent bar start, in quarter notes.
    pub bar_start_ppq: Option<f64>,
    /// Timeline samples elapsed since play start, if the host reports it.
    pub elapsed_samples: Option<i64>,
}

impl PositionSnapshot {
    /// Playing or recording. Tick scheduling runs only while rolling.
    pub fn is_rolling(&self) -> bool {
        self.is_playing || self.is_recording
    }
}

/// Elapsed-sample continuity checker.
///
/// Each block the host's `elapsed_samples` is compared against the
/// position the previous block predicted. A mismatch means the
/// timeline jumped (seek, loop wrap, restart) and tick numbering can
/// no longer be trusted.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportTracker {
    expected_next: Option<i64>,
}

/// Jitter allowance between predicted and reported elapsed samples.
const ELAPSED_TOLERANCE: i64 = 2;

impl TransportTracker {
    /// Create a tracker with no expectation yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the current expectation (stream restart).
    pub fn reset(&mut self) {
        self.expected_next = None;
    }

    /// Feed one block's elapsed-sample report.
    ///
    /// Returns `true` when the block is discontinuous with the previous
    /// one. An absent report cannot assert continuity and counts as
    /// discontinuous; the expectation is left untouched.
    pub fn observe(&mut self, elapsed_samples: Option<i64>, block_len: usize) -> bool {
        let Some(elapsed) = elapsed_samples else {
            return true;
        };

        let discontinuous = match self.expected_next {
            Some(expected) => (elapsed - expected).abs() > ELAPSED_TOLERANCE,
            None => true,
        };
        self.expected_next = Some(elapsed + block_len as i64);
        discontinuous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_report_is_discontinuous() {
        let mut tracker = TransportTracker::new();
        assert!(tracker.observe(Some(0), 512), "no expectation yet");
    }

    #[test]
    fn contiguous_blocks_are_continuous() {
        let mut tracker = TransportTracker::new();
        tracker.observe(Some(0), 512);
        assert!(!tracker.observe(Some(512), 512));
        assert!(!tracker.observe(Some(1024), 256));
        assert!(!tracker.observe(Some(1280), 512));
    }

    #[test]
    fn small_jitter_is_tolerated() {
        let mut tracker = TransportTracker::new();
        tracker.observe(Some(0), 512);
        assert!(!tracker.observe(Some(514), 512), "+2 samples is jitter");
        assert!(!tracker.observe(Some(1024), 512), "-2 samples is jitter");
    }

    #[test]
    fn jumps_are_flagged() {
        let mut tracker = TransportTracker::new();
        tracker.observe(Some(0), 512);
        assert!(tracker.observe(Some(5512), 512), "seek forward");
        assert!(!tracker.observe(Some(6024), 512), "contiguous after seek");
        assert!(tracker.observe(Some(0), 512), "loop wrap to start");
    }

    #[test]
    fn absent_report_is_discontinuous() {
        let mut tracker = TransportTracker::new();
        tracker.observe(Some(0), 512);
        assert!(tracker.observe(None, 512), "continuity cannot be asserted");
        // The expectation was not advanced past the untracked block,
        // so the next report is flagged once more before settling.
        assert!(tracker.observe(Some(1024), 512));
        assert!(!tracker.observe(Some(1536), 512));
    }

    #[test]
    fn reset_forgets_expectation() {
        let mut tracker = TransportTracker::new();
        tracker.observe(Some(0), 512);
        tracker.reset();
        assert!(tracker.observe(Some(512), 512), "reset drops continuity");
    }

    #[test]
    fn rolling_includes_recording() {
        let playing = PositionSnapshot {
            is_playing: true,
            ..PositionSnapshot::default()
        };
        let recording = PositionSnapshot {
            is_recording: true,
            ..PositionSnapshot::default()
        };
        assert!(playing.is_rolling());
        assert!(recording.is_rolling());
        assert!(!PositionSnapshot::default().is_rolling());
    }
}
