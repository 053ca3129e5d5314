//! Bar-boundary sync acquisition.
//!
//! The hardware counts its own bars once clocked, so the pulse train
//! must start exactly on a DAW bar line: pulse 1 on the hardware then
//! lands on beat 1 in the session. [`BarSync`] watches the bar-relative
//! position and latches once it passes within tolerance of a bar line.

use libm::fmod;

/// Latches sync on at a bar boundary, off on stop.
#[derive(Clone, Copy, Debug, Default)]
pub struct BarSync {
    started: bool,
}

impl BarSync {
    /// Create an unsynced detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync has been acquired and not lost since.
    pub fn is_synced(&self) -> bool {
        self.started
    }

    /// Test the current position against the bar grid.
    ///
    /// `bar_relative_ppq` is the quarter-note position relative to the
    /// last bar start, `beats_per_bar` the bar length in the same unit,
    /// and `tolerance` how far past a bar line (in quarter notes) still
    /// counts as "on" it. The window is one-sided: acquisition happens
    /// on or just after the line, never before it, so the first tick
    /// always lands on the bar. Returns `true` on the transition into
    /// sync.
    pub fn try_acquire(&mut self, bar_relative_ppq: f64, beats_per_bar: f64, tolerance: f64) -> bool {
        if self.started || beats_per_bar <= 0.0 {
            return false;
        }

        let mut residual = fmod(bar_relative_ppq, beats_per_bar);
        if residual < 0.0 {
            residual += beats_per_bar;
        }
        if residual <= tolerance {
            self.started = true;
            return true;
        }
        false
    }

    /// Drop sync (stop, unplayable tempo). Re-acquired at the next bar.
    pub fn lose(&mut self) {
        self.started = false;
    }
}
