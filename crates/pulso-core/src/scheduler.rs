//! Per-sample tick scheduling.
//!
//! Positions are expressed in tick units: quarter-note position × 24.
//! The scheduler decides, one sample at a time, whether the integer
//! tick counter has advanced past the last fired tick, clamped by the
//! spacing limits the playable tempo range implies. It never looks at
//! the audio clock directly; all timing comes from the caller's
//! musical-position estimate.

use libm::floor;

use crate::config::TempoRange;

/// Ticks emitted per quarter note.
pub const TICKS_PER_QUARTER: u32 = 24;

/// Decides when ticks fire.
///
/// `last_tick` is the number of the last boundary tick fired, -1 when
/// unknown (fresh sync or timeline jump). `samples_since` counts audio
/// samples since any tick fired and enforces the spacing clamp.
#[derive(Clone, Copy, Debug)]
pub struct TickScheduler {
    last_tick: i64,
    samples_since: i64,
    one_second: i64,
    min_spacing: i64,
    max_spacing: i64,
    fired: u64,
}

impl TickScheduler {
    /// Create a scheduler prepared for 44.1 kHz and the default range.
    pub fn new() -> Self {
        let mut scheduler = Self {
            last_tick: -1,
            samples_since: 0,
            one_second: 0,
            min_spacing: 0,
            max_spacing: i64::MAX,
            fired: 0,
        };
        scheduler.prepare(44_100.0, TempoRange::default());
        scheduler
    }

    /// Derive spacing limits for a sample rate and tempo range, and
    /// reset all tick state.
    pub fn prepare(&mut self, sample_rate: f64, tempo: TempoRange) {
        let sample_rate = sample_rate.max(1.0);
        let samples_per_minute = sample_rate * 60.0;
        let per_quarter = f64::from(TICKS_PER_QUARTER);
        self.one_second = sample_rate as i64;
        self.min_spacing = (samples_per_minute / (tempo.max() * per_quarter)) as i64;
        self.max_spacing = (samples_per_minute / (tempo.min() * per_quarter)) as i64;
        self.last_tick = -1;
        self.samples_since = 0;
        self.fired = 0;
    }

    /// Forget the tick numbering after a timeline jump. The next tick
    /// re-initializes from the boundary window instead of chasing the
    /// counter.
    pub fn invalidate(&mut self) {
        self.last_tick = -1;
    }

    /// Called when bar sync is acquired: pretend a full second has
    /// passed so the first tick is never spacing-suppressed, and drop
    /// any stale tick number.
    pub fn on_acquire(&mut self) {
        self.samples_since = self.one_second;
        self.last_tick = -1;
    }

    /// Count one elapsed audio sample.
    pub fn count_sample(&mut self) {
        self.samples_since += 1;
    }

    /// Decide whether a tick fires at this sample.
    ///
    /// `tick_pos` is the musical position in tick units, `tolerance`
    /// the boundary window in the same units (the caller derives both
    /// per block). With `eighth_note` set an intermediate tick also
    /// fires halfway between boundaries, doubling the density without
    /// advancing the tick counter.
    pub fn advance(&mut self, tick_pos: f64, tolerance: f64, eighth_note: bool) -> bool {
        let base = floor(tick_pos);
        let current = base as i64;
        let frac = tick_pos - base;

        let due = if self.last_tick < 0 {
            // Just past a boundary; adopt its number.
            frac <= tolerance
        } else {
            current > self.last_tick
        };

        if due {
            if self.samples_since >= self.min_spacing {
                self.last_tick = current;
                return self.fire();
            }
        } else if self.samples_since >= self.max_spacing {
            // Stalled estimate; keep the hardware clocked anyway.
            self.last_tick = if self.last_tick < 0 { current } else { self.last_tick + 1 };
            return self.fire();
        } else if eighth_note
            && self.last_tick == current
            && frac >= 0.5
            && frac - 0.5 <= tolerance
            && self.samples_since >= self.min_spacing
        {
            // Intermediate tick: fires between boundaries, counter
            // untouched. Only valid numbering qualifies; the halfway
            // window never re-initializes it.
            return self.fire();
        }
        false
    }

    fn fire(&mut self) -> bool {
        self.samples_since = 0;
        self.fired += 1;
        true
    }

    /// Smallest legal gap between ticks, in samples.
    pub fn min_spacing(&self) -> i64 {
        self.min_spacing
    }

    /// Largest gap before a tick is forced, in samples.
    pub fn max_spacing(&self) -> i64 {
        self.max_spacing
    }

    /// Ticks fired since the last prepare.
    pub fn total_fired(&self) -> u64 {
        self.fired
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}
