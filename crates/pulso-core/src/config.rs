//! Engine configuration.

/// Default lowest tempo the hardware can follow, in BPM.
pub const DEFAULT_MIN_BPM: f64 = 30.0;

/// Default highest tempo the hardware can follow, in BPM.
pub const DEFAULT_MAX_BPM: f64 = 400.0;

/// Playable tempo range.
///
/// Tempi outside the range are treated like an absent tempo: no sync,
/// no ticks, no tempo telegrams.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoRange {
    min: f64,
    max: f64,
}

impl TempoRange {
    /// Create a range. Reversed bounds are swapped.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lowest playable BPM.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Highest playable BPM.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Whether `bpm` is playable.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pulso_core::TempoRange;
    ///
    /// let range = TempoRange::default();
    /// assert!(range.contains(120.0));
    /// assert!(!range.contains(20.0));
    /// assert!(!range.contains(500.0));
    /// ```
    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.min && bpm <= self.max
    }
}

impl Default for TempoRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_BPM,
            max: DEFAULT_MAX_BPM,
        }
    }
}

/// Static engine configuration, fixed for the lifetime of a stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Playable tempo range.
    pub tempo: TempoRange,
    /// Peak amplitude of the tick pulse, in linear gain.
    pub pulse_peak: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tempo: TempoRange::default(),
            pulse_peak: 0.9,
        }
    }
}
