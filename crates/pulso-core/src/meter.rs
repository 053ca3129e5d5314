//! Time signature and meter derivation.
//!
//! Converts a host time signature into the beats-per-bar value the
//! hardware expects, including the ×/8 special case that doubles tick
//! density.

use libm::round;

/// A musical time signature as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSignature {
    /// Beats per bar as written (top number).
    pub numerator: u32,
    /// Beat unit as written (bottom number).
    pub denominator: u32,
}

impl TimeSignature {
    /// Create a time signature. Zero components are clamped to 1.
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator: numerator.max(1),
            denominator: denominator.max(1),
        }
    }

    /// Bar length in quarter notes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pulso_core::TimeSignature;
    ///
    /// assert!((TimeSignature::new(4, 4).bar_length_quarters() - 4.0).abs() < 1e-12);
    /// assert!((TimeSignature::new(6, 8).bar_length_quarters() - 3.0).abs() < 1e-12);
    /// ```
    pub fn bar_length_quarters(&self) -> f64 {
        4.0 * f64::from(self.numerator) / f64::from(self.denominator)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl core::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Meter as the sync hardware understands it.
///
/// `beats_per_bar` counts quarter notes per bar, except in ×/8 meters
/// where the raw numerator is kept (counting eighths) and
/// `eighth_note` is set. Eighth-note mode doubles the tick density and
/// doubles the BPM value reported in tempo telegrams.
///
/// # Example
///
/// ```rust
/// use pulso_core::{Meter, TimeSignature};
///
/// let common = Meter::from_signature(TimeSignature::new(4, 4));
/// assert_eq!(common.beats_per_bar, 4);
/// assert!(!common.eighth_note);
///
/// let compound = Meter::from_signature(TimeSignature::new(6, 8));
/// assert_eq!(compound.beats_per_bar, 6);
/// assert!(compound.eighth_note);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Meter {
    /// Beats per bar in the unit the hardware counts.
    pub beats_per_bar: u32,
    /// ×/8 meter: double tick density, double reported BPM.
    pub eighth_note: bool,
}

impl Meter {
    /// Derive the meter from a host time signature.
    pub fn from_signature(sig: TimeSignature) -> Self {
        if sig.denominator == 8 {
            Self {
                beats_per_bar: sig.numerator.max(1),
                eighth_note: true,
            }
        } else {
            Self {
                // Integer arithmetic on purpose: 7/4 -> 7, 2/2 -> 4.
                // Saturating, since the numerator is host input.
                beats_per_bar: (sig.numerator.saturating_mul(4) / sig.denominator.max(1)).max(1),
                eighth_note: false,
            }
        }
    }

    /// BPM value to report in tempo telegrams, rounded to the nearest
    /// integer and doubled in eighth-note mode.
    pub fn reported_bpm(&self, bpm: f64) -> u32 {
        let rounded = round(bpm.max(0.0)) as u32;
        if self.eighth_note { rounded.saturating_mul(2) } else { rounded }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self {
            beats_per_bar: 4,
            eighth_note: false,
        }
    }
}
