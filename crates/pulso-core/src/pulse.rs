//! Tick pulse waveform generator.
//!
//! Each scheduled tick is rendered as one short pulse: a 4-sample
//! attack ramp, a plateau at peak amplitude, and a 15-sample release
//! ramp back to zero. Sync boxes trigger on the rising edge; the ramps
//! keep the edge free of clicks on the analog side.

/// Pulse length in samples at sample rates up to 50 kHz.
const BASE_LENGTH: i32 = 24;

/// Samples spent in the attack ramp.
const ATTACK_SAMPLES: i32 = 4;

/// Samples spent in the release ramp.
const RELEASE_SAMPLES: i32 = 15;

/// Renders one tick pulse sample-by-sample.
///
/// The generator is driven every sample; it returns 0.0 while idle.
/// A pulse started with [`start`](Self::start) runs to completion even
/// if the transport stops, so the hardware always sees a full edge.
#[derive(Clone, Copy, Debug)]
pub struct PulseGenerator {
    length: i32,
    peak: f32,
    idx: i32,
    active: bool,
}

impl PulseGenerator {
    /// Create a generator with the base pulse length and default peak.
    pub fn new() -> Self {
        Self {
            length: BASE_LENGTH,
            peak: 0.9,
            idx: 0,
            active: false,
        }
    }

    /// Derive the pulse length from the sample rate and reset.
    ///
    /// The pulse keeps a roughly constant duration in wall time: 24
    /// samples up to 50 kHz, doubled above 50 kHz, doubled again above
    /// 100 kHz.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.length = BASE_LENGTH;
        if sample_rate > 50_000.0 {
            self.length *= 2;
        }
        if sample_rate > 100_000.0 {
            self.length *= 2;
        }
        self.idx = 0;
        self.active = false;
    }

    /// Set the peak amplitude in linear gain.
    pub fn set_peak(&mut self, peak: f32) {
        self.peak = peak;
    }

    /// Begin a new pulse on the next sample.
    pub fn start(&mut self) {
        self.active = true;
        self.idx = 0;
    }

    /// A pulse is currently being rendered.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pulse length in samples at the prepared rate.
    pub fn length(&self) -> usize {
        self.length as usize
    }

    /// Produce the next pulse sample, advancing the envelope.
    pub fn next_sample(&mut self) -> f32 {
        if !self.active {
            self.idx = 0;
            return 0.0;
        }

        self.idx += 1;
        if self.idx < ATTACK_SAMPLES {
            return self.idx as f32 * self.peak / ATTACK_SAMPLES as f32;
        }

        let before_end = self.length - self.idx;
        if before_end <= 0 {
            self.active = false;
            self.idx = 0;
            return 0.0;
        }
        if before_end < RELEASE_SAMPLES {
            return before_end as f32 * self.peak / RELEASE_SAMPLES as f32;
        }
        self.peak
    }
}

impl Default for PulseGenerator {
    fn default() -> Self {
        Self::new()
    }
}
