//! WAV output for rendered pulse trains.

use std::path::Path;

use hound::{SampleFormat, WavWriter};

/// Output file specification.
#[derive(Debug, Clone, Copy)]
pub struct WavSpec {
    /// Number of audio channels; the mono pulse is duplicated across
    /// all of them.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24, or 32).
    pub bits_per_sample: u16,
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Write a mono pulse train, duplicating it across `spec.channels`.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> hound::Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
    let copies = usize::from(spec.channels);

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            for _ in 0..copies {
                writer.write_sample(sample)?;
            }
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            let quantized = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            for _ in 0..copies {
                writer.write_sample(quantized)?;
            }
        }
    }

    writer.finalize()
}
