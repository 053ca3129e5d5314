//! Session profiles: a scripted transport timeline as TOML.
//!
//! A profile describes what the host transport does over time: spans of
//! playing or stopped transport with tempo, meter, seeks and record
//! state. The [`Timeline`](crate::timeline::Timeline) replays it
//! block by block for the engine.

use std::path::{Path, PathBuf};

use pulso_core::{EngineConfig, TempoRange, TimeSignature};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a session profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Profile file could not be read.
    #[error("failed to read profile '{path}': {source}")]
    Read {
        /// Path of the profile that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Profile file is not valid TOML.
    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    /// A time signature string did not parse.
    #[error("invalid time signature '{0}' (expected e.g. \"4/4\")")]
    InvalidSignature(String),

    /// A tempo is zero, negative or not a number.
    #[error("tempo {0} BPM is not usable")]
    InvalidTempo(f64),

    /// The sample rate is zero, negative or not a number.
    #[error("sample rate {0} is not usable")]
    InvalidSampleRate(f64),

    /// The block size is zero.
    #[error("block size must be nonzero")]
    InvalidBlockSize,

    /// A segment's fields contradict each other.
    #[error("segment {index}: {reason}")]
    InvalidSegment {
        /// Zero-based index of the offending segment.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The profile has no segments.
    #[error("profile has no segments")]
    Empty,
}

/// Transport state for one session span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// The transport is playing.
    #[default]
    Play,
    /// The transport is parked.
    Stop,
}

/// One span of the scripted session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Segment {
    /// Transport state over the span.
    #[serde(default)]
    pub state: TransportState,
    /// The host's record flag; recording rolls like playing.
    #[serde(default)]
    pub record: bool,
    /// Tempo override in BPM. Inherits the profile tempo when absent.
    pub bpm: Option<f64>,
    /// Time signature override, e.g. "3/4".
    pub signature: Option<String>,
    /// Seek to this quarter-note position when the span starts.
    pub start_ppq: Option<f64>,
    /// Span length in seconds.
    pub seconds: Option<f64>,
    /// Span length in bars of the active meter.
    pub bars: Option<f64>,
}

/// Engine tuning carried in the profile.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EngineSection {
    /// Lowest playable tempo, in BPM.
    #[serde(default = "default_min_bpm")]
    pub min_bpm: f64,
    /// Highest playable tempo, in BPM.
    #[serde(default = "default_max_bpm")]
    pub max_bpm: f64,
    /// Peak amplitude of the tick pulse, in linear gain.
    #[serde(default = "default_pulse_peak")]
    pub pulse_peak: f32,
}

fn default_min_bpm() -> f64 {
    pulso_core::DEFAULT_MIN_BPM
}

fn default_max_bpm() -> f64 {
    pulso_core::DEFAULT_MAX_BPM
}

fn default_pulse_peak() -> f32 {
    EngineConfig::default().pulse_peak
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
            pulse_peak: default_pulse_peak(),
        }
    }
}

/// Session profile file format.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Name of the session.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description, echoed when the session renders.
    #[serde(default)]
    pub description: Option<String>,
    /// Sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Processing block size in samples.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Session tempo in BPM; segments may override.
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Session time signature; segments may override.
    #[serde(default = "default_signature")]
    pub signature: String,
    /// Engine tuning.
    #[serde(default)]
    pub engine: EngineSection,
    /// The scripted transport spans, in order.
    pub segments: Vec<Segment>,
}

fn default_sample_rate() -> f64 {
    48000.0
}

fn default_block_size() -> usize {
    512
}

fn default_bpm() -> f64 {
    120.0
}

fn default_signature() -> String {
    "4/4".to_string()
}

impl Profile {
    /// Load and validate a profile from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Profile = toml::from_str(&content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check the profile for contradictions before simulation.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ProfileError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 {
            return Err(ProfileError::InvalidBlockSize);
        }
        check_tempo(self.bpm)?;
        check_tempo(self.engine.min_bpm)?;
        check_tempo(self.engine.max_bpm)?;
        parse_signature(&self.signature)?;
        if self.segments.is_empty() {
            return Err(ProfileError::Empty);
        }

        for (index, segment) in self.segments.iter().enumerate() {
            if let Some(bpm) = segment.bpm {
                check_tempo(bpm)?;
            }
            if let Some(signature) = &segment.signature {
                parse_signature(signature)?;
            }
            let invalid = |reason: &str| ProfileError::InvalidSegment {
                index,
                reason: reason.to_string(),
            };
            match (segment.seconds, segment.bars) {
                (Some(_), Some(_)) => {
                    return Err(invalid("set either `seconds` or `bars`, not both"));
                }
                (None, None) => {
                    return Err(invalid("set a length with `seconds` or `bars`"));
                }
                (Some(duration), None) | (None, Some(duration)) => {
                    if !(duration.is_finite() && duration > 0.0) {
                        return Err(invalid("the length must be a positive number"));
                    }
                }
            }
            if let Some(ppq) = segment.start_ppq {
                if !ppq.is_finite() {
                    return Err(invalid("`start_ppq` must be a number"));
                }
            }
        }
        Ok(())
    }

    /// The engine configuration the profile asks for.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            tempo: TempoRange::new(self.engine.min_bpm, self.engine.max_bpm),
            pulse_peak: self.engine.pulse_peak,
        }
    }
}

fn check_tempo(bpm: f64) -> Result<(), ProfileError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(ProfileError::InvalidTempo(bpm))
    }
}

/// Parse a "numerator/denominator" time signature string.
pub fn parse_signature(s: &str) -> Result<TimeSignature, ProfileError> {
    let invalid = || ProfileError::InvalidSignature(s.to_string());
    let (numerator, denominator) = s.trim().split_once('/').ok_or_else(invalid)?;
    let numerator: u32 = numerator.trim().parse().map_err(|_| invalid())?;
    let denominator: u32 = denominator.trim().parse().map_err(|_| invalid())?;
    if numerator == 0 || denominator == 0 {
        return Err(invalid());
    }
    Ok(TimeSignature::new(numerator, denominator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Profile, ProfileError> {
        let profile: Profile = toml::from_str(toml_str)?;
        profile.validate()?;
        Ok(profile)
    }

    #[test]
    fn minimal_profile_uses_defaults() {
        let profile = parse(
            r#"
            [[segments]]
            seconds = 1.0
            "#,
        )
        .expect("minimal profile");
        assert!((profile.sample_rate - 48000.0).abs() < f64::EPSILON);
        assert_eq!(profile.block_size, 512);
        assert!((profile.bpm - 120.0).abs() < f64::EPSILON);
        assert_eq!(profile.signature, "4/4");
        assert_eq!(profile.segments.len(), 1);
        assert_eq!(profile.segments[0].state, TransportState::Play);
        assert!(!profile.segments[0].record);
    }

    #[test]
    fn full_profile_parses() {
        let profile = parse(
            r#"
            name = "three four rehearsal"
            sample_rate = 96000.0
            block_size = 256
            bpm = 90.0
            signature = "3/4"

            [engine]
            max_bpm = 300.0
            pulse_peak = 0.5

            [[segments]]
            state = "stop"
            seconds = 0.5

            [[segments]]
            bars = 4.0
            bpm = 140.0
            signature = "6/8"
            start_ppq = 12.0
            record = true
            "#,
        )
        .expect("full profile");
        assert_eq!(profile.name.as_deref(), Some("three four rehearsal"));
        assert_eq!(profile.segments[0].state, TransportState::Stop);
        assert_eq!(profile.segments[1].signature.as_deref(), Some("6/8"));
        assert!((profile.segments[1].start_ppq.unwrap() - 12.0).abs() < f64::EPSILON);

        let config = profile.engine_config();
        assert!((config.tempo.min() - 30.0).abs() < f64::EPSILON, "min inherits the default");
        assert!((config.tempo.max() - 300.0).abs() < f64::EPSILON);
        assert!((config.pulse_peak - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn segments_need_exactly_one_length() {
        let both = parse(
            r#"
            [[segments]]
            seconds = 1.0
            bars = 2.0
            "#,
        );
        assert!(matches!(both, Err(ProfileError::InvalidSegment { index: 0, .. })));

        let neither = parse(
            r#"
            [[segments]]
            state = "play"
            "#,
        );
        assert!(matches!(neither, Err(ProfileError::InvalidSegment { index: 0, .. })));
    }

    #[test]
    fn negative_lengths_are_rejected() {
        let result = parse(
            r#"
            [[segments]]
            seconds = -1.0
            "#,
        );
        assert!(matches!(result, Err(ProfileError::InvalidSegment { .. })));
    }

    #[test]
    fn empty_profile_is_rejected() {
        let result = parse("segments = []");
        assert!(matches!(result, Err(ProfileError::Empty)));
    }

    #[test]
    fn bad_signatures_are_rejected() {
        for s in ["44", "4/", "/4", "0/4", "4/0", "a/b", ""] {
            assert!(
                parse_signature(s).is_err(),
                "'{s}' should not parse as a signature"
            );
        }
    }

    #[test]
    fn good_signatures_parse() {
        let sig = parse_signature(" 6/8 ").expect("whitespace is tolerated");
        assert_eq!(sig.numerator, 6);
        assert_eq!(sig.denominator, 8);
    }

    #[test]
    fn zero_tempo_is_rejected() {
        let result = parse(
            r#"
            bpm = 0.0

            [[segments]]
            seconds = 1.0
            "#,
        );
        assert!(matches!(result, Err(ProfileError::InvalidTempo(_))));
    }

    #[test]
    fn negative_engine_range_is_rejected() {
        // An unchecked negative pair would flip the derived tick
        // spacing limits.
        let result = parse(
            r#"
            [engine]
            min_bpm = -100.0
            max_bpm = -10.0

            [[segments]]
            seconds = 1.0
            "#,
        );
        assert!(matches!(result, Err(ProfileError::InvalidTempo(_))));

        let result = parse(
            r#"
            [engine]
            min_bpm = -30.0

            [[segments]]
            seconds = 1.0
            "#,
        );
        assert!(matches!(result, Err(ProfileError::InvalidTempo(_))));
    }

    #[test]
    fn load_reports_the_missing_path() {
        let err = Profile::load("/nonexistent/pulso-session.toml").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("failed to read profile"), "got: {msg}");
        assert!(msg.contains("pulso-session.toml"), "got: {msg}");
    }
}
