//! Replays a session profile as per-block transport snapshots.
//!
//! [`Timeline`] walks the profile's segments and hands out one
//! [`PositionSnapshot`] per block, exactly the way a host feeds a
//! plugin: the musical position and the sample clock advance together
//! while rolling, freeze while stopped, and jump on seeks. Blocks are
//! split at segment boundaries, so the final block of a segment may be
//! shorter than the configured block size.

use pulso_core::{PositionSnapshot, TimeSignature};

use crate::profile::{Profile, ProfileError, TransportState, parse_signature};

/// One profile segment with inherited fields filled in and its length
/// converted to samples.
#[derive(Clone, Copy, Debug)]
struct ResolvedSegment {
    playing: bool,
    recording: bool,
    bpm: f64,
    signature: TimeSignature,
    seek: Option<f64>,
    samples: u64,
}

/// Scripted transport playback, one block at a time.
#[derive(Debug)]
pub struct Timeline {
    sample_rate: f64,
    block_size: usize,
    segments: Vec<ResolvedSegment>,
    current: usize,
    consumed: u64,
    ppq: f64,
    elapsed: i64,
    bar_origin: f64,
    total: u64,
}

impl Timeline {
    /// Resolve a validated profile into a playable timeline.
    pub fn new(profile: &Profile) -> Result<Self, ProfileError> {
        profile.validate()?;

        let sample_rate = profile.sample_rate;
        let mut segments = Vec::with_capacity(profile.segments.len());
        for segment in &profile.segments {
            let bpm = segment.bpm.unwrap_or(profile.bpm);
            let signature = match &segment.signature {
                Some(s) => parse_signature(s)?,
                None => parse_signature(&profile.signature)?,
            };
            let seconds = match (segment.seconds, segment.bars) {
                (Some(seconds), _) => seconds,
                (None, Some(bars)) => bars * signature.bar_length_quarters() * 60.0 / bpm,
                // validate() guarantees one length is set
                (None, None) => 0.0,
            };
            segments.push(ResolvedSegment {
                playing: segment.state == TransportState::Play,
                recording: segment.record,
                bpm,
                signature,
                seek: segment.start_ppq,
                samples: (seconds * sample_rate).round() as u64,
            });
        }

        let total = segments.iter().map(|s| s.samples).sum();
        let mut timeline = Self {
            sample_rate,
            block_size: profile.block_size,
            segments,
            current: 0,
            consumed: 0,
            ppq: 0.0,
            elapsed: 0,
            bar_origin: 0.0,
            total,
        };
        timeline.enter(0);
        Ok(timeline)
    }

    /// Sample rate of the session.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Block size the session is processed with.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total length of the session in samples.
    pub fn total_samples(&self) -> u64 {
        self.total
    }

    /// The next block's snapshot and length, or `None` when the
    /// session is over.
    pub fn next_block(&mut self) -> Option<(PositionSnapshot, usize)> {
        while self.current < self.segments.len()
            && self.consumed >= self.segments[self.current].samples
        {
            self.current += 1;
            self.consumed = 0;
            if self.current < self.segments.len() {
                self.enter(self.current);
            }
        }
        let segment = *self.segments.get(self.current)?;

        let remaining = segment.samples - self.consumed;
        let n = (self.block_size as u64).min(remaining) as usize;

        let bar_length = segment.signature.bar_length_quarters();
        let bar_start = if self.ppq >= self.bar_origin {
            self.bar_origin + ((self.ppq - self.bar_origin) / bar_length).floor() * bar_length
        } else {
            // Pre-roll parks the bar at the region origin.
            self.bar_origin
        };

        let snapshot = PositionSnapshot {
            is_playing: segment.playing,
            is_recording: segment.recording,
            bpm: Some(segment.bpm),
            time_signature: Some(segment.signature),
            ppq_position: Some(self.ppq),
            bar_start_ppq: Some(bar_start),
            elapsed_samples: Some(self.elapsed),
        };

        if snapshot.is_rolling() {
            self.ppq += segment.bpm / (60.0 * self.sample_rate) * n as f64;
            self.elapsed += n as i64;
        }
        self.consumed += n as u64;
        Some((snapshot, n))
    }

    /// Apply a segment's entry effects: seeks move both clocks, and a
    /// meter change starts a new bar at the boundary.
    fn enter(&mut self, index: usize) {
        let segment = self.segments[index];
        if let Some(ppq) = segment.seek {
            self.ppq = ppq;
            self.elapsed = (ppq * 60.0 / segment.bpm * self.sample_rate).round() as i64;
            tracing::debug!(segment = index, ppq, "seek");
        }
        if index > 0 && self.segments[index - 1].signature != segment.signature {
            self.bar_origin = self.ppq;
            tracing::debug!(
                segment = index,
                signature = %segment.signature,
                bar_origin = self.bar_origin,
                "meter change"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{EngineSection, Segment};

    const SR: f64 = 48000.0;

    fn base_segment() -> Segment {
        Segment {
            state: TransportState::Play,
            record: false,
            bpm: None,
            signature: None,
            start_ppq: None,
            seconds: None,
            bars: None,
        }
    }

    fn play(seconds: f64) -> Segment {
        Segment {
            seconds: Some(seconds),
            ..base_segment()
        }
    }

    fn stop(seconds: f64) -> Segment {
        Segment {
            state: TransportState::Stop,
            seconds: Some(seconds),
            ..base_segment()
        }
    }

    fn profile(segments: Vec<Segment>) -> Profile {
        Profile {
            name: None,
            description: None,
            sample_rate: SR,
            block_size: 512,
            bpm: 120.0,
            signature: "4/4".to_string(),
            engine: EngineSection::default(),
            segments,
        }
    }

    fn collect(timeline: &mut Timeline) -> Vec<(PositionSnapshot, usize)> {
        let mut blocks = Vec::new();
        while let Some(block) = timeline.next_block() {
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn short_sessions_end_with_a_short_block() {
        let mut timeline = Timeline::new(&profile(vec![play(0.01)])).expect("valid profile");
        assert_eq!(timeline.total_samples(), 480);
        let blocks = collect(&mut timeline);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].1, 480, "blocks never overrun the session");
    }

    #[test]
    fn play_blocks_advance_both_clocks() {
        let mut timeline = Timeline::new(&profile(vec![play(1.0)])).expect("valid profile");
        let blocks = collect(&mut timeline);
        assert_eq!(blocks.iter().map(|(_, n)| *n as u64).sum::<u64>(), 48000);

        let (first, _) = blocks[0];
        assert!(first.is_playing);
        assert_eq!(first.ppq_position, Some(0.0));
        assert_eq!(first.elapsed_samples, Some(0));

        let (second, _) = blocks[1];
        assert_eq!(second.elapsed_samples, Some(512));
        let ppq = second.ppq_position.unwrap();
        // 512 samples at 120 BPM.
        assert!((ppq - 512.0 * 120.0 / (60.0 * SR)).abs() < 1e-12);
    }

    #[test]
    fn stopped_blocks_freeze_both_clocks() {
        let mut timeline =
            Timeline::new(&profile(vec![stop(0.5), play(0.5)])).expect("valid profile");
        let blocks = collect(&mut timeline);

        let stopped: Vec<_> = blocks.iter().filter(|(s, _)| !s.is_playing).collect();
        assert_eq!(
            stopped.iter().map(|(_, n)| *n as u64).sum::<u64>(),
            24000,
            "the stop span covers exactly half a second"
        );
        for (snapshot, _) in &stopped {
            assert_eq!(snapshot.ppq_position, Some(0.0));
            assert_eq!(snapshot.elapsed_samples, Some(0));
        }

        // Play picks up from the parked position.
        let first_playing = blocks.iter().find(|(s, _)| s.is_playing).unwrap().0;
        assert_eq!(first_playing.ppq_position, Some(0.0));
    }

    #[test]
    fn bars_convert_with_the_active_meter() {
        let segment = Segment {
            signature: Some("3/4".to_string()),
            bars: Some(2.0),
            ..base_segment()
        };
        let timeline = Timeline::new(&profile(vec![segment])).expect("valid profile");
        // Two bars of 3/4 at 120 BPM: six quarters, three seconds.
        assert_eq!(timeline.total_samples(), 144000);
    }

    #[test]
    fn seeks_jump_both_clocks_together() {
        let jump = Segment {
            start_ppq: Some(100.0),
            seconds: Some(0.1),
            ..base_segment()
        };
        let mut timeline =
            Timeline::new(&profile(vec![play(0.1), jump])).expect("valid profile");
        let blocks = collect(&mut timeline);

        let landed = blocks
            .iter()
            .find(|(s, _)| s.ppq_position.unwrap() >= 100.0)
            .expect("the seek target is reached")
            .0;
        assert_eq!(landed.ppq_position, Some(100.0));
        // 100 quarters at 120 BPM is 50 seconds of timeline.
        assert_eq!(landed.elapsed_samples, Some(2_400_000));
    }

    #[test]
    fn meter_changes_start_a_new_bar_at_the_boundary() {
        let waltz = Segment {
            signature: Some("3/4".to_string()),
            seconds: Some(2.0),
            ..base_segment()
        };
        // Two bars of 4/4 first: the boundary lands at ppq 8.
        let mut timeline =
            Timeline::new(&profile(vec![play(4.0), waltz])).expect("valid profile");
        let blocks = collect(&mut timeline);

        let waltz_blocks: Vec<_> = blocks
            .iter()
            .filter(|(s, _)| s.time_signature == Some(TimeSignature::new(3, 4)))
            .collect();
        let first_bar = waltz_blocks[0].0.bar_start_ppq.unwrap();
        assert!((first_bar - 8.0).abs() < 1e-9, "got bar start {first_bar}");

        // After three more quarters the next 3/4 bar begins at 11.
        let last_bar = waltz_blocks.last().unwrap().0.bar_start_ppq.unwrap();
        assert!((last_bar - 11.0).abs() < 1e-9, "got bar start {last_bar}");
    }

    #[test]
    fn record_flag_rolls_a_stopped_transport() {
        let punch_in = Segment {
            state: TransportState::Stop,
            record: true,
            seconds: Some(0.1),
            ..base_segment()
        };
        let mut timeline = Timeline::new(&profile(vec![punch_in])).expect("valid profile");
        let blocks = collect(&mut timeline);
        let (first, _) = blocks[0];
        assert!(!first.is_playing);
        assert!(first.is_recording);

        let (second, _) = blocks[1];
        assert!(second.ppq_position.unwrap() > 0.0, "recording advances the position");
    }

    #[test]
    fn pre_roll_parks_the_bar_at_the_origin() {
        let count_in = Segment {
            start_ppq: Some(-2.0),
            seconds: Some(1.5),
            ..base_segment()
        };
        let mut timeline = Timeline::new(&profile(vec![count_in])).expect("valid profile");
        let blocks = collect(&mut timeline);

        let (first, _) = blocks[0];
        assert_eq!(first.ppq_position, Some(-2.0));
        assert_eq!(first.elapsed_samples, Some(-48000));
        assert_eq!(first.bar_start_ppq, Some(0.0));

        let crossed = blocks
            .iter()
            .find(|(s, _)| s.ppq_position.unwrap() >= 0.0)
            .expect("pre-roll reaches the timeline")
            .0;
        assert_eq!(crossed.bar_start_ppq, Some(0.0));
    }

    #[test]
    fn tempo_changes_keep_the_sample_clock_continuous() {
        let faster = Segment {
            bpm: Some(150.0),
            seconds: Some(0.5),
            ..base_segment()
        };
        let mut timeline =
            Timeline::new(&profile(vec![play(0.5), faster])).expect("valid profile");
        let blocks = collect(&mut timeline);

        let mut expected = 0i64;
        for (snapshot, n) in &blocks {
            assert_eq!(snapshot.elapsed_samples, Some(expected), "no jump at the tempo change");
            expected += *n as i64;
        }
    }
}
