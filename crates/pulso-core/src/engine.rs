//! Block orchestration.
//!
//! [`SyncEngine`] ties the pieces together: continuity tracking, bar
//! sync, tick scheduling, pulse rendering and telegram debouncing, one
//! host block at a time. The process path never allocates or locks;
//! the scratch buffer and event list are sized in [`prepare`].
//!
//! [`prepare`]: SyncEngine::prepare

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::bar_sync::BarSync;
use crate::config::EngineConfig;
use crate::meter::Meter;
use crate::pulse::PulseGenerator;
use crate::scheduler::{TICKS_PER_QUARTER, TickScheduler};
use crate::telegram::{TelegramChannel, TelegramEvent, TelegramKind};
use crate::transport::{PositionSnapshot, TransportTracker};

/// Phase tolerance for boundary comparisons, in samples of advance.
/// Converted per block into quarter-note and tick units.
const SYNC_WINDOW_SAMPLES: f64 = 20.0;

/// One processed block: the rendered pulse train plus the telegrams
/// that fired inside it. Borrows the engine's scratch storage.
#[derive(Debug)]
pub struct BlockOutput<'a> {
    /// Pulse samples, one per input sample. Mix into every output
    /// channel.
    pub pulse: &'a [f32],
    /// Telegrams fired this block, in offer order (meter before
    /// tempo), not sorted by offset.
    pub telegrams: &'a [TelegramEvent],
}

/// The hardware sync engine.
///
/// Drive it like a host drives a plugin: [`prepare`] once before
/// streaming, then [`process_block`] once per audio block with a fresh
/// [`PositionSnapshot`].
///
/// # Example
///
/// ```rust
/// use pulso_core::{PositionSnapshot, SyncEngine, TimeSignature};
///
/// let mut engine = SyncEngine::default();
/// engine.prepare(48000.0, 512);
///
/// // Playback starting exactly on a bar line.
/// let snapshot = PositionSnapshot {
///     is_playing: true,
///     bpm: Some(120.0),
///     time_signature: Some(TimeSignature::new(4, 4)),
///     ppq_position: Some(16.0),
///     bar_start_ppq: Some(16.0),
///     elapsed_samples: Some(0),
///     ..PositionSnapshot::default()
/// };
/// let out = engine.process_block(&snapshot, 512);
/// assert!(out.pulse.iter().any(|&s| s > 0.0), "first tick lands on the bar");
/// ```
///
/// [`prepare`]: SyncEngine::prepare
/// [`process_block`]: SyncEngine::process_block
#[derive(Debug)]
pub struct SyncEngine {
    config: EngineConfig,
    sample_rate: f64,
    tracker: TransportTracker,
    bar_sync: BarSync,
    scheduler: TickScheduler,
    pulse: PulseGenerator,
    tempo_channel: TelegramChannel,
    meter_channel: TelegramChannel,
    buffer: Vec<f32>,
    events: Vec<TelegramEvent>,
}

impl SyncEngine {
    /// Create an engine. Call [`prepare`](Self::prepare) before
    /// processing.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sample_rate: 44_100.0,
            tracker: TransportTracker::new(),
            bar_sync: BarSync::new(),
            scheduler: TickScheduler::new(),
            pulse: PulseGenerator::new(),
            tempo_channel: TelegramChannel::new(TelegramKind::Tempo),
            meter_channel: TelegramChannel::new(TelegramKind::BeatsPerBar),
            buffer: Vec::new(),
            events: Vec::with_capacity(2),
        }
    }

    /// Size the scratch buffer and derive all rate-dependent constants
    /// for a new stream. Resets every piece of sync state.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.sample_rate = sample_rate.max(1.0);
        self.buffer.clear();
        self.buffer.resize(max_block_size, 0.0);
        self.events.clear();
        self.pulse.prepare(self.sample_rate);
        self.pulse.set_peak(self.config.pulse_peak);
        self.scheduler.prepare(self.sample_rate, self.config.tempo);
        self.tempo_channel.prepare(self.sample_rate);
        self.meter_channel.prepare(self.sample_rate);
        self.tracker.reset();
        self.bar_sync.lose();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "prepare: {} Hz, max block {}, pulse {} samples",
            self.sample_rate,
            max_block_size,
            self.pulse.length()
        );
    }

    /// Process one block.
    ///
    /// `num_samples` beyond the prepared maximum is clamped. Absent
    /// snapshot fields degrade: no tempo means no sync and no ticks,
    /// no time signature means 4/4 for scheduling and no meter
    /// telegrams, no elapsed-sample report counts as a timeline jump
    /// since continuity cannot be asserted.
    pub fn process_block(&mut self, snapshot: &PositionSnapshot, num_samples: usize) -> BlockOutput<'_> {
        let n = num_samples.min(self.buffer.len());
        self.events.clear();
        for sample in &mut self.buffer[..n] {
            *sample = 0.0;
        }

        if self.tracker.observe(snapshot.elapsed_samples, n) {
            self.scheduler.invalidate();
            #[cfg(feature = "tracing")]
            tracing::debug!("timeline jump: tick numbering invalidated");
        }

        let meter = snapshot.time_signature.map(Meter::from_signature).unwrap_or_default();
        let rolling = snapshot.is_rolling();

        if snapshot.time_signature.is_some() {
            if let Some(event) = self.meter_channel.offer(meter.beats_per_bar, rolling, n as u32) {
                self.push_event(event);
            }
        }

        let playable_bpm = snapshot.bpm.filter(|bpm| self.config.tempo.contains(*bpm));
        match playable_bpm {
            Some(bpm) if rolling => self.process_rolling(snapshot, meter, bpm, n),
            _ => self.process_at_rest(meter, playable_bpm, rolling, n),
        }

        BlockOutput {
            pulse: &self.buffer[..n],
            telegrams: &self.events,
        }
    }

    /// Rolling with a playable tempo: acquire sync, schedule ticks,
    /// render pulses.
    fn process_rolling(&mut self, snapshot: &PositionSnapshot, meter: Meter, bpm: f64, n: usize) {
        // Tempo reports wait for the next stop.
        self.tempo_channel.arm();

        let ppq_per_sample = bpm / (60.0 * self.sample_rate);
        let tolerance_ppq = SYNC_WINDOW_SAMPLES * ppq_per_sample;
        let ticks_per_quarter = f64::from(TICKS_PER_QUARTER);
        let tolerance_ticks = tolerance_ppq * ticks_per_quarter;
        let beats_per_bar = f64::from(meter.beats_per_bar);
        let bar_start = snapshot.bar_start_ppq.unwrap_or(0.0);
        let mut ppq = snapshot.ppq_position.unwrap_or(0.0);

        for i in 0..n {
            // Pre-roll makes no decisions; the estimate just advances.
            if ppq >= 0.0 {
                if !self.bar_sync.is_synced()
                    && self.bar_sync.try_acquire(ppq - bar_start, beats_per_bar, tolerance_ppq)
                {
                    self.scheduler.on_acquire();
                    #[cfg(feature = "tracing")]
                    tracing::debug!("bar sync acquired at ppq {ppq:.6}");
                }
                if self.bar_sync.is_synced()
                    && !self.pulse.is_active()
                    && self.scheduler.advance(ppq * ticks_per_quarter, tolerance_ticks, meter.eighth_note)
                {
                    self.pulse.start();
                }
            }
            self.buffer[i] += self.pulse.next_sample();
            self.scheduler.count_sample();
            ppq += ppq_per_sample;
        }
    }

    /// Stopped, or rolling with an unplayable tempo: finish any pulse
    /// in flight and report the tempo once at rest.
    fn process_at_rest(&mut self, meter: Meter, playable_bpm: Option<f64>, rolling: bool, n: usize) {
        #[cfg(feature = "tracing")]
        if self.bar_sync.is_synced() {
            tracing::debug!("bar sync lost");
        }
        self.bar_sync.lose();

        // The hardware needs the full pulse edge even across a stop.
        let mut i = 0;
        while self.pulse.is_active() && i < n {
            self.buffer[i] += self.pulse.next_sample();
            i += 1;
        }

        if !rolling {
            if let Some(bpm) = playable_bpm {
                let value = meter.reported_bpm(bpm);
                if let Some(event) = self.tempo_channel.offer(value, false, n as u32) {
                    self.push_event(event);
                }
            }
        }
    }

    fn push_event(&mut self, event: TelegramEvent) {
        #[cfg(feature = "tracing")]
        tracing::debug!("telegram {:?} = {} at offset {}", event.kind, event.value, event.offset);
        self.events.push(event);
    }

    /// Sample rate of the prepared stream.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Bar sync is currently acquired.
    pub fn is_synced(&self) -> bool {
        self.bar_sync.is_synced()
    }

    /// Ticks fired since the last prepare.
    pub fn ticks_fired(&self) -> u64 {
        self.scheduler.total_fired()
    }

    /// Pulse length in samples at the prepared rate.
    pub fn pulse_length(&self) -> usize {
        self.pulse.length()
    }

    /// Smallest legal tick gap at the prepared rate, in samples.
    pub fn min_tick_spacing(&self) -> i64 {
        self.scheduler.min_spacing()
    }

    /// Largest tick gap before one is forced, in samples.
    pub fn max_tick_spacing(&self) -> i64 {
        self.scheduler.max_spacing()
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
