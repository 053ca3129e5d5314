//! Debounced tempo and beats-per-bar telegrams.
//!
//! The sync hardware reconfigures itself when told about tempo or
//! meter changes, which is disruptive mid-performance, so changes are
//! debounced: a changed value starts a countdown and only the value
//! still pending when the countdown expires is reported. Host edits
//! that flicker through intermediate values (dragging a tempo slider)
//! collapse into one telegram.

/// What a telegram reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelegramKind {
    /// Tempo in BPM, rounded; doubled in eighth-note mode.
    Tempo,
    /// Beats per bar in the hardware's counting unit.
    BeatsPerBar,
}

/// One debounced change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelegramEvent {
    /// What changed.
    pub kind: TelegramKind,
    /// The committed value.
    pub value: u32,
    /// Sample offset within the block where the event fires.
    pub offset: u32,
}

/// Debounce state for one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Debounce {
    /// Nothing pending; a changed value starts a countdown.
    Idle,
    /// Playback is rolling and the channel is muted; the first offer
    /// after stop converts into a full-length countdown.
    Armed,
    /// Counting down to an emission, `remaining` samples to go.
    Counting(u32),
}

/// One per-kind debounced notification channel.
///
/// The engine offers the channel the current value once per block; the
/// channel emits at most one event per block. Countdowns are anchored
/// to the start of the block where the change was first observed.
#[derive(Clone, Copy, Debug)]
pub struct TelegramChannel {
    kind: TelegramKind,
    state: Debounce,
    last_sent: u32,
    pending: u32,
    quarter_second: u32,
    short_delay: u32,
}

impl TelegramChannel {
    /// Create a channel prepared for 44.1 kHz.
    pub fn new(kind: TelegramKind) -> Self {
        let mut channel = Self {
            kind,
            state: Debounce::Idle,
            last_sent: 0,
            pending: 0,
            quarter_second: 0,
            short_delay: 0,
        };
        channel.prepare(44_100.0);
        channel
    }

    /// Derive debounce delays from the sample rate and reset.
    pub fn prepare(&mut self, sample_rate: f64) {
        let sample_rate = sample_rate.max(1.0);
        self.quarter_second = (sample_rate / 4.0) as u32;
        self.short_delay = (sample_rate / 8.0) as u32;
        self.state = Debounce::Idle;
        self.last_sent = 0;
        self.pending = 0;
    }

    /// Mute the channel while playback rolls (tempo only).
    ///
    /// Forcing the last-sent value to zero guarantees the first offer
    /// after stop sees a change, and the armed state makes that report
    /// wait a quarter second instead of firing near-immediately.
    pub fn arm(&mut self) {
        self.state = Debounce::Armed;
        self.last_sent = 0;
    }

    /// Offer the current value for this block.
    ///
    /// Returns the event to emit this block, if the debounce expires
    /// inside it. A changed value offered while counting retargets the
    /// pending event without restarting the countdown.
    pub fn offer(&mut self, value: u32, rolling: bool, block_len: u32) -> Option<TelegramEvent> {
        let remaining = match self.state {
            Debounce::Idle => {
                if value == self.last_sent {
                    return None;
                }
                self.pending = value;
                self.start_delay(value, rolling)
            }
            Debounce::Armed => {
                self.pending = value;
                self.quarter_second
            }
            Debounce::Counting(remaining) => {
                self.pending = value;
                remaining
            }
        };

        if remaining >= block_len {
            self.state = Debounce::Counting(remaining - block_len);
            return None;
        }
        self.state = Debounce::Idle;
        self.last_sent = self.pending;
        Some(TelegramEvent {
            kind: self.kind,
            value: self.pending,
            offset: remaining,
        })
    }

    fn start_delay(&self, value: u32, rolling: bool) -> u32 {
        if !rolling {
            1
        } else if self.kind == TelegramKind::BeatsPerBar && (value == 1 || self.last_sent == 1) {
            // Entering or leaving a one-beat bar re-trims the hardware
            // faster; these transitions are usually deliberate.
            self.short_delay
        } else {
            self.quarter_second
        }
    }

    /// Debounce delay while the transport rolls, in samples.
    pub fn rolling_delay(&self) -> u32 {
        self.quarter_second
    }

    /// Shortened delay for beats-per-bar edges touching a one-beat bar,
    /// in samples.
    pub fn short_delay(&self) -> u32 {
        self.short_delay
    }
}
