//! Pulso Core - hardware sync engine for DAW transports
//!
//! Keeps external gear locked to a DAW's transport by rendering a
//! 24 PPQN audio pulse train phase-locked to the host's musical
//! position, plus debounced tempo and meter change telegrams for a
//! wire encoder to pick up:
//!
//! - [`SyncEngine`] - block orchestration, one call per audio block
//! - [`TransportTracker`] - elapsed-sample continuity checking
//! - [`BarSync`] - sync acquisition on bar lines
//! - [`TickScheduler`] - per-sample tick decisions with spacing clamps
//! - [`PulseGenerator`] - the tick pulse waveform
//! - [`TelegramChannel`] - debounced tempo / beats-per-bar reports
//!
//! The process path is real-time safe: no allocation, no locking, no
//! blocking. All buffers are sized in [`SyncEngine::prepare`].
//!
//! ## Example
//!
//! ```rust
//! use pulso_core::{PositionSnapshot, SyncEngine, TimeSignature};
//!
//! let mut engine = SyncEngine::default();
//! engine.prepare(48000.0, 512);
//!
//! let snapshot = PositionSnapshot {
//!     is_playing: true,
//!     bpm: Some(120.0),
//!     time_signature: Some(TimeSignature::new(4, 4)),
//!     ppq_position: Some(0.0),
//!     bar_start_ppq: Some(0.0),
//!     elapsed_samples: Some(0),
//!     ..PositionSnapshot::default()
//! };
//!
//! let out = engine.process_block(&snapshot, 512);
//! assert!(out.pulse.iter().any(|&s| s > 0.0));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod bar_sync;
pub mod config;
pub mod engine;
pub mod meter;
pub mod pulse;
pub mod scheduler;
pub mod telegram;
pub mod transport;

// Re-export main types at crate root
pub use bar_sync::BarSync;
pub use config::{DEFAULT_MAX_BPM, DEFAULT_MIN_BPM, EngineConfig, TempoRange};
pub use engine::{BlockOutput, SyncEngine};
pub use meter::{Meter, TimeSignature};
pub use pulse::PulseGenerator;
pub use scheduler::{TICKS_PER_QUARTER, TickScheduler};
pub use telegram::{TelegramChannel, TelegramEvent, TelegramKind};
pub use transport::{PositionSnapshot, TransportTracker};
