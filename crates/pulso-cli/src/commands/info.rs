//! Show engine timing constants for a tempo and meter.

use clap::Args;
use pulso_core::{Meter, SyncEngine, TICKS_PER_QUARTER, TelegramChannel, TelegramKind};

use crate::profile::parse_signature;

#[derive(Args)]
pub struct InfoArgs {
    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Tempo in BPM
    #[arg(long, default_value = "120.0")]
    bpm: f64,

    /// Time signature
    #[arg(long, default_value = "4/4")]
    signature: String,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let signature = parse_signature(&args.signature)?;
    let meter = Meter::from_signature(signature);
    let sample_rate = f64::from(args.sample_rate);

    let mut engine = SyncEngine::default();
    engine.prepare(sample_rate, 512);
    if !engine.config().tempo.contains(args.bpm) {
        anyhow::bail!(
            "tempo {} BPM is outside the playable range {}..={} BPM",
            args.bpm,
            engine.config().tempo.min(),
            engine.config().tempo.max()
        );
    }

    let mut channel = TelegramChannel::new(TelegramKind::Tempo);
    channel.prepare(sample_rate);

    let mut tick_interval = sample_rate * 60.0 / (args.bpm * f64::from(TICKS_PER_QUARTER));
    if meter.eighth_note {
        tick_interval /= 2.0;
    }
    let ms = 1000.0 / sample_rate;

    println!("Sample Rate:     {} Hz", args.sample_rate);
    println!(
        "Tempo:           {:.1} BPM (reported as {})",
        args.bpm,
        meter.reported_bpm(args.bpm)
    );
    println!(
        "Signature:       {} ({} beats per bar{})",
        signature,
        meter.beats_per_bar,
        if meter.eighth_note { ", eighth-note ticks" } else { "" }
    );
    println!();
    println!(
        "Pulse Length:    {} samples ({:.2} ms), peak {:.2}",
        engine.pulse_length(),
        engine.pulse_length() as f64 * ms,
        engine.config().pulse_peak
    );
    println!(
        "Tick Interval:   {:.1} samples ({:.2} ms)",
        tick_interval,
        tick_interval * ms
    );
    println!(
        "Tick Spacing:    {} to {} samples",
        engine.min_tick_spacing(),
        engine.max_tick_spacing()
    );
    println!(
        "Telegram Delay:  {} samples rolling ({:.0} ms), {} at a one-beat edge, 1 at rest",
        channel.rolling_delay(),
        f64::from(channel.rolling_delay()) * ms,
        channel.short_delay()
    );

    Ok(())
}
