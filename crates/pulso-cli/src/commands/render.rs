//! Render a simulated session's pulse train to disk.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use pulso_core::{SyncEngine, TelegramEvent, TelegramKind};
use pulso_wire::encode;

use crate::profile::{EngineSection, Profile, Segment, TransportState};
use crate::timeline::Timeline;
use crate::wav::{WavSpec, write_wav};

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Session profile (TOML); replaces the session flags below
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Tempo in BPM
    #[arg(long, default_value = "120.0")]
    bpm: f64,

    /// Time signature
    #[arg(long, default_value = "4/4")]
    signature: String,

    /// Bars of playback to simulate
    #[arg(long, default_value = "8.0")]
    bars: f64,

    /// Stopped lead-in before playback, in seconds
    #[arg(long, default_value = "0.5")]
    lead_in: f64,

    /// Stopped tail after playback, in seconds
    #[arg(long, default_value = "0.5")]
    tail: f64,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Write stereo (the mono pulse on both channels)
    #[arg(long)]
    stereo: bool,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bits: u16,

    /// Print the MIDI bytes each telegram encodes to
    #[arg(long)]
    wire: bool,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !matches!(args.bits, 16 | 24 | 32) {
        anyhow::bail!("unsupported bit depth {} (use 16, 24, or 32)", args.bits);
    }

    let profile = match &args.profile {
        Some(path) => Profile::load(path)?,
        None => session_from_flags(&args)?,
    };
    let mut timeline = Timeline::new(&profile)?;
    let sample_rate = timeline.sample_rate();
    tracing::debug!(
        total_samples = timeline.total_samples(),
        segments = profile.segments.len(),
        "session resolved"
    );

    if let Some(name) = &profile.name {
        println!("Session: {name}");
    }
    if let Some(description) = &profile.description {
        println!("  {description}");
    }
    println!(
        "Rendering {:.2}s at {} Hz, {} segment(s)...",
        timeline.total_samples() as f64 / sample_rate,
        sample_rate,
        profile.segments.len()
    );

    let mut engine = SyncEngine::new(profile.engine_config());
    engine.prepare(sample_rate, timeline.block_size());

    let pb = ProgressBar::new(timeline.total_samples());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut samples = Vec::with_capacity(timeline.total_samples() as usize);
    let mut fired: Vec<(u64, TelegramEvent)> = Vec::new();
    let mut rendered = 0u64;

    while let Some((snapshot, n)) = timeline.next_block() {
        let out = engine.process_block(&snapshot, n);
        samples.extend_from_slice(out.pulse);
        for event in out.telegrams {
            fired.push((rendered + u64::from(event.offset), *event));
        }
        rendered += n as u64;
        pb.set_position(rendered);
    }
    pb.finish_with_message("done");

    if fired.is_empty() {
        println!("\nNo telegrams fired.");
    } else {
        println!("\nTelegrams:");
        for (position, event) in &fired {
            print_telegram(*position, event, sample_rate, args.wire);
        }
    }

    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    println!("\nStats:");
    println!("  Ticks fired: {}", engine.ticks_fired());
    println!("  Telegrams:   {}", fired.len());
    println!("  Peak:        {:.3}", peak);

    let spec = WavSpec {
        channels: if args.stereo { 2 } else { 1 },
        sample_rate: sample_rate as u32,
        bits_per_sample: args.bits,
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &samples, spec)?;
    println!("Wrote {} samples to {}", samples.len(), args.output.display());

    Ok(())
}

fn print_telegram(position: u64, event: &TelegramEvent, sample_rate: f64, wire: bool) {
    let label = match event.kind {
        TelegramKind::Tempo => "tempo",
        TelegramKind::BeatsPerBar => "beats/bar",
    };
    let seconds = position as f64 / sample_rate;
    if wire {
        let packet = encode(event);
        let bytes: Vec<String> = packet
            .messages()
            .iter()
            .map(|m| {
                let [status, data1, data2] = m.bytes();
                format!("{status:02X} {data1:02X} {data2:02X}")
            })
            .collect();
        println!(
            "  {position:>10}  ({seconds:8.3}s)  {label:<9} = {:<4}  [{}]",
            event.value,
            bytes.join(" | ")
        );
    } else {
        println!(
            "  {position:>10}  ({seconds:8.3}s)  {label:<9} = {}",
            event.value
        );
    }
}

/// Build the default lead-in / playback / tail session from the
/// command-line flags.
fn session_from_flags(args: &RenderArgs) -> anyhow::Result<Profile> {
    if args.bars <= 0.0 {
        anyhow::bail!("--bars must be positive");
    }

    let playback = Segment {
        state: TransportState::Play,
        record: false,
        bpm: None,
        signature: None,
        start_ppq: None,
        seconds: None,
        bars: Some(args.bars),
    };

    let mut segments = Vec::new();
    if args.lead_in > 0.0 {
        segments.push(Segment {
            state: TransportState::Stop,
            seconds: Some(args.lead_in),
            bars: None,
            ..playback.clone()
        });
    }
    segments.push(playback.clone());
    if args.tail > 0.0 {
        segments.push(Segment {
            state: TransportState::Stop,
            seconds: Some(args.tail),
            bars: None,
            ..playback
        });
    }

    Ok(Profile {
        name: None,
        description: None,
        sample_rate: f64::from(args.sample_rate),
        block_size: args.block_size,
        bpm: args.bpm,
        signature: args.signature.clone(),
        engine: EngineSection::default(),
        segments,
    })
}
