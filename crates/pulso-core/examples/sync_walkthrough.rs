//! Sync walkthrough: meter derivation, engine constants, and a scripted
//! stop/play/stop session showing ticks and telegrams.
//!
//! Run with: cargo run -p pulso-core --example sync_walkthrough

use pulso_core::{Meter, PositionSnapshot, SyncEngine, TelegramKind, TimeSignature};

fn main() {
    let sample_rate = 48000.0;
    let bpm = 120.0;
    let block = 500usize;

    // --- Meter derivation ---
    println!("=== Meter Derivation at {bpm} BPM ===\n");
    println!(
        "{:<12} {:>10} {:>8} {:>14}",
        "Signature", "Beats/Bar", "Eighth", "Reported BPM"
    );
    println!("{:-<12} {:->10} {:->8} {:->14}", "", "", "", "");

    for (num, den) in [(4u32, 4u32), (3, 4), (5, 4), (2, 2), (6, 8), (7, 8)] {
        let sig = TimeSignature::new(num, den);
        let meter = Meter::from_signature(sig);
        let name = sig.to_string();
        println!(
            "{:<12} {:>10} {:>8} {:>14}",
            name,
            meter.beats_per_bar,
            if meter.eighth_note { "yes" } else { "no" },
            meter.reported_bpm(bpm)
        );
    }

    // --- Engine constants ---
    let mut engine = SyncEngine::default();
    engine.prepare(sample_rate, block);

    println!("\n=== Engine at {sample_rate} Hz ===\n");
    println!("Pulse length: {} samples", engine.pulse_length());
    println!(
        "Tick spacing: {} to {} samples",
        engine.min_tick_spacing(),
        engine.max_tick_spacing()
    );

    // --- Scripted session ---
    println!("\n=== Session: quarter second stopped, one bar of 4/4, half second stopped ===\n");

    let signature = TimeSignature::new(4, 4);
    let mut absolute = 0u64;
    let mut telegrams = Vec::new();
    let mut onsets = Vec::new();
    let mut prev = 0.0f32;

    // At rest the startup reports fire almost immediately.
    for _ in 0..24 {
        let snapshot = PositionSnapshot {
            bpm: Some(bpm),
            time_signature: Some(signature),
            ppq_position: Some(0.0),
            bar_start_ppq: Some(0.0),
            elapsed_samples: Some(0),
            ..PositionSnapshot::default()
        };
        let out = engine.process_block(&snapshot, block);
        for ev in out.telegrams {
            telegrams.push((absolute + u64::from(ev.offset), *ev));
        }
        absolute += block as u64;
    }

    // One bar rolling from the bar line: 96 ticks, 1000 samples apart.
    let mut ppq = 0.0f64;
    let mut elapsed = 0i64;
    for _ in 0..192 {
        let snapshot = PositionSnapshot {
            is_playing: true,
            bpm: Some(bpm),
            time_signature: Some(signature),
            ppq_position: Some(ppq),
            bar_start_ppq: Some(0.0),
            elapsed_samples: Some(elapsed),
            ..PositionSnapshot::default()
        };
        {
            let out = engine.process_block(&snapshot, block);
            for (i, &s) in out.pulse.iter().enumerate() {
                if s > 0.0 && prev == 0.0 {
                    onsets.push(absolute + i as u64);
                }
                prev = s;
            }
            for ev in out.telegrams {
                telegrams.push((absolute + u64::from(ev.offset), *ev));
            }
        }
        absolute += block as u64;
        ppq += bpm / (60.0 * sample_rate) * block as f64;
        elapsed += block as i64;
    }

    println!("Sync acquired while rolling: {}", engine.is_synced());
    println!("Ticks fired in one bar:      {}", engine.ticks_fired());

    // Half a second at rest: the muted tempo channel reports a quarter
    // second after the stop.
    for _ in 0..48 {
        let snapshot = PositionSnapshot {
            bpm: Some(bpm),
            time_signature: Some(signature),
            ppq_position: Some(ppq),
            bar_start_ppq: Some(0.0),
            elapsed_samples: Some(elapsed),
            ..PositionSnapshot::default()
        };
        let out = engine.process_block(&snapshot, block);
        for ev in out.telegrams {
            telegrams.push((absolute + u64::from(ev.offset), *ev));
        }
        absolute += block as u64;
    }

    // --- First ticks ---
    println!("\n--- First Ticks ---\n");
    println!("{:>4} {:>10} {:>8}", "Tick", "Sample", "Gap");
    println!("{:->4} {:->10} {:->8}", "", "", "");
    for (i, pos) in onsets.iter().take(8).enumerate() {
        let gap = if i == 0 { 0 } else { pos - onsets[i - 1] };
        println!("{:>4} {:>10} {:>8}", i, pos, gap);
    }

    // --- Telegrams ---
    println!("\n--- Telegrams ---\n");
    println!("{:>10}  {:<10} {:>6}", "Sample", "Kind", "Value");
    println!("{:->10}  {:-<10} {:->6}", "", "", "");
    for (pos, ev) in &telegrams {
        let kind = match ev.kind {
            TelegramKind::Tempo => "tempo",
            TelegramKind::BeatsPerBar => "beats/bar",
        };
        println!("{:>10}  {:<10} {:>6}", pos, kind, ev.value);
    }

    println!("\nSync walkthrough complete.");
}
