// Simulated timing report for the DIN Sync converter

use din_sync_core::{SyncState, FIRMWARE_VERSION};
use din_sync_tests::scenarios::{follow_midi_clock, run_internal_clock, PulseStats};

fn main() {
    println!("DIN Sync converter timing report (firmware v{FIRMWARE_VERSION})");
    println!();

    println!("External MIDI clock, 96 clocks after Start:");
    for bpm in [60, 90, 120, 180, 240, 300] {
        let state = SyncState::new();
        let sim = follow_midi_clock(&state, bpm, 96);
        report(&format!("{bpm:>3} BPM"), PulseStats::from_capture(sim.capture()));
    }
    println!();

    println!("Internal clock, 10 s running:");
    let state = SyncState::new();
    let sim = run_internal_clock(&state, 10_000);
    report("120 BPM", PulseStats::from_capture(sim.capture()));
}

fn report(label: &str, stats: PulseStats) {
    println!(
        "  {label}: {} pulses, high {}..{} us, mean interval {:.1} us, max duty {:.1} %",
        stats.count,
        stats.min_high_us,
        stats.max_high_us,
        stats.mean_interval_us,
        stats.max_duty_cycle * 100.0,
    );
}
