//! Generating the internal clock

use crate::scenarios::{self, run_internal_clock, PulseStats, LONG_PRESS_MS, SHORT_PRESS_MS};
use din_sync_core::{ButtonEvent, ClockMode, MidiMessage, SyncState, TransportState};

#[test]
fn test_internal_clock_at_120_bpm() {
    let state = SyncState::new();
    let sim = run_internal_clock(&state, 1_000);

    let stats = PulseStats::from_capture(sim.capture());
    assert_eq!(stats.count, 48);
    assert_eq!(stats.min_high_us, 5_000);
    assert_eq!(stats.max_high_us, 5_000);
    assert!((stats.mean_interval_us - 20_833.3).abs() < 25.0, "{stats:?}");

    for interval in sim.capture().intervals_us() {
        assert!(interval == 20_000 || interval == 21_000, "interval {interval}");
    }
}

#[test]
fn test_internal_clock_long_run_average() {
    let state = SyncState::new();
    let sim = run_internal_clock(&state, 60_000);

    // 120 BPM for a minute
    assert_eq!(sim.capture().pulses().len(), 2_880);
}

#[test]
fn test_long_press_enters_internal_mode_stopped() {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);

    sim.press_for_ms(LONG_PRESS_MS);
    assert_eq!(state.mode(), ClockMode::InternalGenerate);
    assert_eq!(state.transport(), TransportState::Stopped);
    assert_eq!(sim.button_events().len(), 1);
    assert_eq!(sim.button_events()[0].1, ButtonEvent::LongPress);

    sim.advance_ms(1_000);
    assert!(sim.capture().pulses().is_empty());
    assert!(!sim.run_high());
}

#[test]
fn test_mode_change_flashes_both_leds() {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);

    sim.set_switch(true);
    // 51 samples to close the debounce window, then 2000 of hold
    sim.advance_ms(2_051);
    assert_eq!(state.mode(), ClockMode::InternalGenerate);

    sim.advance_ms(1);
    assert!(sim.activity_led() && sim.beat_led());
    sim.advance_ms(249);
    assert!(sim.activity_led() && sim.beat_led());
    sim.advance_ms(1);
    assert!(!sim.beat_led());
}

#[test]
fn test_stopped_internal_mode_blinks_activity_led() {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);
    sim.press_for_ms(LONG_PRESS_MS);
    // Let the mode-change flash finish
    sim.advance_ms(300);

    let mut samples = Vec::new();
    for _ in 0..1_000 {
        sim.advance_ms(1);
        samples.push(sim.activity_led());
    }
    let lit = samples.iter().filter(|&&on| on).count();
    let rising = samples.windows(2).filter(|w| !w[0] && w[1]).count();
    assert_eq!(lit, 500);
    assert_eq!(rising, 2);
    assert!(!sim.beat_led());
}

#[test]
fn test_short_press_toggles_internal_transport() {
    let state = SyncState::new();
    let mut sim = run_internal_clock(&state, 500);
    assert!(sim.run_high());
    assert!(!sim.activity_led());

    sim.press_for_ms(SHORT_PRESS_MS);
    assert_eq!(state.transport(), TransportState::Stopped);
    assert!(!sim.run_high());

    let before = sim.capture().pulses().len();
    sim.advance_ms(1_000);
    assert_eq!(sim.capture().pulses().len(), before);
}

#[test]
fn test_midi_ignored_while_generating() {
    let state = SyncState::new();
    let mut sim = run_internal_clock(&state, 100);
    let before = sim.capture().pulses().len();

    sim.receive_message(MidiMessage::Stop);
    sim.receive_message(MidiMessage::TimingClock);
    sim.receive_message(MidiMessage::Start);

    assert_eq!(state.transport(), TransportState::Running);
    assert_eq!(sim.capture().pulses().len(), before);
    assert_eq!(sim.core().decoder_stats().muted, 3);
}

#[test]
fn test_long_press_back_to_external_keeps_running() {
    let state = SyncState::new();
    let mut sim = run_internal_clock(&state, 500);

    sim.press_for_ms(LONG_PRESS_MS);
    assert_eq!(state.mode(), ClockMode::ExternalFollow);
    assert_eq!(state.transport(), TransportState::Running);

    // Output now follows MIDI clock, starting over at the default width
    sim.capture_mut().clear();
    sim.send_clocks(2, 20_833);
    let pulses = sim.capture().pulses();
    assert_eq!(pulses.len(), 2);
    assert_eq!(pulses[0].high_us, Some(5_000));
    assert_eq!(pulses[1].high_us, Some(10_416));
}

#[test]
fn test_short_press_ignored_in_external_mode() {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);

    sim.press_for_ms(SHORT_PRESS_MS);
    assert_eq!(sim.button_events().len(), 1);
    assert_eq!(state.transport(), TransportState::Stopped);
    assert!(!sim.run_high());
}
