//! Property-based checks of the timing invariants

use crate::scenarios;
use din_sync_core::{
    ButtonDebouncer, ButtonEvent, ClockMode, MidiMessage, SyncConfig, SyncState, TransportEvent,
    TransportFsm, TransportState,
};
use proptest::prelude::*;

fn hold(debouncer: &mut ButtonDebouncer, pressed_ms: u32) -> Vec<ButtonEvent> {
    let mut events: Vec<ButtonEvent> = (0..pressed_ms).filter_map(|_| debouncer.sample(true)).collect();
    events.extend(debouncer.sample(false));
    events
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every pulse after the first is half of the interval that preceded it,
    /// and the compare interrupt ends it on time whenever the next clock
    /// comes later than that.
    #[test]
    fn prop_width_is_half_previous_interval(intervals in prop::collection::vec(1_000u64..=60_000, 2..40)) {
        let state = SyncState::new();
        let mut sim = scenarios::simulator(&state);
        sim.receive_message(MidiMessage::Start);
        for &interval in &intervals {
            sim.receive_message(MidiMessage::TimingClock);
            sim.advance_us(interval);
        }

        let pulses = sim.capture().pulses();
        prop_assert_eq!(pulses.len(), intervals.len());
        prop_assert_eq!(pulses[0].scheduled_us, 5_000);
        for i in 1..pulses.len() {
            let expected = (intervals[i - 1] / 2).max(1) as u16;
            prop_assert_eq!(pulses[i].scheduled_us, expected);
            if intervals[i] > u64::from(expected) {
                prop_assert_eq!(pulses[i].high_us, Some(u64::from(expected)));
            }
        }
    }

    #[test]
    fn prop_beat_counter_wraps_at_24(clocks in 0usize..200) {
        let state = SyncState::new();
        let _sim = scenarios::follow_midi_clock(&state, 120, clocks);
        prop_assert_eq!(state.beat_count() as usize, clocks % 24);
    }

    #[test]
    fn prop_long_press_resets_beat_keeps_transport(clocks in 0usize..100, running in any::<bool>()) {
        let state = SyncState::new();
        let mut sim = scenarios::follow_midi_clock(&state, 240, clocks);
        if !running {
            sim.receive_message(MidiMessage::Stop);
        }

        let transition = TransportFsm::new(&state, SyncConfig::default())
            .apply(TransportEvent::LongPress)
            .unwrap();
        prop_assert_eq!(transition.mode, ClockMode::InternalGenerate);
        prop_assert_eq!(transition.transport, TransportState::from_running(running));
        prop_assert_eq!(state.beat_count(), 0);
    }

    #[test]
    fn prop_press_duration_decides_gesture(pressed_ms in 0u32..4_000) {
        let mut debouncer = ButtonDebouncer::new(&SyncConfig::default());
        let events = hold(&mut debouncer, pressed_ms);

        let expected = match pressed_ms {
            0..=50 => vec![],
            51..=2_050 => vec![ButtonEvent::ShortPress],
            _ => vec![ButtonEvent::LongPress],
        };
        prop_assert_eq!(events, expected);
    }

    #[test]
    fn prop_chatter_never_emits(bursts in prop::collection::vec((1u32..=50, 1u32..10), 1..30)) {
        let mut debouncer = ButtonDebouncer::new(&SyncConfig::default());
        for (on_ms, off_ms) in bursts {
            prop_assert!(hold(&mut debouncer, on_ms).is_empty());
            for _ in 1..off_ms {
                prop_assert_eq!(debouncer.sample(false), None);
            }
        }
    }
}
