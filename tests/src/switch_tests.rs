//! Switch gestures through the whole main-loop path

use crate::scenarios;
use din_sync_core::{ButtonEvent, SyncState};
use rstest::rstest;

#[rstest]
#[case::glitch(5, None)]
#[case::inside_debounce(50, None)]
#[case::shortest_press(51, Some(ButtonEvent::ShortPress))]
#[case::tap(150, Some(ButtonEvent::ShortPress))]
#[case::just_short_of_long(2_050, Some(ButtonEvent::ShortPress))]
#[case::long(2_051, Some(ButtonEvent::LongPress))]
#[case::very_long(8_000, Some(ButtonEvent::LongPress))]
fn test_press_duration_classification(#[case] hold_ms: u64, #[case] expected: Option<ButtonEvent>) {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);

    sim.press_for_ms(hold_ms);

    let events: Vec<ButtonEvent> = sim.button_events().iter().map(|&(_, event)| event).collect();
    assert_eq!(events, expected.into_iter().collect::<Vec<_>>());
}

#[test]
fn test_long_press_reported_while_held() {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);

    sim.set_switch(true);
    sim.advance_ms(3_000);
    assert_eq!(sim.button_events(), &[(2_051_000, ButtonEvent::LongPress)]);

    sim.set_switch(false);
    sim.advance_ms(10);
    assert_eq!(sim.button_events().len(), 1);
}

#[test]
fn test_contact_chatter_is_ignored() {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);

    for _ in 0..20 {
        sim.set_switch(true);
        sim.advance_ms(4);
        sim.set_switch(false);
        sim.advance_ms(3);
    }

    assert!(sim.button_events().is_empty());
}

#[test]
fn test_release_bounce_after_short_press() {
    let state = SyncState::new();
    let mut sim = scenarios::simulator(&state);

    sim.press_for_ms(200);
    // Bounce on release: short re-closures inside the debounce window
    for _ in 0..3 {
        sim.press_for_ms(2);
    }

    assert_eq!(sim.button_events().len(), 1);
    assert_eq!(sim.button_events()[0].1, ButtonEvent::ShortPress);
}
