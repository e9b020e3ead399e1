//! embedded-hal adapters driven by pin transaction mocks

use din_sync_core::hal::mock::{MockLine, MockPulseTimer};
use din_sync_core::hal::{EmbeddedHalOutput, EmbeddedHalSwitch};
use din_sync_core::{
    ButtonEvent, HalError, Irq, OutputLine, SwitchInput, SyncConfig, SyncCore, SyncState,
    UiController,
};
use embedded_hal_mock::eh1::pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
use embedded_hal_mock::eh1::MockError;
use std::io::ErrorKind;

#[test]
fn test_output_adapter_drives_pin() {
    let expectations = [
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ];
    let mut line = EmbeddedHalOutput::new(PinMock::new(&expectations), false);

    line.set_high().unwrap();
    line.set_low().unwrap();

    line.release().done();
}

#[test]
fn test_inverted_output_adapter() {
    let expectations = [PinTransaction::set(PinState::Low)];
    let mut line = EmbeddedHalOutput::new(PinMock::new(&expectations), true);

    line.set_level(true).unwrap();

    line.release().done();
}

#[test]
fn test_output_adapter_maps_pin_error() {
    let expectations =
        [PinTransaction::set(PinState::High).with_error(MockError::Io(ErrorKind::NotConnected))];
    let mut line = EmbeddedHalOutput::new(PinMock::new(&expectations), false);

    assert_eq!(line.set_high(), Err(HalError::GpioError));

    line.release().done();
}

#[test]
fn test_switch_adapter_reads_active_low() {
    let expectations = [
        PinTransaction::get(PinState::High),
        PinTransaction::get(PinState::Low),
    ];
    let mut switch = EmbeddedHalSwitch::new(PinMock::new(&expectations));

    assert!(!switch.is_pressed().unwrap());
    assert!(switch.is_pressed().unwrap());

    switch.release().done();
}

#[test]
fn test_sync_lines_through_pins() {
    let state = SyncState::new();
    let clock_expectations = [
        // init
        PinTransaction::set(PinState::Low),
        // clock byte
        PinTransaction::set(PinState::High),
        // compare match
        PinTransaction::set(PinState::Low),
    ];
    let run_expectations = [
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ];
    let mut core = SyncCore::new(
        &state,
        MockPulseTimer::started(),
        EmbeddedHalOutput::new(PinMock::new(&clock_expectations), false),
        EmbeddedHalOutput::new(PinMock::new(&run_expectations), false),
        SyncConfig::default(),
    )
    .unwrap();

    core.init().unwrap();
    core.service(Irq::SerialRx(0xFA)).unwrap();
    core.service(Irq::SerialRx(0xF8)).unwrap();
    core.service(Irq::CompareMatch).unwrap();
    core.service(Irq::SerialRx(0xFC)).unwrap();

    let (_timer, clock, run) = core.release();
    clock.release().done();
    run.release().done();
}

#[test]
fn test_switch_pin_feeds_controller() {
    let state = SyncState::new();
    // 60 ms held, then released
    let mut expectations: Vec<PinTransaction> = (0..60).map(|_| PinTransaction::get(PinState::Low)).collect();
    expectations.push(PinTransaction::get(PinState::High));

    let switch = EmbeddedHalSwitch::new(PinMock::new(&expectations));
    let mut ui = UiController::new(switch, MockLine::new(), MockLine::new(), SyncConfig::default());

    let mut events = Vec::new();
    for _ in 0..expectations.len() {
        state.raise_tick();
        events.extend(ui.poll(&state).unwrap());
    }
    assert_eq!(events, vec![ButtonEvent::ShortPress]);

    let (switch, _, _) = ui.release();
    switch.release().done();
}
