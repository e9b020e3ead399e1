//! Test utilities for the sync core

pub mod pulse_capture {
    //! Output capture and analysis for the sync clock line

    use std::vec::Vec;

    /// One output pulse as seen on the sync clock line
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CapturedPulse {
        /// Time the pulse was triggered, in microseconds since simulation start
        pub start_us: u64,
        /// Width scheduled on the compare channel
        pub scheduled_us: u16,
        /// Time the line actually spent high, once it has fallen
        pub high_us: Option<u64>,
    }

    /// Pulse capture buffer
    #[derive(Debug, Default)]
    pub struct PulseCapture {
        pulses: Vec<CapturedPulse>,
        run_edges: Vec<(u64, bool)>,
    }

    impl PulseCapture {
        pub fn new() -> Self {
            Self::default()
        }

        /// Record a trigger; a pulse still high is retriggered without a falling edge
        pub fn pulse_started(&mut self, start_us: u64, scheduled_us: u16) {
            self.pulses.push(CapturedPulse {
                start_us,
                scheduled_us,
                high_us: None,
            });
        }

        /// Record the falling edge of the current pulse
        pub fn pulse_ended(&mut self, end_us: u64) {
            if let Some(pulse) = self.pulses.last_mut() {
                if pulse.high_us.is_none() {
                    pulse.high_us = Some(end_us - pulse.start_us);
                }
            }
        }

        pub fn run_changed(&mut self, at_us: u64, high: bool) {
            self.run_edges.push((at_us, high));
        }

        pub fn pulses(&self) -> &[CapturedPulse] {
            &self.pulses
        }

        pub fn run_edges(&self) -> &[(u64, bool)] {
            &self.run_edges
        }

        pub fn clear(&mut self) {
            self.pulses.clear();
            self.run_edges.clear();
        }

        /// Start-to-start intervals between consecutive pulses
        pub fn intervals_us(&self) -> Vec<u64> {
            self.pulses
                .windows(2)
                .map(|pair| pair[1].start_us - pair[0].start_us)
                .collect()
        }

        /// Largest high time divided by the interval that follows it
        pub fn max_duty_cycle(&self) -> f64 {
            self.pulses
                .windows(2)
                .filter_map(|pair| {
                    let high = pair[0].high_us? as f64;
                    let interval = (pair[1].start_us - pair[0].start_us) as f64;
                    Some(high / interval)
                })
                .fold(0.0, f64::max)
        }
    }
}

pub mod simulator {
    //! Microsecond-stepped model of the device: interrupts, main loop and I/O

    use super::pulse_capture::PulseCapture;
    use crate::controller::UiController;
    use crate::dispatch::{Irq, SyncCore};
    use crate::hal::mock::{MockLine, MockPulseTimer, MockSwitch};
    use crate::state::SyncState;
    use crate::types::{ButtonEvent, MidiMessage, SyncConfig};
    use std::collections::VecDeque;
    use std::vec::Vec;

    const TICK_US: u64 = 1_000;

    /// Drives a [`SyncCore`] and a [`UiController`] against mock hardware in
    /// virtual time. Interrupts are serviced at the exact microsecond they
    /// would fire; the main loop runs once after every tick.
    pub struct SyncSimulator<'a> {
        core: SyncCore<'a, MockPulseTimer, MockLine, MockLine>,
        ui: UiController<MockSwitch, MockLine, MockLine>,
        state: &'a SyncState,
        now_us: u64,
        next_tick_us: u64,
        pending: VecDeque<Irq>,
        capture: PulseCapture,
        buttons: Vec<(u64, ButtonEvent)>,
        restarts_seen: usize,
        clock_high: bool,
        run_high: bool,
    }

    impl<'a> SyncSimulator<'a> {
        pub fn new(state: &'a SyncState, config: SyncConfig) -> Self {
            let mut core = SyncCore::new(
                state,
                MockPulseTimer::started(),
                MockLine::new(),
                MockLine::new(),
                config,
            )
            .expect("simulator needs a valid configuration");
            core.init().ok();

            Self {
                core,
                ui: UiController::new(MockSwitch::new(), MockLine::new(), MockLine::new(), config),
                state,
                now_us: 0,
                next_tick_us: TICK_US,
                pending: VecDeque::new(),
                capture: PulseCapture::new(),
                buttons: Vec::new(),
                restarts_seen: 0,
                clock_high: false,
                run_high: false,
            }
        }

        pub fn now_us(&self) -> u64 {
            self.now_us
        }

        pub fn state(&self) -> &'a SyncState {
            self.state
        }

        pub fn core(&self) -> &SyncCore<'a, MockPulseTimer, MockLine, MockLine> {
            &self.core
        }

        pub fn capture(&self) -> &PulseCapture {
            &self.capture
        }

        pub fn capture_mut(&mut self) -> &mut PulseCapture {
            &mut self.capture
        }

        /// Gestures the main loop recognised, with their time
        pub fn button_events(&self) -> &[(u64, ButtonEvent)] {
            &self.buttons
        }

        pub fn clock_high(&self) -> bool {
            self.clock_high
        }

        pub fn run_high(&self) -> bool {
            self.run_high
        }

        pub fn activity_led(&self) -> bool {
            self.ui.indicators().activity_led().is_high()
        }

        pub fn beat_led(&self) -> bool {
            self.ui.indicators().beat_led().is_high()
        }

        /// Deliver one received byte now
        pub fn receive(&mut self, byte: u8) {
            self.pending.push_back(Irq::SerialRx(byte));
            self.service_pending();
        }

        pub fn receive_message(&mut self, message: MidiMessage) {
            self.receive(message.status_byte());
        }

        /// Send `count` timing clocks, one every `interval_us`
        pub fn send_clocks(&mut self, count: usize, interval_us: u64) {
            for _ in 0..count {
                self.receive(MidiMessage::TIMING_CLOCK);
                self.advance_us(interval_us);
            }
        }

        /// MIDI clock interval for a tempo, rounded down to whole microseconds
        pub fn clock_interval_us(bpm: u32) -> u64 {
            60_000_000 / (u64::from(bpm) * 24)
        }

        pub fn set_switch(&mut self, pressed: bool) {
            self.ui.switch().set_pressed(pressed);
        }

        /// Hold the switch for `hold_ms`, release it and let the main loop
        /// see the release
        pub fn press_for_ms(&mut self, hold_ms: u64) {
            self.set_switch(true);
            self.advance_ms(hold_ms);
            self.set_switch(false);
            self.advance_ms(1);
        }

        pub fn advance_ms(&mut self, ms: u64) {
            self.advance_us(ms * TICK_US);
        }

        /// Move virtual time forward, firing every interrupt on its due microsecond
        pub fn advance_us(&mut self, micros: u64) {
            let end = self.now_us + micros;
            loop {
                if self.now_us == self.next_tick_us {
                    self.next_tick_us += TICK_US;
                    self.pending.push_back(Irq::Tick);
                    self.service_pending();
                    self.run_main_loop();
                }

                if self.now_us >= end {
                    break;
                }

                let mut step = (end - self.now_us).min(self.next_tick_us - self.now_us);
                if let Some(due) = self.core.engine().timer().next_event_in() {
                    step = step.min(u64::from(due));
                }

                let events = self.core.engine_mut().timer_mut().advance(step as u32);
                self.now_us += step;
                if events.compare {
                    self.pending.push_back(Irq::CompareMatch);
                }
                if events.overflow {
                    self.pending.push_back(Irq::TimerOverflow);
                }
                self.service_pending();
            }
        }

        fn service_pending(&mut self) {
            while let Some(irq) = self.pending.pop_front() {
                self.core.service(irq).ok();
                self.observe_outputs();
            }
        }

        fn run_main_loop(&mut self) {
            if let Ok(Some(event)) = self.ui.poll(self.state) {
                self.buttons.push((self.now_us, event));
                critical_section::with(|_| self.core.handle_button(event)).ok();
                self.observe_outputs();
            }
        }

        fn observe_outputs(&mut self) {
            let restarts = self.core.engine().timer().restarts();
            if restarts != self.restarts_seen {
                self.restarts_seen = restarts;
                let scheduled = self.core.engine().last_width_us().unwrap_or_default();
                self.capture.pulse_started(self.now_us, scheduled);
            }

            let clock_high = self.core.engine().clock_out().is_high();
            if self.clock_high && !clock_high {
                self.capture.pulse_ended(self.now_us);
            }
            self.clock_high = clock_high;

            let run_high = self.core.run_out().is_high();
            if run_high != self.run_high {
                self.capture.run_changed(self.now_us, run_high);
                self.run_high = run_high;
            }
        }
    }
}

pub use pulse_capture::{CapturedPulse, PulseCapture};
pub use simulator::SyncSimulator;
