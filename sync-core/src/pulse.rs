//! Pulse timing engine
//!
//! Each clock event starts an output pulse whose width is half of the
//! interval measured since the previous event. The width is armed on the
//! timer's compare channel before the line goes high, and only the compare
//! interrupt ends the pulse, so the duty cycle stays at or below 50 % however
//! jittery the source is.

use crate::hal::{HalError, OutputLine, PulseTimer};
use crate::state::SyncState;
use crate::types::{SyncConfig, TriggerSource};

/// Owns the interval timer and the sync clock line
pub struct PulseEngine<T, O> {
    timer: T,
    clock_out: O,
    default_pulse_us: u16,
    beat_led_ms: u8,
    last_width_us: Option<u16>,
}

impl<T, O> PulseEngine<T, O>
where
    T: PulseTimer,
    O: OutputLine,
{
    /// Take ownership of the timer and the clock line
    pub fn new(timer: T, clock_out: O, config: &SyncConfig) -> Self {
        Self {
            timer,
            clock_out,
            default_pulse_us: config.default_pulse_us,
            beat_led_ms: config.beat_led_ms,
            last_width_us: None,
        }
    }

    /// Start a pulse; returns the scheduled width in microseconds
    pub fn trigger(&mut self, state: &SyncState, source: TriggerSource) -> Result<u16, HalError> {
        let width = self.next_width(state, source);

        self.timer.set_compare(width);
        self.clock_out.set_high()?;
        self.timer.restart();

        state.advance_beat(self.beat_led_ms);
        self.last_width_us = Some(width);

        sync_trace!("Pulse {:?} {}us", source, width);
        Ok(width)
    }

    /// Compare interrupt: end the pulse
    pub fn compare_match(&mut self) -> Result<(), HalError> {
        self.clock_out.set_low()
    }

    /// Overflow interrupt: the source is too slow to measure. The timer stays
    /// stopped so the next pulse falls back to the default width.
    pub fn timer_overflow(&mut self) {
        self.timer.stop();
        sync_debug!("Interval timer overflow, dropping sync reference");
    }

    /// Width of the most recent pulse
    pub fn last_width_us(&self) -> Option<u16> {
        self.last_width_us
    }

    /// Width used without a valid interval reference
    pub fn default_pulse_us(&self) -> u16 {
        self.default_pulse_us
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn clock_out(&self) -> &O {
        &self.clock_out
    }

    /// Give the timer and the clock line back
    pub fn release(self) -> (T, O) {
        (self.timer, self.clock_out)
    }

    fn next_width(&mut self, state: &SyncState, source: TriggerSource) -> u16 {
        // Consumed on every trigger so a stale request cannot linger
        let resync = state.take_resync();

        match source {
            TriggerSource::InternalClock => self.default_pulse_us,
            TriggerSource::MidiClock => {
                if resync || !self.timer.is_running() {
                    return self.default_pulse_us;
                }
                self.timer.stop();
                // A wrap after the flags were read leaves a meaningless count
                if self.timer.overflow_pending() {
                    return self.default_pulse_us;
                }
                (self.timer.count() / 2).max(1)
            }
        }
    }
}
