//! LED indication, refreshed once per millisecond by the main loop

use crate::hal::{HalError, OutputLine};
use crate::state::SyncState;
use crate::types::{ClockMode, SyncConfig};

/// Levels for the two front-panel LEDs
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorLevels {
    pub activity: bool,
    pub beat: bool,
}

impl IndicatorLevels {
    /// Derive LED levels from the shared state.
    ///
    /// External mode shows MIDI activity; internal mode blinks slowly while
    /// stopped and stays dark while running. The beat LED only lights while
    /// running.
    pub fn from_state(state: &SyncState, config: &SyncConfig) -> Self {
        let running = state.is_running();
        let activity = match state.mode() {
            ClockMode::ExternalFollow => state.activity_led_active(),
            ClockMode::InternalGenerate if !running => {
                state.blink_phase_ms() < config.idle_blink_period_ms / 2
            }
            ClockMode::InternalGenerate => false,
        };

        Self {
            activity,
            beat: running && state.beat_led_active(),
        }
    }

    /// Both LEDs lit
    pub const fn all_on() -> Self {
        Self {
            activity: true,
            beat: true,
        }
    }
}

/// Drives the activity and beat LEDs
pub struct IndicatorDriver<A, B> {
    activity_led: A,
    beat_led: B,
    config: SyncConfig,
    flash_ms: u16,
}

impl<A, B> IndicatorDriver<A, B>
where
    A: OutputLine,
    B: OutputLine,
{
    /// Drive the two LEDs with the configured flash and blink timing
    pub fn new(activity_led: A, beat_led: B, config: SyncConfig) -> Self {
        Self {
            activity_led,
            beat_led,
            config,
            flash_ms: 0,
        }
    }

    /// One millisecond step: update both LEDs, then count the timers down
    pub fn refresh(&mut self, state: &SyncState) -> Result<IndicatorLevels, HalError> {
        if state.take_mode_changed() {
            self.flash_ms = self.config.mode_flash_ms;
        }

        let levels = if self.flash_ms > 0 {
            self.flash_ms -= 1;
            IndicatorLevels::all_on()
        } else {
            IndicatorLevels::from_state(state, &self.config)
        };

        state.decrement_indicators();
        self.write(levels)?;
        Ok(levels)
    }

    /// Drive both LEDs directly, e.g. for the power-on flash
    pub fn write(&mut self, levels: IndicatorLevels) -> Result<(), HalError> {
        self.activity_led.set_level(levels.activity)?;
        self.beat_led.set_level(levels.beat)
    }

    pub fn activity_led(&self) -> &A {
        &self.activity_led
    }

    pub fn beat_led(&self) -> &B {
        &self.beat_led
    }

    pub fn release(self) -> (A, B) {
        (self.activity_led, self.beat_led)
    }
}
