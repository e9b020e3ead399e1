//! Switch debouncing and the main-loop UI controller

use crate::hal::{HalError, OutputLine, SwitchInput};
use crate::indicator::IndicatorDriver;
use crate::state::SyncState;
use crate::types::{ButtonEvent, SyncConfig};

/// Debounce and short/long press discrimination, sampled once per millisecond
#[derive(Debug)]
pub struct ButtonDebouncer {
    debounce_ms: u16,
    long_press_ms: u16,
    pressed: bool,
    debounce_remaining: u16,
    hold_ms: u16,
    long_press_latched: bool,
}

impl ButtonDebouncer {
    /// Idle debouncer using the configured debounce and long-press times
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            debounce_ms: config.debounce_ms,
            long_press_ms: config.long_press_ms,
            pressed: false,
            debounce_remaining: 0,
            hold_ms: 0,
            long_press_latched: false,
        }
    }

    /// Feed one raw sample (true = pressed)
    pub fn sample(&mut self, pressed: bool) -> Option<ButtonEvent> {
        if pressed {
            self.sample_pressed()
        } else {
            self.sample_released()
        }
    }

    fn sample_pressed(&mut self) -> Option<ButtonEvent> {
        if !self.pressed {
            self.pressed = true;
            self.hold_ms = 0;
            self.long_press_latched = false;
            self.debounce_remaining = self.debounce_ms;
            return None;
        }

        if self.debounce_remaining > 0 {
            self.debounce_remaining -= 1;
            return None;
        }

        if self.long_press_latched {
            return None;
        }

        self.hold_ms = self.hold_ms.saturating_add(1);
        if self.hold_ms >= self.long_press_ms {
            self.long_press_latched = true;
            return Some(ButtonEvent::LongPress);
        }
        None
    }

    fn sample_released(&mut self) -> Option<ButtonEvent> {
        let event = if self.pressed && !self.long_press_latched && self.debounce_remaining == 0 {
            Some(ButtonEvent::ShortPress)
        } else {
            None
        };

        self.pressed = false;
        self.hold_ms = 0;
        self.debounce_remaining = 0;
        self.long_press_latched = false;
        event
    }

    /// Debounced switch level
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Milliseconds held since the debounce window closed
    pub fn hold_ms(&self) -> u16 {
        self.hold_ms
    }
}

/// Main-loop side of the device: LEDs and the switch, run once per tick
pub struct UiController<S, A, B> {
    switch: S,
    debouncer: ButtonDebouncer,
    indicators: IndicatorDriver<A, B>,
}

impl<S, A, B> UiController<S, A, B>
where
    S: SwitchInput,
    A: OutputLine,
    B: OutputLine,
{
    /// Create a controller over the switch and both indicator LEDs
    pub fn new(switch: S, activity_led: A, beat_led: B, config: SyncConfig) -> Self {
        Self {
            switch,
            debouncer: ButtonDebouncer::new(&config),
            indicators: IndicatorDriver::new(activity_led, beat_led, config),
        }
    }

    /// Consume the tick flag if set: refresh LEDs and sample the switch.
    /// Returns the button gesture completed on this tick, if any.
    pub fn poll(&mut self, state: &SyncState) -> Result<Option<ButtonEvent>, HalError> {
        if !state.take_tick() {
            return Ok(None);
        }

        self.indicators.refresh(state)?;

        let pressed = self.switch.is_pressed()?;
        let event = self.debouncer.sample(pressed);
        if let Some(event) = event {
            sync_debug!("Button {:?}", event);
        }
        Ok(event)
    }

    pub fn switch(&self) -> &S {
        &self.switch
    }

    pub fn indicators(&self) -> &IndicatorDriver<A, B> {
        &self.indicators
    }

    pub fn indicators_mut(&mut self) -> &mut IndicatorDriver<A, B> {
        &mut self.indicators
    }

    /// Debouncer state, for tests and diagnostics
    pub fn debouncer(&self) -> &ButtonDebouncer {
        &self.debouncer
    }

    /// Give back the switch and both LEDs
    pub fn release(self) -> (S, A, B) {
        let (activity_led, beat_led) = self.indicators.release();
        (self.switch, activity_led, beat_led)
    }
}
