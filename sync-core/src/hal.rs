//! Hardware Abstraction Layer for the sync converter

use embedded_hal::digital::{InputPin, OutputPin};

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Configuration outside the supported ranges
    InvalidConfig,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// A digital output: sync clock, run line or an LED
pub trait OutputLine {
    /// Drive the line (true = high)
    fn set_level(&mut self, high: bool) -> Result<(), HalError>;

    fn set_high(&mut self) -> Result<(), HalError> {
        self.set_level(true)
    }

    fn set_low(&mut self) -> Result<(), HalError> {
        self.set_level(false)
    }
}

/// 16-bit free-running interval counter at 1 MHz with one compare channel.
///
/// The counter measures the time since the last output pulse started. The
/// compare channel ends the pulse; an overflow interrupt is expected when
/// the counter wraps.
pub trait PulseTimer {
    /// True while the counter is enabled
    fn is_running(&self) -> bool;

    /// Microseconds counted since the last restart
    fn count(&self) -> u16;

    /// True once the counter has wrapped and the overflow flag is not yet
    /// cleared by a restart
    fn overflow_pending(&self) -> bool;

    /// Halt the counter, keeping its value
    fn stop(&mut self);

    /// Zero the counter, clear the compare and overflow flags and enable it
    fn restart(&mut self);

    /// Compare value (counter ticks after restart) that ends the pulse
    fn set_compare(&mut self, ticks: u16);
}

/// Momentary switch
pub trait SwitchInput {
    /// True while the switch is held down
    fn is_pressed(&mut self) -> Result<bool, HalError>;
}

/// `embedded-hal` output pin as an [`OutputLine`]
pub struct EmbeddedHalOutput<P> {
    pin: P,
    inverted: bool,
}

impl<P> EmbeddedHalOutput<P>
where
    P: OutputPin,
{
    /// Wrap a pin; `inverted` swaps the electrical levels
    pub fn new(pin: P, inverted: bool) -> Self {
        Self { pin, inverted }
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> OutputLine for EmbeddedHalOutput<P>
where
    P: OutputPin,
{
    fn set_level(&mut self, high: bool) -> Result<(), HalError> {
        let output_state = if self.inverted { !high } else { high };
        if output_state {
            self.pin.set_high().map_err(|_| HalError::GpioError)
        } else {
            self.pin.set_low().map_err(|_| HalError::GpioError)
        }
    }
}

/// `embedded-hal` input pin as a [`SwitchInput`], pulled up and shorted to
/// ground when pressed
pub struct EmbeddedHalSwitch<P> {
    pin: P,
}

impl<P> EmbeddedHalSwitch<P>
where
    P: InputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> SwitchInput for EmbeddedHalSwitch<P>
where
    P: InputPin,
{
    fn is_pressed(&mut self) -> Result<bool, HalError> {
        self.pin.is_low().map_err(|_| HalError::GpioError)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use core::cell::Cell;
    use heapless::Vec;

    /// Output line that remembers its level and every change
    #[derive(Default)]
    pub struct MockLine {
        level: bool,
        writes: usize,
        edges: Vec<bool, 64>,
    }

    impl MockLine {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_high(&self) -> bool {
            self.level
        }

        /// Number of `set_level` calls, including ones that kept the level
        pub fn writes(&self) -> usize {
            self.writes
        }

        /// The most recent level changes, oldest first
        pub fn edges(&self) -> &[bool] {
            &self.edges
        }
    }

    impl OutputLine for MockLine {
        fn set_level(&mut self, high: bool) -> Result<(), HalError> {
            self.writes += 1;
            if high != self.level {
                if self.edges.is_full() {
                    self.edges.remove(0);
                }
                self.edges.push(high).ok();
            }
            self.level = high;
            Ok(())
        }
    }

    /// Output line whose every write fails
    pub struct FaultyLine;

    impl OutputLine for FaultyLine {
        fn set_level(&mut self, _high: bool) -> Result<(), HalError> {
            Err(HalError::GpioError)
        }
    }

    /// Manually advanced pulse timer
    ///
    /// `advance` moves the counter and reports whether the compare value or
    /// the 16-bit overflow was crossed; the caller turns those into
    /// interrupts.
    #[derive(Default)]
    pub struct MockPulseTimer {
        running: bool,
        count: u32,
        compare: u16,
        compare_pending: bool,
        overflowed: bool,
        restarts: usize,
    }

    /// Interrupt conditions raised while advancing the mock timer
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct TimerEvents {
        pub compare: bool,
        pub overflow: bool,
    }

    impl MockPulseTimer {
        /// A stopped timer
        pub fn new() -> Self {
            Self::default()
        }

        /// A timer that has been counting since boot, like the hardware
        pub fn started() -> Self {
            Self {
                running: true,
                ..Self::default()
            }
        }

        pub fn compare(&self) -> u16 {
            self.compare
        }

        pub fn restarts(&self) -> usize {
            self.restarts
        }

        /// Count `micros` ticks; stops at the overflow like the real timer
        /// would raise its interrupt there
        pub fn advance(&mut self, micros: u32) -> TimerEvents {
            let mut events = TimerEvents::default();
            if !self.running {
                return events;
            }

            let target = self.count + micros;
            if self.compare_pending && self.count < self.compare as u32 && target >= self.compare as u32 {
                self.compare_pending = false;
                events.compare = true;
            }
            if target > TIMER_TOP {
                events.overflow = true;
                self.overflowed = true;
                self.count = target - (TIMER_TOP + 1);
            } else {
                self.count = target;
            }
            events
        }

        /// Microseconds until `advance` would next report a compare or overflow
        pub fn next_event_in(&self) -> Option<u32> {
            if !self.running {
                return None;
            }
            let overflow = TIMER_TOP + 1 - self.count;
            if self.compare_pending && self.count < self.compare as u32 {
                Some(overflow.min(self.compare as u32 - self.count))
            } else {
                Some(overflow)
            }
        }
    }

    const TIMER_TOP: u32 = u16::MAX as u32;

    impl PulseTimer for MockPulseTimer {
        fn is_running(&self) -> bool {
            self.running
        }

        fn count(&self) -> u16 {
            self.count as u16
        }

        fn overflow_pending(&self) -> bool {
            self.overflowed
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn restart(&mut self) {
            self.count = 0;
            self.running = true;
            self.compare_pending = true;
            self.overflowed = false;
            self.restarts += 1;
        }

        fn set_compare(&mut self, ticks: u16) {
            self.compare = ticks;
        }
    }

    /// Switch whose state is set by the test
    #[derive(Default)]
    pub struct MockSwitch {
        pressed: Cell<bool>,
    }

    impl MockSwitch {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_pressed(&self, pressed: bool) {
            self.pressed.set(pressed);
        }
    }

    impl SwitchInput for MockSwitch {
        fn is_pressed(&mut self) -> Result<bool, HalError> {
            Ok(self.pressed.get())
        }
    }

    impl SwitchInput for &MockSwitch {
        fn is_pressed(&mut self) -> Result<bool, HalError> {
            Ok(self.pressed.get())
        }
    }
}
