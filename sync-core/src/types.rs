//! Core data types for the sync converter

/// DIN Sync 24 resolution: pulses per quarter note
pub const PPQN: u8 = 24;

/// Largest interval the 16-bit, 1 MHz pulse timer can measure
pub const TIMER_RANGE_US: u16 = u16::MAX;

/// Source of the output clock
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockMode {
    /// Follow MIDI clock received on the serial input
    ExternalFollow = 0,
    /// Generate a fixed-tempo clock from the millisecond tick
    InternalGenerate = 1,
}

impl ClockMode {
    /// Decode the stored representation; unknown values map to external
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ClockMode::InternalGenerate,
            _ => ClockMode::ExternalFollow,
        }
    }

    /// The other mode
    pub const fn toggled(&self) -> Self {
        match self {
            ClockMode::ExternalFollow => ClockMode::InternalGenerate,
            ClockMode::InternalGenerate => ClockMode::ExternalFollow,
        }
    }

    /// Returns true if MIDI input drives the clock
    pub const fn is_external(&self) -> bool {
        matches!(self, ClockMode::ExternalFollow)
    }
}

/// Run/stop state of the sequence
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportState {
    Stopped,
    Running,
}

impl TransportState {
    /// Running for true, stopped for false
    pub const fn from_running(running: bool) -> Self {
        if running {
            TransportState::Running
        } else {
            TransportState::Stopped
        }
    }

    /// Returns true while the run line should be high
    pub const fn is_running(&self) -> bool {
        matches!(self, TransportState::Running)
    }

    /// The other transport state, for the internal-mode short press
    pub const fn toggled(&self) -> Self {
        match self {
            TransportState::Stopped => TransportState::Running,
            TransportState::Running => TransportState::Stopped,
        }
    }
}

/// MIDI system real-time messages understood by the decoder
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MidiMessage {
    /// 0xF8, 24 per quarter note
    TimingClock,
    /// 0xFA
    Start,
    /// 0xFB
    Continue,
    /// 0xFC
    Stop,
}

impl MidiMessage {
    pub const TIMING_CLOCK: u8 = 0xF8;
    pub const START: u8 = 0xFA;
    pub const CONTINUE: u8 = 0xFB;
    pub const STOP: u8 = 0xFC;

    /// Map a received byte to a message; every other value is ignored
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            Self::TIMING_CLOCK => Some(MidiMessage::TimingClock),
            Self::START => Some(MidiMessage::Start),
            Self::CONTINUE => Some(MidiMessage::Continue),
            Self::STOP => Some(MidiMessage::Stop),
            _ => None,
        }
    }

    /// Wire value of this message
    pub const fn status_byte(&self) -> u8 {
        match self {
            MidiMessage::TimingClock => Self::TIMING_CLOCK,
            MidiMessage::Start => Self::START,
            MidiMessage::Continue => Self::CONTINUE,
            MidiMessage::Stop => Self::STOP,
        }
    }
}

/// Debounced switch gestures
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Released after debounce, before the long-press threshold
    ShortPress,
    /// Held past the long-press threshold, fires once per press
    LongPress,
}

/// Inputs to the transport and mode state machine
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    Start,
    Continue,
    Stop,
    ShortPress,
    LongPress,
}

impl From<ButtonEvent> for TransportEvent {
    fn from(event: ButtonEvent) -> Self {
        match event {
            ButtonEvent::ShortPress => TransportEvent::ShortPress,
            ButtonEvent::LongPress => TransportEvent::LongPress,
        }
    }
}

/// What started an output pulse
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerSource {
    /// MIDI timing clock byte in external mode
    MidiClock,
    /// Internal clock rollover in internal mode
    InternalClock,
}

/// Timing constants for the converter
///
/// Everything here is fixed at build time; nothing is persisted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncConfig {
    /// Pulse width used when no valid interval reference exists
    pub default_pulse_us: u16,
    /// Switch debounce window
    pub debounce_ms: u16,
    /// Hold time (after debounce) that turns a press into a long press
    pub long_press_ms: u16,
    /// Tempo of the internal clock
    pub internal_bpm: u16,
    /// MIDI activity LED on-time per clock byte
    pub activity_led_ms: u8,
    /// Beat LED on-time per quarter note
    pub beat_led_ms: u8,
    /// Activity LED blink period while internal mode is stopped
    pub idle_blink_period_ms: u16,
    /// Both LEDs lit after a mode toggle
    pub mode_flash_ms: u16,
}

impl Default for SyncConfig {
    fn default() -> Self {
        crate::default_config()
    }
}

impl SyncConfig {
    /// Create a new configuration with validation
    pub fn new(
        default_pulse_us: u16,
        debounce_ms: u16,
        long_press_ms: u16,
        internal_bpm: u16,
    ) -> Result<Self, &'static str> {
        let config = Self {
            default_pulse_us,
            debounce_ms,
            long_press_ms,
            internal_bpm,
            ..crate::default_config()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its supported range
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.default_pulse_us == 0 || self.default_pulse_us > TIMER_RANGE_US / 2 {
            return Err("Default pulse must be between 1 and 32767 us");
        }
        if self.debounce_ms > 200 {
            return Err("Debounce must be <= 200ms");
        }
        if self.long_press_ms <= self.debounce_ms || self.long_press_ms > 10_000 {
            return Err("Long press must exceed debounce and be <= 10000ms");
        }
        if !(30..=300).contains(&self.internal_bpm) {
            return Err("Internal BPM must be between 30 and 300");
        }
        if self.activity_led_ms == 0 || self.beat_led_ms == 0 {
            return Err("LED on-times must be at least 1ms");
        }
        if !(2..=10_000).contains(&self.idle_blink_period_ms) {
            return Err("Idle blink period must be between 2 and 10000ms");
        }
        if self.mode_flash_ms > 1_000 {
            return Err("Mode flash must be <= 1000ms");
        }
        Ok(())
    }

    /// Internal clock phase increment per millisecond tick
    pub const fn internal_phase_step(&self) -> u32 {
        self.internal_bpm as u32 * PPQN as u32
    }

    /// Nominal internal pulse period in microseconds; zero when the tempo is
    /// zero
    pub fn internal_period_us(&self) -> u32 {
        60_000_000u32.checked_div(self.internal_phase_step()).unwrap_or(0)
    }
}
