#![cfg_attr(not(feature = "std"), no_std)]

//! # DIN Sync Core
//!
//! Timing core for a MIDI clock to DIN Sync 24 converter. Follows an external
//! MIDI clock or generates a fixed-tempo clock, reconstructing each output
//! pulse at half of the previously measured clock interval.

#[macro_use]
mod macros;

pub mod types;
pub mod hal;
pub mod state;
pub mod fsm;
pub mod pulse;
pub mod midi;
pub mod tick;
pub mod indicator;
pub mod controller;
pub mod dispatch;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use state::{SyncSnapshot, SyncState};
pub use fsm::{Transition, TransportFsm};
pub use pulse::PulseEngine;
pub use midi::{DecoderStats, MidiDecoder};
pub use tick::InternalClock;
pub use indicator::{IndicatorDriver, IndicatorLevels};
pub use controller::{ButtonDebouncer, UiController};
pub use dispatch::{Irq, IrqSource, SyncCore};
pub use hal::{HalError, OutputLine, PulseTimer, SwitchInput};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Firmware revision reported at boot
pub const FIRMWARE_VERSION: u8 = 5;

/// Default configuration: 5 ms fallback pulse, 120 BPM internal clock
pub fn default_config() -> SyncConfig {
    SyncConfig {
        default_pulse_us: 5_000,
        debounce_ms: 50,
        long_press_ms: 2_000,
        internal_bpm: 120,
        activity_led_ms: 1,
        beat_led_ms: 30,
        idle_blink_period_ms: 500,
        mode_flash_ms: 250,
    }
}
