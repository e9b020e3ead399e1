//! Millisecond tick source and internal clock generator

use crate::state::SyncState;
use crate::types::SyncConfig;

/// Phase accumulator that derives the internal pulse train from the 1 kHz tick.
///
/// Each tick adds `bpm * 24` to the phase; a pulse is due whenever the phase
/// reaches 60 000. At 120 BPM that yields 48 pulses per second, spaced 20 or
/// 21 ms apart with an exact 20.833 ms average.
#[derive(Copy, Clone, Debug)]
pub struct InternalClock {
    step: u32,
    blink_period_ms: u16,
}

const PHASE_WRAP: u32 = 60_000;

impl InternalClock {
    /// Generator for the configured tempo and idle blink period
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            step: config.internal_phase_step(),
            blink_period_ms: config.idle_blink_period_ms,
        }
    }

    /// Tick interrupt handler. Raises the main-loop flag and returns true
    /// when an internal pulse is due.
    pub fn on_tick(&self, state: &SyncState) -> bool {
        state.raise_tick();

        if state.mode().is_external() {
            return false;
        }

        if state.is_running() {
            let phase = u32::from(state.internal_phase()) + self.step;
            if phase >= PHASE_WRAP {
                state.set_internal_phase((phase % PHASE_WRAP) as u16);
                return true;
            }
            state.set_internal_phase(phase as u16);
        } else {
            let blink = state.blink_phase_ms() + 1;
            state.set_blink_phase_ms(if blink >= self.blink_period_ms { 0 } else { blink });
        }
        false
    }
}
