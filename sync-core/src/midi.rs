//! MIDI real-time input decoder

use crate::state::SyncState;
use crate::types::MidiMessage;

/// Byte counters for the debug heartbeat
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderStats {
    /// Timing clock bytes accepted
    pub clocks: u32,
    /// Start, continue and stop bytes accepted
    pub transport: u32,
    /// Bytes that were not one of the four handled values
    pub discarded: u32,
    /// Bytes drained while generating the internal clock
    pub muted: u32,
}

/// Turns received bytes into [`MidiMessage`]s.
///
/// Only single-byte system real-time messages matter here, and MIDI allows
/// those anywhere in the stream, so no running-status tracking is needed.
#[derive(Debug, Default)]
pub struct MidiDecoder {
    stats: DecoderStats,
}

impl MidiDecoder {
    /// Decoder with zeroed counters
    pub const fn new() -> Self {
        Self {
            stats: DecoderStats {
                clocks: 0,
                transport: 0,
                discarded: 0,
                muted: 0,
            },
        }
    }

    /// Decode one received byte. Always called so the receiver never
    /// overruns; yields nothing while the internal clock is active.
    pub fn decode(&mut self, state: &SyncState, byte: u8) -> Option<MidiMessage> {
        if !state.mode().is_external() {
            self.stats.muted = self.stats.muted.wrapping_add(1);
            return None;
        }

        match MidiMessage::from_byte(byte) {
            Some(MidiMessage::TimingClock) => {
                self.stats.clocks = self.stats.clocks.wrapping_add(1);
                Some(MidiMessage::TimingClock)
            }
            Some(message) => {
                self.stats.transport = self.stats.transport.wrapping_add(1);
                Some(message)
            }
            None => {
                self.stats.discarded = self.stats.discarded.wrapping_add(1);
                sync_trace!("Discarded byte {=u8:#x}", byte);
                None
            }
        }
    }

    /// Counters since power-on
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }
}
