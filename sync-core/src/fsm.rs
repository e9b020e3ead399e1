//! Transport and clock-mode state machine

use crate::state::SyncState;
use crate::types::{ClockMode, SyncConfig, TransportEvent, TransportState};

/// Result of an applied transport or mode event
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub event: TransportEvent,
    pub mode: ClockMode,
    pub transport: TransportState,
}

impl Transition {
    /// Level the run line must take after this transition
    pub const fn run_level(&self) -> bool {
        self.transport.is_running()
    }
}

/// Transport state machine operating on the shared [`SyncState`]
///
/// States are `(ClockMode, TransportState)`, starting at
/// `(ExternalFollow, Stopped)`. Events that do not apply in the current mode
/// are ignored and yield `None`.
pub struct TransportFsm<'a> {
    state: &'a SyncState,
    config: SyncConfig,
}

impl<'a> TransportFsm<'a> {
    /// Bind the machine to the shared state
    pub fn new(state: &'a SyncState, config: SyncConfig) -> Self {
        Self { state, config }
    }

    /// Current `(mode, transport)` pair
    pub fn current_state(&self) -> (ClockMode, TransportState) {
        (self.state.mode(), self.state.transport())
    }

    /// Apply one event atomically with respect to interrupts
    pub fn apply(&self, event: TransportEvent) -> Option<Transition> {
        critical_section::with(|_| self.apply_unguarded(event))
    }

    fn apply_unguarded(&self, event: TransportEvent) -> Option<Transition> {
        let mode = self.state.mode();

        match (event, mode) {
            (TransportEvent::Start | TransportEvent::Continue, ClockMode::ExternalFollow) => {
                self.enter_running();
            }

            (TransportEvent::Stop, ClockMode::ExternalFollow) => {
                self.state.set_transport(TransportState::Stopped);
            }

            (TransportEvent::ShortPress, ClockMode::InternalGenerate) => {
                if self.state.is_running() {
                    self.state.set_transport(TransportState::Stopped);
                    self.state.set_internal_phase(0);
                } else {
                    self.enter_running();
                    self.state.set_internal_phase(0);
                }
            }

            (TransportEvent::LongPress, _) => {
                self.state.set_mode(mode.toggled());
                self.state.reset_beat();
                self.state.set_internal_phase(0);
                self.state.set_blink_phase_ms(0);
                self.state.request_resync();
                self.state.mark_mode_changed();
            }

            // Real-time messages while generating, button taps while following
            _ => return None,
        }

        let transition = Transition {
            event,
            mode: self.state.mode(),
            transport: self.state.transport(),
        };
        sync_info!("Transport {:?} -> {:?}/{:?}", event, transition.mode, transition.transport);
        Some(transition)
    }

    /// Common entry into Running: beat 1 restarts and is shown immediately
    fn enter_running(&self) {
        self.state.set_transport(TransportState::Running);
        self.state.reset_beat();
        self.state.arm_beat_led(self.config.beat_led_ms);
        self.state.request_resync();
    }
}
