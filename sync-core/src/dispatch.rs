//! Interrupt-side core: one entry point for every timing interrupt

use crate::fsm::{Transition, TransportFsm};
use crate::hal::{HalError, OutputLine, PulseTimer};
use crate::midi::{DecoderStats, MidiDecoder};
use crate::pulse::PulseEngine;
use crate::state::SyncState;
use crate::tick::InternalClock;
use crate::types::{ButtonEvent, MidiMessage, SyncConfig, TransportEvent, TriggerSource};

/// Named interrupt events
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    /// 1 kHz system tick
    Tick,
    /// Pulse timer reached the scheduled pulse end
    CompareMatch,
    /// Pulse timer wrapped before the next clock event
    TimerOverflow,
    /// One byte from the serial receiver
    SerialRx(u8),
}

/// Hardware flag reader
///
/// Implementations check their status flags in service order (tick,
/// compare, overflow, serial), acknowledge the first one found and return
/// it. A pending serial flag is acknowledged by reading the data register.
pub trait IrqSource {
    fn next_pending(&mut self) -> Option<Irq>;
}

/// Pulse engine, decoder, internal clock and run line behind one handler
pub struct SyncCore<'a, T, C, R> {
    state: &'a SyncState,
    config: SyncConfig,
    engine: PulseEngine<T, C>,
    run_out: R,
    decoder: MidiDecoder,
    internal_clock: InternalClock,
}

impl<'a, T, C, R> SyncCore<'a, T, C, R>
where
    T: PulseTimer,
    C: OutputLine,
    R: OutputLine,
{
    /// Build the core; fails with [`HalError::InvalidConfig`] when `config`
    /// does not validate
    pub fn new(
        state: &'a SyncState,
        timer: T,
        clock_out: C,
        run_out: R,
        config: SyncConfig,
    ) -> Result<Self, HalError> {
        if let Err(_reason) = config.validate() {
            sync_info!("Rejected configuration: {=str}", _reason);
            return Err(HalError::InvalidConfig);
        }

        Ok(Self {
            state,
            config,
            engine: PulseEngine::new(timer, clock_out, &config),
            run_out,
            decoder: MidiDecoder::new(),
            internal_clock: InternalClock::new(&config),
        })
    }

    /// Put both sync lines in their idle levels
    pub fn init(&mut self) -> Result<(), HalError> {
        self.engine.compare_match()?;
        self.run_out.set_level(self.state.is_running())
    }

    /// Drain every pending interrupt flag; returns how many were serviced
    pub fn dispatch<I: IrqSource>(&mut self, source: &mut I) -> usize {
        let mut serviced = 0;
        while let Some(irq) = source.next_pending() {
            // Nothing to recover from inside an interrupt
            self.service(irq).ok();
            serviced += 1;
        }
        serviced
    }

    /// Handle one interrupt event
    pub fn service(&mut self, irq: Irq) -> Result<(), HalError> {
        match irq {
            Irq::Tick => {
                if self.internal_clock.on_tick(self.state) {
                    self.engine.trigger(self.state, TriggerSource::InternalClock)?;
                }
            }
            Irq::CompareMatch => self.engine.compare_match()?,
            Irq::TimerOverflow => self.engine.timer_overflow(),
            Irq::SerialRx(byte) => self.on_serial_byte(byte)?,
        }
        Ok(())
    }

    /// Apply a debounced switch gesture from the main loop
    pub fn handle_button(&mut self, event: ButtonEvent) -> Result<Option<Transition>, HalError> {
        self.apply(event.into())
    }

    fn on_serial_byte(&mut self, byte: u8) -> Result<(), HalError> {
        let Some(message) = self.decoder.decode(self.state, byte) else {
            return Ok(());
        };

        match message {
            MidiMessage::TimingClock => {
                self.state.arm_activity_led(self.config.activity_led_ms);
                if self.state.is_running() {
                    self.engine.trigger(self.state, TriggerSource::MidiClock)?;
                }
            }
            MidiMessage::Start => {
                self.apply(TransportEvent::Start)?;
            }
            MidiMessage::Continue => {
                self.apply(TransportEvent::Continue)?;
            }
            MidiMessage::Stop => {
                self.apply(TransportEvent::Stop)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, event: TransportEvent) -> Result<Option<Transition>, HalError> {
        let transition = TransportFsm::new(self.state, self.config).apply(event);
        if let Some(transition) = transition {
            self.run_out.set_level(transition.run_level())?;
        }
        Ok(transition)
    }

    /// Shared state this core writes to
    pub fn state(&self) -> &'a SyncState {
        self.state
    }

    /// Validated configuration in use
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn engine(&self) -> &PulseEngine<T, C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PulseEngine<T, C> {
        &mut self.engine
    }

    pub fn run_out(&self) -> &R {
        &self.run_out
    }

    /// Received-byte counters
    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Tear down into the timer, the clock line and the run line
    pub fn release(self) -> (T, C, R) {
        let (timer, clock_out) = self.engine.release();
        (timer, clock_out, self.run_out)
    }
}
