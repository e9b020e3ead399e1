//! Shared state between interrupt handlers and the main loop
//!
//! Every field is an atomic of at most 16 bits, so a read never observes a
//! value torn by interrupt preemption. Read-modify-write sequences go through
//! `portable-atomic`, which masks interrupts on single-core targets without
//! native RMW instructions.

use portable_atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::types::{ClockMode, TransportState, PPQN};

/// Process-wide timing state, one `static` instance shared by reference
pub struct SyncState {
    mode: AtomicU8,
    running: AtomicBool,
    beat_count: AtomicU8,
    activity_led_ms: AtomicU8,
    beat_led_ms: AtomicU8,
    internal_phase: AtomicU16,
    blink_phase_ms: AtomicU16,
    tick_pending: AtomicBool,
    resync: AtomicBool,
    mode_changed: AtomicBool,
}

/// Point-in-time copy of [`SyncState`] for logging and tests
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncSnapshot {
    pub mode: ClockMode,
    pub transport: TransportState,
    pub beat_count: u8,
    pub activity_led_ms: u8,
    pub beat_led_ms: u8,
    pub internal_phase: u16,
    pub blink_phase_ms: u16,
}

impl SyncState {
    /// Power-on state: external mode, stopped
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(ClockMode::ExternalFollow as u8),
            running: AtomicBool::new(false),
            beat_count: AtomicU8::new(0),
            activity_led_ms: AtomicU8::new(0),
            beat_led_ms: AtomicU8::new(0),
            internal_phase: AtomicU16::new(0),
            blink_phase_ms: AtomicU16::new(0),
            tick_pending: AtomicBool::new(false),
            resync: AtomicBool::new(true),
            mode_changed: AtomicBool::new(false),
        }
    }

    /// Current clock source
    pub fn mode(&self) -> ClockMode {
        ClockMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    pub(crate) fn set_mode(&self, mode: ClockMode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Current transport state
    pub fn transport(&self) -> TransportState {
        TransportState::from_running(self.is_running())
    }

    /// True while the run line is high
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_transport(&self, transport: TransportState) {
        self.running.store(transport.is_running(), Ordering::Release);
    }

    // ---- beat counter ----

    /// Pulses since the last quarter note, 0..24
    pub fn beat_count(&self) -> u8 {
        self.beat_count.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_beat(&self) {
        self.beat_count.store(0, Ordering::Relaxed);
    }

    /// Count one output pulse; on the 24th arm the beat LED and return true
    pub(crate) fn advance_beat(&self, beat_led_ms: u8) -> bool {
        let previous = self
            .beat_count
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |count| {
                Some(if count + 1 >= PPQN { 0 } else { count + 1 })
            })
            .unwrap_or(0);
        let rolled_over = previous + 1 >= PPQN;
        if rolled_over {
            self.arm_beat_led(beat_led_ms);
        }
        rolled_over
    }

    // ---- indicator timers ----

    pub(crate) fn arm_activity_led(&self, ms: u8) {
        self.activity_led_ms.store(ms, Ordering::Relaxed);
    }

    pub(crate) fn arm_beat_led(&self, ms: u8) {
        self.beat_led_ms.store(ms, Ordering::Relaxed);
    }

    /// True while the activity LED countdown is running
    pub fn activity_led_active(&self) -> bool {
        self.activity_led_ms.load(Ordering::Relaxed) != 0
    }

    /// True while the beat LED countdown is running
    pub fn beat_led_active(&self) -> bool {
        self.beat_led_ms.load(Ordering::Relaxed) != 0
    }

    /// Count both LED timers down by one millisecond, stopping at zero
    pub(crate) fn decrement_indicators(&self) {
        let countdown = |ms: u8| Some(ms.saturating_sub(1));
        self.activity_led_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, countdown)
            .ok();
        self.beat_led_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, countdown)
            .ok();
    }

    // ---- internal clock and idle blink ----

    /// Internal clock accumulator, below 60 000
    pub fn internal_phase(&self) -> u16 {
        self.internal_phase.load(Ordering::Relaxed)
    }

    pub(crate) fn set_internal_phase(&self, phase: u16) {
        self.internal_phase.store(phase, Ordering::Relaxed);
    }

    /// Position in the idle blink period
    pub fn blink_phase_ms(&self) -> u16 {
        self.blink_phase_ms.load(Ordering::Relaxed)
    }

    pub(crate) fn set_blink_phase_ms(&self, phase: u16) {
        self.blink_phase_ms.store(phase, Ordering::Relaxed);
    }

    // ---- flags ----

    /// Tick interrupt: signal the main loop
    pub fn raise_tick(&self) {
        self.tick_pending.store(true, Ordering::Release);
    }

    /// Main loop: consume the tick flag
    pub fn take_tick(&self) -> bool {
        self.tick_pending.swap(false, Ordering::AcqRel)
    }

    /// Invalidate the interval reference so the next pulse uses the default width
    pub(crate) fn request_resync(&self) {
        self.resync.store(true, Ordering::Release);
    }

    pub(crate) fn take_resync(&self) -> bool {
        self.resync.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn mark_mode_changed(&self) {
        self.mode_changed.store(true, Ordering::Release);
    }

    /// Consume the "mode just toggled" notification for the LED flash
    pub fn take_mode_changed(&self) -> bool {
        self.mode_changed.swap(false, Ordering::AcqRel)
    }

    /// Copy every field for logging
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            mode: self.mode(),
            transport: self.transport(),
            beat_count: self.beat_count(),
            activity_led_ms: self.activity_led_ms.load(Ordering::Relaxed),
            beat_led_ms: self.beat_led_ms.load(Ordering::Relaxed),
            internal_phase: self.internal_phase(),
            blink_phase_ms: self.blink_phase_ms(),
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}
