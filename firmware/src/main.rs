#![no_std]
#![no_main]

// Logging support
#[cfg(feature = "defmt")]
use defmt::{info, warn};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

// Define simple logging macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

mod hardware;

use core::cell::RefCell;
use din_sync_core::{
    default_config, IndicatorLevels, IrqSource, SyncCore, SyncState, UiController,
    FIRMWARE_VERSION,
};
use hardware::{Board, Ch32v003Flags, Ch32v003Output, Ch32v003Switch, Tim2PulseTimer};
use riscv_rt::entry;

// Critical section implementation for RISC-V
struct RiscvCriticalSection;
critical_section::set_impl!(RiscvCriticalSection);

unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let mstatus = riscv::register::mstatus::read();
        riscv::register::mstatus::clear_mie();
        mstatus.mie() as u8
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        if was_enabled != 0 {
            riscv::register::mstatus::set_mie();
        }
    }
}

// ========================================
// Global state
// ========================================

type Core = SyncCore<'static, Tim2PulseTimer, Ch32v003Output, Ch32v003Output>;
type Ui = UiController<Ch32v003Switch, Ch32v003Output, Ch32v003Output>;

/// Timing state shared by the interrupt handlers and the main loop
static SYNC_STATE: SyncState = SyncState::new();

/// Interrupt-side core, installed once bring-up is complete
static SYNC_CORE: critical_section::Mutex<RefCell<Option<Core>>> =
    critical_section::Mutex::new(RefCell::new(None));

/// Power-on flash: on, off, on, then hand the LEDs to the main loop
const STARTUP_FLASH_MS: u32 = 250;

/// Debug heartbeat (feature-gated)
#[cfg(feature = "debug")]
fn debug_heartbeat(last_heartbeat_ms: &mut u32) {
    use portable_atomic::Ordering;

    let now_ms = hardware::UPTIME_MS.load(Ordering::Relaxed);
    if now_ms.wrapping_sub(*last_heartbeat_ms) < 10_000 {
        return;
    }
    *last_heartbeat_ms = now_ms;

    let stats = critical_section::with(|cs| {
        SYNC_CORE
            .borrow(cs)
            .borrow()
            .as_ref()
            .map(|core| core.decoder_stats())
    });
    info!("Heartbeat {}ms - {}, decoder {}", now_ms, SYNC_STATE.snapshot(), stats);
}

#[cfg(not(feature = "debug"))]
fn debug_heartbeat(_last_heartbeat_ms: &mut u32) {}

fn startup_flash(ui: &mut Ui) {
    for levels in [
        IndicatorLevels::all_on(),
        IndicatorLevels::default(),
        IndicatorLevels::all_on(),
    ] {
        ui.indicators_mut().write(levels).ok();
        hardware::delay_ms(STARTUP_FLASH_MS);
    }
    ui.indicators_mut().write(IndicatorLevels::default()).ok();
}

/// Main execution loop: one pass per millisecond tick
fn main_loop(mut ui: Ui) -> ! {
    let mut last_heartbeat_ms = 0u32;

    info!("Main loop started");

    loop {
        match ui.poll(&SYNC_STATE) {
            Ok(Some(event)) => {
                critical_section::with(|cs| {
                    if let Some(core) = SYNC_CORE.borrow(cs).borrow_mut().as_mut() {
                        if let Err(_error) = core.handle_button(event) {
                            warn!("Run line write failed: {}", _error);
                        }
                    }
                });
            }
            Ok(None) => {}
            Err(_error) => warn!("Indicator update failed: {}", _error),
        }

        debug_heartbeat(&mut last_heartbeat_ms);
    }
}

#[entry]
fn main() -> ! {
    let board = Board::init();
    let config = default_config();

    info!("DIN Sync converter firmware v{}", FIRMWARE_VERSION);

    let mut ui = UiController::new(board.switch, board.activity_led, board.beat_led, config);
    startup_flash(&mut ui);

    match SyncCore::new(
        &SYNC_STATE,
        board.timer,
        board.sync_clock,
        board.transport_run,
        config,
    ) {
        Ok(mut core) => {
            if core.init().is_err() {
                warn!("Sync line init failed");
            }
            critical_section::with(|cs| {
                SYNC_CORE.borrow(cs).replace(Some(core));
            });
        }
        // Without a core the handlers only acknowledge their flags
        Err(_error) => warn!("Sync core not started: {}", _error),
    }

    hardware::enable_interrupts();
    info!("Hardware initialization complete");

    main_loop(ui)
}

// ========================================
// Interrupt Handlers
// ========================================

/// Every interrupt funnels into one dispatch pass over all pending flags
fn on_interrupt() {
    critical_section::with(|cs| match SYNC_CORE.borrow(cs).borrow_mut().as_mut() {
        Some(core) => {
            core.dispatch(&mut Ch32v003Flags);
        }
        None => while Ch32v003Flags.next_pending().is_some() {},
    });
}

#[no_mangle]
extern "C" fn SysTick() {
    on_interrupt();
}

#[no_mangle]
extern "C" fn TIM2_IRQHandler() {
    on_interrupt();
}

#[no_mangle]
extern "C" fn USART1_IRQHandler() {
    on_interrupt();
}
