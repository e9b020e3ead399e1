//! CH32V003 register-level drivers
//!
//! GPIO lines, the TIM2 interval timer, SysTick and the USART1 receiver,
//! each wrapped in the sync core's hardware traits.

use din_sync_core::{HalError, Irq, IrqSource, OutputLine, PulseTimer, SwitchInput};
use portable_atomic::{AtomicU32, Ordering};

// ========================================
// CH32V003 Hardware Definitions
// ========================================

/// CH32V003 Memory Map and Register Base Addresses
pub const RCC_BASE: u32 = 0x4002_1000;
pub const GPIOA_BASE: u32 = 0x4001_0800;
pub const GPIOC_BASE: u32 = 0x4001_1000;
pub const GPIOD_BASE: u32 = 0x4001_1400;
const TIM2_BASE: u32 = 0x4000_0000;
const USART1_BASE: u32 = 0x4001_3800;
const PFIC_BASE: u32 = 0xE000_E000;
const SYSTICK_BASE: u32 = 0xE000_F000;

/// RCC Register offsets
const RCC_APB2PCENR: u32 = 0x18;
const RCC_APB1PCENR: u32 = 0x1C;

/// GPIO Register offsets
const GPIO_CFGLR: u32 = 0x00;
const GPIO_INDR: u32 = 0x08;
const GPIO_OUTDR: u32 = 0x0C;
const GPIO_BSHR: u32 = 0x10;

/// TIM2 Register offsets
const TIM_CTLR1: u32 = 0x00;
const TIM_DMAINTENR: u32 = 0x0C;
const TIM_INTFR: u32 = 0x10;
const TIM_CNT: u32 = 0x24;
const TIM_PSC: u32 = 0x28;
const TIM_ATRLR: u32 = 0x2C;
const TIM_CH1CVR: u32 = 0x34;

const TIM_CEN: u32 = 1 << 0;
const TIM_UIF: u32 = 1 << 0;
const TIM_CC1IF: u32 = 1 << 1;

/// USART1 Register offsets
const USART_STATR: u32 = 0x00;
const USART_DATAR: u32 = 0x04;
const USART_BRR: u32 = 0x08;
const USART_CTLR1: u32 = 0x0C;

const USART_RXNE: u32 = 1 << 5;
const USART_ORE: u32 = 1 << 3;

/// SysTick Register offsets
const STK_CTLR: u32 = 0x00;
const STK_SR: u32 = 0x04;
const STK_CNT: u32 = 0x08;
const STK_CMP: u32 = 0x10;

const STK_CNTIF: u32 = 1 << 0;

/// PFIC interrupt enable registers
const PFIC_IENR1: u32 = 0x100;
const PFIC_IENR2: u32 = 0x104;

const IRQ_SYSTICK: u32 = 12;
const IRQ_USART1: u32 = 32;
const IRQ_TIM2: u32 = 38;

/// HSI system clock after reset
const SYSCLK_HZ: u32 = 24_000_000;
const MIDI_BAUD: u32 = 31_250;

#[inline(always)]
fn read_reg(addr: u32) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

#[inline(always)]
fn write_reg(addr: u32, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

#[inline(always)]
fn modify_reg(addr: u32, f: impl FnOnce(u32) -> u32) {
    write_reg(addr, f(read_reg(addr)));
}

/// Milliseconds since SysTick was started, for the debug heartbeat
pub static UPTIME_MS: AtomicU32 = AtomicU32::new(0);

// ========================================
// GPIO
// ========================================

/// Push-pull GPIO output
pub struct Ch32v003Output {
    port: u32,
    pin: u8,
}

impl Ch32v003Output {
    pub const fn new(port: u32, pin: u8) -> Self {
        Self { port, pin }
    }
}

impl OutputLine for Ch32v003Output {
    fn set_level(&mut self, high: bool) -> Result<(), HalError> {
        // BSHR: low half sets, high half resets
        let bit = if high { self.pin } else { self.pin + 16 };
        write_reg(self.port + GPIO_BSHR, 1 << bit);
        Ok(())
    }
}

/// Momentary switch to ground with the internal pull-up enabled
pub struct Ch32v003Switch {
    port: u32,
    pin: u8,
}

impl Ch32v003Switch {
    pub const fn new(port: u32, pin: u8) -> Self {
        Self { port, pin }
    }
}

impl SwitchInput for Ch32v003Switch {
    fn is_pressed(&mut self) -> Result<bool, HalError> {
        Ok(read_reg(self.port + GPIO_INDR) & (1 << self.pin) == 0)
    }
}

/// 50 MHz push-pull output
const CFG_OUTPUT_PP: u32 = 0x3;
/// Input with pull-up/down (direction picked by OUTDR)
const CFG_INPUT_PULL: u32 = 0x8;
/// Floating input
const CFG_INPUT_FLOATING: u32 = 0x4;

fn configure_pin(port: u32, pin: u8, cfg: u32) {
    let shift = u32::from(pin) * 4;
    modify_reg(port + GPIO_CFGLR, |cfglr| (cfglr & !(0xF << shift)) | (cfg << shift));
}

// ========================================
// TIM2 interval timer
// ========================================

/// TIM2 at 1 MHz, free-running over the full 16-bit range, compare on CH1
pub struct Tim2PulseTimer;

impl Tim2PulseTimer {
    fn init() -> Self {
        write_reg(TIM2_BASE + TIM_PSC, SYSCLK_HZ / 1_000_000 - 1);
        write_reg(TIM2_BASE + TIM_ATRLR, 0xFFFF);
        write_reg(TIM2_BASE + TIM_CNT, 0);
        write_reg(TIM2_BASE + TIM_INTFR, 0);
        // Update and CC1 interrupts
        write_reg(TIM2_BASE + TIM_DMAINTENR, TIM_UIF | TIM_CC1IF);
        write_reg(TIM2_BASE + TIM_CTLR1, TIM_CEN);
        Self
    }
}

impl PulseTimer for Tim2PulseTimer {
    fn is_running(&self) -> bool {
        read_reg(TIM2_BASE + TIM_CTLR1) & TIM_CEN != 0
    }

    fn count(&self) -> u16 {
        read_reg(TIM2_BASE + TIM_CNT) as u16
    }

    fn overflow_pending(&self) -> bool {
        read_reg(TIM2_BASE + TIM_INTFR) & TIM_UIF != 0
    }

    fn stop(&mut self) {
        modify_reg(TIM2_BASE + TIM_CTLR1, |ctlr| ctlr & !TIM_CEN);
    }

    fn restart(&mut self) {
        write_reg(TIM2_BASE + TIM_CNT, 0);
        // Flags clear on writing zero; stale compare/overflow must not fire
        write_reg(TIM2_BASE + TIM_INTFR, !(TIM_UIF | TIM_CC1IF));
        modify_reg(TIM2_BASE + TIM_CTLR1, |ctlr| ctlr | TIM_CEN);
    }

    fn set_compare(&mut self, ticks: u16) {
        write_reg(TIM2_BASE + TIM_CH1CVR, u32::from(ticks));
    }
}

// ========================================
// Interrupt flags
// ========================================

/// Reads the pending interrupt flags in service order
pub struct Ch32v003Flags;

impl IrqSource for Ch32v003Flags {
    fn next_pending(&mut self) -> Option<Irq> {
        if read_reg(SYSTICK_BASE + STK_SR) & STK_CNTIF != 0 {
            write_reg(SYSTICK_BASE + STK_SR, 0);
            UPTIME_MS.fetch_add(1, Ordering::Relaxed);
            return Some(Irq::Tick);
        }

        let intfr = read_reg(TIM2_BASE + TIM_INTFR);
        if intfr & TIM_CC1IF != 0 {
            write_reg(TIM2_BASE + TIM_INTFR, !TIM_CC1IF);
            return Some(Irq::CompareMatch);
        }
        if intfr & TIM_UIF != 0 {
            write_reg(TIM2_BASE + TIM_INTFR, !TIM_UIF);
            return Some(Irq::TimerOverflow);
        }

        // Reading DATAR clears both RXNE and an overrun
        if read_reg(USART1_BASE + USART_STATR) & (USART_RXNE | USART_ORE) != 0 {
            let byte = read_reg(USART1_BASE + USART_DATAR) as u8;
            return Some(Irq::SerialRx(byte));
        }

        None
    }
}

// ========================================
// Bring-up
// ========================================

// Pin assignments:
// PC1 = SYNC_CLOCK (DIN pin 3)
// PC2 = TRANSPORT_RUN (DIN pin 1)
// PD2 = Activity LED
// PD3 = Beat LED
// PA2 = Mode/transport switch (active low with pull-up)
// PD6 = USART1 RX, MIDI in
pub const SYNC_CLOCK_PIN: (u32, u8) = (GPIOC_BASE, 1);
pub const TRANSPORT_RUN_PIN: (u32, u8) = (GPIOC_BASE, 2);
pub const ACTIVITY_LED_PIN: (u32, u8) = (GPIOD_BASE, 2);
pub const BEAT_LED_PIN: (u32, u8) = (GPIOD_BASE, 3);
pub const SWITCH_PIN: (u32, u8) = (GPIOA_BASE, 2);
const MIDI_RX_PIN: (u32, u8) = (GPIOD_BASE, 6);

/// Peripherals handed to the application after bring-up
pub struct Board {
    pub timer: Tim2PulseTimer,
    pub sync_clock: Ch32v003Output,
    pub transport_run: Ch32v003Output,
    pub activity_led: Ch32v003Output,
    pub beat_led: Ch32v003Output,
    pub switch: Ch32v003Switch,
}

impl Board {
    /// Clocks, GPIO, SysTick, TIM2 and USART1. Interrupts stay masked in
    /// the PFIC until [`enable_interrupts`] is called.
    pub fn init() -> Self {
        enable_peripheral_clocks();
        configure_gpio_pins();
        configure_systick();
        configure_usart1();

        Self {
            timer: Tim2PulseTimer::init(),
            sync_clock: Ch32v003Output::new(SYNC_CLOCK_PIN.0, SYNC_CLOCK_PIN.1),
            transport_run: Ch32v003Output::new(TRANSPORT_RUN_PIN.0, TRANSPORT_RUN_PIN.1),
            activity_led: Ch32v003Output::new(ACTIVITY_LED_PIN.0, ACTIVITY_LED_PIN.1),
            beat_led: Ch32v003Output::new(BEAT_LED_PIN.0, BEAT_LED_PIN.1),
            switch: Ch32v003Switch::new(SWITCH_PIN.0, SWITCH_PIN.1),
        }
    }
}

fn enable_peripheral_clocks() {
    // APB2: AFIO(0), GPIOA(2), GPIOC(4), GPIOD(5), USART1(14)
    modify_reg(RCC_BASE + RCC_APB2PCENR, |enr| {
        enr | (1 << 0) | (1 << 2) | (1 << 4) | (1 << 5) | (1 << 14)
    });
    // APB1: TIM2(0)
    modify_reg(RCC_BASE + RCC_APB1PCENR, |enr| enr | 1);
}

fn configure_gpio_pins() {
    for (port, pin) in [SYNC_CLOCK_PIN, TRANSPORT_RUN_PIN, ACTIVITY_LED_PIN, BEAT_LED_PIN] {
        write_reg(port + GPIO_BSHR, 1 << (pin + 16));
        configure_pin(port, pin, CFG_OUTPUT_PP);
    }

    configure_pin(SWITCH_PIN.0, SWITCH_PIN.1, CFG_INPUT_PULL);
    modify_reg(SWITCH_PIN.0 + GPIO_OUTDR, |odr| odr | (1 << SWITCH_PIN.1));

    configure_pin(MIDI_RX_PIN.0, MIDI_RX_PIN.1, CFG_INPUT_FLOATING);
}

/// SysTick compare every millisecond, auto-reload, HCLK source
fn configure_systick() {
    write_reg(SYSTICK_BASE + STK_CMP, SYSCLK_HZ / 1_000 - 1);
    write_reg(SYSTICK_BASE + STK_CNT, 0);
    write_reg(SYSTICK_BASE + STK_SR, 0);
    // STE | STIE | STCLK | STRE
    write_reg(SYSTICK_BASE + STK_CTLR, 0xF);
}

/// 31 250 baud 8N1, receive only, RXNE interrupt
fn configure_usart1() {
    write_reg(USART1_BASE + USART_BRR, SYSCLK_HZ / MIDI_BAUD);
    // UE | RXNEIE | RE
    write_reg(USART1_BASE + USART_CTLR1, (1 << 13) | (1 << 5) | (1 << 2));
}

/// Busy-wait on the SysTick flag. Only valid before interrupts are enabled.
pub fn delay_ms(ms: u32) {
    for _ in 0..ms {
        while read_reg(SYSTICK_BASE + STK_SR) & STK_CNTIF == 0 {}
        write_reg(SYSTICK_BASE + STK_SR, 0);
    }
}

/// Unmask SysTick, USART1 and TIM2 in the PFIC and enable machine interrupts
pub fn enable_interrupts() {
    write_reg(PFIC_BASE + PFIC_IENR1, 1 << IRQ_SYSTICK);
    write_reg(
        PFIC_BASE + PFIC_IENR2,
        (1 << (IRQ_USART1 - 32)) | (1 << (IRQ_TIM2 - 32)),
    );
    unsafe { riscv::interrupt::enable() };
}
