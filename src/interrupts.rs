//! Interrupt handlers and the inbox they report to.
//!
//! Every handler acknowledges its pending bit in the peripheral and raises one
//! flag. Nothing else happens in interrupt context; the control loop decides
//! what each event means.
//!
//! # Sources
//!
//! - **TIM2** update (overflow): [`Flag::Tick`]
//! - **EXTI line 22** (COMP2 output, both edges) via `ADC1_COMP`: [`Flag::ComparatorEdge`]
//! - **EXTI line 1** (enable pin PA1, both edges) via `EXTI0_1`: [`Flag::PinChange`]

use ambient_beacon::{Flag, FlagInbox};
use embassy_stm32::pac;
use pac::interrupt;

/// EXTI line of the enable pin (PA1; port A is the EXTICR reset default)
pub const ENABLE_EXTI_LINE: usize = 1;

/// EXTI line wired to the COMP2 output (fixed on STM32L0)
pub const COMP2_EXTI_LINE: usize = 22;

/// Register index for EXTI lines 0-31
pub const IMR1_REG_IDX: usize = 0;

/// Flags shared between the handlers below and the control loop.
pub static INBOX: FlagInbox = FlagInbox::new();

/// TIM2 update interrupt: one debounce tick per timer period.
#[interrupt]
fn TIM2() {
    pac::TIM2.sr().modify(|w| w.set_uif(false));
    INBOX.raiser().raise(Flag::Tick);
}

/// COMP2 edge, routed through EXTI line 22.
#[interrupt]
fn ADC1_COMP() {
    pac::EXTI
        .pr(IMR1_REG_IDX)
        .write(|w| w.set_line(COMP2_EXTI_LINE, true));
    INBOX.raiser().raise(Flag::ComparatorEdge);
}

/// Enable pin level change.
#[interrupt]
fn EXTI0_1() {
    pac::EXTI
        .pr(IMR1_REG_IDX)
        .write(|w| w.set_line(ENABLE_EXTI_LINE, true));
    INBOX.raiser().raise(Flag::PinChange);
}

/// Configures both EXTI lines for any-edge triggering and unmasks all three
/// interrupts in the NVIC.
///
/// The comparator line starts unmasked, matching what the state machine expects
/// of freshly initialised hardware. Call after the drivers in
/// [`crate::hardware::Board`] are set up.
///
/// # Safety
///
/// Unmasks NVIC interrupts whose handlers are defined in this module.
pub fn setup_interrupts() {
    let exti = pac::EXTI;

    for line in [ENABLE_EXTI_LINE, COMP2_EXTI_LINE] {
        exti.rtsr(IMR1_REG_IDX).modify(|w| w.set_line(line, true));
        exti.ftsr(IMR1_REG_IDX).modify(|w| w.set_line(line, true));
        exti.pr(IMR1_REG_IDX).write(|w| w.set_line(line, true));
        exti.imr(IMR1_REG_IDX).modify(|w| w.set_line(line, true));
    }

    unsafe {
        cortex_m::peripheral::NVIC::unmask(embassy_stm32::interrupt::TIM2);
        cortex_m::peripheral::NVIC::unmask(embassy_stm32::interrupt::ADC1_COMP);
        cortex_m::peripheral::NVIC::unmask(embassy_stm32::interrupt::EXTI0_1);
    };
}
