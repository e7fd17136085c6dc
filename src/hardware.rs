//! Hardware abstraction and peripheral initialization.
//!
//! This module defines the pin mappings and the register-level drivers that
//! back the beacon's timer, comparator, enable input and sleep control on the
//! STM32L031G6.
//!
//! # Pin Assignments
//!
//! ## Flash Output
//! - **PA5**: FLASH - TIM2_CH1 (AF5) while blinking, low GPIO output otherwise
//!
//! ## Ambient Light Sense
//! - **PA3**: AMBIENT - COMP2 non-inverting input from the light sensor divider,
//!   compared against VREFINT (~1.2V). Above the reference means night.
//!
//! ## Enable
//! - **PA1**: ENABLE - Input with internal pull-up; pulled low externally to
//!   shut the beacon down
//!
//! ## Bench Indicator (`test-setup` only)
//! - **PA4**: INDICATOR - Output mirroring the light level sampled at each
//!   comparator edge, high for night
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK

use ambient_beacon::config::{FLASH_ON_COUNTS, TICK_PERIOD_COUNTS};
use ambient_beacon::{
    Ambient, EnablePin, FlashTimer, Sleep, SleepDepth, ThresholdDetector, TimerRegisters,
};
use cortex_m::peripheral::SCB;
#[cfg(feature = "test-setup")]
use ambient_beacon::IndicatorPin;
#[cfg(feature = "test-setup")]
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::gpio::{Input, Pull};
use embassy_stm32::pac::gpio::vals::Moder;
use embassy_stm32::pac::timer::vals::Ocm;
use embassy_stm32::peripherals::{PA3, PA5, TIM2};
use embassy_stm32::{Peri, pac};

use crate::interrupts::{COMP2_EXTI_LINE, IMR1_REG_IDX};

/// PA5 pin number within GPIOA
const FLASH_PIN: usize = 5;

/// Alternate function connecting PA5 to TIM2_CH1
const FLASH_AF_TIM2: u8 = 5;

/// PA3 pin number within GPIOA
const AMBIENT_PIN: usize = 3;

/// TIM2 channel driving the flash pin (CH1)
const FLASH_CHANNEL: usize = 0;

/// COMP2 control and status register.
///
/// The L0 PAC has no COMP block, so this one register is accessed by address.
const COMP2_CSR: *mut u32 = 0x4001_001C as *mut u32;

/// COMP2_CSR: comparator enable
const COMP2EN: u32 = 1 << 0;

/// COMP2_CSR: comparator output level
const COMP2VALUE: u32 = 1 << 30;

/// Top-level peripheral container for the beacon.
///
/// Owns all hardware drivers the state machine needs.
pub struct Board {
    /// Tick and flash timer (TIM2 + PA5)
    pub timer: FlashTimer<Tim2Flash>,
    /// Day/night comparator (COMP2 + PA3)
    pub detector: AmbientComparator,
    /// External enable line (PA1)
    pub enable: EnablePin<Input<'static>>,
    /// Sleep control
    pub power: PowerController,
    /// Ambient level indicator (PA4)
    #[cfg(feature = "test-setup")]
    pub indicator: IndicatorPin<Output<'static>>,
}

impl Board {
    /// Initializes all beacon peripherals from the STM32 peripheral singleton.
    ///
    /// # Initial States
    ///
    /// - TIM2 clock gated off, PA5 low GPIO output (flash off)
    /// - COMP2 enabled against VREFINT, PA3 analog
    /// - PA1 input with pull-up
    /// - PA4 low output (`test-setup` only)
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    /// * `scb` - Cortex-M system control block, for sleep depth selection
    /// * `prescaler` - TIM2 prescaler register value for the running system clock
    pub fn new(p: embassy_stm32::Peripherals, scb: SCB, prescaler: u16) -> Self {
        // The PWR clock is needed to select STOP mode later on.
        pac::RCC.apb1enr().modify(|w| w.set_pwren(true));

        Self {
            timer: FlashTimer::new(Tim2Flash::new(p.TIM2, p.PA5, prescaler)),
            detector: AmbientComparator::new(p.PA3),
            enable: EnablePin::new(Input::new(p.PA1, Pull::Up)),
            power: PowerController { scb },
            #[cfg(feature = "test-setup")]
            indicator: IndicatorPin::new(Output::new(p.PA4, Level::Low, Speed::Low)),
        }
    }
}

/// TIM2 channel 1 driving the flash pin.
///
/// Counts at `TIMER_CLOCK_HZ` in PWM mode 1: the flash pin is high for the first
/// `FLASH_ON_COUNTS` counts of every `TICK_PERIOD_COUNTS`-count period while the
/// output is connected.
pub struct Tim2Flash {
    _tim: Peri<'static, TIM2>,
    _pin: Peri<'static, PA5>,
    prescaler: u16,
}

impl Tim2Flash {
    fn new(tim: Peri<'static, TIM2>, pin: Peri<'static, PA5>, prescaler: u16) -> Self {
        let gpio = pac::GPIOA;
        gpio.afr(0)
            .modify(|w| w.set_afr(FLASH_PIN, FLASH_AF_TIM2));
        gpio.bsrr().write(|w| w.set_br(FLASH_PIN, true));
        gpio.moder()
            .modify(|w| w.set_moder(FLASH_PIN, Moder::OUTPUT));
        pac::RCC.apb1enr().modify(|w| w.set_tim2en(false));

        Self {
            _tim: tim,
            _pin: pin,
            prescaler,
        }
    }
}

impl TimerRegisters for Tim2Flash {
    fn power_up(&mut self) {
        pac::RCC.apb1enr().modify(|w| w.set_tim2en(true));
    }

    fn power_down(&mut self) {
        pac::RCC.apb1enr().modify(|w| w.set_tim2en(false));
    }

    fn configure_waveform(&mut self) {
        let tim = pac::TIM2;
        tim.psc().write_value(self.prescaler);
        tim.arr().write(|w| w.set_arr(TICK_PERIOD_COUNTS - 1));
        tim.ccr(FLASH_CHANNEL).write(|w| w.set_ccr(FLASH_ON_COUNTS));
        tim.ccmr_output(0).modify(|w| {
            w.set_ocm(FLASH_CHANNEL, Ocm::PWM_MODE1);
            w.set_ocpe(FLASH_CHANNEL, true);
        });
        // Latch prescaler and period now; drop the update flag that latching sets.
        tim.egr().write(|w| w.set_ug(true));
        tim.sr().modify(|w| w.set_uif(false));
    }

    fn connect_output(&mut self) {
        pac::TIM2.ccer().modify(|w| w.set_cce(FLASH_CHANNEL, true));
        pac::GPIOA
            .moder()
            .modify(|w| w.set_moder(FLASH_PIN, Moder::ALTERNATE));
    }

    fn disconnect_output(&mut self) {
        let gpio = pac::GPIOA;
        gpio.bsrr().write(|w| w.set_br(FLASH_PIN, true));
        gpio.moder()
            .modify(|w| w.set_moder(FLASH_PIN, Moder::OUTPUT));
        pac::TIM2.ccer().modify(|w| w.set_cce(FLASH_CHANNEL, false));
    }

    fn enable_tick_interrupt(&mut self) {
        let tim = pac::TIM2;
        tim.sr().modify(|w| w.set_uif(false));
        tim.dier().modify(|w| w.set_uie(true));
    }

    fn disable_tick_interrupt(&mut self) {
        pac::TIM2.dier().modify(|w| w.set_uie(false));
    }

    fn start_counter(&mut self) {
        pac::TIM2.cr1().modify(|w| w.set_cen(true));
    }

    fn stop_counter(&mut self) {
        pac::TIM2.cr1().modify(|w| w.set_cen(false));
    }

    fn reset_counter(&mut self) {
        pac::TIM2.cnt().write(|w| w.set_cnt(0));
    }

    fn drive_output_low(&mut self) {
        pac::GPIOA.bsrr().write(|w| w.set_br(FLASH_PIN, true));
    }
}

/// COMP2 comparing the light sensor voltage on PA3 against VREFINT.
pub struct AmbientComparator {
    _pin: Peri<'static, PA3>,
}

impl AmbientComparator {
    fn new(pin: Peri<'static, PA3>) -> Self {
        pac::RCC.apb2enr().modify(|w| w.set_syscfgen(true));
        pac::GPIOA
            .moder()
            .modify(|w| w.set_moder(AMBIENT_PIN, Moder::ANALOG));

        pac::SYSCFG.cfgr3().modify(|w| {
            w.set_en_vrefint(true);
            w.set_enbuf_vrefint_comp2(true);
        });

        // INNSEL = VREFINT and INPSEL = PA3 are both the all-zero selection.
        // SAFETY: COMP2_CSR is a valid, aligned MMIO register owned by this driver.
        unsafe { COMP2_CSR.write_volatile(COMP2EN) };

        Self { _pin: pin }
    }
}

impl ThresholdDetector for AmbientComparator {
    fn enable_interrupt(&mut self) {
        let exti = pac::EXTI;
        // An edge seen while masked is stale by now.
        exti.pr(IMR1_REG_IDX)
            .write(|w| w.set_line(COMP2_EXTI_LINE, true));
        exti.imr(IMR1_REG_IDX)
            .modify(|w| w.set_line(COMP2_EXTI_LINE, true));
    }

    fn disable_interrupt(&mut self) {
        pac::EXTI
            .imr(IMR1_REG_IDX)
            .modify(|w| w.set_line(COMP2_EXTI_LINE, false));
    }

    fn read(&self) -> Ambient {
        // SAFETY: as in `new`; reading has no side effects.
        let csr = unsafe { COMP2_CSR.read_volatile() };
        if csr & COMP2VALUE != 0 {
            Ambient::Night
        } else {
            Ambient::Day
        }
    }
}

/// Enters SLEEP or STOP mode between events.
///
/// SLEEP keeps TIM2 and COMP2 clocked. STOP halts every clock; only EXTI
/// lines (the enable pin) can wake the core from it.
pub struct PowerController {
    scb: SCB,
}

impl Sleep for PowerController {
    fn suspend(&mut self, depth: SleepDepth, has_work: impl FnOnce() -> bool) {
        match depth {
            SleepDepth::Idle => self.scb.clear_sleepdeep(),
            SleepDepth::PowerDown => {
                pac::PWR.cr().modify(|w| {
                    w.set_pdds(pac::pwr::vals::Pdds::STOP_MODE);
                    w.set_cwuf(true);
                });
                self.scb.set_sleepdeep();
            }
        }

        // WFI with interrupts masked still wakes on a pending interrupt, which
        // then runs once the critical section ends.
        cortex_m::interrupt::free(|_| {
            if !has_work() {
                cortex_m::asm::wfi();
            }
        });
    }
}
