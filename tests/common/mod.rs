//! Simulated beacon hardware for host tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use ambient_beacon::{
    Ambient, Beacon, EnablePin, Flag, FlagInbox, FlagRaiser, FlashTimer, IndicatorPin, Mode, Sleep,
    SleepDepth, ThresholdDetector, TimerRegisters,
};
use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Register-level model of the timer and its flash pin.
#[derive(Debug, Default)]
pub struct SimTimer {
    pub powered: bool,
    pub waveform: bool,
    pub connected: bool,
    pub tick_irq: bool,
    pub running: bool,
    pub counter: u16,
    pub pin_high: bool,
    /// Writes that reached a powered-down peripheral.
    pub writes_while_unpowered: usize,
}

impl SimTimer {
    fn powered_write(&mut self) -> bool {
        if !self.powered {
            self.writes_while_unpowered += 1;
        }
        self.powered
    }

    /// Flash pin toggles with the counter.
    pub fn is_blinking(&self) -> bool {
        self.powered && self.waveform && self.running && self.connected && self.tick_irq
    }

    /// Flash pin held low as a GPIO.
    pub fn output_off(&self) -> bool {
        !self.connected && !self.pin_high
    }

    pub fn is_stopped(&self) -> bool {
        !self.powered && !self.running && !self.tick_irq && self.counter == 0
    }

    pub fn is_debouncing(&self) -> bool {
        self.powered && self.running && self.tick_irq && !self.connected
    }
}

impl TimerRegisters for SimTimer {
    fn power_up(&mut self) {
        self.powered = true;
    }

    fn power_down(&mut self) {
        self.powered = false;
    }

    fn configure_waveform(&mut self) {
        if self.powered_write() {
            self.waveform = true;
        }
    }

    fn connect_output(&mut self) {
        if self.powered_write() {
            // Counter parked at zero: the first flash starts on the next count.
            assert!(!self.running, "flash pin connected to a running counter");
            self.connected = true;
        }
    }

    fn disconnect_output(&mut self) {
        self.connected = false;
        self.pin_high = false;
    }

    fn enable_tick_interrupt(&mut self) {
        if self.powered_write() {
            self.tick_irq = true;
        }
    }

    fn disable_tick_interrupt(&mut self) {
        self.tick_irq = false;
    }

    fn start_counter(&mut self) {
        if self.powered_write() {
            self.running = true;
        }
    }

    fn stop_counter(&mut self) {
        self.running = false;
    }

    fn reset_counter(&mut self) {
        self.counter = 0;
    }

    fn drive_output_low(&mut self) {
        self.pin_high = false;
    }
}

/// Comparator with a settable light level.
pub struct SimComparator {
    ambient: Rc<Cell<Ambient>>,
    irq: FlagRaiser<'static>,
    /// Raise an edge from inside `disable_interrupt`, as if the level crossed
    /// the threshold just before the interrupt was masked.
    edge_on_mask: Rc<Cell<bool>>,
    pub irq_enabled: bool,
    pub irq_toggles: usize,
}

impl ThresholdDetector for SimComparator {
    fn enable_interrupt(&mut self) {
        self.irq_enabled = true;
        self.irq_toggles += 1;
    }

    fn disable_interrupt(&mut self) {
        if self.irq_enabled && self.edge_on_mask.get() {
            self.irq.raise(Flag::ComparatorEdge);
        }
        self.irq_enabled = false;
        self.irq_toggles += 1;
    }

    fn read(&self) -> Ambient {
        self.ambient.get()
    }
}

/// Enable input whose level the test controls.
pub struct SimPin(Rc<Cell<bool>>);

impl InputPin for SimPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

/// Indicator output whose level the test reads back.
#[derive(Default)]
pub struct SimOutput(pub bool);

impl OutputPin for SimOutput {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0 = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0 = true;
        Ok(())
    }
}

/// Sleeper that records what it was asked to do.
#[derive(Default)]
pub struct SleepLog {
    pub slept: Vec<SleepDepth>,
    pub skipped: usize,
}

impl Sleep for SleepLog {
    fn suspend(&mut self, depth: SleepDepth, has_work: impl FnOnce() -> bool) {
        if has_work() {
            self.skipped += 1;
        } else {
            self.slept.push(depth);
        }
    }
}

pub type SimBeacon = Beacon<
    'static,
    FlashTimer<SimTimer>,
    SimComparator,
    EnablePin<SimPin>,
    IndicatorPin<SimOutput>,
>;

/// A beacon wired to simulated hardware, plus the interrupt side of the inbox.
pub struct Rig {
    pub beacon: SimBeacon,
    pub irq: FlagRaiser<'static>,
    ambient: Rc<Cell<Ambient>>,
    enable_level: Rc<Cell<bool>>,
    edge_on_mask: Rc<Cell<bool>>,
}

impl Rig {
    /// Hardware as init leaves it: timer stopped, comparator interrupt on.
    /// Nothing has been stepped yet.
    pub fn new(ambient: Ambient, enabled: bool) -> Self {
        let inbox: &'static FlagInbox = Box::leak(Box::new(FlagInbox::new()));
        let ambient = Rc::new(Cell::new(ambient));
        let enable_level = Rc::new(Cell::new(enabled));
        let edge_on_mask = Rc::new(Cell::new(false));
        let detector = SimComparator {
            ambient: Rc::clone(&ambient),
            irq: inbox.raiser(),
            edge_on_mask: Rc::clone(&edge_on_mask),
            irq_enabled: true,
            irq_toggles: 0,
        };
        let beacon = Beacon::new(
            FlashTimer::new(SimTimer::default()),
            detector,
            EnablePin::new(SimPin(Rc::clone(&enable_level))),
            inbox.receiver().unwrap(),
        )
        .with_indicator(IndicatorPin::new(SimOutput::default()));
        Self {
            beacon,
            irq: inbox.raiser(),
            ambient,
            enable_level,
            edge_on_mask,
        }
    }

    /// Powered on and past the start-up debounce.
    pub fn booted(ambient: Ambient) -> Self {
        let mut rig = Self::new(ambient, true);
        rig.settle();
        assert_eq!(rig.mode(), Mode::Wait);
        rig.ticks(5);
        assert_eq!(rig.mode(), Mode::Idle);
        rig
    }

    pub fn mode(&self) -> Mode {
        self.beacon.mode()
    }

    pub fn timer(&self) -> &SimTimer {
        self.beacon.timer().registers()
    }

    pub fn comparator(&self) -> &SimComparator {
        self.beacon.detector()
    }

    /// Level of the ambient indicator pin.
    pub fn indicator_high(&self) -> bool {
        self.beacon.indicator().pin().0
    }

    /// Makes every comparator mask race with a fresh edge.
    pub fn edge_on_mask(&mut self, racing: bool) {
        self.edge_on_mask.set(racing);
    }

    /// Steps until the beacon would go to sleep.
    pub fn settle(&mut self) {
        for _ in 0..16 {
            self.beacon.step();
            if !self.beacon.has_work() {
                return;
            }
        }
        panic!("beacon never went back to sleep");
    }

    pub fn ticks(&mut self, count: usize) {
        for _ in 0..count {
            // The overflow interrupt only fires while enabled.
            if self.timer().tick_irq {
                self.irq.raise(Flag::Tick);
            }
            self.settle();
        }
    }

    /// Changes the light level without letting the beacon run.
    pub fn light(&mut self, ambient: Ambient) {
        if self.ambient.get() != ambient {
            self.ambient.set(ambient);
            if self.comparator().irq_enabled {
                self.irq.raise(Flag::ComparatorEdge);
            }
        }
    }

    /// Changes the enable level without letting the beacon run.
    pub fn enable_line(&mut self, enabled: bool) {
        if self.enable_level.get() != enabled {
            self.enable_level.set(enabled);
            self.irq.raise(Flag::PinChange);
        }
    }
}
