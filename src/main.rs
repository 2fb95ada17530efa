//! atlas-fw - board firmware entry point
//!
//! 1. Bring up the log UART and the two I2C buses
//! 2. Probe the touchkey controller, open the parameter block
//! 3. Loop: service touchkey interrupts, run the backlight timer,
//!    feed the console, drain logs

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use esp_idf_svc::hal::delay::{Delay, FreeRtos};
use esp_idf_svc::hal::gpio::{AnyIOPin, Input, InterruptType, Output, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{self, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys as esp_idf_sys;
use esp_idf_svc::sys::EspError;

use atlas_drivers::{
    attr::AttributeGroup,
    boost::IncallBoost,
    config::{nvs::NvsParamBlock, PlatformData, TouchkeyConfig},
    console::{Console, Context},
    dev_err, dev_info,
    log_sink::{drain_into, UartLogConfig, UartSink},
    logging::{LogRing, Logger},
    param::{DockStatus, ParamShim},
    touchkey::{KeySink, Power, TouchkeyDevice, TouchkeyPlatform},
};

static LOG_RING: LogRing = LogRing::new();

/// Set by the touchkey GPIO ISR, consumed by the main loop.
static TOUCHKEY_IRQ: AtomicBool = AtomicBool::new(false);

const MAIN_LOOP_PERIOD_MS: u32 = 5;

fn timestamp_us() -> u64 {
    // SAFETY: esp_timer is started by the IDF before app_main.
    let now = unsafe { esp_idf_sys::esp_timer_get_time() };
    now.max(0) as u64
}

/// Touchkey supply switch and board clock.
struct BoardPlatform<'d> {
    power: PinDriver<'d, AnyIOPin, Output>,
}

impl TouchkeyPlatform for BoardPlatform<'_> {
    fn set_power(&mut self, power: Power) {
        let _ = match power {
            Power::On => self.power.set_high(),
            Power::Off => self.power.set_low(),
        };
    }

    fn now_us(&self) -> u64 {
        timestamp_us()
    }

    fn force_touch_release(&mut self) {}
}

/// Key events go to the log; the board has no input layer.
struct LogKeySink {
    log: Logger<'static>,
}

impl KeySink for LogKeySink {
    fn report_key(&mut self, code: u16, pressed: bool) {
        dev_info!(self.log, timestamp_us(), "key {} {}", code, if pressed { "down" } else { "up" });
    }

    fn sync(&mut self) {}
}

/// Dock detect input and USB-audio switch output.
struct BoardDock<'d> {
    detect: PinDriver<'d, AnyIOPin, Input>,
    usb_audio: PinDriver<'d, AnyIOPin, Output>,
}

impl DockStatus for BoardDock<'_> {
    fn is_docked(&self) -> bool {
        self.detect.is_low()
    }

    fn set_usb_audio_switch(&mut self, state: u8) {
        let _ = if state != 0 {
            self.usb_audio.set_high()
        } else {
            self.usb_audio.set_low()
        };
    }
}

#[no_mangle]
fn main() {
    esp_idf_sys::link_patches();

    if let Err(e) = run() {
        let log = Logger::new(&LOG_RING, "atlas-fw");
        dev_err!(log, timestamp_us(), "startup failed: {}", e);
        loop {
            FreeRtos::delay_ms(1000);
        }
    }
}

fn run() -> Result<(), EspError> {
    let p = Peripherals::take()?;
    let log = Logger::new(&LOG_RING, "atlas-fw");

    let log_cfg = UartLogConfig::default();
    let mut log_out = UartSink::new(p.uart1, p.pins.gpio6, &log_cfg)?;

    let console_cfg = uart::config::Config::default().baudrate(Hertz(115_200));
    let console_uart = UartDriver::new(
        p.uart0,
        p.pins.gpio43,
        p.pins.gpio44,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &console_cfg,
    )?;

    let i2c_cfg = I2cConfig::new().baudrate(Hertz(400_000));
    let touch_i2c = I2cDriver::new(p.i2c0, p.pins.gpio8, p.pins.gpio9, &i2c_cfg)?;

    let platform = BoardPlatform {
        power: PinDriver::output(AnyIOPin::from(p.pins.gpio10))?,
    };
    let keys = LogKeySink {
        log: Logger::new(&LOG_RING, "input"),
    };

    let mut irq_pin = PinDriver::input(AnyIOPin::from(p.pins.gpio11))?;
    irq_pin.set_pull(Pull::Up)?;
    irq_pin.set_interrupt_type(InterruptType::NegEdge)?;
    // SAFETY: the callback only touches an atomic.
    unsafe {
        irq_pin.subscribe(|| TOUCHKEY_IRQ.store(true, Ordering::Release))?;
    }
    irq_pin.enable_interrupt()?;

    let mut touchkey = match TouchkeyDevice::probe(
        touch_i2c,
        Delay::new_default(),
        platform,
        keys,
        &PlatformData::atlas(),
        TouchkeyConfig::default(),
        &LOG_RING,
    ) {
        Ok(dev) => Some(dev),
        Err(e) => {
            dev_err!(log, timestamp_us(), "touchkey probe failed: {}", e);
            None
        }
    };

    let param_block = match NvsParamBlock::open(EspDefaultNvsPartition::take()?) {
        Ok((block, state)) => {
            dev_info!(log, timestamp_us(), "parameter block: {:?}", state);
            Some(block)
        }
        Err(e) => {
            dev_err!(log, timestamp_us(), "parameter block unavailable: {}", e);
            None
        }
    };
    let dock = BoardDock {
        detect: PinDriver::input(AnyIOPin::from(p.pins.gpio12))?,
        usb_audio: PinDriver::output(AnyIOPin::from(p.pins.gpio13))?,
    };
    let mut param = ParamShim::new(param_block, dock, &LOG_RING, timestamp_us);

    let mut boost = IncallBoost::new(&LOG_RING, timestamp_us);
    let mut console = Console::new();
    let mut reply = heapless::String::<512>::new();
    console.print_banner(&mut reply);

    dev_info!(log, timestamp_us(), "{}", atlas_drivers::console::console::VERSION);

    loop {
        if let Some(dev) = touchkey.as_mut() {
            if TOUCHKEY_IRQ.swap(false, Ordering::Acquire) {
                dev.interrupt();
                irq_pin.enable_interrupt()?;
            }
            dev.poll();
        }

        let mut byte = [0u8; 1];
        while console_uart.read(&mut byte, 0).unwrap_or(0) == 1 {
            let mut groups: heapless::Vec<&mut dyn AttributeGroup, 3> = heapless::Vec::new();
            if let Some(dev) = touchkey.as_mut() {
                let _ = groups.push(dev);
            }
            let _ = groups.push(&mut param);
            let _ = groups.push(&mut boost);

            let mut ctx = Context::new(&mut groups).with_log(&LOG_RING);
            console.process_byte(byte[0], &mut ctx, &mut reply);
        }

        if !reply.is_empty() {
            let _ = console_uart.write(reply.as_bytes());
            reply.clear();
        }

        drain_into(&LOG_RING, &mut log_out);

        FreeRtos::delay_ms(MAIN_LOOP_PERIOD_MS);
    }
}
