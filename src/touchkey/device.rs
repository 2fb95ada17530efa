//! Touchkey driver context.
//!
//! # Interrupt path
//!
//! ```text
//! falling edge ──▶ hard_irq() ──WakeThread──▶ irq_thread()
//!                     │                          │
//!                  Handled                 read status ──fail/ESD──▶ recover()
//!            (masked, powering on,               │                    │
//!                 or dead)                       │◀──── fresh status ─┤
//!                                                │                   Dead
//!                                          decode + report
//!                                                │
//!                                          sync + rearm timer
//! ```
//!
//! # Power transitions
//!
//! `powering_on` is set for the whole window in which the controller
//! supply is off or settling. Interrupts in that window are acknowledged
//! and dropped, and backlight requests are recorded in `delay_led_on`
//! instead of being sent, then replayed by [`TouchkeyDevice::resume`].

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::Vec;

use super::backlight::BacklightTimer;
use super::bus::TouchkeyBus;
use super::health::{HealthSnapshot, HealthState};
use super::status::{
    BacklightCodes, HardwareRevision, KeyEncoding, KeyReport, StatusFlags, RELEASE_TRIGGER_INDEX,
};
use super::{IrqReturn, KeySink, Power, TouchkeyError, TouchkeyPlatform, DEVICE_NAME};
use crate::config::{PlatformData, TouchkeyConfig, MAX_KEYS};
use crate::logging::{LogRing, Logger};
use crate::{dev_dbg, dev_err, dev_info, dev_warn};

/// Device state flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFlags {
    /// Recovery exhausted its retries. Latched until resume/reinitialize.
    pub dead: bool,
    /// Supply is off or settling; interrupts are ignored.
    pub powering_on: bool,
    /// A backlight-on request arrived while powering on.
    pub delay_led_on: bool,
    /// Interrupt line unmasked.
    pub irq_enabled: bool,
}

/// One touchkey controller.
pub struct TouchkeyDevice<'a, I2C, D, P, K> {
    bus: TouchkeyBus<I2C, D>,
    platform: P,
    keys: K,
    log: Logger<'a>,
    config: TouchkeyConfig,
    keycodes: Vec<u16, MAX_KEYS>,
    revision: HardwareRevision,
    encoding: KeyEncoding,
    codes: BacklightCodes,
    flags: DeviceFlags,
    /// Bit *i* set while key *i* is reported pressed.
    pressed: u8,
    timer: BacklightTimer,
    health: HealthState,
    power_held: bool,
}

impl<'a, I2C, D, P, K> TouchkeyDevice<'a, I2C, D, P, K>
where
    I2C: I2c,
    D: DelayNs,
    P: TouchkeyPlatform,
    K: KeySink,
{
    /// Power the controller up, identify it and start accepting interrupts.
    ///
    /// On failure the controller is left powered off.
    pub fn probe(
        i2c: I2C,
        delay: D,
        mut platform: P,
        keys: K,
        pdata: &PlatformData,
        config: TouchkeyConfig,
        ring: &'a LogRing,
    ) -> Result<Self, TouchkeyError> {
        let log = Logger::new(ring, DEVICE_NAME);

        if pdata.keycodes.is_empty() {
            dev_err!(log, platform.now_us(), "probe: invalid platform data");
            return Err(TouchkeyError::InvalidPlatformData);
        }

        let mut bus = TouchkeyBus::new(
            i2c,
            delay,
            config.i2c_addr,
            config.bus_retries,
            config.bus_retry_delay_ms,
        );

        platform.set_power(Power::On);
        bus.delay_ms(config.probe_settle_ms);

        let block = match bus.read_version() {
            Ok(block) => block,
            Err(e) => {
                dev_err!(log, platform.now_us(), "probe: error reading hardware version ({})", e);
                platform.set_power(Power::Off);
                return Err(TouchkeyError::VersionRead(e));
            }
        };

        let revision = HardwareRevision::from_version_block(block);
        let (codes, encoding) = if pdata.force_legacy {
            (BacklightCodes::LEGACY, KeyEncoding::Legacy)
        } else {
            (revision.backlight_codes(), revision.key_encoding())
        };

        dev_info!(
            log,
            platform.now_us(),
            "hardware rev1 = {:#04x}, rev2 = {:#04x}, {:?} keys",
            revision.rev1,
            revision.rev2,
            encoding
        );

        Ok(Self {
            bus,
            platform,
            keys,
            log,
            keycodes: pdata.keycodes.clone(),
            revision,
            encoding,
            codes,
            flags: DeviceFlags {
                dead: false,
                powering_on: false,
                delay_led_on: false,
                irq_enabled: true,
            },
            pressed: 0,
            timer: BacklightTimer::new(config.backlight_timeout_ms),
            health: HealthState::new(),
            power_held: false,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Interrupt handling
    // ------------------------------------------------------------------

    /// Top half: decide whether the threaded handler runs.
    pub fn hard_irq(&self) -> IrqReturn {
        if self.flags.powering_on {
            dev_dbg!(self.log, self.platform.now_us(), "ignoring spurious boot interrupt");
            return IrqReturn::Handled;
        }
        if !self.flags.irq_enabled || self.flags.dead {
            return IrqReturn::Handled;
        }
        IrqReturn::WakeThread
    }

    /// Threaded handler: read the status byte, recover or report keys.
    ///
    /// After a successful recovery the status byte read by the recovery
    /// is decoded in place of the failed one.
    pub fn irq_thread(&mut self) {
        let status = match self.bus.read_status() {
            Ok(status) if !StatusFlags::from_status(status).needs_recovery() => status,
            result => {
                let now = self.platform.now_us();
                match result {
                    Ok(status) => dev_warn!(self.log, now, "ESD state detected (status {:#04x})", status),
                    Err(e) => dev_err!(self.log, now, "i2c read error: {}", e),
                };
                match self.recover() {
                    Ok(fresh) if !StatusFlags::from_status(fresh).needs_recovery() => fresh,
                    Ok(fresh) => {
                        dev_warn!(self.log, self.platform.now_us(), "ESD state persists (status {:#04x})", fresh);
                        return;
                    }
                    Err(_) => {
                        dev_err!(self.log, self.platform.now_us(), "touchkey recovery failed!");
                        return;
                    }
                }
            }
        };

        self.process_status(status);
    }

    /// Both halves in sequence, for embedders without threaded IRQs.
    pub fn interrupt(&mut self) -> IrqReturn {
        let ret = self.hard_irq();
        if ret == IrqReturn::WakeThread {
            self.irq_thread();
        }
        ret
    }

    fn process_status(&mut self, status: u8) {
        let now = self.platform.now_us();

        let report = match self.encoding.decode(status, self.keycodes.len()) {
            Ok(report) => report,
            Err(e) => {
                dev_err!(self.log, now, "scancode is out of range ({:?})", e);
                return;
            }
        };

        let reported = match report {
            KeyReport::Single { index, pressed } => {
                if pressed {
                    if self.platform.touch_panel_busy() {
                        dev_dbg!(self.log, now, "touch panel active, press ignored");
                        return;
                    }
                    if index == RELEASE_TRIGGER_INDEX {
                        self.platform.force_touch_release();
                    }
                }
                self.report(index, pressed);
                true
            }
            KeyReport::Bitmap(bits) => {
                let busy = self.platform.touch_panel_busy();
                let mut any = false;
                for index in 0..self.keycodes.len() {
                    let pressed = bits & (1 << index) != 0;
                    let was = self.pressed & (1 << index) != 0;
                    if pressed == was || (pressed && busy) {
                        continue;
                    }
                    self.report(index, pressed);
                    any = true;
                }
                any
            }
        };

        if reported {
            self.keys.sync();
            self.timer.rearm(now);
        }
    }

    fn report(&mut self, index: usize, pressed: bool) {
        let code = self.keycodes[index];
        if pressed {
            self.pressed |= 1 << index;
        } else {
            self.pressed &= !(1 << index);
        }
        self.keys.report_key(code, pressed);
        dev_dbg!(
            self.log,
            self.platform.now_us(),
            "[{}] touch key {}",
            if pressed { "press" } else { "release" },
            code
        );
    }

    /// Release every key and flush.
    fn all_keys_up(&mut self) {
        for &code in self.keycodes.iter() {
            self.keys.report_key(code, false);
        }
        self.pressed = 0;
        self.keys.sync();
    }

    /// Power-cycle and reread until the controller answers. Returns the
    /// status byte of the successful reread.
    ///
    /// Returns [`TouchkeyError::Dead`] without touching the hardware if
    /// the device already died.
    pub fn recover(&mut self) -> Result<u8, TouchkeyError> {
        if self.flags.dead {
            dev_err!(self.log, self.platform.now_us(), "device is already dead, skipping recovery");
            return Err(TouchkeyError::Dead);
        }

        self.health.begin_recovery();
        self.all_keys_up();
        self.flags.irq_enabled = false;

        let retries = self.config.recovery_retries;
        for attempt in 1..=retries {
            self.health.record_attempt();
            self.platform.set_power(Power::Off);
            self.platform.set_power(Power::On);

            match self.bus.read_status() {
                Ok(status) => {
                    self.flags.irq_enabled = true;
                    self.health.recovered();
                    dev_info!(self.log, self.platform.now_us(), "recovered after {} attempt(s)", attempt);
                    return Ok(status);
                }
                Err(e) => {
                    dev_err!(
                        self.log,
                        self.platform.now_us(),
                        "recovery: {} retry = {}",
                        e,
                        retries - attempt
                    );
                }
            }
        }

        self.flags.dead = true;
        self.platform.set_power(Power::Off);
        self.health.died();
        dev_err!(self.log, self.platform.now_us(), "touchkey died");
        Err(TouchkeyError::RecoveryFailed)
    }

    // ------------------------------------------------------------------
    // Backlight
    // ------------------------------------------------------------------

    /// Backlight on/off request (`brightness` attribute).
    pub fn set_backlight(&mut self, on: bool) {
        let now = self.platform.now_us();

        if self.flags.powering_on {
            self.flags.delay_led_on = on;
            if on {
                dev_warn!(self.log, now, "delay led on");
            } else {
                dev_warn!(self.log, now, "delay led off skip");
            }
            return;
        }

        let result = if on {
            let result = self.bus.write_command(self.codes.on);
            dev_info!(self.log, now, "touch key led ON");
            self.timer.rearm(now);
            result
        } else {
            let result = self.bus.write_command(self.codes.off);
            dev_info!(self.log, now, "touch key led OFF");
            self.timer.cancel();
            result
        };

        if let Err(e) = result {
            dev_err!(self.log, now, "touchkey led i2c failed: {}", e);
        }
    }

    /// Run the backlight timer. Turns the backlight off when the
    /// inactivity timeout expired and no notification light is active.
    ///
    /// Returns `true` if an off request was issued.
    pub fn poll(&mut self) -> bool {
        let now = self.platform.now_us();
        if !self.timer.poll(now) {
            return false;
        }
        if self.platform.notification_ongoing() {
            dev_dbg!(self.log, now, "backlight timeout suppressed by notification");
            return false;
        }
        self.set_backlight(false);
        true
    }

    /// Change the inactivity timeout; returns the clamped value stored.
    pub fn set_backlight_timeout_ms(&mut self, ms: u32) -> u32 {
        self.timer.set_timeout_ms(ms)
    }

    pub fn backlight_timeout_ms(&self) -> u32 {
        self.timer.timeout_ms()
    }

    // ------------------------------------------------------------------
    // Power transitions
    // ------------------------------------------------------------------

    /// `enable_disable` attribute: `false` powers the controller off and
    /// masks its interrupt, `true` powers it on and unmasks it.
    pub fn set_enabled(&mut self, enable: bool) {
        if enable {
            self.flags.powering_on = false;
            self.platform.set_power(Power::On);
            self.flags.irq_enabled = true;
        } else {
            if self.platform.notification_ongoing() {
                dev_info!(self.log, self.platform.now_us(), "disable refused: notification ongoing");
                return;
            }
            self.flags.powering_on = true;
            self.flags.irq_enabled = false;
            self.platform.set_power(Power::Off);
        }
    }

    /// Screen-off transition.
    pub fn suspend(&mut self) {
        self.flags.powering_on = true;

        if self.flags.dead {
            return;
        }

        self.flags.irq_enabled = false;

        if !self.platform.notification_ongoing() {
            self.timer.cancel();
            self.platform.set_power(Power::Off);
        }

        self.all_keys_up();
    }

    /// Screen-on transition. Also revives a dead device.
    pub fn resume(&mut self) {
        self.bus.delay_ms(self.config.resume_delay_ms);
        self.platform.set_power(Power::On);

        if self.flags.delay_led_on {
            self.replay_backlight_on();
        }

        self.flags.delay_led_on = false;
        self.flags.dead = false;
        self.flags.powering_on = false;
        self.flags.irq_enabled = true;
        self.health.revive();

        if self.power_held {
            self.platform.release_power();
            self.power_held = false;
        }
    }

    /// Send the backlight-on command recorded while powering on. A failed
    /// write power-cycles the controller and retries, at most
    /// `deferred_led_retries` times.
    fn replay_backlight_on(&mut self) {
        let now = self.platform.now_us();
        let mut result = self.bus.write_command(self.codes.on);
        self.timer.rearm(now);

        let mut retries = self.config.deferred_led_retries;
        while result.is_err() && retries > 0 {
            retries -= 1;
            dev_warn!(self.log, now, "deferred led on failed, force reset");
            self.platform.set_power(Power::Off);
            self.platform.set_power(Power::On);
            result = self.bus.write_command(self.codes.on);
            self.timer.rearm(self.platform.now_us());
        }

        match result {
            Ok(()) => dev_info!(self.log, now, "deferred led on"),
            Err(e) => dev_err!(self.log, now, "deferred led on failed: {}", e),
        };
    }

    /// Power-cycle and re-identify the controller, clearing a dead state.
    ///
    /// The key encoding and backlight codes stay as chosen at probe.
    pub fn reinitialize(&mut self) -> Result<(), TouchkeyError> {
        self.flags.powering_on = true;
        self.flags.irq_enabled = false;
        self.platform.set_power(Power::Off);
        self.platform.set_power(Power::On);
        self.bus.delay_ms(self.config.probe_settle_ms);

        match self.bus.read_version() {
            Ok(block) => {
                self.revision = HardwareRevision::from_version_block(block);
                self.flags.dead = false;
                self.flags.powering_on = false;
                self.flags.irq_enabled = true;
                self.health.revive();
                dev_info!(self.log, self.platform.now_us(), "reinitialized");
                Ok(())
            }
            Err(e) => {
                dev_err!(self.log, self.platform.now_us(), "reinitialize: {}", e);
                self.platform.set_power(Power::Off);
                Err(TouchkeyError::VersionRead(e))
            }
        }
    }

    /// Detach: power off, release keys and hand the resources back.
    pub fn remove(mut self) -> (I2C, D, P, K) {
        if !self.flags.dead {
            self.platform.set_power(Power::Off);
        }
        self.flags.irq_enabled = false;
        self.timer.cancel();
        self.all_keys_up();
        dev_info!(self.log, self.platform.now_us(), "removed");

        let (i2c, delay) = self.bus.release();
        (i2c, delay, self.platform, self.keys)
    }

    // ------------------------------------------------------------------
    // Notification light hooks
    // ------------------------------------------------------------------

    /// Notification light wants the key backlight on.
    pub fn bln_enable(&mut self) {
        self.set_backlight(true);
    }

    /// Notification light wants the key backlight off.
    pub fn bln_disable(&mut self) {
        self.set_backlight(false);
    }

    /// Power the controller for a notification without unmasking the
    /// interrupt, so keys cannot wake the device.
    pub fn bln_power_on(&mut self) {
        if !self.power_held {
            self.platform.hold_power();
            self.power_held = true;
        }
        self.flags.powering_on = false;
        self.platform.set_power(Power::On);
    }

    /// End of notification: power off and drop the power hold.
    pub fn bln_power_off(&mut self) {
        self.flags.powering_on = true;
        self.platform.set_power(Power::Off);
        if self.power_held {
            self.platform.release_power();
            self.power_held = false;
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn flags(&self) -> DeviceFlags {
        self.flags
    }

    pub fn is_dead(&self) -> bool {
        self.flags.dead
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    pub fn backlight_codes(&self) -> BacklightCodes {
        self.codes
    }

    pub fn revision(&self) -> HardwareRevision {
        self.revision
    }

    pub fn keycodes(&self) -> &[u16] {
        &self.keycodes
    }

    /// Bitmap of keys currently reported pressed.
    pub fn pressed(&self) -> u8 {
        self.pressed
    }

    pub fn health(&self) -> HealthSnapshot {
        self.health.snapshot()
    }

    pub fn backlight_deadline_us(&self) -> Option<u64> {
        self.timer.deadline_us()
    }

    pub fn power_held(&self) -> bool {
        self.power_held
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut K {
        &mut self.keys
    }

    pub(crate) fn logger(&self) -> Logger<'a> {
        self.log
    }

    pub(crate) fn now_us(&self) -> u64 {
        self.platform.now_us()
    }
}
