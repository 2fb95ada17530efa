//! Cypress capacitive touchkey controller.
//!
//! One I2C-attached controller scanning up to four keys, with a key
//! backlight and an ESD error flag in its status byte.
//!
//! # Structure
//!
//! - [`status`]: status byte layout, hardware revision, key encodings
//! - [`bus`]: I2C transactions with the fixed retry policy
//! - [`backlight`]: backlight inactivity timer
//! - [`health`]: Normal / Recovering / Dead tracking
//! - [`device`]: the driver context (probe, interrupt, power transitions)
//! - [`attrs`]: the `t_key` attribute group
//! - [`shared`]: lock wrapper for multi-context embedders
//!
//! All per-device state lives in [`TouchkeyDevice`]. Every state flag is
//! mutated through `&mut self`; the interrupt mask is still modelled
//! because it decides whether an interrupt is processed at all.

pub mod attrs;
pub mod backlight;
pub mod bus;
pub mod device;
pub mod health;
pub mod shared;
pub mod status;

pub use backlight::BacklightTimer;
pub use bus::{BusFailure, TouchkeyBus};
pub use device::{DeviceFlags, TouchkeyDevice};
pub use health::{Health, HealthSnapshot, HealthState};
pub use shared::SharedTouchkey;
pub use status::{
    BacklightCodes, DecodeError, HardwareRevision, KeyEncoding, KeyReport, StatusFlags,
    RELEASE_TRIGGER_INDEX,
};

use core::fmt;

/// Log tag for every touchkey message.
pub const DEVICE_NAME: &str = "cypress-touchkey";

/// Controller supply state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    On,
    Off,
}

/// Result of the hard (top-half) interrupt handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// Acknowledged, nothing more to do.
    Handled,
    /// Run the threaded handler.
    WakeThread,
}

/// Board services the touchkey driver depends on.
pub trait TouchkeyPlatform {
    /// Switch the controller supply.
    fn set_power(&mut self, power: Power);

    /// Monotonic time in microseconds.
    fn now_us(&self) -> u64;

    /// True while the touch panel is being touched. Key presses are
    /// ignored in that window so a palm on the screen edge does not
    /// trigger keys.
    fn touch_panel_busy(&self) -> bool {
        false
    }

    /// Make the touch panel release every active touch.
    fn force_touch_release(&mut self);

    /// True while a notification light sequence is running; the
    /// backlight timeout and power-off paths must leave it alone.
    fn notification_ongoing(&self) -> bool {
        false
    }

    /// Keep the system awake while the notification light drives the
    /// controller.
    fn hold_power(&mut self) {}

    /// Drop the hold taken by [`hold_power`](Self::hold_power).
    fn release_power(&mut self) {}
}

/// Consumer of key events (the input layer).
pub trait KeySink {
    /// Record a key state change.
    fn report_key(&mut self, code: u16, pressed: bool);

    /// Flush the recorded changes as one atomic update.
    fn sync(&mut self);
}

/// Touchkey driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchkeyError {
    /// Platform data has no key codes.
    InvalidPlatformData,
    /// Hardware version read failed at probe.
    VersionRead(BusFailure),
    /// Device was already dead; recovery was not attempted.
    Dead,
    /// Every recovery attempt failed; the device is now dead.
    RecoveryFailed,
}

impl fmt::Display for TouchkeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchkeyError::InvalidPlatformData => f.write_str("invalid platform data"),
            TouchkeyError::VersionRead(e) => write!(f, "error reading hardware version: {}", e),
            TouchkeyError::Dead => f.write_str("device is dead"),
            TouchkeyError::RecoveryFailed => f.write_str("recovery failed"),
        }
    }
}
