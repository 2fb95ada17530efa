//! Module: config
//!
//! Purpose: driver tunables, attribute bounds and board platform data.
//!
//! Architecture:
//! - `TouchkeyConfig`: timing and retry policy, fixed at probe
//! - `PlatformData`: what the board tells the driver (key codes, quirks)
//! - `nvs`: parameter block persistence on the board (ESP-IDF only)

pub mod nvs;

use heapless::Vec;

/// Maximum number of touch keys a controller can report.
pub const MAX_KEYS: usize = 4;

/// Default 7-bit I2C address of the touchkey controller.
pub const TOUCHKEY_I2C_ADDR: u8 = 0x20;

/// Backlight inactivity timeout bounds and default (milliseconds).
pub const BACKLIGHT_TIMEOUT_MIN_MS: u32 = 500;
pub const BACKLIGHT_TIMEOUT_MAX_MS: u32 = 30_000;
pub const BACKLIGHT_TIMEOUT_DEFAULT_MS: u32 = 15_000;

/// Incall boost level bounds.
pub const BOOST_LEVEL_MAX: u32 = 3;

/// Size of a string parameter slot, including the terminator the
/// parameter block reserves.
pub const PARAM_STRING_SIZE: usize = 1024;

/// Linux input key codes used by the Atlas touchkeys.
pub mod keycodes {
    pub const KEY_BACK: u16 = 158;
    pub const KEY_MENU: u16 = 139;
    pub const KEY_HOME: u16 = 102;
    pub const KEY_SEARCH: u16 = 217;
}

/// Touchkey timing and retry policy.
#[derive(Debug, Clone)]
pub struct TouchkeyConfig {
    /// 7-bit I2C address.
    pub i2c_addr: u8,
    /// Extra attempts for a single bus transaction.
    pub bus_retries: u8,
    /// Delay between bus attempts (ms).
    pub bus_retry_delay_ms: u32,
    /// Power-cycle-and-reread attempts before the device is declared dead.
    pub recovery_retries: u8,
    /// Settle time after power-on before the version read at probe (ms).
    pub probe_settle_ms: u32,
    /// Delay before powering on at resume (ms).
    pub resume_delay_ms: u32,
    /// Forced retries when the deferred backlight-on replay fails.
    pub deferred_led_retries: u8,
    /// Initial backlight timeout (ms), clamped to the attribute bounds.
    pub backlight_timeout_ms: u32,
}

impl Default for TouchkeyConfig {
    fn default() -> Self {
        Self {
            i2c_addr: TOUCHKEY_I2C_ADDR,
            bus_retries: 2,
            bus_retry_delay_ms: 10,
            recovery_retries: 10,
            probe_settle_ms: 100,
            resume_delay_ms: 1,
            deferred_led_retries: 1,
            backlight_timeout_ms: BACKLIGHT_TIMEOUT_DEFAULT_MS,
        }
    }
}

/// Board description handed to the touchkey driver at probe.
#[derive(Debug, Clone)]
pub struct PlatformData {
    /// Key codes in controller order. Index 0 is scancode 1.
    pub keycodes: Vec<u16, MAX_KEYS>,
    /// Ignore the detected revision and use legacy command bytes and
    /// legacy key encoding. Set on the SCH-I500.
    pub force_legacy: bool,
}

impl PlatformData {
    /// Atlas (SCH-I500) board: menu, home, back, search, legacy codes.
    pub fn atlas() -> Self {
        Self {
            keycodes: Vec::from_slice(&[
                keycodes::KEY_MENU,
                keycodes::KEY_HOME,
                keycodes::KEY_BACK,
                keycodes::KEY_SEARCH,
            ])
            .unwrap_or_default(),
            force_legacy: true,
        }
    }

    /// Board with explicit key codes; extra codes beyond [`MAX_KEYS`] are
    /// ignored.
    pub fn with_keycodes(codes: &[u16]) -> Self {
        let mut keycodes = Vec::new();
        for &code in codes.iter().take(MAX_KEYS) {
            let _ = keycodes.push(code);
        }
        Self {
            keycodes,
            force_legacy: false,
        }
    }
}

/// Clamp a backlight timeout to its bounds.
#[inline]
pub fn clamp_backlight_timeout(ms: u32) -> u32 {
    ms.clamp(BACKLIGHT_TIMEOUT_MIN_MS, BACKLIGHT_TIMEOUT_MAX_MS)
}
