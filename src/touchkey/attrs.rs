//! `t_key` attribute group.
//!
//! | attribute           | mode | value                              |
//! |---------------------|------|------------------------------------|
//! | `brightness`        | -w   | `1` on, anything else off          |
//! | `enable_disable`    | -w   | `0` power off, `1` power on        |
//!
//! Write-only attributes look at the first byte of the raw input; leading
//! whitespace is not skipped.
//! | `backlight_timeout` | rw   | milliseconds, clamped 500..=30000  |

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::device::TouchkeyDevice;
use super::{KeySink, TouchkeyPlatform};
use crate::attr::{parse_uint, AttrDescriptor, AttrError, AttrMode, AttributeGroup};
use crate::{dev_err, dev_info};

pub const GROUP_NAME: &str = "t_key";

static ATTRS: [AttrDescriptor; 3] = [
    AttrDescriptor {
        name: "brightness",
        mode: AttrMode::WriteOnly,
    },
    AttrDescriptor {
        name: "enable_disable",
        mode: AttrMode::WriteOnly,
    },
    AttrDescriptor {
        name: "backlight_timeout",
        mode: AttrMode::ReadWrite,
    },
];

impl<I2C, D, P, K> AttributeGroup for TouchkeyDevice<'_, I2C, D, P, K>
where
    I2C: I2c,
    D: DelayNs,
    P: TouchkeyPlatform,
    K: KeySink,
{
    fn name(&self) -> &'static str {
        GROUP_NAME
    }

    fn attributes(&self) -> &'static [AttrDescriptor] {
        &ATTRS
    }

    fn show(&mut self, attr: &str, out: &mut dyn Write) -> Result<(), AttrError> {
        let desc = self.access(attr, false)?;
        match desc.name {
            "backlight_timeout" => writeln!(out, "{}", self.backlight_timeout_ms())?,
            _ => return Err(AttrError::PermissionDenied),
        }
        Ok(())
    }

    fn store(&mut self, attr: &str, input: &str) -> Result<usize, AttrError> {
        let desc = self.access(attr, true)?;
        match desc.name {
            "brightness" => {
                let on = input.starts_with('1');
                self.set_backlight(on);
            }
            "enable_disable" => match input.as_bytes().first() {
                Some(b'0') => self.set_enabled(false),
                Some(b'1') => self.set_enabled(true),
                _ => {
                    dev_err!(self.logger(), self.now_us(), "enable_disable: invalid input");
                }
            },
            "backlight_timeout" => match parse_uint(input) {
                Some(ms) => {
                    let stored = self.set_backlight_timeout_ms(ms);
                    dev_info!(self.logger(), self.now_us(), "backlight timeout = {} ms", stored);
                }
                None => {
                    dev_err!(self.logger(), self.now_us(), "backlight_timeout: input error");
                }
            },
            _ => return Err(AttrError::PermissionDenied),
        }
        Ok(input.len())
    }
}
