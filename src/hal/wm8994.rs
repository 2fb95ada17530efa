//! WM8994 audio codec control (incall path only).
//!
//! I2C control interface: 16-bit register address, 16-bit data, both
//! big-endian. Reference: WM8994 datasheet, AIF2 DAC section.

use core::fmt;

use embedded_hal::i2c::I2c;

use crate::boost::{BoostPath, IncallBoost};

/// WM8994 7-bit I2C address (CS/ADDR pin low).
pub const WM8994_ADDR: u8 = 0x1A;

/// WM8994 register addresses
pub mod regs {
    pub const SOFTWARE_RESET: u16 = 0x0000;
    pub const AIF2_CONTROL_2: u16 = 0x0311;
}

/// AIF2 Control (2): AIF2DAC_BOOST, bits 11:10.
pub const AIF2DAC_BOOST_SHIFT: u16 = 10;
pub const AIF2DAC_BOOST_MASK: u16 = 0x0C00;

/// Chip ID read back from register 0x0000.
pub const WM8994_CHIP_ID: u16 = 0x8994;

/// WM8994 driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wm8994Error {
    /// I2C communication error
    I2cError,
    /// Chip not responding or wrong ID
    ChipNotFound { id: u16 },
}

impl fmt::Display for Wm8994Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wm8994Error::I2cError => f.write_str("wm8994: i2c error"),
            Wm8994Error::ChipNotFound { id } => write!(f, "wm8994: unexpected chip id {:#06x}", id),
        }
    }
}

/// Codec handle. Owns the control bus.
pub struct Wm8994<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> Wm8994<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            addr: WM8994_ADDR,
        }
    }

    /// Read the chip ID and check it.
    pub fn probe(&mut self) -> Result<(), Wm8994Error> {
        let id = self.read_reg(regs::SOFTWARE_RESET)?;
        if id != WM8994_CHIP_ID {
            return Err(Wm8994Error::ChipNotFound { id });
        }
        Ok(())
    }

    /// Apply the stored boost level of `path` to AIF2 DAC.
    ///
    /// Called when a call is routed to `path`.
    pub fn apply_incall_boost(
        &mut self,
        boost: &IncallBoost<'_>,
        path: BoostPath,
    ) -> Result<(), Wm8994Error> {
        self.update_bits(regs::AIF2_CONTROL_2, AIF2DAC_BOOST_MASK, boost.field(path))
    }

    /// Current AIF2DAC_BOOST level (0..=3).
    pub fn incall_boost_level(&mut self) -> Result<u8, Wm8994Error> {
        let val = self.read_reg(regs::AIF2_CONTROL_2)?;
        Ok(((val & AIF2DAC_BOOST_MASK) >> AIF2DAC_BOOST_SHIFT) as u8)
    }

    /// Read-modify-write of `mask` bits. Skips the write when nothing
    /// changes.
    pub fn update_bits(&mut self, reg: u16, mask: u16, value: u16) -> Result<(), Wm8994Error> {
        let old = self.read_reg(reg)?;
        let new = (old & !mask) | (value & mask);
        if new != old {
            self.write_reg(reg, new)?;
        }
        Ok(())
    }

    pub fn write_reg(&mut self, reg: u16, val: u16) -> Result<(), Wm8994Error> {
        let [r_hi, r_lo] = reg.to_be_bytes();
        let [v_hi, v_lo] = val.to_be_bytes();
        self.i2c
            .write(self.addr, &[r_hi, r_lo, v_hi, v_lo])
            .map_err(|_| Wm8994Error::I2cError)
    }

    pub fn read_reg(&mut self, reg: u16) -> Result<u16, Wm8994Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.addr, &reg.to_be_bytes(), &mut buf)
            .map_err(|_| Wm8994Error::I2cError)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Give back the control bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}
