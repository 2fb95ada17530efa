//! I2C transactions with the controller.
//!
//! The controller has no register map: a plain read returns the status
//! byte (or the 3-byte version block right after power-on) and a plain
//! one-byte write is a command.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

/// A transaction failed on every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFailure {
    /// Attempts made, including the first.
    pub attempts: u8,
    /// Error kind of the last attempt.
    pub kind: ErrorKind,
}

impl fmt::Display for BusFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i2c error {:?} after {} attempt(s)", self.kind, self.attempts)
    }
}

/// Bus handle with the retry policy baked in.
pub struct TouchkeyBus<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    retries: u8,
    retry_delay_ms: u32,
}

impl<I2C: I2c, D: DelayNs> TouchkeyBus<I2C, D> {
    /// `retries` extra attempts are made for status reads and command
    /// writes, `retry_delay_ms` apart.
    pub fn new(i2c: I2C, delay: D, addr: u8, retries: u8, retry_delay_ms: u32) -> Self {
        Self {
            i2c,
            delay,
            addr,
            retries,
            retry_delay_ms,
        }
    }

    /// Read the one-byte status.
    pub fn read_status(&mut self) -> Result<u8, BusFailure> {
        let mut buf = [0u8; 1];
        self.with_retries(|i2c, addr| i2c.read(addr, &mut buf))?;
        Ok(buf[0])
    }

    /// Write a one-byte command.
    pub fn write_command(&mut self, cmd: u8) -> Result<(), BusFailure> {
        self.with_retries(|i2c, addr| i2c.write(addr, &[cmd]))
    }

    /// Read the 3-byte version block. Single attempt.
    pub fn read_version(&mut self) -> Result<[u8; 3], BusFailure> {
        let mut block = [0u8; 3];
        self.i2c.read(self.addr, &mut block).map_err(|e| BusFailure {
            attempts: 1,
            kind: e.kind(),
        })?;
        Ok(block)
    }

    /// Blocking delay on the bus' delay provider.
    pub fn delay_ms(&mut self, ms: u32) {
        if ms > 0 {
            self.delay.delay_ms(ms);
        }
    }

    /// Give back the bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn with_retries<F>(&mut self, mut op: F) -> Result<(), BusFailure>
    where
        F: FnMut(&mut I2C, u8) -> Result<(), I2C::Error>,
    {
        let attempts = self.retries.saturating_add(1);
        let mut kind = ErrorKind::Other;

        for attempt in 1..=attempts {
            match op(&mut self.i2c, self.addr) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    kind = e.kind();
                    if attempt < attempts {
                        self.delay.delay_ms(self.retry_delay_ms);
                    }
                }
            }
        }

        Err(BusFailure { attempts, kind })
    }
}
