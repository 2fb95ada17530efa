//! Lock wrapper for driving one device from several contexts.
//!
//! The interrupt thread, attribute writes and the backlight poll each take
//! the lock for the duration of one operation.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use spin::Mutex;

use super::device::TouchkeyDevice;
use super::{IrqReturn, KeySink, TouchkeyPlatform};

pub struct SharedTouchkey<'a, I2C, D, P, K> {
    inner: Mutex<TouchkeyDevice<'a, I2C, D, P, K>>,
}

impl<'a, I2C, D, P, K> SharedTouchkey<'a, I2C, D, P, K>
where
    I2C: I2c,
    D: DelayNs,
    P: TouchkeyPlatform,
    K: KeySink,
{
    pub fn new(device: TouchkeyDevice<'a, I2C, D, P, K>) -> Self {
        Self {
            inner: Mutex::new(device),
        }
    }

    /// Run `f` with exclusive access to the device.
    pub fn with<R>(&self, f: impl FnOnce(&mut TouchkeyDevice<'a, I2C, D, P, K>) -> R) -> R {
        let mut device = self.inner.lock();
        f(&mut device)
    }

    /// Interrupt entry point.
    pub fn interrupt(&self) -> IrqReturn {
        self.inner.lock().interrupt()
    }

    /// Backlight timer entry point.
    pub fn poll(&self) -> bool {
        self.inner.lock().poll()
    }

    pub fn into_inner(self) -> TouchkeyDevice<'a, I2C, D, P, K> {
        self.inner.into_inner()
    }
}
