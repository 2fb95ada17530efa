//! Hardware Abstraction Layer for atlas-drivers.
//!
//! Codec control over `embedded-hal` I2C.
//! Business logic stays in the driver modules, HAL is just I/O.

pub mod wm8994;

pub use wm8994::{Wm8994, Wm8994Error, WM8994_ADDR};
