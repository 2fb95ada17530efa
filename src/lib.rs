//! # atlas-drivers
//!
//! Device drivers for the Atlas handset, written against `embedded-hal`
//! so the same code runs on the board and on the host test harness.
//!
//! ## Components
//!
//! - [`touchkey`]: Cypress capacitive touchkey controller (keys, backlight,
//!   ESD recovery)
//! - [`param`]: attribute shim over the NV parameter block
//! - [`boost`]: incall audio boost levels consumed by the WM8994 codec
//!
//! Every component exposes an [`attr::AttributeGroup`]; the [`console`]
//! reads and writes those groups from a text line.
//!
//! Components never talk to each other. Each owns its state and is driven
//! explicitly by the embedding firmware.

#![cfg_attr(not(test), no_std)]

pub mod attr;
pub mod boost;
pub mod config;
pub mod console;
pub mod hal;
pub mod log_sink;
pub mod logging;
pub mod param;
pub mod touchkey;

pub use attr::{AttrError, AttrMode, AttributeGroup};
pub use boost::{BoostPath, IncallBoost};
pub use config::{PlatformData, TouchkeyConfig};
pub use logging::{LogLevel, LogRing, Logger};
pub use param::{ParamAccessor, ParamShim, RebootMode};
pub use touchkey::{HealthState, KeyEncoding, SharedTouchkey, TouchkeyDevice};
