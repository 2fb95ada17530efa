//! Incall audio boost levels.
//!
//! Four levels, one per call path, each 0..=3. They are stored already
//! shifted into the WM8994 `AIF2DAC_BOOST` field so the codec driver can OR
//! them straight into register 0x311 when a call starts on that path.
//!
//! The attribute side (`incall_boost` group) and the codec side run in
//! different contexts; the levels are atomics and never locked.

use core::fmt::Write;
use core::sync::atomic::{AtomicU16, Ordering};

use crate::attr::{parse_uint, AttrDescriptor, AttrError, AttrMode, AttributeGroup};
use crate::config::BOOST_LEVEL_MAX;
use crate::hal::wm8994::{AIF2DAC_BOOST_MASK, AIF2DAC_BOOST_SHIFT};
use crate::logging::{ClockFn, LogRing, Logger};
use crate::{dev_dbg, dev_info};

pub const GROUP_NAME: &str = "incall_boost";

/// Audio path of an active call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostPath {
    /// Earpiece receiver.
    Rcv,
    /// Bluetooth SCO.
    Bt,
    /// Loudspeaker.
    Spk,
    /// Wired headphones / headset.
    Hp,
}

impl BoostPath {
    pub const ALL: [BoostPath; 4] = [BoostPath::Rcv, BoostPath::Bt, BoostPath::Spk, BoostPath::Hp];

    pub fn attr_name(self) -> &'static str {
        match self {
            BoostPath::Rcv => "incall_boost_rcv",
            BoostPath::Bt => "incall_boost_bt",
            BoostPath::Spk => "incall_boost_spk",
            BoostPath::Hp => "incall_boost_hp",
        }
    }

    pub fn from_attr_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.attr_name() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

static ATTRS: [AttrDescriptor; 4] = [
    AttrDescriptor {
        name: "incall_boost_rcv",
        mode: AttrMode::ReadWrite,
    },
    AttrDescriptor {
        name: "incall_boost_bt",
        mode: AttrMode::ReadWrite,
    },
    AttrDescriptor {
        name: "incall_boost_spk",
        mode: AttrMode::ReadWrite,
    },
    AttrDescriptor {
        name: "incall_boost_hp",
        mode: AttrMode::ReadWrite,
    },
];

/// Boost level store.
pub struct IncallBoost<'a> {
    /// Register field values (`level << AIF2DAC_BOOST_SHIFT`), by path.
    fields: [AtomicU16; 4],
    log: Logger<'a>,
    clock: ClockFn,
}

impl<'a> IncallBoost<'a> {
    /// All paths start at level 0.
    pub const fn new(ring: &'a LogRing, clock: ClockFn) -> Self {
        Self {
            fields: [
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
            ],
            log: Logger::new(ring, GROUP_NAME),
            clock,
        }
    }

    /// Level 0..=3 for `path`.
    pub fn level(&self, path: BoostPath) -> u8 {
        (self.field(path) >> AIF2DAC_BOOST_SHIFT) as u8
    }

    /// Set the level for `path`, clamped to 3. Returns the stored level.
    pub fn set_level(&self, path: BoostPath, level: u32) -> u8 {
        let level = level.min(BOOST_LEVEL_MAX) as u16;
        self.fields[path.slot()].store(level << AIF2DAC_BOOST_SHIFT, Ordering::Relaxed);
        dev_dbg!(self.log, (self.clock)(), "{} = {}", path.attr_name(), level);
        level as u8
    }

    /// Shifted register field for `path`, ready to OR into register 0x311.
    pub fn field(&self, path: BoostPath) -> u16 {
        self.fields[path.slot()].load(Ordering::Relaxed) & AIF2DAC_BOOST_MASK
    }
}

impl AttributeGroup for IncallBoost<'_> {
    fn name(&self) -> &'static str {
        GROUP_NAME
    }

    fn attributes(&self) -> &'static [AttrDescriptor] {
        &ATTRS
    }

    fn show(&mut self, attr: &str, out: &mut dyn Write) -> Result<(), AttrError> {
        let desc = self.access(attr, false)?;
        let path = BoostPath::from_attr_name(desc.name).ok_or(AttrError::NoSuchAttribute)?;
        writeln!(out, "{}", self.level(path))?;
        Ok(())
    }

    fn store(&mut self, attr: &str, input: &str) -> Result<usize, AttrError> {
        let desc = self.access(attr, true)?;
        let path = BoostPath::from_attr_name(desc.name).ok_or(AttrError::NoSuchAttribute)?;
        match parse_uint(input) {
            Some(level) => {
                self.set_level(path, level);
            }
            None => {
                dev_info!(self.log, (self.clock)(), "{}: input error", path.attr_name());
            }
        }
        Ok(input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::zero_clock;

    #[test]
    fn test_level_clamped_and_shifted() {
        static RING: LogRing = LogRing::new();
        let boost = IncallBoost::new(&RING, zero_clock);

        assert_eq!(boost.set_level(BoostPath::Spk, 5), 3);
        assert_eq!(boost.level(BoostPath::Spk), 3);
        assert_eq!(boost.field(BoostPath::Spk), 0x0C00);

        assert_eq!(boost.set_level(BoostPath::Rcv, 1), 1);
        assert_eq!(boost.field(BoostPath::Rcv), 0x0400);
        assert_eq!(boost.level(BoostPath::Hp), 0);
    }

    #[test]
    fn test_attr_names_round_trip() {
        for path in BoostPath::ALL {
            assert_eq!(BoostPath::from_attr_name(path.attr_name()), Some(path));
        }
        assert_eq!(BoostPath::from_attr_name("incall_boost"), None);
    }
}
