//! incall_boost attribute group and WM8994 apply tests

use std::collections::HashMap;

use atlas_drivers::attr::AttributeGroup;
use atlas_drivers::boost::{BoostPath, IncallBoost};
use atlas_drivers::hal::wm8994::{regs, Wm8994, Wm8994Error, WM8994_ADDR};
use atlas_drivers::logging::{zero_clock, LogRing};
use embedded_hal::i2c::{self, ErrorKind, ErrorType, Operation};

fn ring() -> &'static LogRing {
    Box::leak(Box::new(LogRing::new()))
}

fn read(group: &mut dyn AttributeGroup, attr: &str) -> String {
    let mut out = String::new();
    group.show(attr, &mut out).unwrap();
    out
}

#[test]
fn test_levels_clamped_to_three() {
    let mut boost = IncallBoost::new(ring(), zero_clock);

    assert_eq!(boost.store("incall_boost_spk", "5\n"), Ok(2));
    assert_eq!(read(&mut boost, "incall_boost_spk"), "3\n");

    boost.store("incall_boost_rcv", "2").unwrap();
    assert_eq!(read(&mut boost, "incall_boost_rcv"), "2\n");
    assert_eq!(boost.field(BoostPath::Rcv), 2 << 10);

    assert_eq!(read(&mut boost, "incall_boost_bt"), "0\n");
    assert_eq!(read(&mut boost, "incall_boost_hp"), "0\n");
}

#[test]
fn test_malformed_input_leaves_level() {
    let mut boost = IncallBoost::new(ring(), zero_clock);
    boost.store("incall_boost_hp", "1").unwrap();

    assert_eq!(boost.store("incall_boost_hp", "loud"), Ok(4));
    assert_eq!(boost.level(BoostPath::Hp), 1);
}

#[test]
fn test_every_path_has_an_attribute() {
    let boost = IncallBoost::new(ring(), zero_clock);
    for path in BoostPath::ALL {
        assert!(boost.find(path.attr_name()).is_some());
    }
    assert_eq!(boost.attributes().len(), 4);
}

// --- WM8994 register model ---

#[derive(Debug)]
struct BusError;

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Default)]
struct MockCodec {
    regs: HashMap<u16, u16>,
    writes: usize,
    offline: bool,
}

impl ErrorType for MockCodec {
    type Error = BusError;
}

impl i2c::I2c for MockCodec {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.offline || address != WM8994_ADDR {
            return Err(BusError);
        }
        let mut pointer = 0u16;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) if bytes.len() == 2 => {
                    pointer = u16::from_be_bytes([bytes[0], bytes[1]]);
                }
                Operation::Write(bytes) if bytes.len() == 4 => {
                    let reg = u16::from_be_bytes([bytes[0], bytes[1]]);
                    let val = u16::from_be_bytes([bytes[2], bytes[3]]);
                    self.regs.insert(reg, val);
                    self.writes += 1;
                }
                Operation::Write(_) => return Err(BusError),
                Operation::Read(buf) => {
                    let val = self.regs.get(&pointer).copied().unwrap_or(0);
                    buf.copy_from_slice(&val.to_be_bytes());
                }
            }
        }
        Ok(())
    }
}

#[test]
fn test_apply_boost_preserves_other_bits() {
    let boost = IncallBoost::new(ring(), zero_clock);
    boost.set_level(BoostPath::Spk, 2);

    let mut i2c = MockCodec::default();
    i2c.regs.insert(regs::AIF2_CONTROL_2, 0x4003);
    let mut codec = Wm8994::new(i2c);

    codec.apply_incall_boost(&boost, BoostPath::Spk).unwrap();
    assert_eq!(codec.incall_boost_level(), Ok(2));

    let i2c = codec.release();
    assert_eq!(i2c.regs[&regs::AIF2_CONTROL_2], 0x4803);
}

#[test]
fn test_apply_unchanged_level_skips_write() {
    let boost = IncallBoost::new(ring(), zero_clock);
    boost.set_level(BoostPath::Rcv, 3);

    let mut i2c = MockCodec::default();
    i2c.regs.insert(regs::AIF2_CONTROL_2, 0x0C00);
    let mut codec = Wm8994::new(i2c);

    codec.apply_incall_boost(&boost, BoostPath::Rcv).unwrap();
    assert_eq!(codec.release().writes, 0);
}

#[test]
fn test_probe_checks_chip_id() {
    let mut i2c = MockCodec::default();
    i2c.regs.insert(regs::SOFTWARE_RESET, 0x8994);
    let mut codec = Wm8994::new(i2c);
    assert_eq!(codec.probe(), Ok(()));

    let mut i2c = MockCodec::default();
    i2c.regs.insert(regs::SOFTWARE_RESET, 0x1234);
    let mut codec = Wm8994::new(i2c);
    assert_eq!(codec.probe(), Err(Wm8994Error::ChipNotFound { id: 0x1234 }));

    let mut codec = Wm8994::new(MockCodec {
        offline: true,
        ..MockCodec::default()
    });
    assert_eq!(codec.probe(), Err(Wm8994Error::I2cError));
}
