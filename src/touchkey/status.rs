//! Status byte layout and key encodings.
//!
//! ```text
//!  7   6   5   4     3      2   1   0
//! [ - | - | - |ESD|RELEASE|  SCANCODE  ]   legacy encoding
//! [ - | - | - |ESD|  K3   | K2 | K1 |K0]   bitmask encoding
//! ```

use bitflags::bitflags;

bitflags! {
    /// Status byte read from the controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        /// 1-based key number (legacy encoding).
        const SCANCODE = 0x07;
        /// Key released (legacy encoding).
        const RELEASE = 0x08;
        /// Controller is in an ESD error state and needs recovery.
        const ESD = 0x10;
    }
}

impl StatusFlags {
    #[inline]
    pub fn from_status(status: u8) -> Self {
        Self::from_bits_retain(status)
    }

    #[inline]
    pub fn needs_recovery(self) -> bool {
        self.contains(StatusFlags::ESD)
    }
}

/// Key index whose press makes the touch panel release its touches first.
pub const RELEASE_TRIGGER_INDEX: usize = 1;

/// Backlight command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklightCodes {
    pub on: u8,
    pub off: u8,
}

impl BacklightCodes {
    /// Firmware 0x08..0xC3.
    pub const CURRENT: BacklightCodes = BacklightCodes { on: 0x10, off: 0x20 };
    /// Early firmware and the forced-legacy boards.
    pub const LEGACY: BacklightCodes = BacklightCodes { on: 0x01, off: 0x02 };
}

/// How key state is packed into the status byte. Chosen once at probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// One scancode plus a release bit per interrupt.
    Legacy,
    /// One bit per key.
    Bitmask,
}

/// Decoded key information from one status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyReport {
    /// A single key changed.
    Single { index: usize, pressed: bool },
    /// Pressed state of every key, bit *i* for key *i*.
    Bitmap(u8),
}

/// Status byte does not name a configured key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    OutOfRange { scancode: u8 },
}

impl KeyEncoding {
    /// Decode `status` for a controller with `key_count` keys.
    pub fn decode(self, status: u8, key_count: usize) -> Result<KeyReport, DecodeError> {
        let flags = StatusFlags::from_status(status);
        match self {
            KeyEncoding::Legacy => {
                let scancode = status & StatusFlags::SCANCODE.bits();
                if scancode == 0 || scancode as usize > key_count {
                    return Err(DecodeError::OutOfRange { scancode });
                }
                Ok(KeyReport::Single {
                    index: scancode as usize - 1,
                    pressed: !flags.contains(StatusFlags::RELEASE),
                })
            }
            KeyEncoding::Bitmask => {
                let mask = if key_count >= 8 {
                    0xFF
                } else {
                    (1u8 << key_count) - 1
                };
                Ok(KeyReport::Bitmap(status & mask))
            }
        }
    }
}

/// Firmware version bytes read at probe (bytes 1 and 2 of the 3-byte
/// version block).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareRevision {
    pub rev1: u8,
    pub rev2: u8,
}

impl HardwareRevision {
    pub fn from_version_block(block: [u8; 3]) -> Self {
        Self {
            rev1: block[1],
            rev2: block[2],
        }
    }

    /// Backlight command set understood by this firmware.
    pub fn backlight_codes(self) -> BacklightCodes {
        if (0x08..0xC4).contains(&self.rev1) {
            BacklightCodes::CURRENT
        } else {
            BacklightCodes::LEGACY
        }
    }

    /// Key encoding used by this firmware.
    pub fn key_encoding(self) -> KeyEncoding {
        let legacy = self.rev1 >= 0xC4
            || self.rev1 < 0x09
            || (self.rev1 == 0x09 && self.rev2 < 0x09);
        if legacy {
            KeyEncoding::Legacy
        } else {
            KeyEncoding::Bitmask
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_decode() {
        // Scancode 2 pressed
        assert_eq!(
            KeyEncoding::Legacy.decode(0x02, 4),
            Ok(KeyReport::Single { index: 1, pressed: true })
        );
        // Scancode 4 released
        assert_eq!(
            KeyEncoding::Legacy.decode(0x0C, 4),
            Ok(KeyReport::Single { index: 3, pressed: false })
        );
    }

    #[test]
    fn test_legacy_out_of_range() {
        assert_eq!(
            KeyEncoding::Legacy.decode(0x00, 4),
            Err(DecodeError::OutOfRange { scancode: 0 })
        );
        assert_eq!(
            KeyEncoding::Legacy.decode(0x05, 4),
            Err(DecodeError::OutOfRange { scancode: 5 })
        );
        assert!(KeyEncoding::Legacy.decode(0x03, 2).is_err());
    }

    #[test]
    fn test_bitmask_decode_masks_unused_bits() {
        assert_eq!(KeyEncoding::Bitmask.decode(0b0000_0101, 4), Ok(KeyReport::Bitmap(0b0101)));
        assert_eq!(KeyEncoding::Bitmask.decode(0b0000_1110, 2), Ok(KeyReport::Bitmap(0b0010)));
    }

    #[test]
    fn test_esd_flag() {
        assert!(StatusFlags::from_status(0x11).needs_recovery());
        assert!(!StatusFlags::from_status(0x0F).needs_recovery());
    }

    #[test]
    fn test_revision_selection() {
        let old = HardwareRevision { rev1: 0x05, rev2: 0x00 };
        assert_eq!(old.backlight_codes(), BacklightCodes::LEGACY);
        assert_eq!(old.key_encoding(), KeyEncoding::Legacy);

        let mid = HardwareRevision { rev1: 0x09, rev2: 0x03 };
        assert_eq!(mid.backlight_codes(), BacklightCodes::CURRENT);
        assert_eq!(mid.key_encoding(), KeyEncoding::Legacy);

        let new = HardwareRevision { rev1: 0x0A, rev2: 0x00 };
        assert_eq!(new.backlight_codes(), BacklightCodes::CURRENT);
        assert_eq!(new.key_encoding(), KeyEncoding::Bitmask);

        let odd = HardwareRevision { rev1: 0xC4, rev2: 0x00 };
        assert_eq!(odd.backlight_codes(), BacklightCodes::LEGACY);
        assert_eq!(odd.key_encoding(), KeyEncoding::Legacy);
    }

    #[test]
    fn test_version_block_bytes() {
        let rev = HardwareRevision::from_version_block([0xAA, 0x0B, 0x02]);
        assert_eq!(rev, HardwareRevision { rev1: 0x0B, rev2: 0x02 });
    }
}
