//! Module: param
//!
//! Purpose: `samsung_param` attribute group over the NV parameter block.
//!
//! The parameter block itself is an opaque key-value store reached through
//! [`ParamAccessor`]. It may be missing entirely (the store did not come up);
//! every read then reports a placeholder and every write is dropped with a
//! log line.
//!
//! | attribute           | mode | show                          | store                     |
//! |---------------------|------|-------------------------------|---------------------------|
//! | `command_line`      | rw   | stored string or `null`       | truncated to 1023 bytes   |
//! | `enable_dock_audio` | rw   | `0` / `1`                     | set unless input is `0…`  |
//! | `reboot_mode`       | rw   | `init\n` ... or `unknown`     | by first character        |
//! | `version`           | r-   | stored string or `null`       |                           |

pub mod mem;

pub use mem::MemParamBlock;

use core::fmt::{self, Write};

use heapless::String;

use crate::attr::{AttrDescriptor, AttrError, AttrMode, AttributeGroup};
use crate::config::PARAM_STRING_SIZE;
use crate::logging::{ClockFn, LogRing, Logger};
use crate::{dev_err, dev_info};

pub const GROUP_NAME: &str = "samsung_param";

/// Buffer for one string parameter.
pub type ParamString = String<PARAM_STRING_SIZE>;

/// Parameter slots exposed by the shim, numbered as in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParamKey {
    RebootMode = 9,
    Version = 15,
    CommandLine = 16,
}

impl ParamKey {
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Parameter store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    /// Integer access to a string slot or the reverse.
    WrongKind(ParamKey),
    /// Backend error code.
    Storage(i32),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::WrongKind(key) => write!(f, "wrong value kind for parameter {}", key.index()),
            ParamError::Storage(code) => write!(f, "storage error {}", code),
        }
    }
}

/// Access to the NV parameter block.
pub trait ParamAccessor {
    fn get_int(&self, key: ParamKey) -> Result<i32, ParamError>;

    /// Copy a string slot into `out` (cleared first).
    fn get_str(&self, key: ParamKey, out: &mut ParamString) -> Result<(), ParamError>;

    fn set_int(&mut self, key: ParamKey, value: i32) -> Result<(), ParamError>;

    fn set_str(&mut self, key: ParamKey, value: &str) -> Result<(), ParamError>;
}

/// Dock detection and the USB-audio switch it drives.
pub trait DockStatus {
    fn is_docked(&self) -> bool;

    /// `1` routes audio to the dock, `0` does not.
    fn set_usb_audio_switch(&mut self, state: u8);
}

/// Boot target stored in the `REBOOT_MODE` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RebootMode {
    Init = 0,
    Download = 1,
    Charger = 3,
    Recovery = 4,
}

impl RebootMode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(RebootMode::Init),
            1 => Some(RebootMode::Download),
            3 => Some(RebootMode::Charger),
            4 => Some(RebootMode::Recovery),
            _ => None,
        }
    }

    /// Mode selected by the first character of `input`, case-insensitive.
    ///
    /// `d`/`b` (bootloader) select download, `c`/`l` (low-power) select
    /// charger. Anything else, including empty input, selects init.
    pub fn from_input(input: &str) -> Self {
        match input.as_bytes().first().map(u8::to_ascii_lowercase) {
            Some(b'd') | Some(b'b') => RebootMode::Download,
            Some(b'c') | Some(b'l') => RebootMode::Charger,
            Some(b'r') => RebootMode::Recovery,
            _ => RebootMode::Init,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RebootMode::Init => "init",
            RebootMode::Download => "download",
            RebootMode::Charger => "charger",
            RebootMode::Recovery => "recovery",
        }
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a
/// character.
pub(crate) fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

static ATTRS: [AttrDescriptor; 4] = [
    AttrDescriptor {
        name: "command_line",
        mode: AttrMode::ReadWrite,
    },
    AttrDescriptor {
        name: "enable_dock_audio",
        mode: AttrMode::ReadWrite,
    },
    AttrDescriptor {
        name: "reboot_mode",
        mode: AttrMode::ReadWrite,
    },
    AttrDescriptor {
        name: "version",
        mode: AttrMode::ReadOnly,
    },
];

/// `samsung_param` driver.
pub struct ParamShim<'a, A, Dk> {
    accessor: Option<A>,
    dock: Dk,
    dock_audio: bool,
    log: Logger<'a>,
    clock: ClockFn,
}

impl<'a, A: ParamAccessor, Dk: DockStatus> ParamShim<'a, A, Dk> {
    pub fn new(accessor: Option<A>, dock: Dk, ring: &'a LogRing, clock: ClockFn) -> Self {
        let log = Logger::new(ring, GROUP_NAME);
        dev_info!(
            log,
            clock(),
            "parameter block {}",
            if accessor.is_some() { "available" } else { "missing" }
        );
        Self {
            accessor,
            dock,
            dock_audio: false,
            log,
            clock,
        }
    }

    /// Attach the parameter block once it becomes available.
    pub fn attach(&mut self, accessor: A) {
        self.accessor = Some(accessor);
    }

    pub fn accessor(&self) -> Option<&A> {
        self.accessor.as_ref()
    }

    pub fn dock(&self) -> &Dk {
        &self.dock
    }

    /// Dock audio flag, read by the audio HAL.
    pub fn dock_audio_enabled(&self) -> bool {
        self.dock_audio
    }

    /// Stored reboot mode, `None` if the block is missing or holds a value
    /// outside the known modes.
    pub fn reboot_mode(&self) -> Option<RebootMode> {
        let accessor = self.accessor.as_ref()?;
        match accessor.get_int(ParamKey::RebootMode) {
            Ok(raw) => RebootMode::from_raw(raw),
            Err(e) => {
                dev_err!(self.log, (self.clock)(), "reboot_mode read: {}", e);
                None
            }
        }
    }

    pub fn set_reboot_mode(&mut self, mode: RebootMode) {
        let now = (self.clock)();
        let Some(accessor) = self.accessor.as_mut() else {
            self.missing(now);
            return;
        };
        if let Err(e) = accessor.set_int(ParamKey::RebootMode, mode as i32) {
            dev_err!(self.log, now, "reboot_mode write: {}", e);
        }
    }

    /// Store `flag` and update the USB-audio switch: on only when enabled
    /// and docked.
    pub fn set_dock_audio(&mut self, flag: bool) {
        self.dock_audio = flag;
        let state = u8::from(flag && self.dock.is_docked());
        self.dock.set_usb_audio_switch(state);
    }

    fn missing(&self, now: u64) {
        dev_err!(self.log, now, "unable to access the parameter block");
    }

    fn show_string(&self, key: ParamKey, out: &mut dyn Write) -> Result<(), AttrError> {
        let now = (self.clock)();
        let Some(accessor) = self.accessor.as_ref() else {
            self.missing(now);
            out.write_str("null")?;
            return Ok(());
        };

        let mut value = ParamString::new();
        match accessor.get_str(key, &mut value) {
            Ok(()) => out.write_str(&value)?,
            Err(e) => {
                dev_err!(self.log, now, "read parameter {}: {}", key.index(), e);
                out.write_str("null")?;
            }
        }
        Ok(())
    }

    fn store_command_line(&mut self, input: &str) {
        let now = (self.clock)();
        let Some(accessor) = self.accessor.as_mut() else {
            self.missing(now);
            return;
        };
        let value = truncate_utf8(input, PARAM_STRING_SIZE - 1);
        if let Err(e) = accessor.set_str(ParamKey::CommandLine, value) {
            dev_err!(self.log, now, "command_line write: {}", e);
        }
    }
}

impl<A: ParamAccessor, Dk: DockStatus> AttributeGroup for ParamShim<'_, A, Dk> {
    fn name(&self) -> &'static str {
        GROUP_NAME
    }

    fn attributes(&self) -> &'static [AttrDescriptor] {
        &ATTRS
    }

    fn show(&mut self, attr: &str, out: &mut dyn Write) -> Result<(), AttrError> {
        let desc = self.access(attr, false)?;
        match desc.name {
            "command_line" => self.show_string(ParamKey::CommandLine, out)?,
            "version" => self.show_string(ParamKey::Version, out)?,
            "enable_dock_audio" => write!(out, "{}", u8::from(self.dock_audio))?,
            "reboot_mode" => {
                if self.accessor.is_none() {
                    self.missing((self.clock)());
                }
                match self.reboot_mode() {
                    Some(mode) => writeln!(out, "{}", mode.as_str())?,
                    None => out.write_str("unknown")?,
                }
            }
            _ => return Err(AttrError::NoSuchAttribute),
        }
        Ok(())
    }

    fn store(&mut self, attr: &str, input: &str) -> Result<usize, AttrError> {
        let desc = self.access(attr, true)?;
        match desc.name {
            "command_line" => self.store_command_line(input),
            "enable_dock_audio" => self.set_dock_audio(!input.starts_with('0')),
            "reboot_mode" => self.set_reboot_mode(RebootMode::from_input(input)),
            _ => return Err(AttrError::PermissionDenied),
        }
        Ok(input.len())
    }
}
