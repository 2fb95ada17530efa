//! sysfs-style attribute groups.
//!
//! Each driver publishes a named group of attributes (`t_key`,
//! `samsung_param`, `incall_boost`). Reads format the current value into a
//! text sink; writes take raw text.
//!
//! Writes follow sysfs store semantics: malformed or out-of-range input is
//! clamped or ignored (and logged by the driver), and the whole input is
//! always reported as consumed. The only failures are addressing errors.

use core::fmt::{self, Write};

/// Access mode of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AttrMode {
    pub fn readable(self) -> bool {
        matches!(self, AttrMode::ReadOnly | AttrMode::ReadWrite)
    }

    pub fn writable(self) -> bool {
        matches!(self, AttrMode::WriteOnly | AttrMode::ReadWrite)
    }

    /// `ls -l` style permission string.
    pub fn as_str(self) -> &'static str {
        match self {
            AttrMode::ReadOnly => "r-",
            AttrMode::WriteOnly => "-w",
            AttrMode::ReadWrite => "rw",
        }
    }
}

/// Static attribute description.
#[derive(Debug, Clone, Copy)]
pub struct AttrDescriptor {
    pub name: &'static str,
    pub mode: AttrMode,
}

/// Attribute addressing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrError {
    /// No attribute with that name in the group.
    NoSuchAttribute,
    /// Read of a write-only or write of a read-only attribute.
    PermissionDenied,
    /// The output sink refused the formatted value.
    Format,
}

impl fmt::Display for AttrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrError::NoSuchAttribute => f.write_str("no such attribute"),
            AttrError::PermissionDenied => f.write_str("permission denied"),
            AttrError::Format => f.write_str("output error"),
        }
    }
}

impl From<fmt::Error> for AttrError {
    fn from(_: fmt::Error) -> Self {
        AttrError::Format
    }
}

/// A named set of attributes backed by one driver.
pub trait AttributeGroup {
    /// Group (directory) name.
    fn name(&self) -> &'static str;

    /// Attributes in display order.
    fn attributes(&self) -> &'static [AttrDescriptor];

    /// Format the value of `attr` into `out`.
    fn show(&mut self, attr: &str, out: &mut dyn Write) -> Result<(), AttrError>;

    /// Store `input` into `attr`. Returns the number of bytes consumed,
    /// which is always `input.len()`.
    fn store(&mut self, attr: &str, input: &str) -> Result<usize, AttrError>;

    /// Look up an attribute by name.
    fn find(&self, attr: &str) -> Option<&'static AttrDescriptor> {
        self.attributes().iter().find(|d| d.name == attr)
    }

    /// Resolve `attr` and check its mode allows the access.
    fn access(&self, attr: &str, write: bool) -> Result<&'static AttrDescriptor, AttrError> {
        let desc = self.find(attr).ok_or(AttrError::NoSuchAttribute)?;
        let allowed = if write {
            desc.mode.writable()
        } else {
            desc.mode.readable()
        };
        if allowed {
            Ok(desc)
        } else {
            Err(AttrError::PermissionDenied)
        }
    }
}

/// Parse an unsigned integer the way `sscanf("%u")` does: optional leading
/// whitespace, optional `+`, then decimal digits. Trailing text is
/// ignored. Values past `u32::MAX` saturate.
///
/// Returns `None` when no digit is present.
pub fn parse_uint(input: &str) -> Option<u32> {
    let s = input.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut value: u32 = 0;
    let mut seen = false;
    for b in s.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen = true;
        value = value.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    seen.then_some(value)
}
