//! RAM-backed parameter block for hosts and tests.

use super::{truncate_utf8, ParamAccessor, ParamError, ParamKey, ParamString};
use crate::config::PARAM_STRING_SIZE;

#[derive(Debug, Clone, Default)]
pub struct MemParamBlock {
    reboot_mode: i32,
    version: ParamString,
    command_line: ParamString,
}

impl MemParamBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block with the version string the bootloader would have written.
    pub fn with_version(version: &str) -> Self {
        let mut block = Self::new();
        let _ = block
            .version
            .push_str(truncate_utf8(version, PARAM_STRING_SIZE - 1));
        block
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn raw_reboot_mode(&self) -> i32 {
        self.reboot_mode
    }
}

impl ParamAccessor for MemParamBlock {
    fn get_int(&self, key: ParamKey) -> Result<i32, ParamError> {
        match key {
            ParamKey::RebootMode => Ok(self.reboot_mode),
            _ => Err(ParamError::WrongKind(key)),
        }
    }

    fn get_str(&self, key: ParamKey, out: &mut ParamString) -> Result<(), ParamError> {
        let value = match key {
            ParamKey::Version => &self.version,
            ParamKey::CommandLine => &self.command_line,
            ParamKey::RebootMode => return Err(ParamError::WrongKind(key)),
        };
        out.clear();
        // Same capacity, cannot overflow.
        let _ = out.push_str(value);
        Ok(())
    }

    fn set_int(&mut self, key: ParamKey, value: i32) -> Result<(), ParamError> {
        match key {
            ParamKey::RebootMode => {
                self.reboot_mode = value;
                Ok(())
            }
            _ => Err(ParamError::WrongKind(key)),
        }
    }

    fn set_str(&mut self, key: ParamKey, value: &str) -> Result<(), ParamError> {
        let slot = match key {
            ParamKey::Version => &mut self.version,
            ParamKey::CommandLine => &mut self.command_line,
            ParamKey::RebootMode => return Err(ParamError::WrongKind(key)),
        };
        slot.clear();
        let _ = slot.push_str(truncate_utf8(value, PARAM_STRING_SIZE - 1));
        Ok(())
    }
}
