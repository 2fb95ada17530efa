//! NVS-backed parameter block with schema versioning.
//!
//! On the board the parameter block lives in its own NVS namespace. A
//! schema version key is written on first open so a later layout change
//! can be detected instead of misreading old slots.
//!
//! # Version History
//!
//! - **v1** (current): `reboot_mode` (i32), `version` (str), `cmdline` (str)

use core::cmp::Ordering;
use core::fmt;

#[cfg(all(target_os = "espidf", feature = "firmware"))]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(all(target_os = "espidf", feature = "firmware"))]
use esp_idf_svc::sys::EspError;

#[cfg(all(target_os = "espidf", feature = "firmware"))]
use crate::config::PARAM_STRING_SIZE;
#[cfg(all(target_os = "espidf", feature = "firmware"))]
use crate::param::{ParamAccessor, ParamError, ParamKey, ParamString};

/// Current NVS schema version for the parameter block
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// NVS namespace for the parameter block
pub const NVS_NAMESPACE: &str = "samsung_param";

/// NVS key for schema version
const VERSION_KEY: &str = "schema_ver";

/// Result of opening the parameter namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// No version key yet; the namespace is stamped with the current version.
    FreshInstall,
    /// Stored layout matches this build.
    UpToDate,
}

/// NVS operation errors
#[derive(Debug)]
pub enum NvsError {
    /// NVS initialization failed
    #[cfg(all(target_os = "espidf", feature = "firmware"))]
    InitFailed(EspError),
    /// Schema version too new (downgrade not supported)
    TooNew { stored_version: u32 },
    /// Stored schema older than this build and no migration exists
    UnsupportedMigration { from: u32, to: u32 },
    /// NVS read/write error
    #[cfg(all(target_os = "espidf", feature = "firmware"))]
    IoError(EspError),
    /// Feature not available on this platform
    #[cfg(not(all(target_os = "espidf", feature = "firmware")))]
    NotAvailable,
}

impl fmt::Display for NvsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(all(target_os = "espidf", feature = "firmware"))]
            NvsError::InitFailed(e) => write!(f, "nvs init failed: {}", e),
            NvsError::TooNew { stored_version } => {
                write!(f, "schema v{} is newer than v{}", stored_version, CURRENT_SCHEMA_VERSION)
            }
            NvsError::UnsupportedMigration { from, to } => {
                write!(f, "no migration from schema v{} to v{}", from, to)
            }
            #[cfg(all(target_os = "espidf", feature = "firmware"))]
            NvsError::IoError(e) => write!(f, "nvs i/o error: {}", e),
            #[cfg(not(all(target_os = "espidf", feature = "firmware")))]
            NvsError::NotAvailable => f.write_str("nvs not available on this platform"),
        }
    }
}

#[cfg(all(target_os = "espidf", feature = "firmware"))]
impl From<EspError> for NvsError {
    fn from(e: EspError) -> Self {
        NvsError::IoError(e)
    }
}

/// Classify a stored schema version (0 = never written).
pub fn check_schema(stored_version: u32) -> Result<SchemaState, NvsError> {
    match stored_version.cmp(&CURRENT_SCHEMA_VERSION) {
        Ordering::Equal => Ok(SchemaState::UpToDate),
        Ordering::Less if stored_version == 0 => Ok(SchemaState::FreshInstall),
        // v1 is the first layout; anything older is foreign data
        Ordering::Less => Err(NvsError::UnsupportedMigration {
            from: stored_version,
            to: CURRENT_SCHEMA_VERSION,
        }),
        Ordering::Greater => Err(NvsError::TooNew { stored_version }),
    }
}

/// NVS key of a parameter slot (15 characters max).
pub fn nvs_key(key: crate::param::ParamKey) -> &'static str {
    use crate::param::ParamKey;
    match key {
        ParamKey::RebootMode => "reboot_mode",
        ParamKey::Version => "version",
        ParamKey::CommandLine => "cmdline",
    }
}

/// Parameter block stored in NVS.
#[cfg(all(target_os = "espidf", feature = "firmware"))]
pub struct NvsParamBlock {
    storage: EspNvs<NvsDefault>,
}

#[cfg(all(target_os = "espidf", feature = "firmware"))]
impl NvsParamBlock {
    /// Open (and on first boot stamp) the parameter namespace.
    pub fn open(partition: EspDefaultNvsPartition) -> Result<(Self, SchemaState), NvsError> {
        let mut storage =
            EspNvs::new(partition, NVS_NAMESPACE, true).map_err(NvsError::InitFailed)?;

        let stored_version = storage.get_u32(VERSION_KEY)?.unwrap_or(0);
        let state = check_schema(stored_version)?;
        if state == SchemaState::FreshInstall {
            storage.set_u32(VERSION_KEY, CURRENT_SCHEMA_VERSION)?;
        }

        Ok((Self { storage }, state))
    }
}

#[cfg(all(target_os = "espidf", feature = "firmware"))]
fn storage_error(e: EspError) -> ParamError {
    ParamError::Storage(e.code())
}

#[cfg(all(target_os = "espidf", feature = "firmware"))]
impl ParamAccessor for NvsParamBlock {
    fn get_int(&self, key: ParamKey) -> Result<i32, ParamError> {
        if key != ParamKey::RebootMode {
            return Err(ParamError::WrongKind(key));
        }
        Ok(self.storage.get_i32(nvs_key(key)).map_err(storage_error)?.unwrap_or(0))
    }

    fn get_str(&self, key: ParamKey, out: &mut ParamString) -> Result<(), ParamError> {
        if key == ParamKey::RebootMode {
            return Err(ParamError::WrongKind(key));
        }
        let mut buf = [0u8; PARAM_STRING_SIZE];
        out.clear();
        if let Some(value) = self.storage.get_str(nvs_key(key), &mut buf).map_err(storage_error)? {
            let _ = out.push_str(value);
        }
        Ok(())
    }

    fn set_int(&mut self, key: ParamKey, value: i32) -> Result<(), ParamError> {
        if key != ParamKey::RebootMode {
            return Err(ParamError::WrongKind(key));
        }
        self.storage.set_i32(nvs_key(key), value).map_err(storage_error)
    }

    fn set_str(&mut self, key: ParamKey, value: &str) -> Result<(), ParamError> {
        if key == ParamKey::RebootMode {
            return Err(ParamError::WrongKind(key));
        }
        self.storage.set_str(nvs_key(key), value).map_err(storage_error)
    }
}

/// Stub for non-ESP platforms
#[cfg(not(all(target_os = "espidf", feature = "firmware")))]
pub fn open_param_block() -> Result<SchemaState, NvsError> {
    Err(NvsError::NotAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamKey;

    #[test]
    fn test_schema_classification() {
        assert!(matches!(check_schema(0), Ok(SchemaState::FreshInstall)));
        assert!(matches!(check_schema(1), Ok(SchemaState::UpToDate)));
        assert!(matches!(check_schema(7), Err(NvsError::TooNew { stored_version: 7 })));
    }

    #[test]
    fn test_nvs_keys_fit() {
        for key in [ParamKey::RebootMode, ParamKey::Version, ParamKey::CommandLine] {
            assert!(nvs_key(key).len() <= 15);
        }
    }

    #[test]
    fn test_stub_reports_unavailable() {
        assert!(matches!(open_param_block(), Err(NvsError::NotAvailable)));
    }
}
