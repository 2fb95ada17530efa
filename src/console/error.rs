//! Console error types

use crate::attr::AttrError;

/// Console error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// E01: Unknown command
    UnknownCommand,
    /// E02: Invalid value format
    InvalidValue,
    /// E03: Missing required argument
    MissingArg,
    /// E04: No attribute group with that name
    NoSuchGroup,
    /// E05: Attribute lookup or access failed
    Attr(AttrError),
}

impl ConsoleError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "E01",
            Self::InvalidValue => "E02",
            Self::MissingArg => "E03",
            Self::NoSuchGroup => "E04",
            Self::Attr(_) => "E05",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "unknown command",
            Self::InvalidValue => "invalid value",
            Self::MissingArg => "missing argument",
            Self::NoSuchGroup => "no such group",
            Self::Attr(AttrError::NoSuchAttribute) => "no such attribute",
            Self::Attr(AttrError::PermissionDenied) => "permission denied",
            Self::Attr(AttrError::Format) => "output error",
        }
    }
}

impl From<AttrError> for ConsoleError {
    fn from(e: AttrError) -> Self {
        ConsoleError::Attr(e)
    }
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
