//! Error kinds for registry operations

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The kind of failure that occurred.
///
/// Callers match on the kind to tell a missing definition apart from bad
/// input or a broken catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display, EnumString, EnumIter)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // Registry lookups
    // =========================================================================
    /// A high level definition name is not present in the registry
    DefinitionNotFound,

    /// A low level definition name is not present in the registry
    LowLevelDefinitionNotFound,

    /// Two high level definitions resolve to the same generated type name
    DuplicateTypeName,

    // =========================================================================
    // Deserialization
    // =========================================================================
    /// Deserialization input is not a structured object
    InvalidInput,

    /// Text could not be parsed (JSON, TOML)
    ParseFailed,

    /// A value could not be serialized
    SerializationFailed,

    // =========================================================================
    // Configuration
    // =========================================================================
    /// A definition catalog or registry option is invalid
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Whether the kind comes from a registry lookup miss.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            ErrorKind::DefinitionNotFound | ErrorKind::LowLevelDefinitionNotFound
        )
    }
}
