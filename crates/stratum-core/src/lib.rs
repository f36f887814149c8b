//! Two-tier error registry.
//!
//! High level definitions describe broad categories (`AUTH_ERROR`,
//! `INTERNAL_SERVER_ERROR`); low level definitions describe a specific cause
//! (`DATABASE_FAILURE`) shared across categories. An [`ErrorRegistry`] owns
//! both tables, hands out one [`GeneratedType`] per high level name, and
//! builds [`ErrorObject`] values that serialize to a full internal view and a
//! client-safe view.
//!
//! ```rust
//! use stratum_core::{ErrorRegistry, HighLevelDefinition, LowLevelDefinition};
//! use stratum_core::{HighLevelTable, LowLevelTable, RegistryConfig};
//!
//! let mut high = HighLevelTable::new();
//! high.insert(
//!     "AUTH_ERROR".into(),
//!     HighLevelDefinition::new().with_class_name("AuthError").with_code("AUTH"),
//! );
//! let mut low = LowLevelTable::new();
//! low.insert(
//!     "BAD_TOKEN".into(),
//!     LowLevelDefinition::new("token invalid").with_status_code(401),
//! );
//!
//! let registry = ErrorRegistry::new(high, low, RegistryConfig::default()).unwrap();
//! let err = registry.new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
//! assert!(registry.instance_of(&err, "AUTH_ERROR").unwrap());
//! assert_eq!(err.to_json(&[])["name"], "AuthError");
//! ```

pub mod config;
#[macro_use]
pub mod declare;
pub mod definition;
pub mod format;
pub mod generate;
pub mod object;
pub mod registry;
pub mod value;

pub use config::{
    ConvertFn, CreateErrorFn, DeserializeOptions, ErrorObjectConfig, PreSerializeFn,
    RegistryConfig, boxed_convert,
};
pub use declare::HighLevelKind;
pub use definition::{
    HighLevelDefinition, HighLevelTable, LowLevelDefinition, LowLevelTable, ResolvedHighLevel,
    ResolvedLowLevel,
};
pub use format::format;
pub use generate::{
    GenerateHighLevelOptions, GenerateLowLevelOptions, generate_high_level_definitions,
    generate_low_level_definitions, to_pascal_case,
};
pub use object::{BASE_TYPE_NAME, Converted, ErrorObject};
pub use registry::{ErrorRegistry, GeneratedType, RegistryContext};
pub use value::{Cause, Code, JsonObject, Metadata};

pub use stratum_error::{Error, ErrorKind, Result};
