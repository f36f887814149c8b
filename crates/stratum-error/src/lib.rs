//! # stratum-error
//!
//! Failures raised by the stratum registry itself.
//!
//! These are not the application errors a registry produces (those are
//! `stratum_core::ErrorObject`). They describe misuse of the registry: asking
//! for a definition that was never registered, feeding garbage to the
//! deserializer, or loading a broken definition catalog.
//!
//! ## Usage
//!
//! ```rust
//! use stratum_error::{Error, ErrorKind};
//!
//! fn lookup(name: &str) -> Result<(), Error> {
//!     Err(Error::definition_not_found(name).with_operation("registry::generated_type"))
//! }
//!
//! let err = lookup("AUTH_ERROR").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::DefinitionNotFound);
//! ```
//!
//! ## Principles
//!
//! - Every kind is a programmer or configuration defect, surfaced at the call site
//! - External errors are wrapped with `set_source(err)`
//! - Later layers only append context, they never replace the kind

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using the stratum Error
pub type Result<T> = std::result::Result<T, Error>;
