//! stratum command-line interface.
//!
//! Loads definition catalogs and drives the registry for the `stratum`
//! binary's `check`, `new` and `decode` subcommands.

pub mod catalog;
pub mod commands;

pub use catalog::{Catalog, CatalogFormat, GenerateSection};
pub use commands::{DecodeReport, NewRequest, check, decode, new_error, parse_key_value, parse_value};
