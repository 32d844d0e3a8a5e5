//! Mediation configuration
//!
//! - [`schema`]: value objects (`AdapterConfig`, `ProviderConfig`, `ServiceConfig`)
//! - loader (feature `config`): YAML, TOML, JSON, INI, RON and JSON5 files with
//!   `${VAR}` / `$VAR` environment substitution

pub mod schema;
pub use schema::*;

#[cfg(feature = "config")]
mod loader;
#[cfg(feature = "config")]
pub use loader::*;
