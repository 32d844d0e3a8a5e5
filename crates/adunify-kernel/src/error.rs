//! Crate-level error types for `adunify-kernel`.
//!
//! Only construction problems and programming errors are errors here. A
//! request that cannot be served ("no ready adapter", "not initialized") is
//! never reported through [`MediationError`]; it surfaces as `false`, `None`
//! or a failed [`AdResponse`](crate::request::AdResponse) instead.

use thiserror::Error;

use crate::kind::AdKind;

/// Result type used throughout the mediation engine.
pub type MediationResult<T> = Result<T, MediationError>;

/// Errors raised while building or driving the mediation engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediationError {
    /// A kind handle that does not belong to the kind graph in use.
    #[error("Ad kind {0} is not declared in this kind graph")]
    UnknownKind(AdKind),

    /// The kind graph declaration is inconsistent.
    #[error("Invalid kind graph: {0}")]
    InvalidKindGraph(String),

    /// A configuration value object failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A request reached an adapter whose serviced kind cannot handle it.
    ///
    /// This means resolution is broken, not that the ad is unavailable.
    #[error("Request for '{requested}' routed to an adapter serving '{serviced}'")]
    KindMismatch { requested: String, serviced: String },

    /// A backend collaborator failed during setup.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A configuration file could not be loaded.
    #[cfg(feature = "config")]
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Errors reported by backend collaborators (ad network integrations).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The network SDK refused to start.
    #[error("Backend initialization failed: {0}")]
    InitFailed(String),

    /// Catch-all for errors that don't fit the above categories.
    #[error("{0}")]
    Other(String),
}
