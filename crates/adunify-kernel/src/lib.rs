//! AdUnify kernel: the contracts shared by every mediation layer.
//!
//! - [`kind`]: ad kind descriptors and their specialization graph
//! - [`lifecycle`]: the init/deinit state machine
//! - [`event`]: observer lists for event fan-out
//! - [`request`]: requests, responses, completion callbacks
//! - [`config`]: configuration value objects and loader
//! - [`error`]: error taxonomy

// kind module
pub mod kind;
pub use kind::{AdKind, KindForm, KindGraph, KindGraphBuilder, standard};

// lifecycle module
pub mod lifecycle;
pub use lifecycle::{Lifecycle, LifecycleGuard, LifecycleState};

// event module
pub mod event;
pub use event::{EventHub, ListenerId};

// request module
pub mod request;
pub use request::{AdHandle, AdRequest, AdResponse, ShowCallback};

// config module
pub mod config;
pub use self::config::{AdStatus, AdapterConfig, AdapterSelection, ProviderConfig, ServiceConfig};

// error module
pub mod error;
pub use error::{BackendError, MediationError, MediationResult};
