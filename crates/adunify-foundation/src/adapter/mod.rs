//! Adapter resolution
//!
//! - [`specificity`]: scoring registrations against a requested kind
//! - [`registry`]: ordered adapters with a memoized kind lookup
//! - [`backend`]: the seam to an ad network SDK
//! - [`ad_adapter`]: lifecycle and show semantics around a backend

pub mod ad_adapter;
pub mod backend;
pub mod registry;
pub mod specificity;

pub use ad_adapter::{AdAdapter, MediatedAdapter};
pub use backend::{AdBackend, ShowCompletion};
pub use registry::{AdapterRegistry, Registered, ResolveFilter};
pub use specificity::{CAPABILITY_BASELINE, EXACT_MATCH, best_match, specificity};
