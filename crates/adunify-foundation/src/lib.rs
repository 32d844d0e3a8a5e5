//! AdUnify foundation: resolution, weighted mediation and the aggregates
//! built on the kernel contracts.

// adapter module - kind resolution and the adapter wrapper
pub mod adapter;

// selection module - weighted random draw
pub mod selection;

// provider module - one mediation source and its adapters
pub mod provider;

// service module - application-facing aggregate
pub mod service;

pub use adapter::{
    AdAdapter, AdBackend, AdapterRegistry, MediatedAdapter, Registered, ResolveFilter,
    ShowCompletion,
};
pub use provider::{AdProvider, AdProviderBuilder, ProviderHooks};
pub use selection::{CandidatePool, MediationSelector, PoolEntry, Weighted};
pub use service::AdService;
