//! Weighted random mediation
//!
//! A [`CandidatePool`] snapshots the eligible candidates and their weights;
//! a [`MediationSelector`] draws one of them with probability proportional
//! to its weight.

pub mod pool;
pub mod selector;

pub use pool::{CandidatePool, PoolEntry};
pub use selector::MediationSelector;

/// Anything with a selection weight.
///
/// A weight of 0 keeps the candidate out of every draw.
pub trait Weighted {
    fn weight(&self) -> u32;
}

impl<T: Weighted + ?Sized> Weighted for Box<T> {
    fn weight(&self) -> u32 {
        (**self).weight()
    }
}
