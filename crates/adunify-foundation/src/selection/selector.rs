use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::trace;

use super::pool::{CandidatePool, PoolEntry};

/// Draws candidates from a [`CandidatePool`] proportionally to weight.
///
/// Owns its random source; seed it for reproducible draws.
pub struct MediationSelector {
    rng: Box<dyn RngCore + Send>,
}

impl MediationSelector {
    /// Deterministic selector.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Selector seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Pick one entry of `pool`.
    ///
    /// Draws `r` uniformly from `1..=total` and walks the entries in order,
    /// subtracting each weight; the entry that brings `r` to zero or below
    /// wins. Every entry of weight `w` is therefore picked with probability
    /// `w / total`, and weight-0 entries never are. Returns `None` when the
    /// pool is empty or its total weight is 0.
    pub fn select<'p, 'a, T: ?Sized>(
        &mut self,
        pool: &'p CandidatePool<'a, T>,
    ) -> Option<&'p PoolEntry<'a, T>> {
        let total = pool.total_weight();
        if total == 0 {
            return None;
        }

        let mut remaining = self.rng.gen_range(1..=total);
        trace!(draw = remaining, total, "weighted draw");
        for entry in pool.entries() {
            let weight = u64::from(entry.weight);
            if remaining <= weight {
                return Some(entry);
            }
            remaining -= weight;
        }
        None
    }

    /// Like [`select`](Self::select), returning the winner's source index.
    pub fn select_index<T: ?Sized>(&mut self, pool: &CandidatePool<'_, T>) -> Option<usize> {
        self.select(pool).map(|entry| entry.source_index)
    }
}

impl Default for MediationSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for MediationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediationSelector").finish_non_exhaustive()
    }
}
