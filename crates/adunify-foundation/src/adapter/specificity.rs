//! Specificity scoring between a registered kind and a requested kind.
//!
//! Lower scores are more specific:
//!
//! | Registered kind | Score |
//! |-----------------|-------|
//! | the requested kind itself | [`EXACT_MATCH`] |
//! | concrete ancestor, `n` hops up | `n` (capped below [`CAPABILITY_BASELINE`]) |
//! | capability | [`CAPABILITY_BASELINE`] + number of the requested kind's capabilities it covers |
//!
//! A capability "covers" a tag when the tag is that capability or extends it,
//! so a narrow capability covers fewer tags than a broad one and wins.

use adunify_kernel::kind::{AdKind, KindForm, KindGraph};
use tracing::trace;

/// Score of a registration for exactly the requested kind.
pub const EXACT_MATCH: u32 = 0;

/// Offset separating capability matches from concrete ancestor matches.
pub const CAPABILITY_BASELINE: u32 = 100;

/// Score `registered` against `requested`.
///
/// Returns `None` when an adapter registered for `registered` cannot serve
/// `requested` at all.
pub fn specificity(graph: &KindGraph, registered: AdKind, requested: AdKind) -> Option<u32> {
    if !graph.is_assignable(registered, requested) {
        return None;
    }
    if registered == requested {
        return Some(EXACT_MATCH);
    }

    match graph.form(registered)? {
        KindForm::Concrete => {
            let hops = graph
                .ancestors(requested)
                .iter()
                .position(|&ancestor| ancestor == registered)?
                + 1;
            Some(u32::try_from(hops).map_or(CAPABILITY_BASELINE - 1, |h| h.min(CAPABILITY_BASELINE - 1)))
        }
        KindForm::Capability => {
            let covered = graph
                .all_capabilities(requested)
                .into_iter()
                .filter(|&tag| graph.is_assignable(registered, tag))
                .count();
            Some(CAPABILITY_BASELINE.saturating_add(u32::try_from(covered).unwrap_or(u32::MAX)))
        }
    }
}

/// Pick the most specific candidate for `requested`.
///
/// `candidates` yields `(index, registered kind)` pairs in registration
/// order. Ties keep the earliest candidate; a later one must score strictly
/// lower to win. Returns the winning index.
pub fn best_match<I>(graph: &KindGraph, candidates: I, requested: AdKind) -> Option<usize>
where
    I: IntoIterator<Item = (usize, AdKind)>,
{
    let mut best: Option<(usize, u32)> = None;
    for (index, registered) in candidates {
        let Some(score) = specificity(graph, registered, requested) else {
            continue;
        };
        trace!(
            registered = graph.name(registered),
            requested = graph.name(requested),
            score,
            "scored candidate"
        );
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}
