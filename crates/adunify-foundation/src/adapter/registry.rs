//! Memoizing adapter registry
//!
//! Holds a fixed, ordered set of adapters and answers "which adapter serves
//! kind K?" with the most specific registration. Successful answers are
//! cached for the registry's lifetime; failed lookups are not, so an
//! adapter that becomes initialized later can still satisfy them.

use std::collections::HashMap;
use std::sync::Arc;

use adunify_kernel::error::MediationResult;
use adunify_kernel::kind::{AdKind, KindGraph};
use adunify_kernel::lifecycle::Lifecycle;
use parking_lot::RwLock;
use tracing::debug;

use super::specificity::best_match;

/// An entry that declares the kind it serves.
///
/// Lifecycle is a supertrait so the registry can skip entries that are not
/// yet initialized.
pub trait Registered: Lifecycle {
    fn serviced_kind(&self) -> AdKind;
}

impl<T: Registered + ?Sized> Registered for Box<T> {
    fn serviced_kind(&self) -> AdKind {
        (**self).serviced_kind()
    }
}

/// Which entries take part in scored resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveFilter {
    /// Every registered entry
    #[default]
    All,
    /// Only entries whose lifecycle reports initialized
    InitializedOnly,
}

/// Adapter registry with a per-kind resolution cache.
///
/// The cache is seeded with each entry's declared kind (first registration
/// wins on duplicates) and grows on successful lookups only. Seeded entries
/// are returned without consulting [`ResolveFilter`].
pub struct AdapterRegistry<T> {
    graph: Arc<KindGraph>,
    entries: Vec<T>,
    cache: RwLock<HashMap<AdKind, usize>>,
    filter: ResolveFilter,
}

impl<T: Registered> AdapterRegistry<T> {
    /// Registry where every entry takes part in resolution.
    pub fn new(graph: Arc<KindGraph>, entries: impl IntoIterator<Item = T>) -> MediationResult<Self> {
        Self::with_filter(graph, entries, ResolveFilter::All)
    }

    /// Registry where only initialized entries take part in scored resolution.
    pub fn initialized_only(
        graph: Arc<KindGraph>,
        entries: impl IntoIterator<Item = T>,
    ) -> MediationResult<Self> {
        Self::with_filter(graph, entries, ResolveFilter::InitializedOnly)
    }

    pub fn with_filter(
        graph: Arc<KindGraph>,
        entries: impl IntoIterator<Item = T>,
        filter: ResolveFilter,
    ) -> MediationResult<Self> {
        let entries: Vec<T> = entries.into_iter().collect();
        let mut cache = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let kind = entry.serviced_kind();
            graph.ensure_contains(kind)?;
            cache.entry(kind).or_insert(index);
        }

        Ok(Self {
            graph,
            entries,
            cache: RwLock::new(cache),
            filter,
        })
    }

    pub fn graph(&self) -> &Arc<KindGraph> {
        &self.graph
    }

    pub fn filter(&self) -> ResolveFilter {
        self.filter
    }

    /// Index of the entry that serves `kind`, resolving and caching on a miss.
    pub fn resolve_index(&self, kind: AdKind) -> Option<usize> {
        if let Some(&index) = self.cache.read().get(&kind) {
            debug!(kind = self.graph.name(kind), index, "resolution cache hit");
            return Some(index);
        }

        let candidates = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| match self.filter {
                ResolveFilter::All => true,
                ResolveFilter::InitializedOnly => entry.is_initialized(),
            })
            .map(|(index, entry)| (index, entry.serviced_kind()));

        let Some(index) = best_match(&self.graph, candidates, kind) else {
            debug!(kind = self.graph.name(kind), "no adapter serves kind");
            return None;
        };

        // A concurrent resolver may have won the race; keep its answer.
        let index = *self.cache.write().entry(kind).or_insert(index);
        debug!(kind = self.graph.name(kind), index, "resolved and cached");
        Some(index)
    }

    /// Entry that serves `kind`.
    pub fn resolve(&self, kind: AdKind) -> Option<&T> {
        self.resolve_index(kind).and_then(|index| self.entries.get(index))
    }

    pub fn resolve_mut(&mut self, kind: AdKind) -> Option<&mut T> {
        let index = self.resolve_index(kind)?;
        self.entries.get_mut(index)
    }

    /// Every entry able to serve `kind`, in registration order, with its index.
    ///
    /// Ignores the cache and [`ResolveFilter`].
    pub fn compatible(&self, kind: AdKind) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, entry)| self.graph.is_assignable(entry.serviced_kind(), kind))
    }

    pub fn is_cached(&self, kind: AdKind) -> bool {
        self.cache.read().contains_key(&kind)
    }

    /// Kinds with a cached resolution, in no particular order.
    pub fn cached_kinds(&self) -> Vec<AdKind> {
        self.cache.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.entries.iter_mut()
    }

    /// Drop every entry and forget every cached resolution.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache.get_mut().clear();
    }
}

impl<T> std::fmt::Debug for AdapterRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("entries", &self.entries.len())
            .field("cached", &self.cache.read().len())
            .field("filter", &self.filter)
            .finish()
    }
}
