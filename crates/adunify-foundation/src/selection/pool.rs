use super::Weighted;

/// One eligible candidate with the weight captured at collection time.
#[derive(Debug)]
pub struct PoolEntry<'a, T: ?Sized> {
    /// Position of the candidate in the collection it was taken from
    pub source_index: usize,
    pub candidate: &'a T,
    pub weight: u32,
}

impl<T: ?Sized> Clone for PoolEntry<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for PoolEntry<'_, T> {}

/// Snapshot of the candidates eligible for one draw.
///
/// Order follows the source collection. Entries of weight 0 are kept so
/// callers can inspect them, but contribute nothing to the total.
#[derive(Debug)]
pub struct CandidatePool<'a, T: ?Sized> {
    entries: Vec<PoolEntry<'a, T>>,
    total_weight: u64,
}

impl<'a, T: Weighted + ?Sized> CandidatePool<'a, T> {
    /// Collect every candidate accepted by `is_eligible`.
    ///
    /// `candidates` yields `(source index, candidate)` pairs.
    pub fn collect<I, F>(candidates: I, mut is_eligible: F) -> Self
    where
        I: IntoIterator<Item = (usize, &'a T)>,
        F: FnMut(&T) -> bool,
    {
        let mut entries = Vec::new();
        let mut total_weight = 0u64;
        for (source_index, candidate) in candidates {
            if !is_eligible(candidate) {
                continue;
            }
            let weight = candidate.weight();
            total_weight = total_weight.saturating_add(u64::from(weight));
            entries.push(PoolEntry {
                source_index,
                candidate,
                weight,
            });
        }

        Self {
            entries,
            total_weight,
        }
    }
}

impl<'a, T: ?Sized> CandidatePool<'a, T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// True when a draw can pick something.
    pub fn is_available(&self) -> bool {
        self.total_weight > 0
    }

    pub fn entries(&self) -> &[PoolEntry<'a, T>] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PoolEntry<'a, T>> {
        self.entries.iter()
    }

    pub fn get(&self, position: usize) -> Option<&PoolEntry<'a, T>> {
        self.entries.get(position)
    }
}
