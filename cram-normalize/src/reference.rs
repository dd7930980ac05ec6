//! The reference-base cache: `(prev_seq_id, ref_bases)` kept across
//! containers and invalidated when the sequence id changes (§5, §9).

/// Resolves reference bases for a sequence id; the one piece of external
/// collaboration the normalizer needs that this core doesn't parse itself
/// (see §6's "Reference source interface").
pub trait ReferenceSource {
    /// Return bases for `sequence_id`, 1-based alignment-coordinate-aligned
    /// (index 0 corresponds to reference position 1), upper-cased if
    /// `upper_case` is set.
    fn get_reference_bases(&self, sequence_id: i32, upper_case: bool) -> Vec<u8>;
}

/// Caches the most recently fetched reference's bases, invalidating on
/// sequence id change so repeated containers against the same reference
/// don't refetch.
pub struct ReferenceCache<S: ReferenceSource> {
    source: S,
    cached: Option<(i32, Vec<u8>)>,
}

impl<S: ReferenceSource> ReferenceCache<S> {
    /// Wrap a reference source with an empty cache.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: None,
        }
    }

    /// Return the bases for `sequence_id`, refetching only if the id
    /// differs from the previous call.
    pub fn bases_for(&mut self, sequence_id: i32) -> &[u8] {
        let needs_refetch = match &self.cached {
            Some((cached_id, _)) => *cached_id != sequence_id,
            None => true,
        };
        if needs_refetch {
            let bases = self.source.get_reference_bases(sequence_id, true);
            self.cached = Some((sequence_id, bases));
        }
        &self.cached.as_ref().unwrap().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSource {
        fetches: Cell<u32>,
    }

    impl ReferenceSource for CountingSource {
        fn get_reference_bases(&self, sequence_id: i32, _upper_case: bool) -> Vec<u8> {
            self.fetches.set(self.fetches.get() + 1);
            vec![b'A'; 4 + sequence_id as usize]
        }
    }

    #[test]
    fn caches_until_sequence_id_changes() {
        let mut cache = ReferenceCache::new(CountingSource {
            fetches: Cell::new(0),
        });
        cache.bases_for(1);
        cache.bases_for(1);
        assert_eq!(cache.source.fetches.get(), 1);

        cache.bases_for(2);
        assert_eq!(cache.source.fetches.get(), 2);
    }
}
