//! Change counters that decide whether materialized buffers are current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter advanced by every change to a collection or to one of its
/// entries: structural edits, payload and relation edits through handles,
/// renumbering and release.
#[derive(Debug, Default)]
pub(crate) struct Generation(AtomicU64);

impl Generation {
    pub(crate) fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn advance(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

/// Generations observed while flattening a collection: its own plus the
/// one of every collection owning a relation target.
///
/// Buffers stay valid only while every recorded generation is unchanged.
#[derive(Debug, Default)]
pub(crate) struct Stamps(Vec<(Arc<Generation>, u64)>);

impl Stamps {
    /// Records `generation` the first time it is seen.
    ///
    /// Must be called before reading anything the generation guards.
    pub(crate) fn record(&mut self, generation: &Arc<Generation>) {
        if self
            .0
            .iter()
            .any(|(seen, _)| Arc::ptr_eq(seen, generation))
        {
            return;
        }
        self.0.push((Arc::clone(generation), generation.current()));
    }

    pub(crate) fn is_current(&self) -> bool {
        self.0
            .iter()
            .all(|(generation, seen)| generation.current() == *seen)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}
