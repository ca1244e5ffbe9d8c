//! Reference resolution across collection boundaries.

use crate::collection::ErasedCollection;
use crate::entity::ObjectRef;
use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionId, ObjectID};
use std::collections::HashMap;

/// Registry that returns the collection registered under an id.
///
/// Only used while turning stored ids back into live references. Every
/// collection it returns must already have been reconstructed from its
/// own buffers.
pub trait ReferenceResolver {
    /// The collection registered under `id`, if any.
    fn collection(&self, id: CollectionId) -> Option<&dyn ErasedCollection>;
}

/// Resolves one stored id to a live reference.
///
/// # Errors
///
/// `DanglingReference` if the resolver does not know the collection,
/// `IndexOutOfRange` if the index is beyond that collection's size.
pub fn resolve_object(resolver: &dyn ReferenceResolver, id: ObjectID) -> CoreResult<ObjectRef> {
    let collection =
        resolver
            .collection(id.collection_id)
            .ok_or(CoreError::DanglingReference {
                collection_id: id.collection_id,
            })?;
    let index = id
        .position()
        .ok_or_else(|| CoreError::index_out_of_range(id.index, collection.len()))?;
    collection.object_at(index)
}

/// A resolver over borrowed collections, keyed by their current ids.
#[derive(Debug, Default)]
pub struct ResolverMap<'a> {
    collections: HashMap<CollectionId, &'a dyn ErasedCollection>,
}

impl<'a> ResolverMap<'a> {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `collection` under its current id.
    pub fn insert(&mut self, collection: &'a dyn ErasedCollection) -> &mut Self {
        self.collections
            .insert(collection.collection_id(), collection);
        self
    }

    /// Runs `set_references` on every registered collection.
    pub fn resolve_all(&self) -> CoreResult<()> {
        let mut ids: Vec<_> = self.collections.keys().copied().collect();
        ids.sort();
        for id in ids {
            self.collections[&id].set_references(self)?;
        }
        Ok(())
    }
}

impl ReferenceResolver for ResolverMap<'_> {
    fn collection(&self, id: CollectionId) -> Option<&dyn ErasedCollection> {
        self.collections.get(&id).copied()
    }
}
