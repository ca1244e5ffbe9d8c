//! Bidirectional collection name/id table.

use crate::error::{CoreError, CoreResult};
use crate::types::CollectionId;
use std::collections::HashMap;

/// Name to id bijection for the collections of one frame.
///
/// Populated once per collection set: at write time from the names
/// registered with a frame, at read time from the persisted pairs.
/// Fresh ids are dense and assigned in registration order, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIdTable {
    /// Registration order.
    entries: Vec<(String, CollectionId)>,
    by_name: HashMap<String, CollectionId>,
    by_id: HashMap<CollectionId, usize>,
    next_id: u32,
}

impl CollectionIdTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            by_id: HashMap::new(),
            next_id: 1,
        }
    }

    /// Rebuilds a table from persisted name/id pairs.
    ///
    /// # Errors
    ///
    /// Returns `CorruptBuffer` if a name or an id appears twice, or if
    /// an id is [`CollectionId::INVALID`].
    pub fn from_pairs<I, S>(pairs: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, CollectionId)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, id) in pairs {
            let name = name.into();
            if !id.is_valid() {
                return Err(CoreError::corrupt_buffer(format!(
                    "collection `{name}` has an invalid id"
                )));
            }
            if table.by_name.contains_key(&name) || table.by_id.contains_key(&id) {
                return Err(CoreError::corrupt_buffer(format!(
                    "duplicate id table entry `{name}` -> {id}"
                )));
            }
            table.insert(name, id);
            table.next_id = table.next_id.max(id.as_u32().saturating_add(1));
        }
        Ok(table)
    }

    /// Returns the id for `name`, registering it if it is new.
    pub fn add(&mut self, name: &str) -> CollectionId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }

        let id = CollectionId::new(self.next_id);
        self.next_id += 1;
        self.insert(name.to_string(), id);
        id
    }

    fn insert(&mut self, name: String, id: CollectionId) {
        self.by_id.insert(id, self.entries.len());
        self.by_name.insert(name.clone(), id);
        self.entries.push((name, id));
    }

    /// Gets a collection ID by name.
    #[must_use]
    pub fn collection_id(&self, name: &str) -> Option<CollectionId> {
        self.by_name.get(name).copied()
    }

    /// Gets a collection name by ID.
    #[must_use]
    pub fn name(&self, id: CollectionId) -> Option<&str> {
        self.by_id
            .get(&id)
            .map(|&position| self.entries[position].0.as_str())
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates name/id pairs in registration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, CollectionId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Returns the registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of registered collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no collection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CollectionIdTable {
    fn default() -> Self {
        Self::new()
    }
}
