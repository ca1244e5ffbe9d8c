//! Frames: named, heterogeneous sets of collections plus parameters.
//!
//! A frame owns every collection put into it, assigns collection ids
//! through its [`CollectionIdTable`], and acts as the reference resolver
//! when a whole frame is rebuilt from storage.

mod parameters;
mod registry;

pub use parameters::{ParameterStore, ParameterValue};
pub use registry::TypeRegistry;

use crate::collection::{Collection, CollectionBuffers, DataType, ErasedCollection};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::id_table::CollectionIdTable;
use crate::resolver::ReferenceResolver;
use crate::types::CollectionId;
use std::collections::HashMap;
use tracing::debug;

struct Slot {
    name: String,
    collection: Box<dyn ErasedCollection>,
}

/// Flat form of a frame, as handed to and received from a codec.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    /// Name and id of every collection.
    pub id_table: CollectionIdTable,
    /// Buffers of every collection, in insertion order.
    pub collections: Vec<CollectionData>,
    /// Frame parameters.
    pub parameters: ParameterStore,
}

/// Buffers of one named collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionData {
    /// Name of the collection in its frame.
    pub name: String,
    /// Flat buffers of the collection.
    pub buffers: CollectionBuffers,
}

/// A named set of collections of arbitrary data types.
#[derive(Default)]
pub struct Frame {
    config: Config,
    id_table: CollectionIdTable,
    slots: Vec<Slot>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<CollectionId, usize>,
    parameters: ParameterStore,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty frame whose reads use `config`.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Takes ownership of `collection` under `name`.
    ///
    /// The collection gets the id registered for `name`, or a fresh one.
    ///
    /// # Errors
    ///
    /// `NameAlreadyPresent` if the frame already holds `name`.
    pub fn put<T: DataType>(
        &mut self,
        collection: Collection<T>,
        name: &str,
    ) -> CoreResult<&Collection<T>> {
        let stored = self.put_erased(Box::new(collection), name)?;
        stored
            .as_any()
            .downcast_ref::<Collection<T>>()
            .ok_or_else(|| CoreError::type_mismatch(T::TYPE_NAME, stored.type_name()))
    }

    /// Type-erased form of [`Frame::put`].
    pub fn put_erased(
        &mut self,
        mut collection: Box<dyn ErasedCollection>,
        name: &str,
    ) -> CoreResult<&dyn ErasedCollection> {
        if self.by_name.contains_key(name) {
            return Err(CoreError::name_already_present(name));
        }
        let id = self.id_table.add(name);
        collection.set_collection_id(id);
        debug!(name, collection_id = %id, type_name = collection.type_name(), len = collection.len(), "put collection");

        let index = self.slots.len();
        self.by_name.insert(name.to_owned(), index);
        self.by_id.insert(id, index);
        self.slots.push(Slot {
            name: name.to_owned(),
            collection,
        });
        Ok(self.slots[index].collection.as_ref())
    }

    /// The collection named `name`, if it holds elements of type `T`.
    #[must_use]
    pub fn get<T: DataType>(&self, name: &str) -> Option<&Collection<T>> {
        self.get_erased(name)?.as_any().downcast_ref()
    }

    /// The collection named `name`, whatever its type.
    #[must_use]
    pub fn get_erased(&self, name: &str) -> Option<&dyn ErasedCollection> {
        let index = *self.by_name.get(name)?;
        Some(self.slots[index].collection.as_ref())
    }

    /// Removes and returns the collection named `name`.
    ///
    /// Its id stays reserved in the id table.
    pub fn take<T: DataType>(&mut self, name: &str) -> CoreResult<Option<Collection<T>>> {
        let Some(&index) = self.by_name.get(name) else {
            return Ok(None);
        };
        let found = self.slots[index].collection.type_name();
        if found != T::TYPE_NAME {
            return Err(CoreError::type_mismatch(T::TYPE_NAME, found));
        }
        let slot = self.slots.remove(index);
        self.reindex();

        let mut collection = slot.collection;
        let taken = collection
            .as_any_mut()
            .downcast_mut::<Collection<T>>()
            .map(std::mem::take);
        Ok(taken)
    }

    /// Whether the frame holds a collection named `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Collection names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.name.as_str()).collect()
    }

    /// Number of collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the frame holds no collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Name/id pairs of the collections.
    #[must_use]
    pub fn id_table(&self) -> &CollectionIdTable {
        &self.id_table
    }

    /// Frame parameters.
    #[must_use]
    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    /// Configuration used when rebuilding collections.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Materializes every collection and collects the frame's flat form.
    ///
    /// # Errors
    ///
    /// The first error of any collection's `prepare_for_write`.
    pub fn write_data(&self) -> CoreResult<FrameData> {
        let collections = self
            .slots
            .iter()
            .map(|slot| -> CoreResult<CollectionData> {
                Ok(CollectionData {
                    name: slot.name.clone(),
                    buffers: CollectionBuffers::clone(&*slot.collection.prepare_for_write()?),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(FrameData {
            id_table: self.id_table.clone(),
            collections,
            parameters: self.parameters.clone(),
        })
    }

    /// Rebuilds a frame from its flat form and resolves every reference.
    ///
    /// # Errors
    ///
    /// - `CorruptBuffer` if a collection name is missing from the id table
    /// - `NameAlreadyPresent` if two collections share a name
    /// - `UnknownDataType` if a type is not in `registry`
    /// - any reconstruction or resolution error
    pub fn from_data(data: FrameData, registry: &TypeRegistry, config: Config) -> CoreResult<Self> {
        let FrameData {
            id_table,
            collections,
            parameters,
        } = data;
        let mut frame = Self {
            config,
            id_table,
            parameters,
            ..Self::default()
        };
        for CollectionData { name, buffers } in collections {
            let id = frame.id_table.collection_id(&name).ok_or_else(|| {
                CoreError::corrupt_buffer(format!("collection {name} is missing from the id table"))
            })?;
            let collection = registry.build(&buffers, id, &frame.config)?;
            frame.put_erased(collection, &name)?;
        }
        frame.resolve_references()?;
        debug!(collections = frame.len(), "rebuilt frame");
        Ok(frame)
    }

    /// Runs `set_references` on every collection, in insertion order.
    pub fn resolve_references(&self) -> CoreResult<()> {
        for slot in &self.slots {
            slot.collection.set_references(self)?;
        }
        Ok(())
    }

    fn reindex(&mut self) {
        self.by_name.clear();
        self.by_id.clear();
        for (index, slot) in self.slots.iter().enumerate() {
            self.by_name.insert(slot.name.clone(), index);
            self.by_id.insert(slot.collection.collection_id(), index);
        }
    }
}

impl ReferenceResolver for Frame {
    fn collection(&self, id: CollectionId) -> Option<&dyn ErasedCollection> {
        let index = *self.by_id.get(&id)?;
        Some(self.slots[index].collection.as_ref())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("collections", &self.names())
            .field("parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}
