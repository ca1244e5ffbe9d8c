//! Explicit mapping from persisted type names to collection builders.

use crate::collection::{Collection, DataType, ErasedCollection, ReadBuffers};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::types::CollectionId;
use std::collections::HashMap;
use std::fmt;

type Factory =
    fn(&ReadBuffers, CollectionId, &Config) -> CoreResult<Box<dyn ErasedCollection>>;

fn build<T: DataType>(
    buffers: &ReadBuffers,
    collection_id: CollectionId,
    config: &Config,
) -> CoreResult<Box<dyn ErasedCollection>> {
    Ok(Box::new(Collection::<T>::from_read_buffers(
        buffers,
        collection_id,
        config,
    )?))
}

/// Data types a reader knows how to rebuild.
///
/// Generated datamodel code registers its types here; readers pass the
/// registry explicitly, so no process-wide state is involved.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`. Registering a type twice is harmless.
    pub fn register<T: DataType>(&mut self) -> &mut Self {
        self.factories.insert(T::TYPE_NAME, build::<T>);
        self
    }

    /// Builder form of [`TypeRegistry::register`].
    #[must_use]
    pub fn with<T: DataType>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Whether `type_name` is registered.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Sorted registered type names.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Rebuilds a collection of whatever type the buffers name.
    ///
    /// # Errors
    ///
    /// `UnknownDataType` if the type is not registered, otherwise any
    /// error of `Collection::from_read_buffers`.
    pub fn build(
        &self,
        buffers: &ReadBuffers,
        collection_id: CollectionId,
        config: &Config,
    ) -> CoreResult<Box<dyn ErasedCollection>> {
        let factory = self
            .factories
            .get(buffers.type_name.as_str())
            .ok_or_else(|| CoreError::unknown_data_type(buffers.type_name.as_str()))?;
        factory(buffers, collection_id, config)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Leaf, Node};

    #[test]
    fn builds_registered_types() {
        let registry = TypeRegistry::new().with::<Node>().with::<Leaf>();
        let mut leaves = Collection::<Leaf>::new();
        leaves.create_with(3).unwrap();
        let buffers = leaves.prepare_for_write().unwrap();

        let built = registry
            .build(&buffers, CollectionId::new(4), &Config::default())
            .unwrap();

        assert_eq!(built.type_name(), Leaf::TYPE_NAME);
        assert_eq!(built.collection_id(), CollectionId::new(4));
        assert_eq!(built.len(), 1);
        assert_eq!(registry.type_names(), vec![Leaf::TYPE_NAME, Node::TYPE_NAME]);
    }

    #[test]
    fn unknown_type_is_reported() {
        let registry = TypeRegistry::new().with::<Node>();
        let buffers = Collection::<Leaf>::new().prepare_for_write().unwrap();

        assert_eq!(
            registry
                .build(&buffers, CollectionId::new(1), &Config::default())
                .unwrap_err(),
            CoreError::unknown_data_type(Leaf::TYPE_NAME)
        );
        assert!(!registry.contains(Leaf::TYPE_NAME));
    }
}
