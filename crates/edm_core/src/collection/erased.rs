//! Type-erased collection view.

use crate::collection::buffers::WriteBuffers;
use crate::entity::ObjectRef;
use crate::error::CoreResult;
use crate::resolver::ReferenceResolver;
use crate::types::CollectionId;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A collection of any data type.
///
/// Frames hold collections through this trait, and reference resolution
/// looks targets up through it.
pub trait ErasedCollection: Send + Sync + fmt::Debug {
    /// `DataType::TYPE_NAME` of the elements.
    fn type_name(&self) -> &'static str;

    /// Id of the collection in its frame.
    fn collection_id(&self) -> CollectionId;

    /// Assigns the collection id, renumbering owned objects.
    fn set_collection_id(&mut self, id: CollectionId);

    /// Number of objects.
    fn len(&self) -> usize;

    /// Returns true if the collection holds no objects.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the collection only references objects owned elsewhere.
    fn is_subset_collection(&self) -> bool;

    /// Type-erased handle to the object at `index`.
    fn object_at(&self, index: usize) -> CoreResult<ObjectRef>;

    /// Materializes the flat buffers once and returns them.
    fn prepare_for_write(&self) -> CoreResult<Arc<WriteBuffers>>;

    /// Replaces stored ids with live references.
    fn set_references(&self, resolver: &dyn ReferenceResolver) -> CoreResult<()>;

    /// Releases every owned object.
    fn clear(&mut self);

    /// For downcasting to `Collection<T>`.
    fn as_any(&self) -> &dyn Any;

    /// For downcasting to `Collection<T>`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
