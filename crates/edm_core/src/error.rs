//! Error types for the EDM core.

use crate::types::CollectionId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in EDM core operations.
///
/// Every variant describes a programmer or data error. None of them is
/// transient, so nothing in the core retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Operation attempted on an empty, unlinked or released handle.
    #[error("object is not available")]
    Unavailable,

    /// Indexed access beyond the bounds of a collection or buffer.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: i64,
        /// The number of addressable elements.
        len: usize,
    },

    /// `push_back` of an object that is already owned by a collection.
    #[error("object {id} is already tracked by a collection")]
    AlreadyTracked {
        /// Formatted identifier of the object.
        id: String,
    },

    /// Switching between normal and subset mode on a non-empty collection.
    #[error("cannot switch a non-empty collection of {len} objects to {target} mode")]
    InvalidModeSwitch {
        /// Current number of objects.
        len: usize,
        /// The requested mode.
        target: &'static str,
    },

    /// Subset collections only reference objects that are already tracked.
    #[error("subset collections only accept objects tracked by another collection")]
    RequiresTrackedObject,

    /// Operation that materializes new objects attempted on a subset collection.
    #[error("operation `{operation}` is not valid on a subset collection")]
    InvalidOnSubset {
        /// The rejected operation.
        operation: &'static str,
    },

    /// Flatten found a relation target that is not owned by any collection.
    #[error("{type_name}[{index}].{relation} points to an object that is not in any collection")]
    UnpersistableReference {
        /// Data type of the source collection.
        type_name: &'static str,
        /// Position of the source object.
        index: usize,
        /// Name of the relation holding the floating target.
        relation: &'static str,
    },

    /// A stored reference names a collection the resolver does not know.
    #[error("dangling reference into unknown collection {collection_id}")]
    DanglingReference {
        /// The unknown collection id.
        collection_id: CollectionId,
    },

    /// A collection with this name is already present in the frame.
    #[error("collection name already present: {name}")]
    NameAlreadyPresent {
        /// The colliding name.
        name: String,
    },

    /// An object or collection was accessed as the wrong data type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The requested data type.
        expected: &'static str,
        /// The actual data type.
        found: String,
    },

    /// Read buffers are inconsistent with the data type layout.
    #[error("corrupt buffer: {message}")]
    CorruptBuffer {
        /// Description of the inconsistency.
        message: String,
    },

    /// No collection factory is registered for a persisted data type.
    #[error("unknown data type: {type_name}")]
    UnknownDataType {
        /// The persisted type name.
        type_name: String,
    },

    /// Relations of a read collection were accessed before reference resolution.
    #[error("references of {type_name} collection {collection_id} are not resolved yet")]
    UnresolvedReferences {
        /// Data type of the collection.
        type_name: &'static str,
        /// Id of the collection.
        collection_id: CollectionId,
    },
}

impl CoreError {
    /// Creates an index out of range error.
    pub fn index_out_of_range(index: impl TryInto<i64>, len: usize) -> Self {
        Self::IndexOutOfRange {
            index: index.try_into().unwrap_or(i64::MAX),
            len,
        }
    }

    /// Creates a corrupt buffer error.
    pub fn corrupt_buffer(message: impl Into<String>) -> Self {
        Self::CorruptBuffer {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.into(),
        }
    }

    /// Creates a name already present error.
    pub fn name_already_present(name: impl Into<String>) -> Self {
        Self::NameAlreadyPresent { name: name.into() }
    }

    /// Creates an unknown data type error.
    pub fn unknown_data_type(type_name: impl Into<String>) -> Self {
        Self::UnknownDataType {
            type_name: type_name.into(),
        }
    }

    /// Returns true if this error can only come from corrupt persisted data.
    ///
    /// `IndexOutOfRange` and `TypeMismatch` are not classified: they also
    /// report API misuse. Every error returned by
    /// [`Collection::set_references`](crate::Collection::set_references)
    /// or [`Frame::from_data`](crate::Frame::from_data) stems from the
    /// data being read and should be treated as corruption whatever its
    /// variant.
    #[must_use]
    pub fn is_data_corruption(&self) -> bool {
        matches!(
            self,
            Self::DanglingReference { .. } | Self::CorruptBuffer { .. } | Self::UnknownDataType { .. }
        )
    }
}
