//! Buffer contract between collections and codec backends.

use crate::collection::data_type::{DataType, Record, RecordLayout};
use crate::column::RawBytes;
use crate::error::{CoreError, CoreResult};
use crate::types::ObjectID;

/// Flat representation of one collection.
///
/// A normal collection fills `record_array` with one record per object,
/// `relation_id_arrays` with one array per one-to-many relation followed
/// by one array per one-to-one relation, and `vector_member_arrays` with
/// one array per vector member. A subset collection carries an empty
/// record array and a single id array naming the referenced objects.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionBuffers {
    /// `DataType::TYPE_NAME` of the collection.
    pub type_name: String,
    /// Whether the buffers describe a subset collection.
    pub subset: bool,
    /// One record per object.
    pub record_array: RawBytes,
    /// Flattened relation targets as raw ids.
    pub relation_id_arrays: Vec<RawBytes>,
    /// Flattened vector members.
    pub vector_member_arrays: Vec<RawBytes>,
}

/// Buffers produced by `prepare_for_write`.
pub type WriteBuffers = CollectionBuffers;

/// Buffers filled by a codec and consumed by `prepare_after_read`.
pub type ReadBuffers = CollectionBuffers;

impl CollectionBuffers {
    /// Number of objects described.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.subset {
            self.relation_id_arrays.first().map_or(0, RawBytes::len)
        } else {
            self.record_array.len()
        }
    }

    /// Returns true if no object is described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes the record array as records of `T`.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the buffers belong to another type,
    /// `CorruptBuffer` if the layout does not match.
    pub fn records<T: DataType>(&self) -> CoreResult<Vec<Record<T::Data>>> {
        self.expect_type::<T>()?;
        Record::decode_all(&self.record_array, RecordLayout::of::<T>())
    }

    /// Decodes relation id array `array`.
    pub fn relation_ids(&self, array: usize) -> CoreResult<Vec<ObjectID>> {
        self.relation_id_arrays
            .get(array)
            .ok_or_else(|| CoreError::index_out_of_range(array, self.relation_id_arrays.len()))?
            .decode()
    }

    pub(crate) fn expect_type<T: DataType>(&self) -> CoreResult<()> {
        if self.type_name == T::TYPE_NAME {
            Ok(())
        } else {
            Err(CoreError::type_mismatch(T::TYPE_NAME, self.type_name.as_str()))
        }
    }
}
