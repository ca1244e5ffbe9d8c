//! Serde model of the CBOR frame body.
//!
//! Field order and key order are fixed, so equal frames encode to equal
//! bytes.

use bytes::Bytes;
use edm_core::{
    CollectionBuffers, CollectionData, CollectionId, CollectionIdTable, FrameData,
    ParameterStore, RawBytes,
};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FrameBody {
    collection_ids: Vec<(String, u32)>,
    collections: Vec<CollectionBody>,
    parameters: ParameterBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionBody {
    name: String,
    type_name: String,
    subset: bool,
    records: ArrayBody,
    relations: Vec<ArrayBody>,
    members: Vec<ArrayBody>,
}

/// One flat buffer carried verbatim as a CBOR byte string.
#[derive(Debug, Serialize, Deserialize)]
struct ArrayBody {
    stride: u64,
    len: u64,
    data: Bytes,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ParameterBody {
    ints: Vec<(String, Vec<i32>)>,
    floats: Vec<(String, Vec<f32>)>,
    doubles: Vec<(String, Vec<f64>)>,
    strings: Vec<(String, Vec<String>)>,
}

impl FrameBody {
    pub(crate) fn from_data(data: &FrameData) -> Self {
        Self {
            collection_ids: data
                .id_table
                .pairs()
                .map(|(name, id)| (name.to_owned(), id.as_u32()))
                .collect(),
            collections: data
                .collections
                .iter()
                .map(|collection| CollectionBody {
                    name: collection.name.clone(),
                    type_name: collection.buffers.type_name.clone(),
                    subset: collection.buffers.subset,
                    records: ArrayBody::from_raw(&collection.buffers.record_array),
                    relations: collection
                        .buffers
                        .relation_id_arrays
                        .iter()
                        .map(ArrayBody::from_raw)
                        .collect(),
                    members: collection
                        .buffers
                        .vector_member_arrays
                        .iter()
                        .map(ArrayBody::from_raw)
                        .collect(),
                })
                .collect(),
            parameters: ParameterBody::from_store(&data.parameters),
        }
    }

    pub(crate) fn into_data(self) -> CodecResult<FrameData> {
        let id_table = CollectionIdTable::from_pairs(
            self.collection_ids
                .into_iter()
                .map(|(name, id)| (name, CollectionId::new(id))),
        )?;
        let collections = self
            .collections
            .into_iter()
            .map(CollectionBody::into_data)
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(FrameData {
            id_table,
            collections,
            parameters: self.parameters.into_store(),
        })
    }

    pub(crate) fn collection_count(&self) -> usize {
        self.collections.len()
    }
}

impl CollectionBody {
    fn into_data(self) -> CodecResult<CollectionData> {
        let relations = self
            .relations
            .into_iter()
            .map(ArrayBody::into_raw)
            .collect::<CodecResult<Vec<_>>>()?;
        let members = self
            .members
            .into_iter()
            .map(ArrayBody::into_raw)
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(CollectionData {
            name: self.name,
            buffers: CollectionBuffers {
                type_name: self.type_name,
                subset: self.subset,
                record_array: self.records.into_raw()?,
                relation_id_arrays: relations,
                vector_member_arrays: members,
            },
        })
    }
}

impl ArrayBody {
    fn from_raw(raw: &RawBytes) -> Self {
        Self {
            stride: raw.stride() as u64,
            len: raw.len() as u64,
            data: raw.bytes(),
        }
    }

    fn into_raw(self) -> CodecResult<RawBytes> {
        let stride = usize::try_from(self.stride)
            .map_err(|_| CodecError::invalid_structure(format!("stride {} too large", self.stride)))?;
        let len = usize::try_from(self.len)
            .map_err(|_| CodecError::invalid_structure(format!("length {} too large", self.len)))?;
        Ok(RawBytes::from_parts(self.data, stride, len)?)
    }
}

impl ParameterBody {
    fn from_store(store: &ParameterStore) -> Self {
        Self {
            ints: store.entries(),
            floats: store.entries(),
            doubles: store.entries(),
            strings: store.entries(),
        }
    }

    fn into_store(self) -> ParameterStore {
        let store = ParameterStore::new();
        for (key, values) in self.ints {
            store.set_vec(key, values);
        }
        for (key, values) in self.floats {
            store.set_vec(key, values);
        }
        for (key, values) in self.doubles {
            store.set_vec(key, values);
        }
        for (key, values) in self.strings {
            store.set_vec(key, values);
        }
        store
    }
}
