//! Data type contract for generated per-type code.

use crate::column::{Column, RawBytes, RelationRange};
use crate::error::{CoreError, CoreResult};
use bytes::BytesMut;

/// Static description of one declared relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Relation name, used in error messages.
    pub name: &'static str,
    /// `TYPE_NAME` of the target data type.
    pub target: &'static str,
}

impl RelationDescriptor {
    /// Creates a relation descriptor.
    #[must_use]
    pub const fn new(name: &'static str, target: &'static str) -> Self {
        Self { name, target }
    }
}

/// A data type that can live in a [`Collection`](crate::Collection).
///
/// This is what a schema code generator emits per type: the payload
/// layout plus the static list of relations and vector members. The
/// engine never needs anything else about the type.
///
/// # Example
///
/// ```rust
/// use edm_core::{Column, DataType, RelationDescriptor};
/// use edm_core::bytes::BytesMut;
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// pub struct ParticleData {
///     pub pdg: i32,
///     pub energy: f64,
/// }
///
/// impl Column for ParticleData {
///     const STRIDE: usize = 12;
///
///     fn put(&self, buf: &mut BytesMut) {
///         self.pdg.put(buf);
///         self.energy.put(buf);
///     }
///
///     fn get(buf: &mut &[u8]) -> Self {
///         Self {
///             pdg: i32::get(buf),
///             energy: f64::get(buf),
///         }
///     }
/// }
///
/// pub struct Particle;
///
/// impl DataType for Particle {
///     const TYPE_NAME: &'static str = "Particle";
///     type Data = ParticleData;
///     type Element = ();
///     const TO_MANY: &'static [RelationDescriptor] =
///         &[RelationDescriptor::new("daughters", "Particle")];
/// }
/// ```
pub trait DataType: Send + Sync + Sized + 'static {
    /// Type name persisted with every collection of this type.
    const TYPE_NAME: &'static str;

    /// Plain payload fields.
    type Data: Column;

    /// Element type shared by all vector members (`()` if there are none).
    type Element: Column;

    /// One-to-many relations, in declaration order.
    const TO_MANY: &'static [RelationDescriptor] = &[];

    /// One-to-one relations, in declaration order.
    const TO_ONE: &'static [RelationDescriptor] = &[];

    /// Vector member names, in declaration order.
    const VECTOR_MEMBERS: &'static [&'static str] = &[];
}

/// Flat layout of one record: payload followed by one range per
/// one-to-many relation and one per vector member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Bytes taken by the payload.
    pub data_stride: usize,
    /// Number of one-to-many relations.
    pub to_many: usize,
    /// Number of one-to-one relations.
    pub to_one: usize,
    /// Number of vector members.
    pub vector_members: usize,
}

impl RecordLayout {
    /// Layout of `T`.
    #[must_use]
    pub fn of<T: DataType>() -> Self {
        Self {
            data_stride: <T::Data as Column>::STRIDE,
            to_many: T::TO_MANY.len(),
            to_one: T::TO_ONE.len(),
            vector_members: T::VECTOR_MEMBERS.len(),
        }
    }

    /// Number of ranges stored per record.
    #[must_use]
    pub const fn ranges(&self) -> usize {
        self.to_many + self.vector_members
    }

    /// Number of relation id arrays (one-to-many first, then one-to-one).
    #[must_use]
    pub const fn relation_arrays(&self) -> usize {
        self.to_many + self.to_one
    }

    /// Full record stride in bytes.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.data_stride + self.ranges() * <RelationRange as Column>::STRIDE
    }
}

/// The flat, payload-only representation of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<D> {
    /// Payload fields.
    pub data: D,
    /// One-to-many ranges followed by vector-member ranges.
    pub ranges: Vec<RelationRange>,
}

impl<D: Column> Record<D> {
    /// Encodes records into a record array.
    pub(crate) fn encode_all(records: &[Self], layout: RecordLayout) -> RawBytes {
        let stride = layout.stride();
        let mut buf = BytesMut::with_capacity(stride * records.len());
        for record in records {
            record.data.put(&mut buf);
            for range in &record.ranges {
                range.put(&mut buf);
            }
        }
        RawBytes::from_exact(buf.freeze(), stride, records.len())
    }

    /// Decodes a record array produced for `layout`.
    ///
    /// # Errors
    ///
    /// Returns `CorruptBuffer` if the stride does not match the layout.
    pub fn decode_all(raw: &RawBytes, layout: RecordLayout) -> CoreResult<Vec<Self>> {
        if raw.stride() != layout.stride() {
            return Err(CoreError::corrupt_buffer(format!(
                "record stride {} does not match layout stride {}",
                raw.stride(),
                layout.stride()
            )));
        }
        let mut cursor: &[u8] = raw.as_bytes();
        let records = (0..raw.len())
            .map(|_| {
                let data = D::get(&mut cursor);
                let ranges = (0..layout.ranges())
                    .map(|_| RelationRange::get(&mut cursor))
                    .collect();
                Record { data, ranges }
            })
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl DataType for Plain {
        const TYPE_NAME: &'static str = "Plain";
        type Data = u32;
        type Element = ();
    }

    struct Rich;

    impl DataType for Rich {
        const TYPE_NAME: &'static str = "Rich";
        type Data = f64;
        type Element = i16;
        const TO_MANY: &'static [RelationDescriptor] = &[
            RelationDescriptor::new("a", "Plain"),
            RelationDescriptor::new("b", "Rich"),
        ];
        const TO_ONE: &'static [RelationDescriptor] = &[RelationDescriptor::new("c", "Plain")];
        const VECTOR_MEMBERS: &'static [&'static str] = &["values"];
    }

    #[test]
    fn layout_without_relations() {
        let layout = RecordLayout::of::<Plain>();
        assert_eq!(layout.ranges(), 0);
        assert_eq!(layout.relation_arrays(), 0);
        assert_eq!(layout.stride(), 4);
    }

    #[test]
    fn layout_with_relations_and_members() {
        let layout = RecordLayout::of::<Rich>();
        assert_eq!(layout.ranges(), 3);
        assert_eq!(layout.relation_arrays(), 3);
        assert_eq!(layout.stride(), 8 + 3 * 8);
    }

    #[test]
    fn record_array_roundtrip() {
        let layout = RecordLayout::of::<Rich>();
        let records = vec![
            Record {
                data: 1.5f64,
                ranges: vec![
                    RelationRange::new(0, 2),
                    RelationRange::new(0, 0),
                    RelationRange::new(0, 1),
                ],
            },
            Record {
                data: -3.0f64,
                ranges: vec![
                    RelationRange::new(2, 2),
                    RelationRange::new(0, 4),
                    RelationRange::new(1, 1),
                ],
            },
        ];

        let raw = Record::encode_all(&records, layout);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.stride(), layout.stride());
        assert_eq!(Record::<f64>::decode_all(&raw, layout).unwrap(), records);
    }

    #[test]
    fn decode_rejects_foreign_layout() {
        let raw = Record::encode_all(
            &[Record {
                data: 7u32,
                ranges: Vec::new(),
            }],
            RecordLayout::of::<Plain>(),
        );
        let result = Record::<f64>::decode_all(&raw, RecordLayout::of::<Rich>());
        assert!(result.is_err());
    }
}
