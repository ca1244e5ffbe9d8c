//! Fixed-stride columnar encoding for flat buffers.
//!
//! Every flat buffer handed to a codec is a contiguous run of equally
//! sized little-endian elements. [`Column`] is the contract an element
//! type fulfils; [`RawBytes`] is the buffer itself.

use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionId, ObjectID};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

/// A value with a fixed-width little-endian byte representation.
///
/// Generated payload types implement this by writing their fields in
/// declaration order.
pub trait Column: Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Encoded size in bytes.
    const STRIDE: usize;

    /// Appends exactly `STRIDE` bytes to `buf`.
    fn put(&self, buf: &mut BytesMut);

    /// Reads one value, advancing `buf` by exactly `STRIDE` bytes.
    ///
    /// Callers guarantee that at least `STRIDE` bytes remain.
    fn get(buf: &mut &[u8]) -> Self;
}

macro_rules! impl_column_for_primitive {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl Column for $ty {
                const STRIDE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn put(&self, buf: &mut BytesMut) {
                    buf.$put(*self);
                }

                #[inline]
                fn get(buf: &mut &[u8]) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

impl_column_for_primitive! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16_le, get_u16_le;
    i16 => put_i16_le, get_i16_le;
    u32 => put_u32_le, get_u32_le;
    i32 => put_i32_le, get_i32_le;
    u64 => put_u64_le, get_u64_le;
    i64 => put_i64_le, get_i64_le;
    f32 => put_f32_le, get_f32_le;
    f64 => put_f64_le, get_f64_le;
}

impl Column for bool {
    const STRIDE: usize = 1;

    fn put(&self, buf: &mut BytesMut) {
        buf.put_u8(u8::from(*self));
    }

    fn get(buf: &mut &[u8]) -> Self {
        buf.get_u8() != 0
    }
}

/// Payload-free types and types without vector members use `()`.
impl Column for () {
    const STRIDE: usize = 0;

    fn put(&self, _buf: &mut BytesMut) {}

    fn get(_buf: &mut &[u8]) -> Self {}
}

impl<C: Column, const N: usize> Column for [C; N]
where
    [C; N]: Default,
{
    const STRIDE: usize = C::STRIDE * N;

    fn put(&self, buf: &mut BytesMut) {
        for item in self {
            item.put(buf);
        }
    }

    fn get(buf: &mut &[u8]) -> Self {
        std::array::from_fn(|_| C::get(buf))
    }
}

impl Column for ObjectID {
    const STRIDE: usize = 12;

    fn put(&self, buf: &mut BytesMut) {
        buf.put_i64_le(self.index);
        buf.put_u32_le(self.collection_id.as_u32());
    }

    fn get(buf: &mut &[u8]) -> Self {
        let index = buf.get_i64_le();
        let collection_id = CollectionId::new(buf.get_u32_le());
        ObjectID::new(index, collection_id)
    }
}

/// Half-open `[begin, end)` window into a relation or vector-member buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelationRange {
    /// First element belonging to the record.
    pub begin: u32,
    /// One past the last element belonging to the record.
    pub end: u32,
}

impl RelationRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    /// Number of elements covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.begin) as usize
    }

    /// Returns true if the range covers nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// Converts to a `usize` range after checking it against `len`.
    ///
    /// # Errors
    ///
    /// Returns `CorruptBuffer` if the range is inverted or exceeds `len`.
    pub fn checked(&self, len: usize) -> CoreResult<std::ops::Range<usize>> {
        let (begin, end) = (self.begin as usize, self.end as usize);
        if begin > end || end > len {
            return Err(CoreError::corrupt_buffer(format!(
                "range {begin}..{end} exceeds buffer of {len} elements"
            )));
        }
        Ok(begin..end)
    }
}

impl Column for RelationRange {
    const STRIDE: usize = 8;

    fn put(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.begin);
        buf.put_u32_le(self.end);
    }

    fn get(buf: &mut &[u8]) -> Self {
        let begin = buf.get_u32_le();
        let end = buf.get_u32_le();
        Self { begin, end }
    }
}

/// An opaque contiguous byte range plus element stride.
///
/// The element count is stored explicitly so zero-stride columns keep
/// their length.
#[derive(Clone, PartialEq, Eq)]
pub struct RawBytes {
    data: Bytes,
    stride: usize,
    len: usize,
}

impl RawBytes {
    /// Creates an empty buffer with the given stride.
    #[must_use]
    pub fn empty(stride: usize) -> Self {
        Self {
            data: Bytes::new(),
            stride,
            len: 0,
        }
    }

    /// Wraps bytes produced by a codec.
    ///
    /// # Errors
    ///
    /// Returns `CorruptBuffer` if `data` is not exactly `len` elements of
    /// `stride` bytes.
    pub fn from_parts(data: Bytes, stride: usize, len: usize) -> CoreResult<Self> {
        let expected = stride.checked_mul(len).ok_or_else(|| {
            CoreError::corrupt_buffer(format!("{len} elements of {stride} bytes overflow"))
        })?;
        if data.len() != expected {
            return Err(CoreError::corrupt_buffer(format!(
                "expected {expected} bytes for {len} elements of stride {stride}, got {}",
                data.len()
            )));
        }
        Ok(Self { data, stride, len })
    }

    pub(crate) fn from_exact(data: Bytes, stride: usize, len: usize) -> Self {
        debug_assert_eq!(data.len(), stride * len);
        Self { data, stride, len }
    }

    /// Encodes a slice of column values.
    #[must_use]
    pub fn encode<C: Column>(items: &[C]) -> Self {
        let mut buf = BytesMut::with_capacity(C::STRIDE * items.len());
        for item in items {
            item.put(&mut buf);
        }
        Self {
            data: buf.freeze(),
            stride: C::STRIDE,
            len: items.len(),
        }
    }

    /// Decodes all elements as `C`.
    ///
    /// # Errors
    ///
    /// Returns `CorruptBuffer` if the stride does not match `C`.
    pub fn decode<C: Column>(&self) -> CoreResult<Vec<C>> {
        if self.stride != C::STRIDE {
            return Err(CoreError::corrupt_buffer(format!(
                "stride {} does not match element size {}",
                self.stride,
                C::STRIDE
            )));
        }
        let mut cursor: &[u8] = &self.data;
        Ok((0..self.len).map(|_| C::get(&mut cursor)).collect())
    }

    /// The encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// A cheap clone of the encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Size of one element in bytes.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for RawBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBytes")
            .field("len", &self.len)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    #[test]
    fn primitive_strides() {
        assert_eq!(<u8 as Column>::STRIDE, 1);
        assert_eq!(<f64 as Column>::STRIDE, 8);
        assert_eq!(<[f32; 3] as Column>::STRIDE, 12);
        assert_eq!(<() as Column>::STRIDE, 0);
        assert_eq!(<ObjectID as Column>::STRIDE, 12);
    }

    #[test]
    fn encoding_is_little_endian() {
        let raw = RawBytes::encode(&[0x0102_0304u32]);
        assert_eq!(raw.as_bytes(), &[4, 3, 2, 1]);
    }

    #[test]
    fn object_ids_survive_encoding() {
        let ids = vec![
            ObjectID::at(3, CollectionId::new(7)),
            ObjectID::untracked(),
        ];
        let raw = RawBytes::encode(&ids);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.as_bytes().len(), 24);
        assert_eq!(raw.decode::<ObjectID>().unwrap(), ids);
    }

    #[test]
    fn decode_rejects_wrong_stride() {
        let raw = RawBytes::encode(&[1u32, 2, 3]);
        assert!(matches!(
            raw.decode::<u64>(),
            Err(CoreError::CorruptBuffer { .. })
        ));
    }

    #[test]
    fn from_parts_checks_length() {
        let data = Bytes::from_static(&[0u8; 10]);
        assert!(RawBytes::from_parts(data.clone(), 4, 2).is_err());
        assert!(RawBytes::from_parts(data, 5, 2).is_ok());
    }

    #[test]
    fn zero_stride_keeps_count() {
        let raw = RawBytes::encode(&[(), (), ()]);
        assert_eq!(raw.len(), 3);
        assert!(raw.as_bytes().is_empty());
        assert_eq!(raw.decode::<()>().unwrap().len(), 3);
    }

    #[test]
    fn range_checks() {
        assert_eq!(RelationRange::new(1, 3).checked(3).unwrap(), 1..3);
        assert!(RelationRange::new(2, 1).checked(5).is_err());
        assert!(RelationRange::new(0, 6).checked(5).is_err());
        assert_eq!(RelationRange::new(4, 4).len(), 0);
    }

    proptest! {
        #[test]
        fn length_is_bytes_over_stride(values in vec(any::<[i32; 3]>(), 0..64)) {
            let raw = RawBytes::encode(&values);
            prop_assert_eq!(raw.len(), values.len());
            prop_assert_eq!(raw.as_bytes().len(), values.len() * 12);
            prop_assert_eq!(raw.decode::<[i32; 3]>().unwrap(), values);
        }
    }
}
