//! Collections: the arena that owns entries and converts them to and
//! from flat buffers.
//!
//! Provides `Collection<T>` for any `T` implementing [`DataType`], the
//! buffer contract handed to codecs, and the type-erased view used by
//! frames and reference resolution.

mod buffers;
mod data_type;
mod erased;
mod typed;

pub use buffers::{CollectionBuffers, ReadBuffers, WriteBuffers};
pub use data_type::{DataType, Record, RecordLayout, RelationDescriptor};
pub use erased::ErasedCollection;
pub use typed::{Collection, Iter};
