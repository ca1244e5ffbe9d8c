//! Entries and the handles that reference them.

mod entry;
mod generation;
mod handle;

pub(crate) use entry::{
    EntryBody, EntryCell, ErasedEntry, Link, RelationBuffer, SharedRelations, ToMany,
};
pub(crate) use generation::{Generation, Stamps};
pub use handle::{Handle, MutableHandle, ObjectRef};
