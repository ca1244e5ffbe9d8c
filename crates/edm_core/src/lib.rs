//! # EDM Core
//!
//! Runtime for event data models: typed records with relations between
//! them, owned by collections and persisted as flat buffers.
//!
//! This crate provides:
//! - Object identity (`ObjectID`, `CollectionId`, `CollectionIdTable`)
//! - Handles with free-floating and collection-owned regimes
//! - `Collection<T>`, the arena owning the entries of one data type
//! - Flattening into `WriteBuffers` and reconstruction from `ReadBuffers`
//! - Reference resolution across collections
//! - `Frame`, a named set of collections with a typed parameter store
//!
//! ## Usage
//!
//! ```
//! use edm_core::{Collection, DataType, RelationDescriptor};
//!
//! struct Particle;
//!
//! impl DataType for Particle {
//!     const TYPE_NAME: &'static str = "Particle";
//!     type Data = f64;
//!     type Element = ();
//!     const TO_MANY: &'static [RelationDescriptor] =
//!         &[RelationDescriptor::new("daughters", "Particle")];
//! }
//!
//! let mut particles = Collection::<Particle>::new();
//! let mother = particles.create_with(91.2).unwrap();
//! let daughter = particles.create_with(45.6).unwrap();
//! mother.add_related(0, &daughter).unwrap();
//!
//! let buffers = particles.prepare_for_write().unwrap();
//! assert_eq!(buffers.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod column;
mod config;
mod entity;
mod error;
mod frame;
mod id_table;
mod resolver;
mod types;

#[cfg(test)]
mod testing;

pub use bytes;
pub use collection::{
    Collection, CollectionBuffers, DataType, ErasedCollection, Iter, ReadBuffers, Record,
    RecordLayout, RelationDescriptor, WriteBuffers,
};
pub use column::{Column, RawBytes, RelationRange};
pub use config::Config;
pub use entity::{Handle, MutableHandle, ObjectRef};
pub use error::{CoreError, CoreResult};
pub use frame::{CollectionData, Frame, FrameData, ParameterStore, ParameterValue, TypeRegistry};
pub use id_table::CollectionIdTable;
pub use resolver::{resolve_object, ReferenceResolver, ResolverMap};
pub use types::{CollectionId, ObjectID};
