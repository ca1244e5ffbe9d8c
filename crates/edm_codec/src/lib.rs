//! # EDM Codec
//!
//! CBOR frame backend for the EDM core.
//!
//! A frame is written as a short header followed by one CBOR document
//! holding the collection id table, every collection's flat buffers and
//! the frame parameters. Buffers travel as byte strings, so writing
//! never re-encodes record payloads.
//!
//! ## Usage
//!
//! ```
//! use edm_codec::{FrameReader, FrameWriter};
//! use edm_core::{Collection, DataType, Frame, TypeRegistry};
//!
//! struct Sample;
//!
//! impl DataType for Sample {
//!     const TYPE_NAME: &'static str = "Sample";
//!     type Data = u32;
//!     type Element = ();
//! }
//!
//! let mut samples = Collection::<Sample>::new();
//! samples.create_with(7).unwrap();
//! let mut frame = Frame::new();
//! frame.put(samples, "samples").unwrap();
//!
//! let bytes = FrameWriter::new().encode(&frame.write_data().unwrap()).unwrap();
//! let registry = TypeRegistry::new().with::<Sample>();
//! let read = FrameReader::new().read_frame(bytes.as_slice(), &registry).unwrap();
//!
//! let samples = read.get::<Sample>("samples").unwrap();
//! assert_eq!(samples.get(0).unwrap().data().unwrap(), 7);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod body;
mod config;
mod error;
mod stream;

pub use config::CodecConfig;
pub use error::{CodecError, CodecResult};
pub use stream::{FrameReader, FrameWriter, HEADER_SIZE};

/// Magic bytes opening every frame stream.
pub const FRAME_MAGIC: [u8; 4] = *b"EDMF";

/// Current stream format version.
pub const FORMAT_VERSION: u16 = 1;
