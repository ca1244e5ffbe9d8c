//! Frame stream writer and reader.
//!
//! ## Stream layout
//!
//! | magic (4) | version (2, LE) | CBOR body |
//!
//! The body holds the collection id table, each collection's flat
//! buffers as byte strings with their stride, and the frame parameters.

use std::io::{Read, Write};

use edm_core::{Frame, FrameData, TypeRegistry};
use tracing::debug;

use crate::body::FrameBody;
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::FRAME_MAGIC;

/// Size of the stream header: magic (4) + version (2).
pub const HEADER_SIZE: usize = 6;

/// Writes frames as CBOR streams.
#[derive(Debug, Clone, Default)]
pub struct FrameWriter {
    config: CodecConfig,
}

impl FrameWriter {
    /// Creates a writer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with `config`.
    #[must_use]
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Writes the flat form of a frame to `writer`.
    ///
    /// # Errors
    ///
    /// `Io` if the writer fails, `EncodingFailed` if CBOR encoding fails.
    pub fn write<W: Write>(&self, data: &FrameData, mut writer: W) -> CodecResult<()> {
        let body = FrameBody::from_data(data);
        writer.write_all(&FRAME_MAGIC)?;
        writer.write_all(&self.config.format_version.to_le_bytes())?;
        ciborium::into_writer(&body, &mut writer)
            .map_err(|err| CodecError::encoding_failed(err.to_string()))?;
        writer.flush()?;
        debug!(
            collections = body.collection_count(),
            version = self.config.format_version,
            "wrote frame"
        );
        Ok(())
    }

    /// Materializes `frame` and writes it to `writer`.
    ///
    /// # Errors
    ///
    /// `Core` if a collection cannot be flattened, otherwise as
    /// [`FrameWriter::write`].
    pub fn write_frame<W: Write>(&self, frame: &Frame, writer: W) -> CodecResult<()> {
        self.write(&frame.write_data()?, writer)
    }

    /// Encodes the flat form of a frame into a byte vector.
    pub fn encode(&self, data: &FrameData) -> CodecResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write(data, &mut bytes)?;
        Ok(bytes)
    }
}

/// Reads frames from CBOR streams.
#[derive(Debug, Clone, Default)]
pub struct FrameReader {
    config: CodecConfig,
}

impl FrameReader {
    /// Creates a reader with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader with `config`.
    #[must_use]
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Reads the flat form of a frame from `reader`.
    ///
    /// # Errors
    ///
    /// - `InvalidMagic` / `UnsupportedVersion` for a foreign header
    /// - `DecodingFailed` if the body is not valid CBOR for a frame
    /// - `Core` if the id table or a buffer is inconsistent
    pub fn read<R: Read>(&self, mut reader: R) -> CodecResult<FrameData> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[..4]);
        if magic != FRAME_MAGIC {
            return Err(CodecError::InvalidMagic { found: magic });
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != self.config.format_version {
            return Err(CodecError::UnsupportedVersion {
                found: version,
                expected: self.config.format_version,
            });
        }

        let body: FrameBody = ciborium::from_reader(&mut reader)
            .map_err(|err| CodecError::decoding_failed(err.to_string()))?;
        debug!(collections = body.collection_count(), version, "read frame");
        body.into_data()
    }

    /// Decodes the flat form of a frame from `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<FrameData> {
        self.read(bytes)
    }

    /// Reads a frame and rebuilds every collection in it.
    ///
    /// # Errors
    ///
    /// As [`FrameReader::read`], plus any error of `Frame::from_data`.
    pub fn read_frame<R: Read>(&self, reader: R, registry: &TypeRegistry) -> CodecResult<Frame> {
        let data = self.read(reader)?;
        Ok(Frame::from_data(data, registry, self.config.core_config())?)
    }
}
