//! Error types for the codec crate.

use edm_core::CoreError;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while writing or reading a frame stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The underlying reader or writer failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error.
        message: String,
    },

    /// Failed to encode the frame body to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode the frame body from CBOR.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// The stream does not start with the frame magic.
    #[error("invalid magic: expected EDMF, got {found:?}")]
    InvalidMagic {
        /// The four bytes found instead.
        found: [u8; 4],
    },

    /// The stream was written in another format version.
    #[error("unsupported format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the header.
        found: u16,
        /// Version this reader accepts.
        expected: u16,
    },

    /// The decoded body is structurally invalid.
    #[error("invalid frame structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// The decoded buffers were rejected by the core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_convert() {
        let err: CodecError = CoreError::corrupt_buffer("short").into();
        assert_eq!(err.to_string(), "corrupt buffer: short");
    }

    #[test]
    fn version_message() {
        let err = CodecError::UnsupportedVersion {
            found: 9,
            expected: 1,
        };
        assert_eq!(err.to_string(), "unsupported format version 9 (expected 1)");
    }
}
