//! Codec configuration.

use crate::FORMAT_VERSION;

/// Configuration for [`FrameWriter`](crate::FrameWriter) and
/// [`FrameReader`](crate::FrameReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Version written into, and expected in, the stream header.
    pub format_version: u16,

    /// Forwarded to `edm_core::Config::verify_on_read` when a reader
    /// rebuilds a frame.
    pub verify_on_read: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            verify_on_read: true,
        }
    }
}

impl CodecConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the header format version.
    #[must_use]
    pub const fn format_version(mut self, version: u16) -> Self {
        self.format_version = version;
        self
    }

    /// Sets whether rebuilt frames verify their buffers.
    #[must_use]
    pub const fn verify_on_read(mut self, value: bool) -> Self {
        self.verify_on_read = value;
        self
    }

    /// Core configuration used when rebuilding frames.
    #[must_use]
    pub fn core_config(&self) -> edm_core::Config {
        edm_core::Config::new().verify_on_read(self.verify_on_read)
    }
}
