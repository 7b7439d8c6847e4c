//! Transfer configuration via `spool.toml`
//!
//! Every field is optional in the file; missing ones take their defaults.

use crate::element::SIZE_WIRE_SIZE;
use crate::fragment::FRAGMENT_HEADER_SIZE;
use serde::{Deserialize, Serialize};
use spool_core::{Error, Result};
use spool_io::StreamSource;
use std::io::Read;
use std::path::Path;

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "spool.toml";

/// Smallest chunk that holds a fragment header and one 8-byte element.
pub const MIN_CHUNK_SIZE: usize = FRAGMENT_HEADER_SIZE + SIZE_WIRE_SIZE;

/// Tuning knobs of the chunked transfer driver and stream media.
///
/// # Example
///
/// ```toml
/// chunk_size = 256
/// stream_read_chunk = 8192
/// max_elements = 16777216
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes per chunk handed to the medium (default: 256).
    pub chunk_size: usize,
    /// Bytes a stream source pulls per read (default: 8192).
    pub stream_read_chunk: usize,
    /// Largest element count a receiver accepts from a length prefix
    /// (default: 16M).
    pub max_elements: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            chunk_size: 256,
            stream_read_chunk: spool_io::DEFAULT_READ_CHUNK,
            max_elements: 16 * 1024 * 1024,
        }
    }
}

impl TransferConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size (builder pattern).
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set stream read chunk (builder pattern).
    pub fn with_stream_read_chunk(mut self, size: usize) -> Self {
        self.stream_read_chunk = size;
        self
    }

    /// Set the receiver's element cap (builder pattern).
    pub fn with_max_elements(mut self, max: usize) -> Self {
        self.max_elements = max;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(ConfigError::ChunkTooSmall {
                size: self.chunk_size,
            });
        }
        if self.stream_read_chunk == 0 {
            return Err(ConfigError::ZeroReadChunk);
        }
        Ok(())
    }

    /// Wraps `input` in a stream source reading `stream_read_chunk` bytes
    /// at a time.
    pub fn stream_source<R: Read>(&self, input: R) -> StreamSource<R> {
        StreamSource::with_read_chunk(input, self.stream_read_chunk)
    }

    /// Create a configuration with tiny buffers, so tests cross many chunk
    /// boundaries.
    pub fn for_testing() -> Self {
        TransferConfig {
            chunk_size: MIN_CHUNK_SIZE + 8,
            stream_read_chunk: 16,
            max_elements: 1024 * 1024,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Spool transfer configuration
#
# Bytes per chunk handed to the medium. Must hold a 16-byte fragment
# header plus one 8-byte element.
chunk_size = 256

# Bytes a stream source pulls from its reader per read.
stream_read_chunk = 8192

# Largest element count accepted from a length prefix.
max_elements = 16777216
"#
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TransferConfig = toml::from_str(text)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::InvalidConfig` if it does not parse or validate.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: TransferConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this config to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))
    }

    /// Serialize this config to TOML and write it to `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Transfer configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Chunk cannot hold a fragment header and one element.
    #[error("Chunk size {size} is below the minimum of {min}", min = MIN_CHUNK_SIZE)]
    ChunkTooSmall {
        /// Rejected chunk size
        size: usize,
    },

    /// Stream read chunk is zero.
    #[error("Stream read chunk must be non-zero")]
    ZeroReadChunk,
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
