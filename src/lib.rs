//! Spool - bounded-buffer binary serialization
//!
//! Spool moves typed data through sinks and sources of fixed capacity.
//! Payloads larger than one buffer go out as self-describing fragments and
//! are reassembled on the other side.
//!
//! # Quick Start
//!
//! ```ignore
//! use spool::{receive_all, send_all, TransferConfig};
//!
//! let values: Vec<i32> = (0..8192).collect();
//! let mut chunks = Vec::new();
//! send_all(&values, TransferConfig::default(), |chunk| {
//!     chunks.push(chunk.to_vec());
//!     Ok(())
//! })?;
//! let back: Vec<i32> = receive_all(&chunks, TransferConfig::default())?;
//! ```
//!
//! # Layers
//!
//! - `spool-core`: error bitsets, bit-density engine, base64, float
//!   decomposition, multi-byte size codes
//! - `spool-io`: block and stream sinks and sources
//! - `spool-backend`: element codec, fast and portable backends, fragments,
//!   framing, transfer

pub use spool_backend::*;
pub use spool_core::{base64, bits, float, multi_byte};
pub use spool_core::{
    DeserializationErrorCode, DeserializationErrors, Error, Result, SerializationErrorCode,
    SerializationErrors,
};
pub use spool_io::{
    testing, BlockSink, BlockSource, DataSink, DataSource, StreamSink, StreamSource,
    TransactionHandle, TransactionStack,
};
