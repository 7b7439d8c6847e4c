//! Typed serialization on top of Spool sinks and sources
//!
//! This crate turns element slices, strings and struct/list framing into
//! bytes and back:
//! - `element`: per-type wire codec
//! - `backend`: serializer and deserializer traits
//! - `fast`: native-layout backend
//! - `portable`: host-independent text backend
//! - `fragment`: resumable transfer of large slices
//! - `framing`: size-prefixed data blocks
//! - `transfer`: chunked sender and receiver
//! - `config`: transfer configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod element;
pub mod fast;
pub mod fragment;
pub mod framing;
pub mod portable;
pub mod transfer;

pub use backend::{
    read_list, read_list_into, write_list, DeserializerBackend, Progress, ReadProgress,
    SerializerBackend, WriteProgress,
};
pub use config::{ConfigError, TransferConfig, CONFIG_FILE_NAME, MIN_CHUNK_SIZE};
pub use element::{encode_all, Element, PortableKind, PortableValue, SIZE_WIRE_SIZE};
pub use fast::{FastDeserializer, FastSerializer, FAST_BACKEND_ID};
pub use fragment::{FragmentDeserializer, FragmentSerializer, FRAGMENT_HEADER_SIZE};
pub use framing::{
    for_each_data_with_size, get_data_with_size, get_data_with_size_mut, read_frame,
    skip_data_with_size, store_data_with_size, write_frame, DataWithSizeIter,
};
pub use portable::{PortableDeserializer, PortableSerializer, MAX_TOKEN_LEN, PORTABLE_BACKEND_ID};
pub use transfer::{
    receive_all, receive_from_reader, receive_from_source, send_all, send_to_sink, ChunkedReceiver,
    ChunkedSender, TransferStats,
};
