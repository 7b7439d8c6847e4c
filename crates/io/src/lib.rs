//! Byte media for Spool
//!
//! Serializers write through a [`DataSink`] and deserializers read through a
//! [`DataSource`]. This crate provides both traits plus two media:
//!
//! - [`BlockSink`] / [`BlockSource`]: a fixed, caller-owned memory block
//! - [`StreamSink`] / [`StreamSource`]: any `std::io::Write` / `std::io::Read`
//!
//! The [`testing`] module holds failure-injection doubles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod sink;
pub mod stream;
pub mod testing;

pub use block::{BlockSink, BlockSource};
pub use sink::{DataSink, DataSource, TransactionHandle, TransactionStack, DEFAULT_SCAN_STEP};
pub use stream::{StreamSink, StreamSource, DEFAULT_READ_CHUNK};
