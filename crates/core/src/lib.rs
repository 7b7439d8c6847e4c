//! Foundation types for Spool
//!
//! This crate holds the pieces every other layer builds on:
//! - Error bitsets for serialization and deserialization, plus `Error`
//! - Bit-density engine: bytes to N-bit groups and back
//! - Base64 codec on top of the bit-density engine
//! - Portable float decomposition into an integer pair
//! - Multi-byte size codes used by size-prefixed framing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod base64;
pub mod bits;
pub mod error;
pub mod float;
pub mod multi_byte;

pub use base64::Base64Error;
pub use bits::{
    concentrate_bits, concentrated_bits_length, dissolve_bits, dissolved_bits_length, BitRegister,
};
pub use error::{
    DeserializationErrorCode, DeserializationErrors, Error, Result, SerializationErrorCode,
    SerializationErrors,
};
pub use float::{compose, decompose, Decompose};
