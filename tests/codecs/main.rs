//! Codec conformance: base64, bit density, floats, portable text and size
//! codes.
//!
//! Run with: cargo test --test codecs

#[path = "../common/mod.rs"]
mod common;

mod base64_compat;
mod bit_density;
mod floats;
mod portable_text;
mod size_codes;
