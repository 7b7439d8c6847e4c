//! End-to-end transfers through bounded chunks.
//!
//! Run with: cargo test --test transfer

#[path = "../common/mod.rs"]
mod common;

mod fixed_chunks;
mod resumable;
mod streams;
