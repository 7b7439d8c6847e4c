//! Shared helpers for the integration test suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spool::{Element, Result, TransferConfig};

/// Deterministic RNG so failures reproduce.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `len` random bytes.
pub fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen()).collect()
}

/// Sends `values` and collects every emitted chunk.
pub fn chunks_of<T: Element>(values: &[T], config: &TransferConfig) -> Result<Vec<Vec<u8>>> {
    let mut chunks = Vec::new();
    spool::send_all(values, config.clone(), |chunk| {
        chunks.push(chunk.to_vec());
        Ok(())
    })?;
    Ok(chunks)
}

/// Config with the given chunk size and defaults otherwise.
pub fn chunked(chunk_size: usize) -> TransferConfig {
    TransferConfig::new().with_chunk_size(chunk_size)
}
