//! Whole arrays through 256-byte chunks.

use crate::common::{chunked, chunks_of, seeded_rng};
use rand::Rng;
use spool::{receive_all, ChunkedReceiver, Element, TransferConfig};

fn round_trip<T>(values: &[T], chunk_size: usize)
where
    T: Element + PartialEq + std::fmt::Debug,
{
    let config = chunked(chunk_size);
    let chunks = chunks_of(values, &config).unwrap();
    assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= chunk_size));

    let back: Vec<T> = receive_all(&chunks, config).unwrap();
    assert_eq!(back.len(), values.len());
    assert_eq!(back, values);
}

#[test]
fn test_8192_i32_through_256_byte_chunks() {
    let values: Vec<i32> = (0..8192).map(|i| i * 3 - 12_000).collect();
    round_trip(&values, 256);
}

#[test]
fn test_4096_i16_through_256_byte_chunks() {
    let values: Vec<i16> = (0..4096).map(|i| (i * 17) as i16).collect();
    round_trip(&values, 256);
}

#[test]
fn test_2048_i8_through_256_byte_chunks() {
    let values: Vec<i8> = (0..2048).map(|i| (i % 256) as i8).collect();
    round_trip(&values, 256);
}

#[test]
fn test_random_payloads_of_every_element_kind() {
    let mut rng = seeded_rng(0x5eed);
    let bools: Vec<bool> = (0..999).map(|_| rng.gen()).collect();
    round_trip(&bools, 64);
    let words: Vec<u64> = (0..777).map(|_| rng.gen()).collect();
    round_trip(&words, 100);
    let wide: Vec<i128> = (0..100).map(|_| rng.gen()).collect();
    round_trip(&wide, 48);
    let chars: Vec<char> = (0..500).map(|_| rng.gen()).collect();
    round_trip(&chars, 256);
    let floats: Vec<f32> = (0..1000).map(|_| rng.gen::<f32>() * 1e6 - 5e5).collect();
    round_trip(&floats, 128);
    let doubles: Vec<f64> = (0..1000)
        .map(|_| f64::from_bits(rng.gen()))
        .filter(|x| !x.is_nan())
        .collect();
    round_trip(&doubles, 256);
}

#[test]
fn test_chunk_count_matches_payload() {
    // First chunk: 8-byte count + 16-byte header + 58 i32 values.
    // Every other chunk: 16-byte header + 60 i32 values.
    let values: Vec<i32> = (0..8192).collect();
    let chunks = chunks_of(&values, &chunked(256)).unwrap();
    let expected = 1 + (8192 - 58 + 59) / 60;
    assert_eq!(chunks.len(), expected);
    assert_eq!(chunks[0].len(), 8 + 16 + 58 * 4);
}

#[test]
fn test_receiver_counts_chunks_and_bytes() {
    let values: Vec<u16> = (0..3000).collect();
    let config = TransferConfig::default();
    let chunks = chunks_of(&values, &config).unwrap();

    let mut receiver = ChunkedReceiver::<u16>::new(config).unwrap();
    for chunk in &chunks {
        receiver.receive(chunk).unwrap();
    }
    let stats = receiver.stats();
    assert_eq!(stats.chunks, chunks.len() as u64);
    assert_eq!(
        stats.bytes,
        chunks.iter().map(|c| c.len() as u64).sum::<u64>()
    );
    assert_eq!(stats.fragments, chunks.len() as u64);
    assert_eq!(receiver.into_values().unwrap(), values);
}
