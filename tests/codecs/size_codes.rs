//! Multi-byte size codes and size-prefixed framing.

use proptest::prelude::*;
use spool::multi_byte::{
    decode_code_point, decode_code_points, decode_sequence_length, encode_code_point,
    encode_code_points, encoding_bytes_required, max_code_point, required_sequence_length,
    INVALID_CODE_POINT, MAX_SEQUENCE_LENGTH,
};
use spool::{
    for_each_data_with_size, get_data_with_size, skip_data_with_size, store_data_with_size,
};

use crate::common::{random_bytes, seeded_rng};

#[test]
fn test_every_sequence_length_round_trips() {
    let mut lower = 0u32;
    for len in 1..=MAX_SEQUENCE_LENGTH {
        let upper = max_code_point(len).unwrap();
        for cp in [lower, lower + (upper - lower) / 2, upper - 1] {
            let mut buf = [0u8; MAX_SEQUENCE_LENGTH];
            assert_eq!(encode_code_point(cp, &mut buf), Some(len), "cp {:#x}", cp);
            assert_eq!(decode_sequence_length(&buf), Some(len));
            assert_eq!(decode_code_point(&buf[..len]), Some((cp, len)));
        }
        lower = upper;
    }
    assert_eq!(required_sequence_length(INVALID_CODE_POINT), None);
}

#[test]
fn test_value_sequences_round_trip() {
    let cps = [0, 0x7F, 0x80, 0x7FF, 0x800, 0xFFFF, 0x1F_FFFF, 0x3FF_FFFF, 0x7FFF_FFFE];
    let needed = encoding_bytes_required(&cps).unwrap();
    let mut buf = vec![0u8; needed];
    assert_eq!(encode_code_points(&cps, &mut buf), Some(needed));

    let mut back = [0u32; 9];
    assert_eq!(decode_code_points(&buf, &mut back), Some(needed));
    assert_eq!(back, cps);
}

#[test]
fn test_framed_blocks_iterate_in_order() {
    let mut rng = seeded_rng(11);
    let blocks: Vec<Vec<u8>> = [1usize, 5, 127, 128, 2000, 3]
        .iter()
        .map(|len| random_bytes(&mut rng, *len))
        .collect();

    let mut buf = vec![0u8; 4096];
    let mut pos = 0;
    for block in &blocks {
        pos += store_data_with_size(block, &mut buf[pos..]).unwrap();
    }

    let walked: Vec<&[u8]> = for_each_data_with_size(&buf[..pos]).collect();
    assert_eq!(walked.len(), blocks.len());
    for (got, want) in walked.iter().zip(&blocks) {
        assert_eq!(got, want);
    }

    let mut rest = &buf[..pos];
    for block in &blocks {
        assert_eq!(get_data_with_size(rest), Some(&block[..]));
        rest = &rest[skip_data_with_size(rest)..];
    }
    assert!(rest.is_empty());
}

proptest! {
    #[test]
    fn prop_size_codes_round_trip(cp in 0u32..INVALID_CODE_POINT) {
        let mut buf = [0u8; MAX_SEQUENCE_LENGTH];
        let len = encode_code_point(cp, &mut buf).unwrap();
        prop_assert_eq!(Some(len), required_sequence_length(cp));
        prop_assert_eq!(decode_code_point(&buf), Some((cp, len)));
    }

    #[test]
    fn prop_frames_round_trip(data in prop::collection::vec(any::<u8>(), 1..600)) {
        let mut buf = vec![0u8; data.len() + MAX_SEQUENCE_LENGTH];
        let len = store_data_with_size(&data, &mut buf).unwrap();
        prop_assert_eq!(skip_data_with_size(&buf), len);
        prop_assert_eq!(get_data_with_size(&buf), Some(&data[..]));
    }
}
