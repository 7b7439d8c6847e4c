//! Bytes to N-bit groups and back.

use proptest::prelude::*;
use spool::bits::{
    concentrate_to_vec, concentrated_bits_length, dissolve_to_vec, dissolved_bits_length,
};

#[test]
fn test_group_counts_for_every_width() {
    for width in 1..=8u32 {
        let data: Vec<u8> = (0..=255).collect();
        let groups = dissolve_to_vec(&data, width).unwrap();
        assert_eq!(groups.len(), dissolved_bits_length(data.len(), width));
        assert!(groups.iter().all(|g| u32::from(*g) < (1 << width)));
        assert_eq!(concentrated_bits_length(groups.len(), width), data.len());
    }
}

#[test]
fn test_three_bit_layout() {
    let groups = dissolve_to_vec(&[0b1010_1100, 0b0111_0000], 3).unwrap();
    assert_eq!(groups, vec![0b101, 0b011, 0b000, 0b111, 0b000, 0b000]);
}

#[test]
fn test_unsupported_widths() {
    assert_eq!(dissolve_to_vec(b"abc", 0), None);
    assert_eq!(concentrate_to_vec(b"abc", 9), None);
}

proptest! {
    #[test]
    fn prop_concentrate_inverts_dissolve(
        data in prop::collection::vec(any::<u8>(), 0..256),
        width in 1u32..=8,
    ) {
        let groups = dissolve_to_vec(&data, width).unwrap();
        prop_assert_eq!(concentrate_to_vec(&groups, width).unwrap(), data);
    }
}
