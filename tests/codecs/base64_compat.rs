//! Base64 output checked against the `base64` crate.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use proptest::prelude::*;
use spool::base64 as codec;

use crate::common::{random_bytes, seeded_rng};

#[test]
fn test_known_vectors() {
    for (plain, encoded) in [
        (&b""[..], ""),
        (&b"f"[..], "Zg"),
        (&b"fo"[..], "Zm8"),
        (&b"foo"[..], "Zm9v"),
        (&b"foob"[..], "Zm9vYg"),
        (&b"fooba"[..], "Zm9vYmE"),
        (&b"foobar"[..], "Zm9vYmFy"),
    ] {
        assert_eq!(codec::encode(plain), encoded);
        assert_eq!(codec::decode(encoded).unwrap(), plain);
    }
}

#[test]
fn test_random_blocks_match_reference() {
    let mut rng = seeded_rng(64);
    for len in 0..200 {
        let data = random_bytes(&mut rng, len);
        let ours = codec::encode(&data);
        assert_eq!(ours, STANDARD_NO_PAD.encode(&data));
        assert_eq!(codec::decode(&ours).unwrap(), data);
    }
}

#[test]
fn test_padded_reference_input_decodes() {
    let data = b"padding matters?";
    let padded = STANDARD.encode(data);
    assert!(padded.ends_with('='));
    assert_eq!(codec::decode(&padded).unwrap(), data);
}

#[test]
fn test_invalid_character_is_rejected() {
    let err = codec::decode("Zm9v*mFy").unwrap_err();
    assert!(err.to_string().contains('*'));
}

proptest! {
    #[test]
    fn prop_encode_matches_reference(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let ours = codec::encode(&data);
        prop_assert_eq!(&ours, &STANDARD_NO_PAD.encode(&data));
        prop_assert_eq!(STANDARD_NO_PAD.decode(&ours).unwrap(), data);
    }
}
