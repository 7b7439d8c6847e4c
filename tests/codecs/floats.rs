//! Float decomposition through the public API and the element codec.

use proptest::prelude::*;
use spool::float::{self, compose, decompose};
use spool::{encode_all, Element};

#[test]
fn test_special_values_use_reserved_codes() {
    assert_eq!(decompose(0.0f64), (0, float::POSITIVE_ZERO));
    assert_eq!(decompose(-0.0f64), (0, float::NEGATIVE_ZERO));
    assert_eq!(decompose(f64::INFINITY), (0, float::POSITIVE_INFINITY));
    assert_eq!(decompose(f32::NEG_INFINITY), (0, float::NEGATIVE_INFINITY as i16));
    assert_eq!(decompose(f64::NAN).1, float::POSITIVE_NAN);
    assert_eq!(decompose(-f64::NAN).1, float::NEGATIVE_NAN);
}

#[test]
fn test_finite_values_never_use_zero_fraction() {
    for x in [1.0f64, -1.0, 0.5, f64::MIN_POSITIVE, f64::MAX, 5e-324] {
        assert_ne!(decompose(x).0, 0, "{}", x);
    }
}

#[test]
fn test_nan_keeps_sign() {
    let (fraction, exponent) = decompose(-f32::NAN);
    let back: f32 = compose(fraction, exponent);
    assert!(back.is_nan());
    assert!(back.is_sign_negative());
}

#[test]
fn test_unknown_code_composes_to_nan() {
    let back: f64 = compose(0, 42);
    assert!(back.is_nan());
}

#[test]
fn test_hostile_exponents_saturate() {
    let huge: f64 = compose(1 << 63, i32::MAX);
    assert_eq!(huge, f64::INFINITY);
    let tiny: f64 = compose(1 << 63, i32::MIN);
    assert_eq!(tiny, 0.0);
}

#[test]
fn test_element_bytes_decode_back() {
    let values = [f64::MIN_POSITIVE / 4.0, -123.456, 1e-310];
    let bytes = encode_all(&values);
    for (value, chunk) in values.iter().zip(bytes.chunks_exact(f64::WIRE_SIZE)) {
        assert_eq!(f64::decode(chunk).map(f64::to_bits), Some(value.to_bits()));
    }
}

proptest! {
    #[test]
    fn prop_f64_bits_survive(bits in any::<u64>()) {
        let x = f64::from_bits(bits);
        let (fraction, exponent) = decompose(x);
        let back: f64 = compose(fraction, exponent);
        if x.is_nan() {
            prop_assert!(back.is_nan());
            prop_assert_eq!(back.is_sign_negative(), x.is_sign_negative());
        } else {
            prop_assert_eq!(back.to_bits(), bits);
        }
    }

    #[test]
    fn prop_f32_bits_survive(bits in any::<u32>()) {
        let x = f32::from_bits(bits);
        let back: f32 = compose(decompose(x).0, decompose(x).1);
        if !x.is_nan() {
            prop_assert_eq!(back.to_bits(), bits);
        }
    }
}
