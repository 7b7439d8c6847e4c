//! Portable floating-point decomposition
//!
//! Floats cross the wire as an explicit `(fraction, exponent)` integer pair
//! instead of a raw bit copy, so hosts with different native float layouts
//! agree on the value.
//!
//! ## Encoding
//!
//! ```text
//! special values (fraction = 0):
//!   exponent 0 = +0    1 = -0
//!   exponent 2 = +inf  3 = -inf
//!   exponent 4 = +NaN  5 = -NaN
//!
//! finite non-zero values:
//!   exponent = e where |x| = m * 2^e, m in [0.5, 1)   (frexp)
//!   fraction = (2m scaled so its leading one sits in the
//!               second-highest bit) << 1 | sign
//! ```
//!
//! The leading one of the mantissa is kept, so a finite non-zero value never
//! produces a zero fraction and cannot collide with the reserved codes.

/// Exponent code for `+0.0`.
pub const POSITIVE_ZERO: i32 = 0;
/// Exponent code for `-0.0`.
pub const NEGATIVE_ZERO: i32 = 1;
/// Exponent code for `+inf`.
pub const POSITIVE_INFINITY: i32 = 2;
/// Exponent code for `-inf`.
pub const NEGATIVE_INFINITY: i32 = 3;
/// Exponent code for a NaN with the sign bit clear.
pub const POSITIVE_NAN: i32 = 4;
/// Exponent code for a NaN with the sign bit set.
pub const NEGATIVE_NAN: i32 = 5;

/// Floating-point types with a portable integer-pair representation.
pub trait Decompose: Copy {
    /// Unsigned integer holding the packed mantissa and sign.
    type Fraction: Copy + Eq + std::fmt::Debug;
    /// Signed integer holding the binary exponent or a reserved code.
    type Exponent: Copy + Eq + std::fmt::Debug;

    /// Splits `self` into its portable pair.
    fn decompose(self) -> (Self::Fraction, Self::Exponent);

    /// Rebuilds a value from a portable pair.
    fn compose(fraction: Self::Fraction, exponent: Self::Exponent) -> Self;
}

/// Splits `value` into its portable `(fraction, exponent)` pair.
pub fn decompose<F: Decompose>(value: F) -> (F::Fraction, F::Exponent) {
    value.decompose()
}

/// Rebuilds a float from a portable `(fraction, exponent)` pair.
pub fn compose<F: Decompose>(fraction: F::Fraction, exponent: F::Exponent) -> F {
    F::compose(fraction, exponent)
}

macro_rules! impl_decompose {
    (
        $float:ty,
        bits = $bits:ty,
        exponent = $exp:ty,
        mantissa_bits = $mant:literal,
        bias = $bias:literal,
        scale_step = $step:literal
    ) => {
        impl Decompose for $float {
            type Fraction = $bits;
            type Exponent = $exp;

            fn decompose(self) -> ($bits, $exp) {
                const WIDTH: u32 = <$bits>::BITS;
                const MANT_MASK: $bits = (1 << $mant) - 1;
                const EXP_MASK: $bits = (1 << (WIDTH - 1 - $mant)) - 1;

                let negative = self.is_sign_negative();
                let code = |pos: i32, neg: i32| (0, (if negative { neg } else { pos }) as $exp);
                if self == 0.0 {
                    return code(POSITIVE_ZERO, NEGATIVE_ZERO);
                }
                if self.is_infinite() {
                    return code(POSITIVE_INFINITY, NEGATIVE_INFINITY);
                }
                if self.is_nan() {
                    return code(POSITIVE_NAN, NEGATIVE_NAN);
                }

                let raw = self.to_bits();
                let biased = ((raw >> $mant) & EXP_MASK) as i32;
                let mantissa = raw & MANT_MASK;

                let (significand, unbiased) = if biased == 0 {
                    // Subnormal: renormalize so the highest set bit becomes the leading one.
                    let top = (WIDTH - 1 - mantissa.leading_zeros()) as i32;
                    (mantissa << ($mant - top), top - ($bias - 1 + $mant))
                } else {
                    (mantissa | (1 << $mant), biased - $bias)
                };

                let packed = significand << (WIDTH - 2 - $mant);
                let fraction = (packed << 1) | <$bits>::from(negative);
                (fraction, (unbiased + 1) as $exp)
            }

            fn compose(fraction: $bits, exponent: $exp) -> $float {
                const WIDTH: u32 = <$bits>::BITS;

                if fraction == 0 {
                    return match i32::from(exponent) {
                        POSITIVE_ZERO => 0.0,
                        NEGATIVE_ZERO => -0.0,
                        POSITIVE_INFINITY => <$float>::INFINITY,
                        NEGATIVE_INFINITY => <$float>::NEG_INFINITY,
                        NEGATIVE_NAN => -<$float>::NAN,
                        _ => <$float>::NAN,
                    };
                }

                fn pow2(e: i64) -> $float {
                    <$float>::from_bits(((e + $bias) as $bits) << $mant)
                }

                let negative = fraction & 1 == 1;
                let mut magnitude = (fraction >> 1) as $float;
                let mut e = i64::from(exponent) - i64::from(WIDTH - 1);
                while e > $step && magnitude.is_finite() {
                    magnitude *= pow2($step);
                    e -= $step;
                }
                while e < -$step && magnitude != 0.0 {
                    magnitude *= pow2(-$step);
                    e += $step;
                }
                if e.abs() <= $step {
                    magnitude *= pow2(e);
                }
                if negative {
                    -magnitude
                } else {
                    magnitude
                }
            }
        }
    };
}

impl_decompose!(
    f32,
    bits = u32,
    exponent = i16,
    mantissa_bits = 23,
    bias = 127,
    scale_step = 100
);

impl_decompose!(
    f64,
    bits = u64,
    exponent = i32,
    mantissa_bits = 52,
    bias = 1023,
    scale_step = 1000
);
