//! Element wire codec.
//!
//! Every value the fast backend moves is an [`Element`]: a fixed-size type
//! with a native-layout encoding.
//!
//! | type              | wire size | layout                                 |
//! |-------------------|-----------|----------------------------------------|
//! | `bool`            | 1         | `0` or `1`, anything else is rejected  |
//! | `u8` / `i8`       | 1         | raw byte                               |
//! | 16..128-bit ints  | 2..16     | native endian                          |
//! | `usize` / `isize` | 8         | native endian 64-bit                   |
//! | `char`            | 4         | native endian scalar value             |
//! | `f32`             | 6         | `u32` fraction, `i16` exponent         |
//! | `f64`             | 12        | `u64` fraction, `i32` exponent         |
//!
//! Floats go through [`spool_core::float`] so their value survives hosts
//! with different float layouts.
//!
//! Textual backends work on [`PortableValue`] instead of wire bytes: every
//! element converts to and from one of four host-independent shapes.

use byteorder::{ByteOrder, NativeEndian};
use spool_core::float::{compose, decompose};

/// Wire size of every collection or string length prefix.
pub const SIZE_WIRE_SIZE: usize = 8;

/// Shape of an element's [`PortableValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortableKind {
    /// `bool`
    Bool,
    /// Unsigned integers and `char`
    Unsigned,
    /// Signed integers
    Signed,
    /// `f32` / `f64` as their decomposed pair
    Float,
}

/// Host-independent value of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortableValue {
    /// A truth value.
    Bool(bool),
    /// Any unsigned integer or `char` scalar value.
    Unsigned(u128),
    /// Any signed integer.
    Signed(i128),
    /// A float as its decomposed (fraction, exponent) pair.
    Float {
        /// Packed mantissa and sign
        fraction: u64,
        /// Binary exponent or special-value code
        exponent: i32,
    },
}

/// A fixed-size value the backends can write and read.
pub trait Element: Copy + Default + 'static {
    /// Encoded size in bytes.
    const WIRE_SIZE: usize;

    /// Shape of this type's portable value.
    const PORTABLE_KIND: PortableKind;

    /// Encodes `self` into `out`, which is exactly `WIRE_SIZE` bytes long.
    fn encode(&self, out: &mut [u8]);

    /// Decodes a value from exactly `WIRE_SIZE` bytes.
    ///
    /// Returns `None` when the bytes are not a valid encoding.
    fn decode(bytes: &[u8]) -> Option<Self>;

    /// Host-independent value of `self`.
    fn to_portable(&self) -> PortableValue;

    /// Rebuilds a value, or `None` when `value` has the wrong shape or
    /// does not fit the type.
    fn from_portable(value: PortableValue) -> Option<Self>;
}

impl Element for bool {
    const WIRE_SIZE: usize = 1;
    const PORTABLE_KIND: PortableKind = PortableKind::Bool;

    fn encode(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        match bytes[0] {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    fn to_portable(&self) -> PortableValue {
        PortableValue::Bool(*self)
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        match value {
            PortableValue::Bool(value) => Some(value),
            _ => None,
        }
    }
}

impl Element for u8 {
    const WIRE_SIZE: usize = 1;
    const PORTABLE_KIND: PortableKind = PortableKind::Unsigned;

    fn encode(&self, out: &mut [u8]) {
        out[0] = *self;
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes[0])
    }

    fn to_portable(&self) -> PortableValue {
        PortableValue::Unsigned(u128::from(*self))
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        unsigned_from_portable(value)
    }
}

impl Element for i8 {
    const WIRE_SIZE: usize = 1;
    const PORTABLE_KIND: PortableKind = PortableKind::Signed;

    fn encode(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes[0] as i8)
    }

    fn to_portable(&self) -> PortableValue {
        PortableValue::Signed(i128::from(*self))
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        signed_from_portable(value)
    }
}

fn unsigned_from_portable<T: TryFrom<u128>>(value: PortableValue) -> Option<T> {
    match value {
        PortableValue::Unsigned(value) => T::try_from(value).ok(),
        _ => None,
    }
}

fn signed_from_portable<T: TryFrom<i128>>(value: PortableValue) -> Option<T> {
    match value {
        PortableValue::Signed(value) => T::try_from(value).ok(),
        _ => None,
    }
}

macro_rules! impl_int_element {
    ($($ty:ty => $size:literal, $write:ident, $read:ident, $kind:ident, $wide:ty, $from:ident;)+) => {
        $(
            impl Element for $ty {
                const WIRE_SIZE: usize = $size;
                const PORTABLE_KIND: PortableKind = PortableKind::$kind;

                fn encode(&self, out: &mut [u8]) {
                    NativeEndian::$write(out, *self);
                }

                fn decode(bytes: &[u8]) -> Option<Self> {
                    Some(NativeEndian::$read(bytes))
                }

                fn to_portable(&self) -> PortableValue {
                    PortableValue::$kind(<$wide>::from(*self))
                }

                fn from_portable(value: PortableValue) -> Option<Self> {
                    $from(value)
                }
            }
        )+
    };
}

impl_int_element! {
    u16 => 2, write_u16, read_u16, Unsigned, u128, unsigned_from_portable;
    i16 => 2, write_i16, read_i16, Signed, i128, signed_from_portable;
    u32 => 4, write_u32, read_u32, Unsigned, u128, unsigned_from_portable;
    i32 => 4, write_i32, read_i32, Signed, i128, signed_from_portable;
    u64 => 8, write_u64, read_u64, Unsigned, u128, unsigned_from_portable;
    i64 => 8, write_i64, read_i64, Signed, i128, signed_from_portable;
    u128 => 16, write_u128, read_u128, Unsigned, u128, unsigned_from_portable;
    i128 => 16, write_i128, read_i128, Signed, i128, signed_from_portable;
}

impl Element for usize {
    const WIRE_SIZE: usize = 8;
    const PORTABLE_KIND: PortableKind = PortableKind::Unsigned;

    fn encode(&self, out: &mut [u8]) {
        NativeEndian::write_u64(out, *self as u64);
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        usize::try_from(NativeEndian::read_u64(bytes)).ok()
    }

    fn to_portable(&self) -> PortableValue {
        PortableValue::Unsigned(*self as u128)
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        unsigned_from_portable(value)
    }
}

impl Element for isize {
    const WIRE_SIZE: usize = 8;
    const PORTABLE_KIND: PortableKind = PortableKind::Signed;

    fn encode(&self, out: &mut [u8]) {
        NativeEndian::write_i64(out, *self as i64);
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        isize::try_from(NativeEndian::read_i64(bytes)).ok()
    }

    fn to_portable(&self) -> PortableValue {
        PortableValue::Signed(*self as i128)
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        signed_from_portable(value)
    }
}

impl Element for char {
    const WIRE_SIZE: usize = 4;
    const PORTABLE_KIND: PortableKind = PortableKind::Unsigned;

    fn encode(&self, out: &mut [u8]) {
        NativeEndian::write_u32(out, u32::from(*self));
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        char::from_u32(NativeEndian::read_u32(bytes))
    }

    fn to_portable(&self) -> PortableValue {
        PortableValue::Unsigned(u128::from(u32::from(*self)))
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        unsigned_from_portable::<u32>(value).and_then(char::from_u32)
    }
}

impl Element for f32 {
    const WIRE_SIZE: usize = 6;
    const PORTABLE_KIND: PortableKind = PortableKind::Float;

    fn encode(&self, out: &mut [u8]) {
        let (fraction, exponent) = decompose(*self);
        NativeEndian::write_u32(&mut out[..4], fraction);
        NativeEndian::write_i16(&mut out[4..6], exponent);
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let fraction = NativeEndian::read_u32(&bytes[..4]);
        let exponent = NativeEndian::read_i16(&bytes[4..6]);
        Some(compose(fraction, exponent))
    }

    fn to_portable(&self) -> PortableValue {
        let (fraction, exponent) = decompose(*self);
        PortableValue::Float {
            fraction: u64::from(fraction),
            exponent: i32::from(exponent),
        }
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        match value {
            PortableValue::Float { fraction, exponent } => Some(compose(
                u32::try_from(fraction).ok()?,
                i16::try_from(exponent).ok()?,
            )),
            _ => None,
        }
    }
}

impl Element for f64 {
    const WIRE_SIZE: usize = 12;
    const PORTABLE_KIND: PortableKind = PortableKind::Float;

    fn encode(&self, out: &mut [u8]) {
        let (fraction, exponent) = decompose(*self);
        NativeEndian::write_u64(&mut out[..8], fraction);
        NativeEndian::write_i32(&mut out[8..12], exponent);
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let fraction = NativeEndian::read_u64(&bytes[..8]);
        let exponent = NativeEndian::read_i32(&bytes[8..12]);
        Some(compose(fraction, exponent))
    }

    fn to_portable(&self) -> PortableValue {
        let (fraction, exponent) = decompose(*self);
        PortableValue::Float { fraction, exponent }
    }

    fn from_portable(value: PortableValue) -> Option<Self> {
        match value {
            PortableValue::Float { fraction, exponent } => Some(compose(fraction, exponent)),
            _ => None,
        }
    }
}

/// Encodes `values` back to back into a fresh buffer.
pub fn encode_all<T: Element>(values: &[T]) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * T::WIRE_SIZE];
    encode_into(values, &mut out);
    out
}

/// Encodes `values` into the front of `out`, which must hold them all.
pub(crate) fn encode_into<T: Element>(values: &[T], out: &mut [u8]) {
    for (value, slot) in values.iter().zip(out.chunks_exact_mut(T::WIRE_SIZE)) {
        value.encode(slot);
    }
}
