//! Error types for spool
//!
//! Failures are reported on two levels:
//!
//! - [`SerializationErrors`] and [`DeserializationErrors`] are small bitsets
//!   returned by every sink, source and backend step. Sub-steps OR their
//!   results together, so accumulating never loses a bit, and drivers decide
//!   between retry and abort with `has_at_most`.
//! - [`Error`] covers whole operations (chunked transfers, config loading)
//!   and is built with `thiserror` like the rest of the crate family.

use crate::base64::Base64Error;
use std::fmt;
use std::io;
use std::ops::{BitOr, BitOrAssign};
use thiserror::Error;

/// Result type alias for whole-operation APIs
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! error_bitset {
    (
        $(#[$set_meta:meta])*
        pub struct $set:ident;

        $(#[$code_meta:meta])*
        pub enum $code:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $bit:literal => $msg:literal,
            )+
        }
    ) => {
        $(#[$code_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
        #[repr(u16)]
        pub enum $code {
            $(
                $(#[$variant_meta])*
                #[error($msg)]
                $variant = 1 << $bit,
            )+
        }

        impl $code {
            /// Every code, in bit order.
            pub const ALL: &'static [$code] = &[$($code::$variant),+];

            #[inline]
            const fn bit(self) -> u16 {
                self as u16
            }
        }

        $(#[$set_meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $set(u16);

        impl $set {
            /// The empty set (success).
            pub const fn none() -> Self {
                Self(0)
            }

            /// A set holding exactly one code.
            pub const fn from_code(code: $code) -> Self {
                Self(code.bit())
            }

            /// True when no error bit is set.
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// True when `code` is set.
            pub const fn has(self, code: $code) -> bool {
                self.0 & code.bit() != 0
            }

            /// True when the set is empty or holds only `code`.
            pub const fn has_at_most(self, code: $code) -> bool {
                self.0 & !code.bit() == 0
            }

            /// Sets `code`.
            pub fn set(&mut self, code: $code) {
                self.0 |= code.bit();
            }

            /// Clears `code`, leaving every other bit untouched.
            pub fn clear(&mut self, code: $code) {
                self.0 &= !code.bit();
            }

            /// Returns the set without `code`.
            pub const fn without(self, code: $code) -> Self {
                Self(self.0 & !code.bit())
            }

            /// Raw bit representation.
            pub const fn bits(self) -> u16 {
                self.0
            }

            /// Iterates over the codes that are set, in bit order.
            pub fn codes(self) -> impl Iterator<Item = $code> {
                $code::ALL.iter().copied().filter(move |c| self.has(*c))
            }

            /// `Ok(())` when empty, the set itself otherwise.
            pub fn into_result(self) -> std::result::Result<(), Self> {
                if self.is_empty() {
                    Ok(())
                } else {
                    Err(self)
                }
            }
        }

        impl From<$code> for $set {
            fn from(code: $code) -> Self {
                Self::from_code(code)
            }
        }

        impl BitOr for $set {
            type Output = $set;

            fn bitor(self, rhs: $set) -> $set {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOr<$code> for $set {
            type Output = $set;

            fn bitor(self, rhs: $code) -> $set {
                Self(self.0 | rhs.bit())
            }
        }

        impl BitOr for $code {
            type Output = $set;

            fn bitor(self, rhs: $code) -> $set {
                $set(self.bit() | rhs.bit())
            }
        }

        impl BitOrAssign for $set {
            fn bitor_assign(&mut self, rhs: $set) {
                self.0 |= rhs.0;
            }
        }

        impl BitOrAssign<$code> for $set {
            fn bitor_assign(&mut self, rhs: $code) {
                self.0 |= rhs.bit();
            }
        }

        impl fmt::Debug for $set {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.codes()).finish()
            }
        }

        impl fmt::Display for $set {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_empty() {
                    return f.write_str("no errors");
                }
                for (idx, code) in self.codes().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", code)?;
                }
                Ok(())
            }
        }

        impl std::error::Error for $set {}
    };
}

error_bitset! {
    /// Combinable set of serialization failures.
    ///
    /// An empty set means success. `IncompleteWrite` and `TooMuchData` are
    /// recoverable in a fragmented transfer; everything else aborts it.
    pub struct SerializationErrors;

    /// A single serialization failure.
    pub enum SerializationErrorCode {
        /// The sink cannot take any more writes until it is flushed or reset.
        TooMuchData = 0 => "too much data for the sink",
        /// The sink accepted only a prefix of the requested data.
        IncompleteWrite = 1 => "incomplete write",
        /// The underlying medium failed.
        DataSinkError = 2 => "data sink error",
        /// The backend could not encode a value.
        BackendError = 3 => "serializer backend error",
        /// A transaction handle was closed out of LIFO order.
        InvalidTransaction = 4 => "invalid transaction handle",
    }
}

error_bitset! {
    /// Combinable set of deserialization failures.
    ///
    /// `NotEnoughData` may be transient (more bytes can arrive later) and
    /// `IncompleteRead` reports partial progress; the rest are hard errors.
    pub struct DeserializationErrors;

    /// A single deserialization failure.
    pub enum DeserializationErrorCode {
        /// Fewer bytes are buffered than a single element needs.
        NotEnoughData = 0 => "not enough data",
        /// Only a clamped number of whole elements was read.
        IncompleteRead = 1 => "incomplete read",
        /// The data is well-formed but not what was expected here.
        UnexpectedData = 2 => "unexpected data",
        /// The data cannot be decoded.
        InvalidFormat = 3 => "invalid format",
        /// A list or struct announced fewer elements than required.
        MissingElement = 4 => "missing element",
        /// A list or struct announced more elements than fit.
        ExcessElement = 5 => "excess element",
        /// The underlying medium failed.
        DataSourceError = 6 => "data source error",
        /// The backend could not decode a value.
        BackendError = 7 => "deserializer backend error",
    }
}

/// Whole-operation error type
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on a stream or config file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization step failed with a non-recoverable error set
    #[error("Serialization failed: {0}")]
    Serialization(SerializationErrors),

    /// Deserialization step failed with a non-recoverable error set
    #[error("Deserialization failed: {0}")]
    Deserialization(DeserializationErrors),

    /// Base64 text could not be decoded
    #[error("Base64 error: {0}")]
    Base64(#[from] Base64Error),

    /// Configuration was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A freshly cleared chunk still cannot hold a single fragment
    #[error("Chunk of {chunk_size} bytes cannot hold a fragment header and one element")]
    ChunkTooSmall {
        /// Configured chunk size in bytes
        chunk_size: usize,
    },

    /// Operation is not valid in the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<SerializationErrors> for Error {
    fn from(errors: SerializationErrors) -> Self {
        Error::Serialization(errors)
    }
}

impl From<DeserializationErrors> for Error {
    fn from(errors: DeserializationErrors) -> Self {
        Error::Deserialization(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Ser = SerializationErrorCode;
    type De = DeserializationErrorCode;

    #[test]
    fn test_empty_set_is_success() {
        let errors = SerializationErrors::none();
        assert!(errors.is_empty());
        assert!(errors.has_at_most(Ser::IncompleteWrite));
        assert_eq!(errors.into_result(), Ok(()));
        assert_eq!(errors.to_string(), "no errors");
    }

    #[test]
    fn test_or_accumulates_bits() {
        let mut errors = SerializationErrors::none();
        errors |= Ser::IncompleteWrite;
        errors |= SerializationErrors::from(Ser::DataSinkError);

        assert!(errors.has(Ser::IncompleteWrite));
        assert!(errors.has(Ser::DataSinkError));
        assert!(!errors.has(Ser::TooMuchData));
        assert!(!errors.has_at_most(Ser::IncompleteWrite));
    }

    #[test]
    fn test_or_is_associative() {
        let a = SerializationErrors::from(Ser::TooMuchData);
        let b = SerializationErrors::from(Ser::IncompleteWrite);
        let c = SerializationErrors::from(Ser::BackendError);
        assert_eq!((a | b) | c, a | (b | c));
        assert_eq!(a | a, a);
    }

    #[test]
    fn test_has_at_most_single_code() {
        let errors = DeserializationErrors::from(De::IncompleteRead);
        assert!(errors.has_at_most(De::IncompleteRead));
        assert!(!errors.has_at_most(De::NotEnoughData));

        let both = De::IncompleteRead | De::NotEnoughData;
        assert!(!both.has_at_most(De::IncompleteRead));
        assert!(both.without(De::NotEnoughData).has_at_most(De::IncompleteRead));
    }

    #[test]
    fn test_clear_keeps_other_bits() {
        let mut errors = De::InvalidFormat | De::UnexpectedData;
        errors.clear(De::InvalidFormat);
        assert!(!errors.has(De::InvalidFormat));
        assert!(errors.has(De::UnexpectedData));
    }

    #[test]
    fn test_codes_in_bit_order() {
        let errors = Ser::InvalidTransaction | Ser::TooMuchData;
        let codes: Vec<_> = errors.codes().collect();
        assert_eq!(codes, vec![Ser::TooMuchData, Ser::InvalidTransaction]);
    }

    #[test]
    fn test_display_lists_codes() {
        let errors = Ser::TooMuchData | Ser::IncompleteWrite;
        let msg = errors.to_string();
        assert!(msg.contains("too much data"));
        assert!(msg.contains("incomplete write"));
        assert_eq!(format!("{:?}", errors), "{TooMuchData, IncompleteWrite}");
    }

    #[test]
    fn test_codes_have_distinct_bits() {
        let mut seen = 0u16;
        for code in DeserializationErrorCode::ALL {
            let bits = DeserializationErrors::from(*code).bits();
            assert_eq!(bits.count_ones(), 1);
            assert_eq!(seen & bits, 0);
            seen |= bits;
        }
    }

    #[test]
    fn test_error_from_bitsets() {
        let err: Error = SerializationErrors::from(Ser::DataSinkError).into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("data sink error"));

        let err: Error = DeserializationErrors::from(De::InvalidFormat).into();
        assert!(err.to_string().contains("Deserialization failed"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_chunk_too_small_display() {
        let err = Error::ChunkTooSmall { chunk_size: 12 };
        assert!(err.to_string().contains("12 bytes"));
    }
}
