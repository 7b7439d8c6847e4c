//! Base64 codec built on the bit-density engine.
//!
//! Uses the standard alphabet (`A-Z a-z 0-9 + /`) and emits no `=` padding:
//! an input of `n` bytes encodes to exactly `ceil(n * 8 / 6)` characters.
//! Trailing `=` characters are tolerated when decoding.

use crate::bits::{
    concentrate_bits, concentrated_bits_length, dissolve_bits, dissolved_bits_length,
};
use thiserror::Error;

const BASE64_BITS: u32 = 6;
const PADDING: u8 = b'=';

/// Base64 decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Base64Error {
    /// A character outside the alphabet was found.
    #[error("Invalid base64 character {ch:?} at position {position}")]
    InvalidCharacter {
        /// Byte offset of the offending character
        position: usize,
        /// The offending character
        ch: char,
    },

    /// The output buffer is smaller than the decoded data.
    #[error("Output buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        have: usize,
    },
}

/// Maps a 6-bit group to its alphabet character.
pub const fn encode_symbol(group: u8) -> u8 {
    match group {
        0..=25 => b'A' + group,
        26..=51 => b'a' + (group - 26),
        52..=61 => b'0' + (group - 52),
        62 => b'+',
        63 => b'/',
        _ => PADDING,
    }
}

/// Maps an alphabet character back to its 6-bit group.
pub const fn decode_symbol(ch: u8) -> Option<u8> {
    match ch {
        b'A'..=b'Z' => Some(ch - b'A'),
        b'a'..=b'z' => Some(ch - b'a' + 26),
        b'0'..=b'9' => Some(ch - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Number of characters produced when encoding `len` bytes.
pub fn encoded_length(len: usize) -> usize {
    dissolved_bits_length(len, BASE64_BITS)
}

/// Number of bytes carried by `len` base64 characters (padding excluded).
pub fn decoded_length(len: usize) -> usize {
    concentrated_bits_length(len, BASE64_BITS)
}

/// Encodes `src` into `dst`, returning the number of characters written.
///
/// Returns `None` when `dst` is shorter than [`encoded_length`].
pub fn encode_into(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    let mut input = src.iter().copied();
    let mut out = 0usize;
    let ok = dissolve_bits(
        || input.next(),
        |group| match dst.get_mut(out) {
            Some(slot) => {
                *slot = encode_symbol(group);
                out += 1;
                true
            }
            None => false,
        },
        BASE64_BITS,
    );
    ok.then_some(out)
}

/// Encodes `src` as a base64 string.
pub fn encode(src: &[u8]) -> String {
    let mut buf = vec![0u8; encoded_length(src.len())];
    let written = encode_into(src, &mut buf).unwrap_or(0);
    buf.truncate(written);
    // Every byte written is drawn from the ASCII alphabet.
    buf.into_iter().map(char::from).collect()
}

fn strip_padding(src: &str) -> &[u8] {
    let bytes = src.as_bytes();
    let end = bytes
        .iter()
        .rposition(|b| *b != PADDING)
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}

/// Decodes base64 `src` into `dst`, returning the number of bytes written.
pub fn decode_into(src: &str, dst: &mut [u8]) -> Result<usize, Base64Error> {
    let symbols = strip_padding(src);
    let needed = decoded_length(symbols.len());
    if dst.len() < needed {
        return Err(Base64Error::BufferTooSmall {
            needed,
            have: dst.len(),
        });
    }

    let mut invalid = None;
    let mut pos = 0usize;
    let mut input = || {
        let ch = *symbols.get(pos)?;
        match decode_symbol(ch) {
            Some(group) => {
                pos += 1;
                Some(group)
            }
            None => {
                invalid = Some(Base64Error::InvalidCharacter {
                    position: pos,
                    ch: char::from(ch),
                });
                None
            }
        }
    };

    let mut out = 0usize;
    concentrate_bits(
        &mut input,
        |byte| match dst.get_mut(out) {
            Some(slot) => {
                *slot = byte;
                out += 1;
                true
            }
            None => false,
        },
        BASE64_BITS,
    );

    match invalid {
        Some(err) => Err(err),
        None => Ok(out),
    }
}

/// Decodes a base64 string into a byte vector.
pub fn decode(src: &str) -> Result<Vec<u8>, Base64Error> {
    let mut buf = vec![0u8; decoded_length(strip_padding(src).len())];
    let written = decode_into(src, &mut buf)?;
    buf.truncate(written);
    Ok(buf)
}
