//! Multi-byte size codes
//!
//! An extended UTF-8 scheme storing values below `0x7FFF_FFFF` in 1 to 6
//! bytes. Used as the size prefix of framed data blocks.
//!
//! ```text
//! len  head       tail bytes     max value
//!  1   0xxxxxxx   -              0x0000_007F (exclusive)
//!  2   110xxxxx   10xxxxxx       0x0000_07FF
//!  3   1110xxxx   10xxxxxx x2    0x0000_FFFF
//!  4   11110xxx   10xxxxxx x3    0x001F_FFFF
//!  5   111110xx   10xxxxxx x4    0x03FF_FFFF
//!  6   1111110x   10xxxxxx x5    0x7FFF_FFFF
//! ```
//!
//! The bound is exclusive: a value equal to a length's maximum needs the next
//! longer sequence. `0x7FFF_FFFF` itself marks an invalid code point.

/// Longest sequence in bytes.
pub const MAX_SEQUENCE_LENGTH: usize = 6;

/// Reserved value that no sequence can carry.
pub const INVALID_CODE_POINT: u32 = 0x7FFF_FFFF;

/// Byte written by [`encode_nil`]; never a valid head byte.
pub const NIL_BYTE: u8 = 0xFF;

const TAIL_CODE_MASK: u8 = 0xC0;
const TAIL_CODE: u8 = 0x80;
const TAIL_DATA_MASK: u8 = 0x3F;
const TAIL_BITS: usize = 6;

/// Upper bound for values of a `len`-byte sequence.
pub const fn max_code_point(len: usize) -> Option<u32> {
    match len {
        1 => Some(0x0000_007F),
        2 => Some(0x0000_07FF),
        3 => Some(0x0000_FFFF),
        4 => Some(0x001F_FFFF),
        5 => Some(0x03FF_FFFF),
        6 => Some(0x7FFF_FFFF),
        _ => None,
    }
}

const fn head_code_mask(len: usize) -> u8 {
    match len {
        1 => 0x80,
        2 => 0xE0,
        3 => 0xF0,
        4 => 0xF8,
        5 => 0xFC,
        _ => 0xFE,
    }
}

#[inline]
const fn head_code(len: usize) -> u8 {
    head_code_mask(len) << 1
}

#[inline]
const fn head_data_mask(len: usize) -> u8 {
    !head_code_mask(len)
}

#[inline]
const fn head_shift(len: usize) -> usize {
    (len - 1) * TAIL_BITS
}

/// Returns true when `byte` starts a sequence of exactly `len` bytes.
pub const fn is_valid_head_byte(byte: u8, len: usize) -> bool {
    len >= 1 && len <= MAX_SEQUENCE_LENGTH && byte & head_code_mask(len) == head_code(len)
}

/// Returns true when `byte` is a continuation byte.
pub const fn is_valid_tail_byte(byte: u8) -> bool {
    byte & TAIL_CODE_MASK == TAIL_CODE
}

/// Shortest sequence length able to carry `cp`, or `None` if none can.
pub fn required_sequence_length(cp: u32) -> Option<usize> {
    (1..=MAX_SEQUENCE_LENGTH).find(|len| max_code_point(*len).is_some_and(|max| max > cp))
}

/// Sequence length announced by the head byte of `seq`.
pub fn decode_sequence_length(seq: &[u8]) -> Option<usize> {
    let head = *seq.first()?;
    (1..=MAX_SEQUENCE_LENGTH).find(|len| is_valid_head_byte(head, *len))
}

/// Returns true when `seq` starts with a complete, well-formed sequence.
pub fn is_valid_encoding(seq: &[u8]) -> bool {
    match decode_sequence_length(seq) {
        Some(len) if len <= seq.len() => seq[1..len].iter().all(|b| is_valid_tail_byte(*b)),
        _ => false,
    }
}

/// Encodes `cp` into the start of `dst`, returning the sequence length.
///
/// Returns `None` when `cp` is out of range or `dst` is too short; `dst` is
/// left untouched in that case.
pub fn encode_code_point(cp: u32, dst: &mut [u8]) -> Option<usize> {
    let len = required_sequence_length(cp)?;
    let seq = dst.get_mut(..len)?;

    seq[0] = head_code(len) | (head_data_mask(len) & (cp >> head_shift(len)) as u8);
    for (idx, slot) in seq.iter_mut().enumerate().skip(1) {
        let shift = (len - idx - 1) * TAIL_BITS;
        *slot = TAIL_CODE | (TAIL_DATA_MASK & (cp >> shift) as u8);
    }
    Some(len)
}

/// Encodes `cp` into a fresh vector.
pub fn encode_code_point_to_vec(cp: u32) -> Option<Vec<u8>> {
    let mut buf = [0u8; MAX_SEQUENCE_LENGTH];
    let len = encode_code_point(cp, &mut buf)?;
    Some(buf[..len].to_vec())
}

/// Writes the nil marker, a byte no decoder accepts as a head.
pub fn encode_nil(dst: &mut [u8]) -> Option<usize> {
    let slot = dst.first_mut()?;
    *slot = NIL_BYTE;
    Some(1)
}

/// Decodes the sequence at the start of `src`, returning the value and the
/// number of bytes it occupied.
pub fn decode_code_point(src: &[u8]) -> Option<(u32, usize)> {
    let len = decode_sequence_length(src)?;
    let seq = src.get(..len)?;

    let mut cp = u32::from(seq[0] & head_data_mask(len)) << head_shift(len);
    for (idx, byte) in seq.iter().enumerate().skip(1) {
        if !is_valid_tail_byte(*byte) {
            return None;
        }
        let shift = (len - idx - 1) * TAIL_BITS;
        cp |= u32::from(byte & TAIL_DATA_MASK) << shift;
    }
    (cp != INVALID_CODE_POINT).then_some((cp, len))
}

/// Total bytes needed to encode every value in `cps`.
pub fn encoding_bytes_required(cps: &[u32]) -> Option<usize> {
    cps.iter()
        .map(|cp| required_sequence_length(*cp))
        .sum::<Option<usize>>()
}

/// Number of sequences whose heads chain through `bytes`.
///
/// Only head bytes are inspected. Returns `None` on a bad head or when the
/// last sequence runs past the end.
pub fn decoding_code_points_required(bytes: &[u8]) -> Option<usize> {
    let mut count = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        pos += decode_sequence_length(&bytes[pos..])?;
        count += 1;
    }
    (pos == bytes.len()).then_some(count)
}

/// Encodes every value of `cps` back to back into `dst`.
///
/// Returns the number of bytes written.
pub fn encode_code_points(cps: &[u32], dst: &mut [u8]) -> Option<usize> {
    let mut pos = 0;
    for cp in cps {
        pos += encode_code_point(*cp, dst.get_mut(pos..)?)?;
    }
    Some(pos)
}

/// Decodes `out.len()` values from the start of `src`.
///
/// Returns the number of bytes consumed.
pub fn decode_code_points(src: &[u8], out: &mut [u32]) -> Option<usize> {
    let mut pos = 0;
    for slot in out.iter_mut() {
        let (cp, len) = decode_code_point(src.get(pos..)?)?;
        *slot = cp;
        pos += len;
    }
    Some(pos)
}
