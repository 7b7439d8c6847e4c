//! Bit-density engine
//!
//! Converts a stream of 8-bit bytes into fixed-width groups of `bits` bits
//! (1..=8) and back. Base64 is this engine at `bits = 6`.
//!
//! ## Layout
//!
//! Groups are taken from the most significant end of each byte first:
//!
//! ```text
//! bytes:  [1010 1100][0111 ....]
//! bits=3:  101 011 000 111 ...
//! ```
//!
//! When dissolving runs out of input with bits left over, the last group is
//! zero-padded on its low end. Concentrating silently drops a trailing
//! partial byte, so callers must know the intended output length up front
//! (see [`concentrated_bits_length`]).

/// Number of bits in a byte.
pub const BYTE_BITS: u32 = 8;

/// Returns true when `bits` is a supported group width.
#[inline]
pub const fn is_valid_width(bits: u32) -> bool {
    bits >= 1 && bits <= BYTE_BITS
}

#[inline]
const fn group_mask(bits: u32) -> u16 {
    (1u16 << bits) - 1
}

/// Number of `bits`-wide groups needed to hold `len` bytes: `ceil(len * 8 / bits)`.
pub fn dissolved_bits_length(len: usize, bits: u32) -> usize {
    debug_assert!(is_valid_width(bits));
    let total = len * BYTE_BITS as usize;
    let bits = bits as usize;
    total / bits + usize::from(total % bits != 0)
}

/// Number of whole bytes carried by `len` groups of `bits` bits: `floor(len * bits / 8)`.
pub fn concentrated_bits_length(len: usize, bits: u32) -> usize {
    debug_assert!(is_valid_width(bits));
    (len * bits as usize) / BYTE_BITS as usize
}

/// Shift register shared by both directions of the engine.
///
/// Holds at most 15 significant bits: a push only happens while fewer bits
/// are held than the next pull needs, and no unit is wider than 8 bits.
/// Bits above `bits_held` are stale and masked off on every pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitRegister {
    accumulator: u16,
    bits_held: u32,
}

impl BitRegister {
    /// Create an empty register.
    pub const fn new() -> Self {
        BitRegister {
            accumulator: 0,
            bits_held: 0,
        }
    }

    /// Number of valid bits currently held.
    pub const fn bits_held(&self) -> u32 {
        self.bits_held
    }

    /// Appends the low `width` bits of `value` below the held bits.
    pub fn push(&mut self, value: u8, width: u32) {
        debug_assert!(is_valid_width(width));
        debug_assert!(self.bits_held + width < 16);
        let mask = group_mask(width);
        self.accumulator = ((self.accumulator << width) & !mask) | (u16::from(value) & mask);
        self.bits_held += width;
    }

    /// Removes and returns the `width` most significant held bits, if held.
    pub fn pull(&mut self, width: u32) -> Option<u8> {
        debug_assert!(is_valid_width(width));
        if self.bits_held < width {
            return None;
        }
        let shift = self.bits_held - width;
        self.bits_held = shift;
        Some(((self.accumulator >> shift) & group_mask(width)) as u8)
    }

    /// Drains a partial group, padding it with zero bits on the low end.
    pub fn flush(&mut self, width: u32) -> Option<u8> {
        debug_assert!(is_valid_width(width));
        if self.bits_held == 0 || self.bits_held >= width {
            return None;
        }
        let pad = width - self.bits_held;
        self.bits_held = 0;
        Some(((self.accumulator << pad) & group_mask(width)) as u8)
    }
}

/// Splits bytes from `get` into `bits`-wide groups passed to `put`.
///
/// Returns false if `bits` is outside 1..=8 or `put` refuses a group. Groups
/// emitted before the refusal stay emitted.
pub fn dissolve_bits<G, P>(mut get: G, mut put: P, bits: u32) -> bool
where
    G: FnMut() -> Option<u8>,
    P: FnMut(u8) -> bool,
{
    if !is_valid_width(bits) {
        return false;
    }
    let mut reg = BitRegister::new();
    loop {
        if reg.bits_held() < bits {
            match get() {
                Some(byte) => reg.push(byte, BYTE_BITS),
                None => break,
            }
        }
        while let Some(group) = reg.pull(bits) {
            if !put(group) {
                return false;
            }
        }
    }
    match reg.flush(bits) {
        Some(last) => put(last),
        None => true,
    }
}

/// Merges `bits`-wide groups from `get` into bytes passed to `put`.
///
/// Only the low `bits` bits of each unit are used. A trailing tail shorter
/// than a byte is discarded. Returns false if `bits` is outside 1..=8 or
/// `put` refuses a byte.
pub fn concentrate_bits<G, P>(mut get: G, mut put: P, bits: u32) -> bool
where
    G: FnMut() -> Option<u8>,
    P: FnMut(u8) -> bool,
{
    if !is_valid_width(bits) {
        return false;
    }
    let mut reg = BitRegister::new();
    let mut exhausted = false;
    while !exhausted {
        while reg.bits_held() < BYTE_BITS {
            match get() {
                Some(unit) => reg.push(unit, bits),
                None => {
                    exhausted = true;
                    break;
                }
            }
        }
        if let Some(byte) = reg.pull(BYTE_BITS) {
            if !put(byte) {
                return false;
            }
        }
    }
    true
}

/// Dissolves `src` into a freshly allocated vector of groups.
pub fn dissolve_to_vec(src: &[u8], bits: u32) -> Option<Vec<u8>> {
    if !is_valid_width(bits) {
        return None;
    }
    let mut out = Vec::with_capacity(dissolved_bits_length(src.len(), bits));
    let mut input = src.iter().copied();
    let ok = dissolve_bits(
        || input.next(),
        |g| {
            out.push(g);
            true
        },
        bits,
    );
    ok.then_some(out)
}

/// Concentrates `src` groups into a freshly allocated byte vector.
pub fn concentrate_to_vec(src: &[u8], bits: u32) -> Option<Vec<u8>> {
    if !is_valid_width(bits) {
        return None;
    }
    let mut out = Vec::with_capacity(concentrated_bits_length(src.len(), bits));
    let mut input = src.iter().copied();
    let ok = concentrate_bits(
        || input.next(),
        |b| {
            out.push(b);
            true
        },
        bits,
    );
    ok.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_register_push_pull_per_width() {
        for width in 1..=8 {
            let mut reg = BitRegister::new();
            reg.push(0xFF, 8);
            let mut pulled = 0;
            while let Some(group) = reg.pull(width) {
                assert_eq!(group, group_mask(width) as u8, "width {}", width);
                pulled += 1;
            }
            assert_eq!(pulled, 8 / width);
            assert_eq!(reg.bits_held(), 8 % width);
        }
    }

    #[test]
    fn test_register_masks_stale_bits() {
        let mut reg = BitRegister::new();
        reg.push(0b1111_1111, 3);
        reg.push(0b1111_1010, 3);
        assert_eq!(reg.bits_held(), 6);
        assert_eq!(reg.pull(6), Some(0b111_010));
    }

    #[test]
    fn test_register_flush_pads_low_end() {
        let mut reg = BitRegister::new();
        reg.push(0b11, 2);
        assert_eq!(reg.flush(6), Some(0b110000));
        assert_eq!(reg.bits_held(), 0);
        assert_eq!(reg.flush(6), None);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(dissolved_bits_length(0, 6), 0);
        assert_eq!(dissolved_bits_length(1, 6), 2);
        assert_eq!(dissolved_bits_length(3, 6), 4);
        assert_eq!(dissolved_bits_length(5, 3), 14);
        assert_eq!(dissolved_bits_length(7, 8), 7);

        assert_eq!(concentrated_bits_length(2, 6), 1);
        assert_eq!(concentrated_bits_length(3, 6), 2);
        assert_eq!(concentrated_bits_length(4, 6), 3);
        assert_eq!(concentrated_bits_length(14, 3), 5);
        assert_eq!(concentrated_bits_length(7, 8), 7);
    }

    #[test]
    fn test_dissolve_known_groups() {
        let groups = dissolve_to_vec(&[0b1010_1100, 0b0111_0000], 3).unwrap();
        assert_eq!(groups, vec![0b101, 0b011, 0b000, 0b111, 0b000, 0b000]);
    }

    #[test]
    fn test_dissolve_pads_last_group() {
        let groups = dissolve_to_vec(&[0xFF], 6).unwrap();
        assert_eq!(groups, vec![0b111111, 0b110000]);
    }

    #[test]
    fn test_concentrate_drops_partial_tail() {
        let bytes = concentrate_to_vec(&[0b111111, 0b110000], 6).unwrap();
        assert_eq!(bytes, vec![0xFF]);
    }

    #[test]
    fn test_concentrate_ignores_high_bits_of_units() {
        let bytes = concentrate_to_vec(&[0xF1, 0xF0], 4).unwrap();
        assert_eq!(bytes, vec![0x10]);
    }

    #[test]
    fn test_invalid_widths_are_rejected() {
        assert!(!dissolve_bits(|| None, |_| true, 0));
        assert!(!dissolve_bits(|| None, |_| true, 9));
        assert!(!concentrate_bits(|| None, |_| true, 0));
        assert!(dissolve_to_vec(&[1, 2], 12).is_none());
    }

    #[test]
    fn test_putter_refusal_keeps_prior_output() {
        let src = [0xAB, 0xCD, 0xEF];
        let mut input = src.iter().copied();
        let mut out = Vec::new();
        let ok = dissolve_bits(
            || input.next(),
            |g| {
                if out.len() == 3 {
                    return false;
                }
                out.push(g);
                true
            },
            4,
        );
        assert!(!ok);
        assert_eq!(out, vec![0xA, 0xB, 0xC]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(dissolve_to_vec(&[], 5).unwrap(), Vec::<u8>::new());
        assert_eq!(concentrate_to_vec(&[], 5).unwrap(), Vec::<u8>::new());
    }

    proptest! {
        #[test]
        fn prop_dissolve_concentrate_roundtrip(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            bits in 1u32..=8,
        ) {
            let thin = dissolve_to_vec(&data, bits).unwrap();
            prop_assert_eq!(thin.len(), dissolved_bits_length(data.len(), bits));
            prop_assert!(thin.iter().all(|g| u16::from(*g) <= group_mask(bits)));

            let back = concentrate_to_vec(&thin, bits).unwrap();
            prop_assert_eq!(back.len(), concentrated_bits_length(thin.len(), bits));
            prop_assert_eq!(back, data);
        }
    }
}
