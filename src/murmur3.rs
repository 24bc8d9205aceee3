//! MurmurHash3 (x86, 32-bit) over byte and code-unit buffers.
//!
//! The generator reads buffer memory exclusively through a [`NativeAccess`]
//! implementation, so the same logical content hashes identically whether it
//! arrives as `&[u8]` or as byte-restricted `&[u16]` code units, and whether
//! the accessor assembles words portably or a load at a time. Results match
//! the `MurmurHash3_x86_32` reference for the little-endian configuration.
//!
//! [`safe_hash`] is the independent byte-by-byte reference path; the property
//! tests pin its agreement with every accessor-backed configuration.

use thiserror::Error;

use crate::access::{AccessError, ByteOrder, DirectAccess, NativeAccess, SafeAccess};

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;
const ROTATE_K: u32 = 15;
const ROTATE_H: u32 = 13;
const FINAL_MIX_1: u32 = 0x85eb_ca6b;
const FINAL_MIX_2: u32 = 0xc2b2_ae35;

/// Error raised by the caller-level bounds check.
///
/// The mixer itself never fails for any in-bounds length.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HashError {
    /// The requested range does not lie inside the buffer.
    #[error("range {start}..{end} is invalid for a buffer of {bound} elements")]
    InvalidRange {
        /// Start of the requested range.
        start: usize,
        /// End of the requested range.
        end: usize,
        /// Number of elements in the buffer.
        bound: usize,
    },
    /// An accessor read failed despite the bounds check.
    ///
    /// Reaching this from `hashframe` code is a defect; it exists so custom
    /// accessors with stricter bounds can still fail cleanly.
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// 32-bit hash generation over the two buffer representations.
///
/// Both operations must return the same value for inputs encoding the same
/// logical byte content with the same seed.
pub trait HashCodeGenerator: Send + Sync {
    /// Hash the `[start, end)` subsection of `bytes` with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidRange`] if the range is inverted or lies
    /// outside the buffer.
    fn hash_bytes(&self, bytes: &[u8], start: usize, end: usize, seed: i32)
    -> Result<i32, HashError>;

    /// Hash `len` code units of `units` starting at `offset` with `seed`.
    ///
    /// Each unit contributes its low byte, matching
    /// [`HashCodeGenerator::hash_bytes`] over the corresponding byte content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidRange`] if the range lies outside the
    /// buffer.
    fn hash_code_units(
        &self,
        units: &[u16],
        offset: usize,
        len: usize,
        seed: i32,
    ) -> Result<i32, HashError>;
}

/// MurmurHash3 x86_32 parameterized on an accessor.
///
/// The byte order is fixed at construction from the accessor; the little
/// configuration reproduces the reference vectors on every host.
#[derive(Clone, Copy, Debug)]
pub struct Murmur3<A> {
    access: A,
    little: bool,
}

impl<A: NativeAccess> Murmur3<A> {
    /// Build a generator reading through `access`.
    pub fn new(access: A) -> Self {
        let little = access.byte_order().is_little();
        Self { access, little }
    }

    /// The accessor this generator reads through.
    pub fn access(&self) -> &A { &self.access }
}

impl Default for Murmur3<DirectAccess> {
    /// Word-at-a-time generator in the reference (little-endian) order.
    fn default() -> Self { Self::new(DirectAccess::new(ByteOrder::Little)) }
}

impl Murmur3<SafeAccess> {
    /// Portable generator in the reference (little-endian) order.
    #[must_use]
    pub fn portable() -> Self { Self::new(SafeAccess::new(ByteOrder::Little)) }
}

impl<A: NativeAccess> HashCodeGenerator for Murmur3<A> {
    fn hash_bytes(
        &self,
        bytes: &[u8],
        start: usize,
        end: usize,
        seed: i32,
    ) -> Result<i32, HashError> {
        let len = checked_len(start, end, bytes.len())?;
        #[expect(clippy::cast_sign_loss, reason = "Seed mixes as a raw 32-bit word.")]
        let mut h = seed as u32;
        let words_end = start + (len & !3);
        let mut offset = start;
        while offset < words_end {
            h = mix_word(h, self.access.word_from_bytes(bytes, offset)?);
            offset += 4;
        }
        let trailing = len & 3;
        if trailing > 0 {
            let mut tail = [0_i8; 3];
            for (index, slot) in tail.iter_mut().enumerate().take(trailing) {
                *slot = self.access.byte_at(bytes, offset + index)?;
            }
            h ^= mix_k(tail_word(self.little, &tail[..trailing]));
        }
        Ok(finish(h, len))
    }

    fn hash_code_units(
        &self,
        units: &[u16],
        offset: usize,
        len: usize,
        seed: i32,
    ) -> Result<i32, HashError> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= units.len())
            .ok_or(HashError::InvalidRange {
                start: offset,
                end: offset.saturating_add(len),
                bound: units.len(),
            })?;
        #[expect(clippy::cast_sign_loss, reason = "Seed mixes as a raw 32-bit word.")]
        let mut h = seed as u32;
        let words_end = end - (len & 3);
        let mut cursor = offset;
        while cursor < words_end {
            h = mix_word(h, self.access.word_from_units(units, cursor)?);
            cursor += 4;
        }
        let trailing = len & 3;
        if trailing > 0 {
            let mut tail = [0_i8; 3];
            for (index, slot) in tail.iter_mut().enumerate().take(trailing) {
                *slot = unit_low_byte(self.access.unit_at(units, cursor + index)?);
            }
            h ^= mix_k(tail_word(self.little, &tail[..trailing]));
        }
        Ok(finish(h, len))
    }
}

/// Byte-by-byte reference implementation over a byte range.
///
/// No accessor, no word-at-a-time reads; words and tail are assembled with
/// explicit little-endian shifts. Every accessor-backed little-endian
/// configuration must agree with this path for all inputs.
///
/// # Errors
///
/// Returns [`HashError::InvalidRange`] if the range is inverted or lies
/// outside the buffer.
pub fn safe_hash(bytes: &[u8], start: usize, end: usize, seed: i32) -> Result<i32, HashError> {
    let len = checked_len(start, end, bytes.len())?;
    #[expect(clippy::cast_sign_loss, reason = "Seed mixes as a raw 32-bit word.")]
    let mut h = seed as u32;
    let words_end = start + (len & !3);
    let mut offset = start;
    while offset < words_end {
        let word = i32::from(bytes[offset])
            | (i32::from(bytes[offset + 1]) << 8)
            | (i32::from(bytes[offset + 2]) << 16)
            | (i32::from(bytes[offset + 3]) << 24);
        h = mix_word(h, word);
        offset += 4;
    }
    let trailing = len & 3;
    if trailing > 0 {
        let mut tail = [0_i8; 3];
        for (slot, byte) in tail.iter_mut().zip(&bytes[offset..offset + trailing]) {
            *slot = byte_as_signed(*byte);
        }
        h ^= mix_k(tail_word(true, &tail[..trailing]));
    }
    Ok(finish(h, len))
}

fn checked_len(start: usize, end: usize, bound: usize) -> Result<usize, HashError> {
    if start <= end && end <= bound {
        Ok(end - start)
    } else {
        Err(HashError::InvalidRange { start, end, bound })
    }
}

fn mix_word(h: u32, word: i32) -> u32 {
    let k = mix_k(word);
    (h ^ k)
        .rotate_left(ROTATE_H)
        .wrapping_mul(5)
        .wrapping_add(0xe654_6b64)
}

#[expect(clippy::cast_sign_loss, reason = "Words mix as raw 32-bit values.")]
fn mix_k(word: i32) -> u32 {
    (word as u32)
        .wrapping_mul(C1)
        .rotate_left(ROTATE_K)
        .wrapping_mul(C2)
}

/// Pack the 1-3 trailing bytes into one word.
///
/// Shift placement depends on byte order because the tail emulates a raw
/// machine-word read; values are sign-extended before shifting, matching the
/// reference behaviour byte for byte.
fn tail_word(little: bool, tail: &[i8]) -> i32 {
    let mut k = 0_i32;
    if little {
        if tail.len() == 3 {
            k = i32::from(tail[2]) << 16;
        }
        if tail.len() >= 2 {
            k ^= i32::from(tail[1]) << 8;
        }
        k ^= i32::from(tail[0]);
    } else {
        if tail.len() == 3 {
            k = i32::from(tail[2]) << 8;
        }
        if tail.len() >= 2 {
            k ^= i32::from(tail[1]) << 16;
        }
        k ^= i32::from(tail[0]) << 24;
    }
    k
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "Lengths fold into the mix as 32-bit words and the result is signed."
)]
fn finish(h: u32, len: usize) -> i32 {
    let mut h = h ^ (len as u32);
    h ^= h >> 16;
    h = h.wrapping_mul(FINAL_MIX_1);
    h ^= h >> 13;
    h = h.wrapping_mul(FINAL_MIX_2);
    h ^= h >> 16;
    h as i32
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "Tail bytes take the low byte of the unit, then sign-extend."
)]
fn unit_low_byte(unit: u16) -> i8 { unit as u8 as i8 }

#[expect(clippy::cast_possible_wrap, reason = "Tail bytes sign-extend before shifting.")]
fn byte_as_signed(byte: u8) -> i8 { byte as i8 }
