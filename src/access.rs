//! Primitive-width reads over byte and code-unit buffers.
//!
//! The hashing layer never touches buffer memory directly; it goes through a
//! [`NativeAccess`] implementation that assembles 1-, 2-, and 4-byte values in
//! a configured [`ByteOrder`]. Two buffer shapes are supported with equivalent
//! semantics: plain byte slices, and `u16` code-unit slices whose elements are
//! restricted to the byte range (upper eight bits zero for valid input).
//!
//! [`TranslatingAccess`] decorates any accessor with a per-width value hook.
//! It is an instrumentation seam: with an identity translator the wrapped
//! accessor is indistinguishable from the bare one.

use thiserror::Error;

/// Byte order used when assembling multi-byte words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

impl ByteOrder {
    /// The byte order of the host.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }

    /// Returns `true` for [`ByteOrder::Little`].
    #[must_use]
    pub const fn is_little(self) -> bool { matches!(self, Self::Little) }
}

/// Error raised when a read would cross the declared buffer bound.
///
/// Callers of the accessor layer bounds-check before iterating; hitting this
/// error from library code indicates a caller-side defect, not bad input.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// A read of `len` elements at `offset` exceeds the buffer bound.
    #[error("read of {len} at offset {offset} exceeds buffer bound {bound}")]
    OutOfRange {
        /// Logical offset of the attempted read.
        offset: usize,
        /// Width of the attempted read in elements.
        len: usize,
        /// Number of elements in the buffer.
        bound: usize,
    },
}

/// Extraction of fixed-width native values from array-backed buffers.
///
/// All word assembly honours [`NativeAccess::byte_order`]. Implementations
/// are immutable after construction and safe to share across workers.
pub trait NativeAccess: Send + Sync {
    /// Read a packed 4-byte word from four consecutive bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfRange`] if `offset + 4` exceeds the buffer.
    fn word_from_bytes(&self, data: &[u8], offset: usize) -> Result<i32, AccessError>;

    /// Read one byte as a signed value.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfRange`] if `offset` is past the buffer.
    fn byte_at(&self, data: &[u8], offset: usize) -> Result<i8, AccessError>;

    /// Read a packed 4-byte word from four consecutive code units.
    ///
    /// Each unit contributes its low byte; the packing is identical to
    /// [`NativeAccess::word_from_bytes`] over the corresponding bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfRange`] if `offset + 4` exceeds the buffer.
    fn word_from_units(&self, data: &[u16], offset: usize) -> Result<i32, AccessError>;

    /// Pack two consecutive code units into one 32-bit value.
    ///
    /// An accessor capability with no consumer in the hashing path; kept on
    /// the interface for callers that read full 16-bit units.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfRange`] if `offset + 2` exceeds the buffer.
    fn packed_unit_pair(&self, data: &[u16], offset: usize) -> Result<i32, AccessError>;

    /// Read one code unit.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OutOfRange`] if `offset` is past the buffer.
    fn unit_at(&self, data: &[u16], offset: usize) -> Result<u16, AccessError>;

    /// Byte order used for word assembly.
    fn byte_order(&self) -> ByteOrder;

    /// Base addressing bias of the backing storage.
    ///
    /// Zero for slice-backed accessors. Exposed so decorators can forward it
    /// faithfully.
    fn base_offset(&self) -> usize;
}

fn take<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], AccessError> {
    let out_of_range = AccessError::OutOfRange {
        offset,
        len: N,
        bound: data.len(),
    };
    let end = offset.checked_add(N).ok_or(out_of_range)?;
    data.get(offset..end)
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(out_of_range)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Valid code units carry their payload in the low byte."
)]
fn unit_bytes(data: &[u16], offset: usize) -> Result<[u8; 4], AccessError> {
    let out_of_range = AccessError::OutOfRange {
        offset,
        len: 4,
        bound: data.len(),
    };
    let end = offset.checked_add(4).ok_or(out_of_range)?;
    let units = data.get(offset..end).ok_or(out_of_range)?;
    Ok([
        units[0] as u8,
        units[1] as u8,
        units[2] as u8,
        units[3] as u8,
    ])
}

const fn assemble(order: ByteOrder, bytes: [u8; 4]) -> i32 {
    match order {
        ByteOrder::Big => i32::from_be_bytes(bytes),
        ByteOrder::Little => i32::from_le_bytes(bytes),
    }
}

/// Portable accessor assembling words byte by byte.
#[derive(Clone, Copy, Debug)]
pub struct SafeAccess {
    order: ByteOrder,
}

impl SafeAccess {
    /// Create an accessor assembling words in `order`.
    #[must_use]
    pub const fn new(order: ByteOrder) -> Self { Self { order } }
}

impl Default for SafeAccess {
    fn default() -> Self { Self::new(ByteOrder::native()) }
}

impl NativeAccess for SafeAccess {
    fn word_from_bytes(&self, data: &[u8], offset: usize) -> Result<i32, AccessError> {
        let bytes = take::<4>(data, offset)?;
        let word = match self.order {
            ByteOrder::Little => {
                i32::from(bytes[0])
                    | (i32::from(bytes[1]) << 8)
                    | (i32::from(bytes[2]) << 16)
                    | (i32::from(bytes[3]) << 24)
            }
            ByteOrder::Big => {
                (i32::from(bytes[0]) << 24)
                    | (i32::from(bytes[1]) << 16)
                    | (i32::from(bytes[2]) << 8)
                    | i32::from(bytes[3])
            }
        };
        Ok(word)
    }

    fn byte_at(&self, data: &[u8], offset: usize) -> Result<i8, AccessError> {
        let [byte] = take::<1>(data, offset)?;
        #[expect(clippy::cast_possible_wrap, reason = "Reads are signed by contract.")]
        let signed = byte as i8;
        Ok(signed)
    }

    fn word_from_units(&self, data: &[u16], offset: usize) -> Result<i32, AccessError> {
        let bytes = unit_bytes(data, offset)?;
        self.word_from_bytes(&bytes, 0)
    }

    fn packed_unit_pair(&self, data: &[u16], offset: usize) -> Result<i32, AccessError> {
        let low = self.unit_at(data, offset)?;
        let high = self.unit_at(data, offset + 1)?;
        Ok(i32::from(low) | (i32::from(high) << 16))
    }

    fn unit_at(&self, data: &[u16], offset: usize) -> Result<u16, AccessError> {
        data.get(offset).copied().ok_or(AccessError::OutOfRange {
            offset,
            len: 1,
            bound: data.len(),
        })
    }

    fn byte_order(&self) -> ByteOrder { self.order }

    fn base_offset(&self) -> usize { 0 }
}

/// Word-at-a-time accessor.
///
/// Reads whole 4-byte words from byte buffers in one load and reorders only
/// when the configured order disagrees with the host. Must agree with
/// [`SafeAccess`] for every input; the hash tests pin that equivalence.
#[derive(Clone, Copy, Debug)]
pub struct DirectAccess {
    order: ByteOrder,
}

impl DirectAccess {
    /// Create an accessor assembling words in `order`.
    #[must_use]
    pub const fn new(order: ByteOrder) -> Self { Self { order } }
}

impl Default for DirectAccess {
    fn default() -> Self { Self::new(ByteOrder::native()) }
}

impl NativeAccess for DirectAccess {
    fn word_from_bytes(&self, data: &[u8], offset: usize) -> Result<i32, AccessError> {
        let bytes = take::<4>(data, offset)?;
        Ok(assemble(self.order, bytes))
    }

    fn byte_at(&self, data: &[u8], offset: usize) -> Result<i8, AccessError> {
        SafeAccess::new(self.order).byte_at(data, offset)
    }

    fn word_from_units(&self, data: &[u16], offset: usize) -> Result<i32, AccessError> {
        let bytes = unit_bytes(data, offset)?;
        Ok(assemble(self.order, bytes))
    }

    fn packed_unit_pair(&self, data: &[u16], offset: usize) -> Result<i32, AccessError> {
        SafeAccess::new(self.order).packed_unit_pair(data, offset)
    }

    fn unit_at(&self, data: &[u16], offset: usize) -> Result<u16, AccessError> {
        SafeAccess::new(self.order).unit_at(data, offset)
    }

    fn byte_order(&self) -> ByteOrder { self.order }

    fn base_offset(&self) -> usize { 0 }
}

/// Per-width hook applied to every value an accessor extracts.
///
/// The default methods are identity, so implementors override only the widths
/// they care about. Four widths are covered even though the accessor surface
/// currently reads at most 32 bits; the 64-bit hook mirrors the widths a full
/// accessor family exposes.
pub trait ValueTranslator: Send + Sync {
    /// Translate a 64-bit value.
    fn translate_i64(&self, value: i64) -> i64 { value }

    /// Translate a 32-bit value.
    fn translate_i32(&self, value: i32) -> i32 { value }

    /// Translate a 16-bit value.
    fn translate_u16(&self, value: u16) -> u16 { value }

    /// Translate an 8-bit value.
    fn translate_i8(&self, value: i8) -> i8 { value }
}

/// Translator returning every value unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTranslator;

impl ValueTranslator for IdentityTranslator {}

/// Decorator passing every extracted value through a [`ValueTranslator`].
///
/// Byte order and base addressing are forwarded untouched, so a wrapper with
/// an identity translator hashes identically to the accessor it wraps.
#[derive(Clone, Copy, Debug)]
pub struct TranslatingAccess<A, T> {
    inner: A,
    translator: T,
}

impl<A, T> TranslatingAccess<A, T> {
    /// Wrap `inner`, routing every read through `translator`.
    pub const fn new(inner: A, translator: T) -> Self { Self { inner, translator } }
}

impl<A, T> NativeAccess for TranslatingAccess<A, T>
where
    A: NativeAccess,
    T: ValueTranslator,
{
    fn word_from_bytes(&self, data: &[u8], offset: usize) -> Result<i32, AccessError> {
        self.inner
            .word_from_bytes(data, offset)
            .map(|value| self.translator.translate_i32(value))
    }

    fn byte_at(&self, data: &[u8], offset: usize) -> Result<i8, AccessError> {
        self.inner
            .byte_at(data, offset)
            .map(|value| self.translator.translate_i8(value))
    }

    fn word_from_units(&self, data: &[u16], offset: usize) -> Result<i32, AccessError> {
        self.inner
            .word_from_units(data, offset)
            .map(|value| self.translator.translate_i32(value))
    }

    fn packed_unit_pair(&self, data: &[u16], offset: usize) -> Result<i32, AccessError> {
        self.inner
            .packed_unit_pair(data, offset)
            .map(|value| self.translator.translate_i32(value))
    }

    fn unit_at(&self, data: &[u16], offset: usize) -> Result<u16, AccessError> {
        self.inner
            .unit_at(data, offset)
            .map(|value| self.translator.translate_u16(value))
    }

    fn byte_order(&self) -> ByteOrder { self.inner.byte_order() }

    fn base_offset(&self) -> usize { self.inner.base_offset() }
}

/// Compare two byte ranges for equality.
///
/// Returns `true` iff both ranges are in bounds, have the same length, and
/// match byte for byte. Zero-length ranges are equal only to other
/// zero-length ranges. Out-of-bounds or inverted ranges compare unequal.
#[must_use]
pub fn ranges_equal(
    a: &[u8],
    a_start: usize,
    a_end: usize,
    b: &[u8],
    b_start: usize,
    b_end: usize,
) -> bool {
    let (Some(left), Some(right)) = (a.get(a_start..a_end), b.get(b_start..b_end)) else {
        return false;
    };
    left == right
}
