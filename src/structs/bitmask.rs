//! # **Bitmask Module** - *Packed validity/boolean bitmask*
//!
//! Arrow-compatible packed bitmask used as the validity (null) mask for
//! all array types and as the value storage for `BooleanArray`.
//!
//! ## Behaviour
//! - LSB corresponds to the first logical element; 1 = valid/set, 0 = null/cleared.
//! - Trailing padding bits are always masked off for Arrow spec compliance.
//! - Imports rebuild foreign bitmaps into this owned form (ceil(N/8) bytes),
//!   including bitmaps that start at a non-zero logical offset.

/// Packed bitmask. 1 = set/valid, 0 = cleared/null, LSB-first.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct Bitmask {
    bits: Vec<u8>,
    len: usize,
}

impl Bitmask {
    /// Create new mask, length `len`, all bits set if `set` else cleared.
    pub fn new_set_all(len: usize, set: bool) -> Self {
        let n_bytes = len.div_ceil(8);
        let fill = if set { 0xFF } else { 0 };
        let mut mask = Self {
            bits: vec![fill; n_bytes],
            len,
        };
        mask.mask_trailing_bits();
        mask
    }

    /// Create with capacity for `bits` logical bits, all cleared, length 0.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Create a bitmask by reading `len` bits from a packed buffer,
    /// starting at logical bit `offset`.
    ///
    /// # Safety
    /// `ptr` must point to at least `(offset + len + 7) / 8` readable bytes.
    pub unsafe fn from_raw_slice_offset(ptr: *const u8, offset: usize, len: usize) -> Self {
        if ptr.is_null() || len == 0 {
            return Bitmask::default();
        }
        let n_bytes = (offset + len).div_ceil(8);
        let bytes = unsafe { std::slice::from_raw_parts(ptr, n_bytes) };
        if offset == 0 {
            let mut out = Bitmask {
                bits: bytes[..len.div_ceil(8)].to_vec(),
                len,
            };
            out.mask_trailing_bits();
            return out;
        }
        // Re-pack bit-by-bit when the window does not start on bit 0.
        let mut out = Bitmask::new_set_all(len, false);
        for i in 0..len {
            let bit = offset + i;
            if (bytes[bit >> 3] >> (bit & 7)) & 1 != 0 {
                out.set(i, true);
            }
        }
        out
    }

    /// Reads `len` bits starting at bit 0.
    ///
    /// # Safety
    /// `ptr` must point to at least `(len + 7) / 8` readable bytes.
    pub unsafe fn from_raw_slice(ptr: *const u8, len: usize) -> Self {
        unsafe { Self::from_raw_slice_offset(ptr, 0, len) }
    }

    /// Ensures all unused bits above `self.len` are zeroed, per Arrow spec.
    fn mask_trailing_bits(&mut self) {
        if self.len == 0 || (self.len & 7) == 0 {
            return;
        }
        if let Some(last) = self.bits.last_mut() {
            *last &= (1u8 << (self.len & 7)) - 1;
        }
    }

    /// Logical length in bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at logical index `i`.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len, "bit index {i} out of bounds (len {})", self.len);
        (self.bits[i >> 3] >> (i & 7)) & 1 != 0
    }

    /// Sets bit at logical index `i`.
    #[inline]
    pub fn set(&mut self, i: usize, value: bool) {
        debug_assert!(i < self.len, "bit index {i} out of bounds (len {})", self.len);
        if value {
            self.bits[i >> 3] |= 1 << (i & 7);
        } else {
            self.bits[i >> 3] &= !(1 << (i & 7));
        }
    }

    /// Appends one bit.
    pub fn push(&mut self, value: bool) {
        if self.len & 7 == 0 {
            self.bits.push(0);
        }
        self.len += 1;
        if value {
            self.set(self.len - 1, true);
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        // Trailing bits are kept zeroed, so a plain popcount is exact.
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Number of cleared bits within the logical length.
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// Raw packed bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Base pointer of the packed bytes.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.bits.as_ptr()
    }
}

impl FromIterator<bool> for Bitmask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut mask = Bitmask::default();
        for b in iter {
            mask.push(b);
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let mut m = Bitmask::new_set_all(10, false);
        m.set(3, true);
        m.set(7, true);
        assert!(m.get(3) && m.get(7));
        assert!(!m.get(0));
        assert_eq!(m.count_ones(), 2);
        assert_eq!(m.count_zeros(), 8);
    }

    #[test]
    fn push_extends_storage() {
        let mut m = Bitmask::default();
        for i in 0..17 {
            m.push(i % 2 == 0);
        }
        assert_eq!(m.len(), 17);
        assert_eq!(m.count_ones(), 9);
        assert_eq!(m.as_bytes().len(), 3);
    }

    #[test]
    fn trailing_bits_masked() {
        let m = Bitmask::new_set_all(5, true);
        assert_eq!(m.as_bytes(), &[0b0001_1111]);
        assert_eq!(m.count_ones(), 5);
    }

    #[test]
    fn from_raw_slice_copies_bytes() {
        let src = [0b1010_1101u8, 0b0000_0011];
        let m = unsafe { Bitmask::from_raw_slice(src.as_ptr(), 10) };
        assert_eq!(m.len(), 10);
        assert!(m.get(0));
        assert!(!m.get(1));
        assert!(m.get(9));
        assert_eq!(m.count_ones(), 7);
    }

    #[test]
    fn from_raw_slice_offset_repacks() {
        // Bits 3..8 of the byte below are 1,1,0,1,0 (LSB-first from bit 3).
        let src = [0b0101_1000u8, 0b0000_0001];
        let m = unsafe { Bitmask::from_raw_slice_offset(src.as_ptr(), 3, 6) };
        assert_eq!(m.len(), 6);
        assert!(m.get(0));
        assert!(m.get(1));
        assert!(!m.get(2));
        assert!(m.get(3));
        assert!(!m.get(4));
        assert!(m.get(5)); // bit 8 = second byte bit 0
    }

    #[test]
    fn null_and_zero_len_sources_give_empty() {
        let m = unsafe { Bitmask::from_raw_slice(std::ptr::null(), 8) };
        assert!(m.is_empty());
        let src = [0xFFu8];
        let m = unsafe { Bitmask::from_raw_slice(src.as_ptr(), 0) };
        assert!(m.is_empty());
    }
}
