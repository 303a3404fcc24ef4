//! # **BooleanArray Module** - *Bit-packed nullable boolean array*
//!
//! Values and validity are both packed bitmasks, per the Arrow layout.
//! Unlike the fixed-width arrays, boolean values cannot be aliased at an
//! arbitrary logical offset, so imports rebuild the bits into owned
//! storage (ceil(N/8) bytes).

use crate::structs::bitmask::Bitmask;

/// Bit-packed nullable boolean array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BooleanArray {
    data: Bitmask,
    null_mask: Option<Bitmask>,
    null_count: usize,
}

impl BooleanArray {
    /// Constructs from value bits and an optional validity mask.
    pub fn new(data: Bitmask, null_mask: Option<Bitmask>) -> Self {
        if let Some(mask) = &null_mask {
            assert_eq!(
                mask.len(),
                data.len(),
                "validity mask length must match data length"
            );
        }
        let null_count = null_mask.as_ref().map_or(0, Bitmask::count_zeros);
        Self {
            data,
            null_mask,
            null_count,
        }
    }

    /// Non-nullable array from a bool slice.
    pub fn from_slice(values: &[bool]) -> Self {
        Self {
            data: values.iter().copied().collect(),
            null_mask: None,
            null_count: 0,
        }
    }

    /// Builds from a sequence of optional values; `None` marks a null.
    pub fn from_nullable_slice(values: &[Option<bool>]) -> Self {
        let mut arr = Self::default();
        for v in values {
            match v {
                Some(v) => arr.push(*v),
                None => arr.push_null(),
            }
        }
        arr
    }

    /// Appends a present value.
    pub fn push(&mut self, value: bool) {
        self.data.push(value);
        if let Some(mask) = &mut self.null_mask {
            mask.push(true);
        }
    }

    /// Appends a null, materialising the validity mask on first use.
    pub fn push_null(&mut self) {
        let len = self.data.len();
        self.data.push(false);
        let mask = self
            .null_mask
            .get_or_insert_with(|| Bitmask::new_set_all(len, true));
        mask.push(false);
        self.null_count += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// True if position `i` holds a null.
    ///
    /// Panics if `i >= len`, whether or not a validity mask exists.
    #[inline]
    pub fn is_null(&self, i: usize) -> bool {
        assert!(i < self.len(), "index {i} out of bounds (len {})", self.len());
        self.null_mask.as_ref().is_some_and(|m| !m.get(i))
    }

    /// Value at `i`, or `None` for a null position.
    pub fn get(&self, i: usize) -> Option<bool> {
        if self.is_null(i) {
            None
        } else {
            Some(self.data.get(i))
        }
    }

    /// Raw pointer and byte length of the packed values buffer.
    pub fn data_ptr_and_byte_len(&self) -> (*const u8, usize) {
        (self.data.as_ptr(), self.data.as_bytes().len())
    }

    /// Raw pointer to the packed validity bitmap, if present.
    pub fn null_mask_ptr(&self) -> Option<*const u8> {
        self.null_mask.as_ref().map(Bitmask::as_ptr)
    }

    pub fn null_mask(&self) -> Option<&Bitmask> {
        self.null_mask.as_ref()
    }
}
