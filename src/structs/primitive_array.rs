//! # **PrimitiveArray Module** - *Fixed-width nullable array*
//!
//! Contiguous value storage plus an optional validity bitmask, for any
//! [`Primitive`] element type.
//!
//! ## Invariants
//! - `null_count ∈ [0, len]`, and equals the number of cleared validity
//!   bits. With no validity mask, `null_count == 0`.
//! - The cached count is maintained by every constructor and mutator, so
//!   export never has to rescan the mask.

use crate::structs::bitmask::Bitmask;
use crate::structs::buffer::Buffer;
use crate::traits::primitive::Primitive;

/// Fixed-width nullable array.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveArray<T: Primitive> {
    data: Buffer<T>,
    null_mask: Option<Bitmask>,
    null_count: usize,
}

impl<T: Primitive> PrimitiveArray<T> {
    /// Constructs from a data buffer and optional validity mask.
    ///
    /// The null count is derived from the mask, which keeps the cached
    /// count invariant by construction.
    pub fn new(data: Buffer<T>, null_mask: Option<Bitmask>) -> Self {
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

    /// Constructs from parts with a pre-computed null count.
    ///
    /// Used by the importer, which has already validated or computed the
    /// count against the adopted mask.
    pub(crate) fn from_parts(
        data: Buffer<T>,
        null_mask: Option<Bitmask>,
        null_count: usize,
    ) -> Self {
        debug_assert_eq!(
            null_count,
            null_mask.as_ref().map_or(0, Bitmask::count_zeros)
        );
        Self {
            data,
            null_mask,
            null_count,
        }
    }

    /// Non-nullable array from a value slice.
    pub fn from_slice(values: &[T]) -> Self {
        Self {
            data: Buffer::from_slice(values),
            null_mask: None,
            null_count: 0,
        }
    }

    /// Builds from a sequence of optional values; `None` marks a null.
    pub fn from_nullable_slice(values: &[Option<T>]) -> Self {
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
    pub fn push(&mut self, value: T) {
        self.data.push(value);
        if let Some(mask) = &mut self.null_mask {
            mask.push(true);
        }
    }

    /// Appends a null, materialising the validity mask on first use.
    pub fn push_null(&mut self) {
        let len = self.data.len();
        self.data.push(T::zero());
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
    pub fn get(&self, i: usize) -> Option<T> {
        if self.is_null(i) {
            None
        } else {
            Some(self.data.as_slice()[i])
        }
    }

    /// Raw pointer and byte length of the values buffer.
    pub fn data_ptr_and_byte_len(&self) -> (*const u8, usize) {
        (
            self.data.as_ptr() as *const u8,
            self.data.len() * std::mem::size_of::<T>(),
        )
    }

    /// Raw pointer to the packed validity bitmap, if present.
    pub fn null_mask_ptr(&self) -> Option<*const u8> {
        self.null_mask.as_ref().map(Bitmask::as_ptr)
    }

    /// The validity mask, if any position is tracked as nullable.
    pub fn null_mask(&self) -> Option<&Bitmask> {
        self.null_mask.as_ref()
    }

    /// Read view of the raw values, including placeholders at null slots.
    #[inline]
    pub fn values(&self) -> &[T] {
        self.data.as_slice()
    }
}

impl<T: Primitive> Default for PrimitiveArray<T> {
    fn default() -> Self {
        Self {
            data: Buffer::default(),
            null_mask: None,
            null_count: 0,
        }
    }
}
