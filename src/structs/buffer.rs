//! # **Buffer** - *Unified owned/shared value storage*
//!
//! `Buffer<T>` backs the typed arrays in this crate with one of two
//! storage backends:
//! - **Owned**: a plain `Vec<T>` built locally.
//! - **Shared**: a read-only window into memory owned by someone else,
//!   kept alive by a reference-counted owner handle. This is what makes
//!   zero-copy import possible: the window aliases a foreign producer's
//!   values buffer, and the owner's drop invokes the producer's release
//!   callback exactly once.
//!
//! Read access goes straight to the backing memory in both cases; the
//! shared variant is never mutated.

use std::ops::Deref;
use std::slice;
use std::sync::Arc;

/// Keep-alive handle for externally owned memory.
///
/// The handle itself carries no data; dropping the last clone must make
/// the aliased region invalid-to-free exactly once (typically by running
/// a foreign release callback in its `Drop`).
pub type BufferOwner = Arc<dyn Send + Sync>;

/// Data buffer abstraction blending an owned `Vec<T>` with a borrowed
/// window over externally owned memory.
pub struct Buffer<T> {
    storage: Storage<T>,
}

/// Internal memory ownership tracking store for `Buffer`.
enum Storage<T> {
    Owned(Vec<T>),
    Shared {
        ptr: *const T,
        len: usize,
        _owner: BufferOwner,
    },
}

impl<T> Buffer<T> {
    /// Construct from an owned `Vec<T>`.
    #[inline]
    pub fn from_vec(v: Vec<T>) -> Self {
        Self {
            storage: Storage::Owned(v),
        }
    }

    /// Construct a zero-copy window over externally owned memory.
    ///
    /// # Safety
    /// - `ptr` must be valid and readable for `len` elements of `T`, and
    ///   aligned for `T`.
    /// - The region must stay valid for as long as `owner` has a live
    ///   clone; `owner`'s final drop is what reclaims it.
    #[inline]
    pub unsafe fn from_owner(owner: BufferOwner, ptr: *const T, len: usize) -> Self {
        debug_assert!(!ptr.is_null());
        debug_assert_eq!(ptr as usize % std::mem::align_of::<T>(), 0);
        Self {
            storage: Storage::Shared {
                ptr,
                len,
                _owner: owner,
            },
        }
    }

    /// Read view of the buffer contents.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Storage::Owned(v) => v.as_slice(),
            Storage::Shared { ptr, len, .. } => {
                if *len == 0 {
                    &[]
                } else {
                    unsafe { slice::from_raw_parts(*ptr, *len) }
                }
            }
        }
    }

    /// Base pointer of the backing memory.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match &self.storage {
            Storage::Owned(v) => v.as_ptr(),
            Storage::Shared { ptr, .. } => *ptr,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Owned(v) => v.len(),
            Storage::Shared { len, .. } => *len,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if this buffer is a window over externally owned memory.
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self.storage, Storage::Shared { .. })
    }

    /// Appends a value, converting a shared buffer to owned first.
    #[inline]
    pub fn push(&mut self, value: T)
    where
        T: Clone,
    {
        self.make_owned();
        match &mut self.storage {
            Storage::Owned(v) => v.push(value),
            Storage::Shared { .. } => unreachable!("make_owned converted storage"),
        }
    }

    /// Copy-on-write: converts shared storage into an owned `Vec<T>`.
    fn make_owned(&mut self)
    where
        T: Clone,
    {
        if let Storage::Shared { .. } = self.storage {
            let copied = self.as_slice().to_vec();
            self.storage = Storage::Owned(copied);
        }
    }
}

impl<T: Clone> Buffer<T> {
    /// Construct an owned buffer from a slice, copying the data.
    #[inline]
    pub fn from_slice(slice: &[T]) -> Self {
        Self::from_vec(slice.to_vec())
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    fn from(v: Vec<T>) -> Self {
        Self::from_vec(v)
    }
}

impl<T: Clone> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        match &self.storage {
            Storage::Owned(v) => Self::from_vec(v.clone()),
            Storage::Shared { ptr, len, _owner } => Self {
                storage: Storage::Shared {
                    ptr: *ptr,
                    len: *len,
                    _owner: Arc::clone(_owner),
                },
            },
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

// The shared variant aliases memory pinned by `_owner`, which is itself
// Send + Sync; the window is read-only.
unsafe impl<T: Send> Send for Buffer<T> {}
unsafe impl<T: Sync> Sync for Buffer<T> {}
