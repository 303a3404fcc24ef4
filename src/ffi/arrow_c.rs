//! # **Arrow-C Descriptors** - *C ABI structs and release plumbing*
//!
//! The two plain structs of the Arrow C Data Interface, laid out
//! byte-for-byte as published:
//! <https://arrow.apache.org/docs/format/CDataInterface.html>
//!
//! ## Lifetime contract
//! - Each exported descriptor carries its own private-data holder and its
//!   own release callback, so a schema and its array can be released
//!   independently and in either order.
//! - A release callback reclaims the holder, zeroes the struct, and thereby
//!   nulls its own release pointer. A second invocation is a no-op.
//! - Descriptor shells are `Box` allocations. The capsule destructor runs
//!   the release (if still set) and then frees the shell; a consumer that
//!   takes a capsule's pointer takes over both steps.

use std::ffi::{CString, c_void};
use std::ptr;

use crate::enums::array::Array;
use crate::structs::capsule::Capsule;

/// Capsule name tag for a schema descriptor payload.
pub const SCHEMA_CAPSULE_NAME: &str = "arrow_schema";
/// Capsule name tag for an array descriptor payload.
pub const ARRAY_CAPSULE_NAME: &str = "arrow_array";

/// Schema flag: dictionary indices are ordered.
pub const ARROW_FLAG_DICTIONARY_ORDERED: i64 = 1;
/// Schema flag: the field is nullable.
pub const ARROW_FLAG_NULLABLE: i64 = 2;
/// Schema flag: map keys are sorted.
pub const ARROW_FLAG_MAP_KEYS_SORTED: i64 = 4;

/// ArrowSchema as per the Arrow C spec.
#[repr(C)]
pub struct ArrowSchema {
    pub format: *const i8,
    pub name: *const i8,
    pub metadata: *const i8,
    pub flags: i64,
    pub n_children: i64,
    pub children: *mut *mut ArrowSchema,
    pub dictionary: *mut ArrowSchema,
    pub release: Option<unsafe extern "C" fn(*mut ArrowSchema)>,
    pub private_data: *mut c_void,
}

impl ArrowSchema {
    /// Creates an empty ArrowSchema for receiving FFI data.
    pub fn empty() -> Self {
        Self {
            format: ptr::null(),
            name: ptr::null(),
            metadata: ptr::null(),
            flags: 0,
            n_children: 0,
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }
}

/// ArrowArray as per the Arrow C spec.
#[repr(C)]
pub struct ArrowArray {
    pub length: i64,
    pub null_count: i64,
    pub offset: i64,
    pub n_buffers: i64,
    pub n_children: i64,
    pub buffers: *mut *const u8,
    pub children: *mut *mut ArrowArray,
    pub dictionary: *mut ArrowArray,
    pub release: Option<unsafe extern "C" fn(*mut ArrowArray)>,
    pub private_data: *mut c_void,
}

impl ArrowArray {
    /// Creates an empty ArrowArray for receiving FFI data.
    pub fn empty() -> Self {
        Self {
            length: 0,
            null_count: 0,
            offset: 0,
            n_buffers: 0,
            n_children: 0,
            buffers: ptr::null_mut(),
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }
}

/// Private data behind an exported schema descriptor.
///
/// Owns the name string the descriptor points into. The format string is
/// static (`ArrowType::format`) and needs no keep-alive.
pub(crate) struct SchemaHolder {
    #[allow(dead_code)] // holds the allocation `ArrowSchema.name` aliases
    pub name_cstr: Option<CString>,
}

/// Private data behind an exported array descriptor.
///
/// Keeps the array storage alive (one `Arc` share per export) together
/// with the buffer-pointer table the descriptor points into.
pub(crate) struct ArrayHolder {
    #[allow(dead_code)] // holds the storage the buffer pointers alias
    pub array: Array,
    #[allow(dead_code)]
    pub buf_ptrs: Vec<*const u8>,
}

// ArrayHolder travels inside release callbacks that a foreign runtime may
// invoke from any thread; the raw pointers alias Arc-pinned storage.
unsafe impl Send for ArrayHolder {}
unsafe impl Sync for ArrayHolder {}

/// Release callback for exported schemas: reclaims the holder and zeroes
/// the struct. Safe to invoke at most once; later calls are no-ops.
pub(crate) unsafe extern "C" fn release_exported_schema(s: *mut ArrowSchema) {
    if s.is_null() || unsafe { &*s }.release.is_none() {
        return;
    }
    let private = unsafe { (*s).private_data };
    if !private.is_null() {
        drop(unsafe { Box::from_raw(private as *mut SchemaHolder) });
    }
    unsafe { ptr::write_bytes(s, 0, 1) };
}

/// Release callback for exported arrays: reclaims the holder (dropping one
/// reference share of the storage) and zeroes the struct.
pub(crate) unsafe extern "C" fn release_exported_array(a: *mut ArrowArray) {
    if a.is_null() || unsafe { &*a }.release.is_none() {
        return;
    }
    let private = unsafe { (*a).private_data };
    if !private.is_null() {
        drop(unsafe { Box::from_raw(private as *mut ArrayHolder) });
    }
    unsafe { ptr::write_bytes(a, 0, 1) };
}

/// Runs a schema descriptor's release (if still set) and frees its shell.
pub(crate) unsafe fn release_and_free_schema(ptr: *mut ArrowSchema) {
    let mut shell = unsafe { Box::from_raw(ptr) };
    if let Some(release) = shell.release {
        unsafe { release(shell.as_mut() as *mut ArrowSchema) };
    }
}

/// Runs an array descriptor's release (if still set) and frees its shell.
pub(crate) unsafe fn release_and_free_array(ptr: *mut ArrowArray) {
    let mut shell = unsafe { Box::from_raw(ptr) };
    if let Some(release) = shell.release {
        unsafe { release(shell.as_mut() as *mut ArrowArray) };
    }
}

/// Capsule destructor for an unconsumed schema capsule.
pub(crate) unsafe fn schema_capsule_destructor(p: *mut c_void) {
    unsafe { release_and_free_schema(p as *mut ArrowSchema) };
}

/// Capsule destructor for an unconsumed array capsule.
pub(crate) unsafe fn array_capsule_destructor(p: *mut c_void) {
    unsafe { release_and_free_array(p as *mut ArrowArray) };
}

/// Wraps a boxed schema descriptor into a tagged capsule.
pub(crate) fn schema_capsule(schema: Box<ArrowSchema>) -> Capsule {
    Capsule::new(
        SCHEMA_CAPSULE_NAME,
        Box::into_raw(schema) as *mut c_void,
        schema_capsule_destructor,
    )
}

/// Wraps a boxed array descriptor into a tagged capsule.
pub(crate) fn array_capsule(array: Box<ArrowArray>) -> Capsule {
    Capsule::new(
        ARRAY_CAPSULE_NAME,
        Box::into_raw(array) as *mut c_void,
        array_capsule_destructor,
    )
}
