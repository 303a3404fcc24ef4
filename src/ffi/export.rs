//! # **Exporter** - *Ownership packaging into a capsule pair*
//!
//! Builds a (schema, array) descriptor pair whose buffer pointers alias
//! the array's storage, then wraps each descriptor in a tagged capsule.
//!
//! ## Ownership
//! - Every export mints an independent `Arc` share of the storage, held by
//!   the array descriptor's private holder. Re-exporting the same array is
//!   therefore always zero-copy and can never double-free: each capsule
//!   pair releases only its own share.
//! - The schema and array capsules may be dropped in either order; each
//!   descriptor's release reclaims only its own holder.

use std::ffi::{CString, c_void};
use std::ptr;
use std::sync::Arc;

use crate::enums::array::Array;
use crate::enums::error::BridgeError;
use crate::ffi::arrow_c::{
    ARROW_FLAG_NULLABLE, ArrayHolder, ArrowArray, ArrowSchema, SchemaHolder, array_capsule,
    release_exported_array, release_exported_schema, schema_capsule,
};
use crate::structs::capsule::Capsule;
use crate::structs::field::Field;

/// Exports an array as raw Arrow C Data Interface pointers.
///
/// Returned pointers are `Box` allocations; the caller owns both the
/// release obligation and the shell deallocation (normally by wrapping in
/// capsules via [`export_to_capsules`]).
pub fn export_to_c(
    array: &Array,
    field: &Field,
) -> Result<(*mut ArrowSchema, *mut ArrowArray), BridgeError> {
    if field.dtype != array.dtype() {
        return Err(BridgeError::TypeUnsupported(format!(
            "field dtype {:?} does not match array dtype {:?}",
            field.dtype,
            array.dtype()
        )));
    }
    // Closed type set: every variant has a format mapping.
    let format = field.dtype.format();

    let name_cstr = if field.name.is_empty() {
        None
    } else {
        Some(
            CString::new(field.name.clone())
                .map_err(|e| BridgeError::Allocation(format!("field name: {e}")))?,
        )
    };
    let name_ptr = name_cstr
        .as_ref()
        .map_or(ptr::null(), |c| c.as_ptr() as *const i8);

    let flags = if field.nullable { ARROW_FLAG_NULLABLE } else { 0 };
    let schema = Box::new(ArrowSchema {
        format: format.as_ptr() as *const i8,
        name: name_ptr,
        metadata: ptr::null(),
        flags,
        n_children: 0,
        children: ptr::null_mut(),
        dictionary: ptr::null_mut(),
        release: Some(release_exported_schema),
        private_data: Box::into_raw(Box::new(SchemaHolder { name_cstr })) as *mut c_void,
    });

    let len = array.len();
    let (data_ptr, byte_len) = array.data_ptr_and_byte_len();
    // Avoid exporting sentinel pointers for empty buffers.
    let values_ptr = if byte_len > 0 { data_ptr } else { ptr::null() };
    let mask_ptr = array.null_mask_ptr().unwrap_or(ptr::null());
    let mut buf_ptrs: Vec<*const u8> = vec![mask_ptr, values_ptr];
    let buffers = buf_ptrs.as_mut_ptr();

    // Moving the Vec into the holder keeps its heap allocation, and the
    // `buffers` pointer into it, stable.
    let holder = Box::new(ArrayHolder {
        array: array.clone(),
        buf_ptrs,
    });

    let arr = Box::new(ArrowArray {
        length: len as i64,
        null_count: array.null_count() as i64,
        offset: 0,
        n_buffers: 2,
        n_children: 0,
        buffers,
        children: ptr::null_mut(),
        dictionary: ptr::null_mut(),
        release: Some(release_exported_array),
        private_data: Box::into_raw(holder) as *mut c_void,
    });

    Ok((Box::into_raw(schema), Box::into_raw(arr)))
}

/// Exports an array as a (schema capsule, array capsule) pair.
///
/// The pair must be consumed together; dropping either capsule releases
/// that descriptor's holder, and the storage itself is freed once the last
/// outstanding share is gone.
pub fn export_to_capsules(
    array: &Array,
    field: &Field,
) -> Result<(Arc<Capsule>, Arc<Capsule>), BridgeError> {
    let (schema_ptr, array_ptr) = export_to_c(array, field)?;
    let schema = unsafe { Box::from_raw(schema_ptr) };
    let arr = unsafe { Box::from_raw(array_ptr) };
    Ok((
        Arc::new(schema_capsule(schema)),
        Arc::new(array_capsule(arr)),
    ))
}
