//! # **Importer** - *Validation and zero-copy adoption of a capsule pair*
//!
//! Accepts a (schema capsule, array capsule) pair from a foreign producer,
//! validates it, and adopts the descriptors into a [`FieldArray`].
//!
//! ## Validation order (fail fast)
//! 1. capsule name tags,
//! 2. pointers non-null / not already consumed; a descriptor whose
//!    release pointer is cleared counts as consumed too,
//! 3. format string maps to a supported type,
//! 4. descriptor-internal consistency (length, null_count, offset,
//!    buffer count).
//!
//! Nothing is consumed until every check passes: a failed import leaves
//! both capsules exactly as received, so the producer side retains the
//! release responsibility.
//!
//! ## Copy semantics
//! - Numeric value buffers are adopted zero-copy; the foreign release runs
//!   once, when the last buffer window over the allocation drops.
//! - Validity bitmaps are rebuilt into owned [`Bitmask`] storage
//!   (ceil(N/8) bytes), which also absorbs any logical offset.
//! - Boolean value bits cannot be aliased at a bit offset, so they are
//!   rebuilt the same way and the foreign array is released immediately.

use std::ffi::CStr;
use std::sync::Arc;

use crate::enums::array::Array;
use crate::enums::error::BridgeError;
use crate::ffi::arrow_c::{
    ARRAY_CAPSULE_NAME, ARROW_FLAG_NULLABLE, ArrowArray, ArrowSchema, SCHEMA_CAPSULE_NAME,
    release_and_free_schema,
};
use crate::ffi::arrow_dtype::ArrowType;
use crate::structs::bitmask::Bitmask;
use crate::structs::boolean_array::BooleanArray;
use crate::structs::buffer::{Buffer, BufferOwner};
use crate::structs::capsule::Capsule;
use crate::structs::field::{Field, FieldArray};
use crate::structs::primitive_array::PrimitiveArray;
use crate::traits::primitive::Primitive;

/// Owns a foreign ArrowArray and calls its release on drop.
///
/// One instance exists per adopted array; wrapped in an `Arc` it serves as
/// the keep-alive owner for every buffer window into the foreign memory,
/// so the release runs exactly once, after the last window drops.
struct ForeignBuffer {
    array: Option<Box<ArrowArray>>,
}

impl Drop for ForeignBuffer {
    fn drop(&mut self) {
        if let Some(mut arr) = self.array.take() {
            if let Some(release) = arr.release {
                unsafe { release(arr.as_mut() as *mut ArrowArray) };
            }
        }
    }
}

// The foreign producer's release contract is thread-agnostic.
unsafe impl Send for ForeignBuffer {}
unsafe impl Sync for ForeignBuffer {}

/// Imports a validated (schema capsule, array capsule) pair.
///
/// On success both capsules are consumed and the returned array owns the
/// obligation to run each descriptor's release exactly once.
pub fn import_from_capsules(
    schema_capsule: &Capsule,
    array_capsule: &Capsule,
) -> Result<FieldArray, BridgeError> {
    // Steps 1-2: tags and liveness, without consuming.
    let schema_ptr = schema_capsule.peek(SCHEMA_CAPSULE_NAME)? as *mut ArrowSchema;
    let array_ptr = array_capsule.peek(ARRAY_CAPSULE_NAME)? as *mut ArrowArray;

    let sch = unsafe { &*schema_ptr };
    let arr = unsafe { &*array_ptr };

    // Step 2, continued: a cleared release pointer is the data model's
    // "already released" marker, regardless of what the rest of the
    // descriptor claims.
    if sch.release.is_none() {
        return Err(BridgeError::CapsuleConsumed(SCHEMA_CAPSULE_NAME));
    }
    if arr.release.is_none() {
        return Err(BridgeError::CapsuleConsumed(ARRAY_CAPSULE_NAME));
    }

    // Step 3: type mapping.
    let dtype = parse_schema_format(sch)?;

    // Step 4: internal consistency. No buffer has been touched yet.
    validate_descriptors(arr, dtype)?;

    // All checks passed: consume both capsules. The take of the second
    // capsule can only fail under a concurrent consumer; unwind the first
    // so the pair is left as received.
    let schema_raw = schema_capsule.take(SCHEMA_CAPSULE_NAME)? as *mut ArrowSchema;
    let array_raw = match array_capsule.take(ARRAY_CAPSULE_NAME) {
        Ok(p) => p as *mut ArrowArray,
        Err(e) => {
            schema_capsule.restore(schema_raw as *mut _);
            return Err(e);
        }
    };

    debug_assert_eq!(schema_raw, schema_ptr);
    debug_assert_eq!(array_raw, array_ptr);

    // Adoption: from here on this function owns both descriptors.
    let field = unsafe { field_from_schema(&*schema_raw, dtype) };
    unsafe { release_and_free_schema(schema_raw) };

    let arr_box = unsafe { Box::from_raw(array_raw) };
    let array = unsafe { adopt_array(arr_box, dtype) };
    Ok(FieldArray::new(field, array))
}

/// Parses the schema's format string, rejecting nested or dictionary types.
fn parse_schema_format(sch: &ArrowSchema) -> Result<ArrowType, BridgeError> {
    if sch.format.is_null() {
        return Err(BridgeError::MalformedArray(
            "schema format string is null".into(),
        ));
    }
    let fmt = unsafe { CStr::from_ptr(sch.format as *const _) };
    let dtype = ArrowType::from_format(fmt)?;
    if sch.n_children != 0 || !sch.children.is_null() {
        return Err(BridgeError::TypeUnsupported(
            "nested types with children are not supported".into(),
        ));
    }
    if !sch.dictionary.is_null() {
        return Err(BridgeError::TypeUnsupported(
            "dictionary-encoded arrays are not supported".into(),
        ));
    }
    Ok(dtype)
}

/// Checks descriptor-internal consistency before any adoption.
fn validate_descriptors(arr: &ArrowArray, dtype: ArrowType) -> Result<(), BridgeError> {
    if arr.length < 0 {
        return Err(BridgeError::MalformedArray(format!(
            "negative length {}",
            arr.length
        )));
    }
    if arr.offset < 0 {
        return Err(BridgeError::MalformedArray(format!(
            "negative offset {}",
            arr.offset
        )));
    }
    if arr.null_count < -1 || arr.null_count > arr.length {
        return Err(BridgeError::MalformedArray(format!(
            "null_count {} out of range for length {}",
            arr.null_count, arr.length
        )));
    }
    if arr.n_children != 0 || !arr.dictionary.is_null() {
        return Err(BridgeError::TypeUnsupported(
            "nested or dictionary-encoded arrays are not supported".into(),
        ));
    }
    if arr.n_buffers != 2 {
        return Err(BridgeError::MalformedArray(format!(
            "expected 2 buffers for {:?}, descriptor declares {}",
            dtype, arr.n_buffers
        )));
    }
    let logical_end = arr.offset as usize + arr.length as usize;
    if logical_end > 0 {
        if arr.buffers.is_null() {
            return Err(BridgeError::MalformedArray(
                "buffer pointer table is null".into(),
            ));
        }
        let buffers = unsafe { std::slice::from_raw_parts(arr.buffers, 2) };
        if buffers[1].is_null() {
            return Err(BridgeError::MalformedArray(
                "values buffer is null for a non-empty array".into(),
            ));
        }
        if arr.null_count > 0 && buffers[0].is_null() {
            return Err(BridgeError::MalformedArray(format!(
                "null_count {} declared but validity buffer is null",
                arr.null_count
            )));
        }
    }
    Ok(())
}

/// Rebuilds field metadata from an adopted schema descriptor.
unsafe fn field_from_schema(sch: &ArrowSchema, dtype: ArrowType) -> Field {
    let name = if sch.name.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(sch.name as *const _) }
            .to_string_lossy()
            .into_owned()
    };
    let nullable = sch.flags & ARROW_FLAG_NULLABLE != 0;
    Field::new(name, dtype, nullable)
}

/// Adopts an owned array descriptor into typed storage.
///
/// # Safety
/// The descriptor must have passed [`validate_descriptors`].
unsafe fn adopt_array(arr_box: Box<ArrowArray>, dtype: ArrowType) -> Array {
    match dtype {
        ArrowType::Boolean => unsafe { adopt_boolean(arr_box) },
        ArrowType::Int32 => Array::from_int32(unsafe { adopt_primitive::<i32>(arr_box) }),
        ArrowType::UInt32 => Array::from_uint32(unsafe { adopt_primitive::<u32>(arr_box) }),
        ArrowType::Int64 => Array::from_int64(unsafe { adopt_primitive::<i64>(arr_box) }),
        ArrowType::UInt64 => Array::from_uint64(unsafe { adopt_primitive::<u64>(arr_box) }),
        ArrowType::Float32 => Array::from_float32(unsafe { adopt_primitive::<f32>(arr_box) }),
        ArrowType::Float64 => Array::from_float64(unsafe { adopt_primitive::<f64>(arr_box) }),
    }
}

/// Copies the validity window and resolves a lazy null count.
///
/// Returns `(mask, null_count)` honouring `null_count == -1` ("unknown,
/// compute") by counting zeros in the copied window.
unsafe fn adopt_validity(arr: &ArrowArray, len: usize) -> (Option<Bitmask>, usize) {
    let validity_ptr = if arr.buffers.is_null() {
        std::ptr::null()
    } else {
        unsafe { *arr.buffers }
    };
    if validity_ptr.is_null() || len == 0 {
        return (None, 0);
    }
    let mask = unsafe { Bitmask::from_raw_slice_offset(validity_ptr, arr.offset as usize, len) };
    // Recount from the copied window rather than trusting the declared
    // value: a -1 sentinel means "unknown", and offset slicing changes the
    // count relative to the producer's whole-buffer figure anyway.
    let null_count = mask.count_zeros();
    if null_count == 0 {
        // All-valid bitmap: drop it so the no-nulls sentinel holds.
        (None, 0)
    } else {
        (Some(mask), null_count)
    }
}

/// Zero-copy adoption of a fixed-width values buffer.
unsafe fn adopt_primitive<T: Primitive>(arr_box: Box<ArrowArray>) -> PrimitiveArray<T> {
    debug_assert_eq!(T::DTYPE.byte_width(), Some(std::mem::size_of::<T>()));
    let len = arr_box.length as usize;
    let offset = arr_box.offset as usize;
    let (null_mask, null_count) = unsafe { adopt_validity(&arr_box, len) };

    // Zero-length: nothing to alias; release the foreign memory now.
    if len == 0 {
        drop(ForeignBuffer {
            array: Some(arr_box),
        });
        return PrimitiveArray::default();
    }

    let buffers = unsafe { std::slice::from_raw_parts(arr_box.buffers, 2) };
    let data_ptr = unsafe { (buffers[1] as *const T).add(offset) };
    let owner: BufferOwner = Arc::new(ForeignBuffer {
        array: Some(arr_box),
    });
    let data = unsafe { Buffer::from_owner(owner, data_ptr, len) };
    PrimitiveArray::from_parts(data, null_mask, null_count)
}

/// Boolean adoption: bit-packed values are rebuilt into owned storage and
/// the foreign array is released immediately after the copy.
unsafe fn adopt_boolean(arr_box: Box<ArrowArray>) -> Array {
    let len = arr_box.length as usize;
    let offset = arr_box.offset as usize;
    let (null_mask, _) = unsafe { adopt_validity(&arr_box, len) };

    let data = if len == 0 {
        Bitmask::default()
    } else {
        let buffers = unsafe { std::slice::from_raw_parts(arr_box.buffers, 2) };
        unsafe { Bitmask::from_raw_slice_offset(buffers[1], offset, len) }
    };

    drop(ForeignBuffer {
        array: Some(arr_box),
    });

    Array::from_bool(BooleanArray::new(data, null_mask))
}
