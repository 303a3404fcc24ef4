//! # **Array Enum** - *Unified array type over the supported primitives*
//!
//! One tag per transportable physical layout. Inner arrays are `Arc`-shared
//! so an export can mint an independent reference share of the storage
//! without copying, and multiple outstanding capsule pairs can be released
//! concurrently by independent consumers.

use std::sync::Arc;

use crate::ffi::arrow_dtype::ArrowType;
use crate::structs::bitmask::Bitmask;
use crate::structs::boolean_array::BooleanArray;
use crate::structs::primitive_array::PrimitiveArray;

/// Unified array type.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Boolean(Arc<BooleanArray>),
    Int32(Arc<PrimitiveArray<i32>>),
    UInt32(Arc<PrimitiveArray<u32>>),
    Int64(Arc<PrimitiveArray<i64>>),
    UInt64(Arc<PrimitiveArray<u64>>),
    Float32(Arc<PrimitiveArray<f32>>),
    Float64(Arc<PrimitiveArray<f64>>),
}

macro_rules! dispatch {
    ($self:expr, $arr:ident => $body:expr) => {
        match $self {
            Array::Boolean($arr) => $body,
            Array::Int32($arr) => $body,
            Array::UInt32($arr) => $body,
            Array::Int64($arr) => $body,
            Array::UInt64($arr) => $body,
            Array::Float32($arr) => $body,
            Array::Float64($arr) => $body,
        }
    };
}

impl Array {
    pub fn from_bool(arr: BooleanArray) -> Self {
        Array::Boolean(Arc::new(arr))
    }

    pub fn from_int32(arr: PrimitiveArray<i32>) -> Self {
        Array::Int32(Arc::new(arr))
    }

    pub fn from_uint32(arr: PrimitiveArray<u32>) -> Self {
        Array::UInt32(Arc::new(arr))
    }

    pub fn from_int64(arr: PrimitiveArray<i64>) -> Self {
        Array::Int64(Arc::new(arr))
    }

    pub fn from_uint64(arr: PrimitiveArray<u64>) -> Self {
        Array::UInt64(Arc::new(arr))
    }

    pub fn from_float32(arr: PrimitiveArray<f32>) -> Self {
        Array::Float32(Arc::new(arr))
    }

    pub fn from_float64(arr: PrimitiveArray<f64>) -> Self {
        Array::Float64(Arc::new(arr))
    }

    /// Logical type tag of the physical layout.
    pub fn dtype(&self) -> ArrowType {
        match self {
            Array::Boolean(_) => ArrowType::Boolean,
            Array::Int32(_) => ArrowType::Int32,
            Array::UInt32(_) => ArrowType::UInt32,
            Array::Int64(_) => ArrowType::Int64,
            Array::UInt64(_) => ArrowType::UInt64,
            Array::Float32(_) => ArrowType::Float32,
            Array::Float64(_) => ArrowType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        dispatch!(self, a => a.null_count())
    }

    /// True if position `i` holds a null. Panics if `i >= len`.
    pub fn is_null(&self, i: usize) -> bool {
        dispatch!(self, a => a.is_null(i))
    }

    /// Raw pointer and byte length of the values buffer.
    pub fn data_ptr_and_byte_len(&self) -> (*const u8, usize) {
        dispatch!(self, a => a.data_ptr_and_byte_len())
    }

    /// Raw pointer to the packed validity bitmap, if present.
    pub fn null_mask_ptr(&self) -> Option<*const u8> {
        dispatch!(self, a => a.null_mask_ptr())
    }

    pub fn null_mask(&self) -> Option<&Bitmask> {
        dispatch!(self, a => a.null_mask())
    }
}
