//! # **Primitive Trait** - *Fixed-width element types*
//!
//! Marker trait tying each transportable element type to its logical
//! [`ArrowType`] tag. The `Zero` bound supplies the placeholder value
//! written at null positions.

use num_traits::Zero;

use crate::ffi::arrow_dtype::ArrowType;

/// Fixed-width element type that can cross the C Data Interface.
pub trait Primitive: Zero + Copy + PartialEq + Send + Sync + 'static {
    /// Logical type tag used for the format-string mapping.
    const DTYPE: ArrowType;
}

impl Primitive for i32 {
    const DTYPE: ArrowType = ArrowType::Int32;
}

impl Primitive for u32 {
    const DTYPE: ArrowType = ArrowType::UInt32;
}

impl Primitive for i64 {
    const DTYPE: ArrowType = ArrowType::Int64;
}

impl Primitive for u64 {
    const DTYPE: ArrowType = ArrowType::UInt64;
}

impl Primitive for f32 {
    const DTYPE: ArrowType = ArrowType::Float32;
}

impl Primitive for f64 {
    const DTYPE: ArrowType = ArrowType::Float64;
}
