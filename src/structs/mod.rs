//! Concrete storage and protocol primitives.

pub mod bitmask;
pub mod boolean_array;
pub mod buffer;
pub mod capsule;
pub mod field;
pub mod primitive_array;
