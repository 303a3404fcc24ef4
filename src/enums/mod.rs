//! Enum-dispatched unified types and the crate error type.

pub mod array;
pub mod error;
