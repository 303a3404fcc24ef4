//! Trait seams shared across the crate.

pub mod primitive;
