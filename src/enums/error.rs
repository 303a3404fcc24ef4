//! # **Error Module** - *Unified error type for capsule interchange*
//!
//! Every failure in this crate is deterministic for a given input and is
//! surfaced synchronously through `Result`; nothing is retried or swallowed.

use thiserror::Error;

/// Catch-all error type for `arrowbridge`.
#[derive(Error, Debug, PartialEq)]
pub enum BridgeError {
    /// Descriptor or capsule construction could not acquire a resource.
    ///
    /// Rust's global allocator aborts rather than failing, so in practice
    /// this surfaces only from fallible constructions such as a field name
    /// containing an interior NUL byte.
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// The element type or format string has no mapping in this crate.
    #[error("unsupported type: {0}")]
    TypeUnsupported(String),

    /// A capsule carried an unexpected name tag.
    #[error("capsule type mismatch: expected `{expected}`, got `{actual}`")]
    CapsuleType {
        expected: &'static str,
        actual: &'static str,
    },

    /// The capsule's pointer was already taken, or its descriptor was
    /// already released (cleared release pointer).
    #[error("capsule `{0}` has already been consumed")]
    CapsuleConsumed(&'static str),

    /// Imported descriptors failed an internal consistency check.
    /// No buffer is touched and no ownership is taken when this is raised.
    #[error("malformed array: {0}")]
    MalformedArray(String),

    /// An operation was attempted on a bridge object after release.
    #[error("use after release: bridge array has already been released")]
    UseAfterRelease,
}
