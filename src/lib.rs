//! # arrowbridge - Arrow C Data Interface capsule interchange
//!
//! Lets two independent runtimes exchange columnar array data (values plus
//! per-element validity) without copying the underlying memory, via the
//! *Apache Arrow* **C Data Interface**: a (schema, array) pair of plain C
//! structs passed by pointer inside opaque capsules whose lifetime is
//! controlled by an explicit release callback.
//!
//! ## Features
//! - **Export**: wrap a nullable typed array into a tagged
//!   (schema capsule, array capsule) pair; buffer pointers alias the
//!   array's storage, no copy.
//! - **Import**: validate a foreign capsule pair and adopt it zero-copy,
//!   taking over the obligation to run each descriptor's release exactly
//!   once.
//! - **Lifetime tracking**: storage is reference counted, so the same
//!   array can be exported to any number of simultaneous consumers and is
//!   freed only after the last outstanding capsule pair is released.
//!
//! ## Copy semantics
//! Value buffers move zero-copy in both directions. Validity bitmaps (and
//! bit-packed boolean values) are rebuilt into owned [`Bitmask`] storage
//! on import - ceil(N/8) bytes per array, which also absorbs any logical
//! offset the producer sliced at.
//!
//! ## Example
//! ```
//! use arrowbridge::{
//!     Array, ArrowArrayExportable, ArrowType, BridgeArray, Field, FieldArray, PrimitiveArray,
//! };
//!
//! // Producer side: 5 nullable 32-bit values.
//! let values = PrimitiveArray::<i32>::from_nullable_slice(&[
//!     Some(10), Some(20), None, Some(40), Some(50),
//! ]);
//! let bridge = BridgeArray::new(FieldArray::new(
//!     Field::new("values", ArrowType::Int32, true),
//!     Array::from_int32(values),
//! ));
//!
//! // Across the boundary: two capsules, consumed by the other runtime.
//! let (schema_capsule, array_capsule) = bridge.export()?;
//! let received = BridgeArray::from_capsules(&schema_capsule, &array_capsule)?;
//!
//! assert_eq!(received.size()?, 5);
//! assert!(received.is_null(2)?);
//! # Ok::<(), arrowbridge::BridgeError>(())
//! ```
//!
//! ## Trademark Notice
//! *Apache Arrow* is a trademark of the Apache Software Foundation, used
//! here under fair-use to implement its published interoperability
//! standard as per <https://www.apache.org/foundation/marks/>.

pub mod bridge;
pub mod enums;
pub mod ffi;
pub mod structs;
pub mod traits;

// Re-export the main types for ease of use
pub use bridge::{ArrowArrayExportable, BridgeArray};
pub use enums::array::Array;
pub use enums::error::BridgeError;
pub use ffi::arrow_c::{
    ARRAY_CAPSULE_NAME, ARROW_FLAG_DICTIONARY_ORDERED, ARROW_FLAG_MAP_KEYS_SORTED,
    ARROW_FLAG_NULLABLE, ArrowArray, ArrowSchema, SCHEMA_CAPSULE_NAME,
};
pub use ffi::arrow_dtype::ArrowType;
pub use ffi::export::{export_to_c, export_to_capsules};
pub use ffi::import::import_from_capsules;
pub use structs::bitmask::Bitmask;
pub use structs::boolean_array::BooleanArray;
pub use structs::buffer::{Buffer, BufferOwner};
pub use structs::capsule::{Capsule, CapsuleDestructor};
pub use structs::field::{Field, FieldArray};
pub use structs::primitive_array::PrimitiveArray;
pub use traits::primitive::Primitive;
