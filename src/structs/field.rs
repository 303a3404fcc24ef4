//! # **Field Module** - *Logical metadata for one array*
//!
//! A `Field` names an array and records its logical type and nullability;
//! a `FieldArray` pairs the metadata with the data. These travel through
//! the schema descriptor on export and are rebuilt from it on import.

use crate::enums::array::Array;
use crate::ffi::arrow_dtype::ArrowType;

/// Logical metadata for one array.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub dtype: ArrowType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: ArrowType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            dtype,
            nullable,
        }
    }
}

/// A field paired with its array data.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    pub field: Field,
    pub array: Array,
}

impl FieldArray {
    /// Pairs metadata with data. The field's logical type must match the
    /// array's physical type tag.
    pub fn new(field: Field, array: Array) -> Self {
        assert_eq!(
            field.dtype,
            array.dtype(),
            "field dtype must match array dtype"
        );
        Self { field, array }
    }

    /// Wraps an array under a default field using its own type tag.
    pub fn from_array(name: impl Into<String>, array: Array) -> Self {
        let field = Field::new(name, array.dtype(), true);
        Self { field, array }
    }
}
