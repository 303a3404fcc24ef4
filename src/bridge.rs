//! # **BridgeArray Module** - *The externally visible interchange wrapper*
//!
//! A `BridgeArray` is what a foreign runtime interacts with: it can be
//! built directly from a typed array, adopted from a foreign capsule pair,
//! and re-exported to fresh capsules any number of times.
//!
//! ## State machine
//! `Holding -> Released`, exactly once. Export is a read operation and
//! leaves the state untouched. After release, every observable operation
//! fails with [`BridgeError::UseAfterRelease`]; drop releases implicitly
//! if the explicit transition never happened, and a second drop path
//! cannot double-free because the storage is reference counted.

use std::sync::Arc;

use crate::enums::array::Array;
use crate::enums::error::BridgeError;
use crate::ffi::export::export_to_capsules;
use crate::ffi::import::import_from_capsules;
use crate::structs::capsule::Capsule;
use crate::structs::field::{Field, FieldArray};

/// Capability: "exports as a (schema capsule, array capsule) pair".
///
/// The statically checkable counterpart of the runtime attribute probe
/// used by dynamic producers; anything implementing this can hand its data
/// to [`BridgeArray::from_exportable`].
pub trait ArrowArrayExportable {
    /// Exports the array as a (schema capsule, array capsule) pair.
    ///
    /// Canonical consumption order is schema first; the pair must be
    /// consumed together.
    fn export(&self) -> Result<(Arc<Capsule>, Arc<Capsule>), BridgeError>;
}

enum State {
    Holding(FieldArray),
    Released,
}

/// Interchange wrapper holding one typed nullable array.
pub struct BridgeArray {
    state: State,
}

impl BridgeArray {
    /// Directly wraps an owned field/array pair.
    pub fn new(fa: FieldArray) -> Self {
        Self {
            state: State::Holding(fa),
        }
    }

    /// Validates and adopts a foreign capsule pair.
    ///
    /// On failure the capsules are left exactly as received and the caller
    /// keeps the release responsibility. A pair that was already imported
    /// fails with [`BridgeError::CapsuleConsumed`].
    pub fn from_capsules(
        schema_capsule: &Capsule,
        array_capsule: &Capsule,
    ) -> Result<Self, BridgeError> {
        let fa = import_from_capsules(schema_capsule, array_capsule)?;
        Ok(Self::new(fa))
    }

    /// Builds from anything that can export a capsule pair.
    pub fn from_exportable(source: &impl ArrowArrayExportable) -> Result<Self, BridgeError> {
        let (schema, array) = source.export()?;
        Self::from_capsules(&schema, &array)
    }

    fn holding(&self) -> Result<&FieldArray, BridgeError> {
        match &self.state {
            State::Holding(fa) => Ok(fa),
            State::Released => Err(BridgeError::UseAfterRelease),
        }
    }

    /// Number of logical elements.
    pub fn size(&self) -> Result<usize, BridgeError> {
        Ok(self.holding()?.array.len())
    }

    /// Number of null positions.
    pub fn null_count(&self) -> Result<usize, BridgeError> {
        Ok(self.holding()?.array.null_count())
    }

    /// True if position `i` holds a null. Panics if `i >= size`.
    pub fn is_null(&self, i: usize) -> Result<bool, BridgeError> {
        Ok(self.holding()?.array.is_null(i))
    }

    /// Field metadata of the held array.
    pub fn field(&self) -> Result<&Field, BridgeError> {
        Ok(&self.holding()?.field)
    }

    /// The held array.
    pub fn array(&self) -> Result<&Array, BridgeError> {
        Ok(&self.holding()?.array)
    }

    /// Explicit `Holding -> Released` transition.
    ///
    /// Drops the held storage (running any adopted release callbacks whose
    /// last share this was). Exactly once: a second call fails with
    /// [`BridgeError::UseAfterRelease`].
    pub fn release(&mut self) -> Result<(), BridgeError> {
        match std::mem::replace(&mut self.state, State::Released) {
            State::Holding(fa) => {
                drop(fa);
                Ok(())
            }
            State::Released => Err(BridgeError::UseAfterRelease),
        }
    }
}

impl ArrowArrayExportable for BridgeArray {
    /// Exports to a fresh capsule pair. Read operation: the bridge keeps
    /// holding its array, and repeated exports each mint an independent
    /// reference share of the storage.
    fn export(&self) -> Result<(Arc<Capsule>, Arc<Capsule>), BridgeError> {
        let fa = self.holding()?;
        export_to_capsules(&fa.array, &fa.field)
    }
}

impl std::fmt::Debug for BridgeArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            State::Holding(fa) => f
                .debug_struct("BridgeArray")
                .field("field", &fa.field)
                .field("len", &fa.array.len())
                .field("null_count", &fa.array.null_count())
                .finish(),
            State::Released => f.write_str("BridgeArray(released)"),
        }
    }
}
