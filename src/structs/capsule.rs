//! # **Capsule Module** - *Opaque pointer holder with exactly-once teardown*
//!
//! A capsule exclusively owns one raw pointer and one destructor. The
//! destructor runs exactly once, on the drop of the capsule's last
//! reference, unless a consumer took the pointer over first. Consumption
//! is an atomic pointer swap, so concurrent reclamation passes from
//! independent runtimes cannot double-run the teardown.
//!
//! The name tag identifies the payload type, mirroring the Arrow PyCapsule
//! convention (`"arrow_schema"` / `"arrow_array"`), so a generic
//! interchange path can tell a schema/array pair apart from any unrelated
//! capsule.

use std::ffi::c_void;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::enums::error::BridgeError;

/// Teardown callback for a capsule payload.
///
/// # Safety
/// Invoked with the pointer the capsule was built with, exactly once.
pub type CapsuleDestructor = unsafe fn(*mut c_void);

/// Opaque holder for one foreign pointer plus one destructor.
///
/// Reference counting comes from wrapping in `Arc`; the capsule itself
/// tracks only the consumed state.
pub struct Capsule {
    name: &'static str,
    ptr: AtomicPtr<c_void>,
    destructor: CapsuleDestructor,
}

impl Capsule {
    /// Wraps `ptr` under `name`, arranging for `destructor` to run on drop
    /// unless the pointer is consumed first.
    pub fn new(name: &'static str, ptr: *mut c_void, destructor: CapsuleDestructor) -> Self {
        debug_assert!(!ptr.is_null(), "capsule payload must be non-null");
        Self {
            name,
            ptr: AtomicPtr::new(ptr),
            destructor,
        }
    }

    /// The payload type tag.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True once the pointer has been taken over by a consumer.
    pub fn is_consumed(&self) -> bool {
        self.ptr.load(Ordering::Acquire).is_null()
    }

    /// Reads the payload pointer without consuming it.
    ///
    /// Fails with `CapsuleType` on a tag mismatch and `CapsuleConsumed` if
    /// the pointer was already taken. Used for validation passes that must
    /// leave the capsule exactly as received on failure.
    pub fn peek(&self, expected_name: &'static str) -> Result<*mut c_void, BridgeError> {
        if self.name != expected_name {
            return Err(BridgeError::CapsuleType {
                expected: expected_name,
                actual: self.name,
            });
        }
        let ptr = self.ptr.load(Ordering::Acquire);
        if ptr.is_null() {
            return Err(BridgeError::CapsuleConsumed(self.name));
        }
        Ok(ptr)
    }

    /// Takes the payload over, marking the capsule consumed.
    ///
    /// After a successful take the capsule's drop becomes a no-op and the
    /// caller owns both the pointer and the teardown obligation.
    pub fn take(&self, expected_name: &'static str) -> Result<*mut c_void, BridgeError> {
        if self.name != expected_name {
            return Err(BridgeError::CapsuleType {
                expected: expected_name,
                actual: self.name,
            });
        }
        let ptr = self.ptr.swap(std::ptr::null_mut(), Ordering::AcqRel);
        if ptr.is_null() {
            return Err(BridgeError::CapsuleConsumed(self.name));
        }
        Ok(ptr)
    }

    /// Hands a taken pointer back, un-consuming the capsule.
    ///
    /// Only used to unwind a partially consumed pair when the second take
    /// of an import fails; the pointer must be the one `take` returned.
    pub(crate) fn restore(&self, ptr: *mut c_void) {
        let prev = self.ptr.swap(ptr, Ordering::AcqRel);
        debug_assert!(prev.is_null(), "restore over a live capsule payload");
    }
}

impl Drop for Capsule {
    fn drop(&mut self) {
        let ptr = self.ptr.swap(std::ptr::null_mut(), Ordering::AcqRel);
        if !ptr.is_null() {
            unsafe { (self.destructor)(ptr) };
        }
    }
}

impl std::fmt::Debug for Capsule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capsule")
            .field("name", &self.name)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

// The payload is an exclusively owned heap pointer whose teardown is
// thread-agnostic; consumed-marking is atomic.
unsafe impl Send for Capsule {}
unsafe impl Sync for Capsule {}
