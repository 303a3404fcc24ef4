//! Exactly-once release accounting against a hand-built foreign producer.
//!
//! The helpers below play the role of another runtime: they assemble raw
//! `ArrowSchema` / `ArrowArray` descriptors with their own release
//! callbacks and count every invocation.

use arrowbridge::{
    ARROW_FLAG_NULLABLE, Array, ArrowArray, ArrowArrayExportable, ArrowSchema, ArrowType,
    BridgeArray, BridgeError, Capsule, Field, FieldArray, PrimitiveArray,
};
use std::ffi::{CString, c_void};
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct ForeignSchemaState {
    #[allow(dead_code)] // aliased by ArrowSchema.format
    format: CString,
    #[allow(dead_code)] // aliased by ArrowSchema.name
    name: CString,
    releases: Arc<AtomicUsize>,
}

struct ForeignArrayState {
    // u64 storage keeps the values bytes aligned for any fixed-width type.
    #[allow(dead_code)] // aliased through the buffer table
    values: Vec<u64>,
    #[allow(dead_code)]
    validity: Option<Vec<u8>>,
    buffers: Vec<*const u8>,
    releases: Arc<AtomicUsize>,
}

fn pack_bytes(mut bytes: Vec<u8>) -> Vec<u64> {
    while bytes.len() % 8 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

unsafe extern "C" fn release_foreign_schema(s: *mut ArrowSchema) {
    if s.is_null() || unsafe { &*s }.release.is_none() {
        return;
    }
    let state = unsafe { Box::from_raw((*s).private_data as *mut ForeignSchemaState) };
    state.releases.fetch_add(1, Ordering::SeqCst);
    drop(state);
    unsafe { ptr::write_bytes(s, 0, 1) };
}

unsafe extern "C" fn release_foreign_array(a: *mut ArrowArray) {
    if a.is_null() || unsafe { &*a }.release.is_none() {
        return;
    }
    let state = unsafe { Box::from_raw((*a).private_data as *mut ForeignArrayState) };
    state.releases.fetch_add(1, Ordering::SeqCst);
    drop(state);
    unsafe { ptr::write_bytes(a, 0, 1) };
}

unsafe fn drop_foreign_schema_capsule(p: *mut c_void) {
    let mut shell = unsafe { Box::from_raw(p as *mut ArrowSchema) };
    if let Some(release) = shell.release {
        unsafe { release(shell.as_mut() as *mut ArrowSchema) };
    }
}

unsafe fn drop_foreign_array_capsule(p: *mut c_void) {
    let mut shell = unsafe { Box::from_raw(p as *mut ArrowArray) };
    if let Some(release) = shell.release {
        unsafe { release(shell.as_mut() as *mut ArrowArray) };
    }
}

fn foreign_schema(format: &str, releases: Arc<AtomicUsize>) -> Capsule {
    let state = Box::new(ForeignSchemaState {
        format: CString::new(format).unwrap(),
        name: CString::new("foreign").unwrap(),
        releases,
    });
    let mut schema = ArrowSchema::empty();
    schema.format = state.format.as_ptr() as *const i8;
    schema.name = state.name.as_ptr() as *const i8;
    schema.flags = ARROW_FLAG_NULLABLE;
    schema.release = Some(release_foreign_schema);
    schema.private_data = Box::into_raw(state) as *mut c_void;
    Capsule::new(
        "arrow_schema",
        Box::into_raw(Box::new(schema)) as *mut c_void,
        drop_foreign_schema_capsule,
    )
}

struct ForeignLayout {
    length: i64,
    null_count: i64,
    offset: i64,
    values: Vec<u8>,
    validity: Option<Vec<u8>>,
}

fn foreign_array(layout: ForeignLayout, releases: Arc<AtomicUsize>) -> Capsule {
    let mut state = Box::new(ForeignArrayState {
        values: pack_bytes(layout.values),
        validity: layout.validity,
        buffers: Vec::new(),
        releases,
    });
    let validity_ptr = state
        .validity
        .as_ref()
        .map_or(ptr::null(), |v| v.as_ptr());
    state.buffers = vec![validity_ptr, state.values.as_ptr() as *const u8];

    let mut arr = ArrowArray::empty();
    arr.length = layout.length;
    arr.null_count = layout.null_count;
    arr.offset = layout.offset;
    arr.n_buffers = 2;
    arr.buffers = state.buffers.as_mut_ptr();
    arr.release = Some(release_foreign_array);
    arr.private_data = Box::into_raw(state) as *mut c_void;
    Capsule::new(
        "arrow_array",
        Box::into_raw(Box::new(arr)) as *mut c_void,
        drop_foreign_array_capsule,
    )
}

fn le_bytes_i32(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn foreign_int32_pair(
    values: &[i32],
    validity: Option<Vec<u8>>,
    null_count: i64,
    offset: i64,
    length: i64,
    schema_releases: Arc<AtomicUsize>,
    array_releases: Arc<AtomicUsize>,
) -> (Capsule, Capsule) {
    let schema = foreign_schema("i", schema_releases);
    let array = foreign_array(
        ForeignLayout {
            length,
            null_count,
            offset,
            values: le_bytes_i32(values),
            validity,
        },
        array_releases,
    );
    (schema, array)
}

#[test]
fn import_then_drop_releases_each_descriptor_once() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let array_releases = Arc::new(AtomicUsize::new(0));
    let (s, a) = foreign_int32_pair(
        &[1, 2, 3],
        Some(vec![0b0000_0101]),
        1,
        0,
        3,
        schema_releases.clone(),
        array_releases.clone(),
    );

    let bridge = BridgeArray::from_capsules(&s, &a).unwrap();
    // The schema descriptor is consumed during adoption; the array's
    // release waits on the adopted buffer.
    assert_eq!(schema_releases.load(Ordering::SeqCst), 1);
    assert_eq!(array_releases.load(Ordering::SeqCst), 0);

    assert_eq!(bridge.size().unwrap(), 3);
    assert_eq!(bridge.null_count().unwrap(), 1);
    assert!(bridge.is_null(1).unwrap());

    drop(bridge);
    assert_eq!(schema_releases.load(Ordering::SeqCst), 1);
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);

    // Consumed capsules must not release again.
    drop(s);
    drop(a);
    assert_eq!(schema_releases.load(Ordering::SeqCst), 1);
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);
}

#[test]
fn unconsumed_capsules_release_on_drop_in_either_order() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let array_releases = Arc::new(AtomicUsize::new(0));
    let (s, a) = foreign_int32_pair(
        &[7],
        None,
        0,
        0,
        1,
        schema_releases.clone(),
        array_releases.clone(),
    );
    drop(a);
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);
    assert_eq!(schema_releases.load(Ordering::SeqCst), 0);
    drop(s);
    assert_eq!(schema_releases.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_import_consumes_nothing() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let array_releases = Arc::new(AtomicUsize::new(0));
    // null_count exceeds length: rejected before any adoption.
    let (s, a) = foreign_int32_pair(
        &[1, 2],
        Some(vec![0b0000_0011]),
        5,
        0,
        2,
        schema_releases.clone(),
        array_releases.clone(),
    );

    let err = BridgeArray::from_capsules(&s, &a).unwrap_err();
    assert!(matches!(err, BridgeError::MalformedArray(_)));
    assert!(!s.is_consumed());
    assert!(!a.is_consumed());
    assert_eq!(schema_releases.load(Ordering::SeqCst), 0);
    assert_eq!(array_releases.load(Ordering::SeqCst), 0);

    // The producer-side obligation still stands and runs once on drop.
    drop(s);
    drop(a);
    assert_eq!(schema_releases.load(Ordering::SeqCst), 1);
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);
}

#[test]
fn released_array_descriptor_is_rejected_as_consumed() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let schema = foreign_schema("i", schema_releases);

    let mut arr = ArrowArray::empty();
    arr.length = 1;
    arr.n_buffers = 2;
    // release cleared: the descriptor was already released by someone.
    let array = Capsule::new(
        "arrow_array",
        Box::into_raw(Box::new(arr)) as *mut c_void,
        drop_foreign_array_capsule,
    );

    let err = BridgeArray::from_capsules(&schema, &array).unwrap_err();
    assert_eq!(err, BridgeError::CapsuleConsumed("arrow_array"));
    assert!(!schema.is_consumed());
    assert!(!array.is_consumed());
}

#[test]
fn released_schema_reports_consumed_before_format_parsing() {
    // The release pointer is checked in the liveness phase, so a released
    // schema wins over its unsupported format string.
    let mut schema = ArrowSchema::empty();
    schema.format = c"tdD".as_ptr() as *const i8;
    let schema = Capsule::new(
        "arrow_schema",
        Box::into_raw(Box::new(schema)) as *mut c_void,
        drop_foreign_schema_capsule,
    );

    let array_releases = Arc::new(AtomicUsize::new(0));
    let array = foreign_array(
        ForeignLayout {
            length: 1,
            null_count: 0,
            offset: 0,
            values: vec![0; 4],
            validity: None,
        },
        array_releases.clone(),
    );

    let err = BridgeArray::from_capsules(&schema, &array).unwrap_err();
    assert_eq!(err, BridgeError::CapsuleConsumed("arrow_schema"));
    assert!(!array.is_consumed());
    drop(array);
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);
}

#[test]
fn unsupported_format_string_is_rejected() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let array_releases = Arc::new(AtomicUsize::new(0));
    let schema = foreign_schema("u", schema_releases.clone());
    let array = foreign_array(
        ForeignLayout {
            length: 1,
            null_count: 0,
            offset: 0,
            values: vec![0; 4],
            validity: None,
        },
        array_releases.clone(),
    );

    let err = BridgeArray::from_capsules(&schema, &array).unwrap_err();
    assert!(matches!(err, BridgeError::TypeUnsupported(_)));
    assert!(!schema.is_consumed());
    assert!(!array.is_consumed());
    drop(schema);
    drop(array);
    assert_eq!(schema_releases.load(Ordering::SeqCst), 1);
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);
}

#[test]
fn offset_slice_imports_the_window() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let array_releases = Arc::new(AtomicUsize::new(0));
    // Producer sliced [_, _, 10, 20, 30] at offset 2; validity clears the
    // logical middle slot (physical bit 3).
    let (s, a) = foreign_int32_pair(
        &[0, 0, 10, 20, 30],
        Some(vec![0b0001_0111]),
        -1, // unknown, must be recomputed
        2,
        3,
        schema_releases.clone(),
        array_releases.clone(),
    );

    let bridge = BridgeArray::from_capsules(&s, &a).unwrap();
    assert_eq!(bridge.size().unwrap(), 3);
    assert_eq!(bridge.null_count().unwrap(), 1);
    assert!(!bridge.is_null(0).unwrap());
    assert!(bridge.is_null(1).unwrap());
    assert!(!bridge.is_null(2).unwrap());

    let Array::Int32(arr) = bridge.array().unwrap() else {
        panic!("expected Int32 array");
    };
    assert_eq!(arr.get(0), Some(10));
    assert_eq!(arr.get(2), Some(30));

    drop(bridge);
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);
}

#[test]
fn boolean_import_copies_and_releases_immediately() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let array_releases = Arc::new(AtomicUsize::new(0));
    let schema = foreign_schema("b", schema_releases.clone());
    // bits [true, false, true, true], no validity
    let array = foreign_array(
        ForeignLayout {
            length: 4,
            null_count: 0,
            offset: 0,
            values: vec![0b0000_1101],
            validity: None,
        },
        array_releases.clone(),
    );

    let bridge = BridgeArray::from_capsules(&schema, &array).unwrap();
    // Bit-packed values are rebuilt into owned storage, so nothing keeps
    // the foreign allocation alive past the import itself.
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);

    let Array::Boolean(arr) = bridge.array().unwrap() else {
        panic!("expected Boolean array");
    };
    assert_eq!(arr.get(0), Some(true));
    assert_eq!(arr.get(1), Some(false));
    assert_eq!(arr.get(3), Some(true));
}

#[test]
fn each_export_holds_one_storage_share() {
    let values = PrimitiveArray::<i32>::from_slice(&[1, 2, 3]);
    let bridge = BridgeArray::new(FieldArray::new(
        Field::new("x", ArrowType::Int32, false),
        Array::from_int32(values),
    ));
    let Array::Int32(inner) = bridge.array().unwrap() else {
        panic!("expected Int32 array");
    };
    let base = Arc::strong_count(inner);

    let (s1, a1) = bridge.export().unwrap();
    assert_eq!(Arc::strong_count(inner), base + 1);
    let (s2, a2) = bridge.export().unwrap();
    assert_eq!(Arc::strong_count(inner), base + 2);

    // Unconsumed capsule pairs give their share back on drop.
    drop((s1, a1));
    assert_eq!(Arc::strong_count(inner), base + 1);
    drop((s2, a2));
    assert_eq!(Arc::strong_count(inner), base);
}

#[test]
fn zero_length_foreign_array_releases_during_import() {
    let schema_releases = Arc::new(AtomicUsize::new(0));
    let array_releases = Arc::new(AtomicUsize::new(0));
    let (s, a) = foreign_int32_pair(
        &[],
        None,
        0,
        0,
        0,
        schema_releases.clone(),
        array_releases.clone(),
    );

    let bridge = BridgeArray::from_capsules(&s, &a).unwrap();
    assert_eq!(bridge.size().unwrap(), 0);
    // No buffer to alias: the foreign memory is handed back at once.
    assert_eq!(array_releases.load(Ordering::SeqCst), 1);
    assert_eq!(schema_releases.load(Ordering::SeqCst), 1);
}
