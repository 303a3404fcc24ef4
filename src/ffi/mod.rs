//! # **FFI Module** - *Arrow C Data Interface interchange*
//!
//! Everything that crosses the runtime boundary lives here: the C ABI
//! descriptor structs, the format-string mapping, and the exporter and
//! importer that move arrays in and out of tagged capsules.

pub mod arrow_c;
pub mod arrow_dtype;
pub mod export;
pub mod import;
