//! Binary on-disk formats
//!
//! - `value_record`: framed records of the value log
//! - `manifest`: store identity and format version
//! - `heads`: dataset head table

pub mod heads;
pub mod manifest;
pub mod value_record;

pub use heads::{decode_heads, encode_heads, read_heads, write_heads_atomic};
pub use manifest::{Manifest, MANIFEST_FORMAT_VERSION, MANIFEST_MAGIC};
pub use value_record::{RecordHeader, ValueRecord, MAX_RECORD_PAYLOAD, RECORD_HEADER_SIZE};
