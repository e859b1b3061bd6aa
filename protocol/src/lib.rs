//! Trace record model shared by the jtrace agent and CLI.
//!
//! - `buffer`: growable text buffer a record is assembled in
//! - `record`: arguments, the unquoted-tag protocol, and the record formatter
//! - `document`: reader for the streamed JSON array the agent writes
//! - `glob`: name matching used by the CLI filters
//! - `platform`: agent library naming

pub mod buffer;
pub mod document;
pub mod error;
pub mod glob;
pub mod platform;
pub mod record;

pub use buffer::RecordBuffer;
pub use document::{TraceDocument, TraceEntry, ARRAY_CLOSE, ARRAY_OPEN, RECORD_SEPARATOR};
pub use error::{DocumentError, FormatError};
pub use record::{
    decode_tagged, Argument, RecordBuilder, TraceRecord, EMPTY_RAW_STANDIN, UNQUOTED_TAG,
};
