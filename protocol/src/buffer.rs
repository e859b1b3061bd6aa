//! Growable text buffer used to assemble one trace record.
//!
//! A record is built completely in a `RecordBuffer` before anything is
//! written to the shared output, so writers never observe a partial object.

use std::fmt;

use crate::error::FormatError;

/// Typical record size; most records fit without reallocating.
const DEFAULT_CAPACITY: usize = 128;

/// Append-only text buffer for a single trace record.
///
/// Storage grows as needed and is never truncated. The view returned by
/// [`RecordBuffer::as_str`] borrows the buffer, so it cannot outlive the next
/// mutation or the buffer itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBuffer {
    buf: String,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Append text verbatim.
    #[inline]
    pub fn append(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// Append a single character.
    #[inline]
    pub fn append_char(&mut self, c: char) {
        self.buf.push(c);
    }

    /// Append formatted text, e.g. `buf.append_fmt(format_args!("{}", n))`.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), FormatError> {
        fmt::Write::write_fmt(&mut self.buf, args).map_err(|_| FormatError::Fmt)
    }

    /// Append `s` as a JSON string literal, including the surrounding quotes.
    pub fn append_json_str(&mut self, s: &str) -> Result<(), FormatError> {
        let literal = serde_json::to_string(s)?;
        self.buf.push_str(&literal);
        Ok(())
    }

    /// Read-only view of the text assembled so far.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Write for RecordBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

impl fmt::Display for RecordBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

impl From<RecordBuffer> for String {
    fn from(buffer: RecordBuffer) -> Self {
        buffer.buf
    }
}
