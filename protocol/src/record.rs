//! Trace records and their single-line JSON encoding.
//!
//! One record is emitted per intercepted call:
//!
//! ```text
//! {"tracer":"jni", "function":"newArray", "class":"Foo", "result":"true", "args":["a",1]},
//! ```
//!
//! Keys always appear in the order tracer, function, class, result, args.
//! Optional keys are omitted when absent, never written as `null`.

use crate::buffer::RecordBuffer;
use crate::document::RECORD_SEPARATOR;
use crate::error::FormatResult;

/// Written in place of an empty raw argument, which would otherwise leave a
/// hole in the `args` array.
pub const EMPTY_RAW_STANDIN: &str = "\"\"";

/// Token that switches quoting off for the argument right after it.
///
/// Only meaningful in tagged token streams (see [`decode_tagged`]); it is
/// never written to the output.
pub const UNQUOTED_TAG: &str = "\u{1}";

/// A single argument of a traced call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument {
    /// Written as a JSON string literal.
    Quoted(String),
    /// Written verbatim: numbers, booleans, nested JSON produced by the caller.
    Raw(String),
}

impl Argument {
    pub fn quoted(value: impl Into<String>) -> Self {
        Argument::Quoted(value.into())
    }

    pub fn raw(value: impl Into<String>) -> Self {
        Argument::Raw(value.into())
    }

    pub fn value(&self) -> &str {
        match self {
            Argument::Quoted(v) | Argument::Raw(v) => v,
        }
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self, Argument::Quoted(_))
    }

    /// A raw argument with no text, written as [`EMPTY_RAW_STANDIN`].
    pub fn is_empty_raw(&self) -> bool {
        matches!(self, Argument::Raw(v) if v.is_empty())
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Quoted(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Quoted(value)
    }
}

/// Decode a tagged token stream into typed arguments.
///
/// Every token equal to [`UNQUOTED_TAG`] marks the next token as raw and is
/// itself dropped. All other tokens are quoted. The end of the iterator is the
/// end of the list; a trailing tag with nothing after it has no effect.
pub fn decode_tagged<I, S>(tokens: I) -> Vec<Argument>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = Vec::new();
    let mut quote_next = true;
    for token in tokens {
        let token = token.as_ref();
        if token == UNQUOTED_TAG {
            quote_next = false;
            continue;
        }
        if quote_next {
            args.push(Argument::quoted(token));
        } else {
            args.push(Argument::raw(token));
            quote_next = true;
        }
    }
    args
}

/// A fully resolved trace record, ready to be formatted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceRecord {
    /// Interceptor that produced the event (e.g. "jni", "reflect")
    pub tracer: String,
    pub function: Option<String>,
    /// Display name of the target class
    pub class: Option<String>,
    pub result: Option<String>,
    pub args: Vec<Argument>,
}

impl TraceRecord {
    pub fn builder(tracer: impl Into<String>) -> RecordBuilder {
        RecordBuilder::new(tracer)
    }

    /// Format this record, separator included, into a fresh buffer.
    pub fn format(&self) -> FormatResult<RecordBuffer> {
        let mut buf = RecordBuffer::new();
        self.format_into(&mut buf)?;
        Ok(buf)
    }

    /// Append this record, separator included, to `buf`.
    ///
    /// On error `buf` may hold a partial record and must be discarded.
    pub fn format_into(&self, buf: &mut RecordBuffer) -> FormatResult<()> {
        buf.append("{\"tracer\":");
        buf.append_json_str(&self.tracer)?;

        for (key, value) in [
            ("function", &self.function),
            ("class", &self.class),
            ("result", &self.result),
        ] {
            if let Some(value) = value {
                buf.append_fmt(format_args!(", \"{}\":", key))?;
                buf.append_json_str(value)?;
            }
        }

        if !self.args.is_empty() {
            buf.append(", \"args\":");
            for (index, arg) in self.args.iter().enumerate() {
                buf.append_char(if index == 0 { '[' } else { ',' });
                match arg {
                    Argument::Quoted(value) => buf.append_json_str(value)?,
                    Argument::Raw(value) if value.is_empty() => buf.append(EMPTY_RAW_STANDIN),
                    Argument::Raw(value) => buf.append(value),
                }
            }
            buf.append_char(']');
        }

        buf.append_char('}');
        buf.append(RECORD_SEPARATOR);
        Ok(())
    }
}

/// Builder for [`TraceRecord`].
pub struct RecordBuilder {
    record: TraceRecord,
}

impl RecordBuilder {
    pub fn new(tracer: impl Into<String>) -> Self {
        Self {
            record: TraceRecord {
                tracer: tracer.into(),
                ..TraceRecord::default()
            },
        }
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.record.function = Some(function.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.record.class = Some(class.into());
        self
    }

    pub fn result(mut self, result: impl Into<String>) -> Self {
        self.record.result = Some(result.into());
        self
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.record.args.push(arg.into());
        self
    }

    /// Replace the argument list.
    pub fn arguments(mut self, args: Vec<Argument>) -> Self {
        self.record.args = args;
        self
    }

    pub fn build(self) -> TraceRecord {
        self.record
    }
}
