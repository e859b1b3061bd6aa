//! Reading trace files written by the agent.
//!
//! The agent streams a JSON array: `[` and a newline, one record per line
//! each followed by `,`, and `]` when the VM unloads the agent. The comma
//! after the last record is kept, so the file is not strict JSON. This module
//! reads that format as-is, and also accepts a file whose closing bracket is
//! missing because the process died before unload.

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, DocumentResult};

/// Written once when the output is opened.
pub const ARRAY_OPEN: &str = "[\n";
/// Written once when the output is closed.
pub const ARRAY_CLOSE: &str = "]";
/// Terminates every record.
pub const RECORD_SEPARATOR: &str = ",\n";

/// One record as read back from a trace file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub tracer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<serde_json::Value>>,
}

impl TraceEntry {
    /// `class.function`, or whichever of the two is present.
    pub fn qualified_name(&self) -> String {
        match (&self.class, &self.function) {
            (Some(class), Some(function)) => format!("{}.{}", class, function),
            (Some(class), None) => class.clone(),
            (None, Some(function)) => function.clone(),
            (None, None) => String::new(),
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.as_ref().map_or(0, Vec::len)
    }
}

/// A parsed trace file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceDocument {
    entries: Vec<TraceEntry>,
    closed: bool,
}

impl TraceDocument {
    pub fn parse(text: &str) -> DocumentResult<Self> {
        let body = text
            .trim_start()
            .strip_prefix('[')
            .ok_or(DocumentError::MissingOpenBracket)?;

        let body = body.trim_end();
        let (body, closed) = match body.strip_suffix(ARRAY_CLOSE) {
            Some(inner) => (inner.trim_end(), true),
            None => (body, false),
        };
        let body = body.strip_suffix(',').unwrap_or(body);

        let entries: Vec<TraceEntry> = serde_json::from_str(&format!("[{}]", body))?;
        Ok(Self { entries, closed })
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the closing bracket was written, i.e. the agent unloaded cleanly.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Standards-compliant JSON for consumers that reject the trailing comma.
    pub fn to_strict_json(&self, pretty: bool) -> DocumentResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(&self.entries)?
        } else {
            serde_json::to_string(&self.entries)?
        };
        Ok(json)
    }
}
