//! Record selection shared by `summary` and `convert`.

use clap::Args;
use jtrace_protocol::glob::matches_optional;
use jtrace_protocol::TraceEntry;

/// Glob filters on record fields. A pattern on a field the record lacks
/// never matches.
#[derive(Debug, Clone, Default, Args)]
pub struct EntryFilter {
    /// Only records from this tracer (glob)
    #[arg(long, value_name = "PATTERN", help_heading = "Filtering")]
    pub tracer: Option<String>,

    /// Only records whose function matches (glob)
    #[arg(long, value_name = "PATTERN", help_heading = "Filtering")]
    pub function: Option<String>,

    /// Only records whose class matches (glob)
    #[arg(long, value_name = "PATTERN", help_heading = "Filtering")]
    pub class: Option<String>,
}

impl EntryFilter {
    pub fn is_empty(&self) -> bool {
        self.tracer.is_none() && self.function.is_none() && self.class.is_none()
    }

    pub fn matches(&self, entry: &TraceEntry) -> bool {
        matches_optional(self.tracer.as_deref(), Some(&entry.tracer))
            && matches_optional(self.function.as_deref(), entry.function.as_deref())
            && matches_optional(self.class.as_deref(), entry.class.as_deref())
    }

    pub fn apply<'a>(&'a self, entries: &'a [TraceEntry]) -> impl Iterator<Item = &'a TraceEntry> {
        entries.iter().filter(move |e| self.matches(e))
    }
}
