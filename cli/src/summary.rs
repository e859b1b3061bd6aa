//! Per-tracer and per-call counts for `jtrace summary`.

use std::collections::HashMap;
use std::fmt;

use jtrace_protocol::TraceEntry;

/// Counts sorted by descending count, ties by name.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub tracers: Vec<(String, usize)>,
    pub calls: Vec<(String, usize)>,
}

impl Summary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a TraceEntry>) -> Self {
        let mut total = 0;
        let mut tracers: HashMap<&str, usize> = HashMap::new();
        let mut calls: HashMap<String, usize> = HashMap::new();

        for entry in entries {
            total += 1;
            *tracers.entry(entry.tracer.as_str()).or_default() += 1;
            let name = entry.qualified_name();
            let name = if name.is_empty() { "<anonymous>".to_string() } else { name };
            *calls.entry(name).or_default() += 1;
        }

        Self {
            total,
            tracers: sorted(tracers.into_iter().map(|(k, v)| (k.to_string(), v))),
            calls: sorted(calls.into_iter()),
        }
    }
}

fn sorted(counts: impl Iterator<Item = (String, usize)>) -> Vec<(String, usize)> {
    let mut counts: Vec<_> = counts.collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} record(s)", self.total)?;
        if self.total == 0 {
            return Ok(());
        }
        let width = self
            .tracers
            .iter()
            .chain(&self.calls)
            .map(|(_, n)| n.to_string().len())
            .max()
            .unwrap_or(1);

        writeln!(f, "\nBy tracer:")?;
        for (name, count) in &self.tracers {
            writeln!(f, "  {:>width$}  {}", count, name, width = width)?;
        }
        writeln!(f, "\nBy call:")?;
        for (name, count) in &self.calls {
            writeln!(f, "  {:>width$}  {}", count, name, width = width)?;
        }
        Ok(())
    }
}
