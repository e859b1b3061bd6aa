//! jtrace CLI - inspect trace files written by the jtrace agent.

mod agent_lib;
mod filter;
mod summary;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jtrace_protocol::platform::agent_path_flag;
use jtrace_protocol::{TraceDocument, TraceEntry};
use log::{debug, warn};

use filter::EntryFilter;
use summary::Summary;

#[derive(Parser)]
#[command(name = "jtrace")]
#[command(version, about = "Inspect JVM boundary-call traces", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a trace file and report its record count
    Check {
        /// Trace file, or - for stdin
        file: PathBuf,
    },

    /// Count records per tracer and per call
    Summary {
        /// Trace file, or - for stdin
        file: PathBuf,

        #[command(flatten)]
        filter: EntryFilter,
    },

    /// Rewrite a trace as a strict JSON array
    Convert {
        /// Trace file, or - for stdin
        file: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Indent the output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        filter: EntryFilter,
    },

    /// Print the JVM flag that loads the agent
    AgentFlag {
        /// Trace file the agent will write
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Agent library (default: $JTRACE_AGENT_LIB, then next to this binary)
        #[arg(long, value_name = "PATH")]
        lib: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Check { file } => check(&file)?,
        Commands::Summary { file, filter } => {
            let doc = read_trace(&file)?;
            print!("{}", Summary::from_entries(filter.apply(doc.entries())));
        }
        Commands::Convert {
            file,
            output,
            pretty,
            filter,
        } => convert(&file, output.as_deref(), pretty, &filter)?,
        Commands::AgentFlag { output, lib } => {
            let lib = agent_lib::find_agent_library(lib.as_deref())?;
            let output = agent_lib::absolute_output(&output)?;
            println!("{}", agent_path_flag(&lib, &output));
        }
    }

    Ok(())
}

// =============================================================================
// COMMANDS
// =============================================================================

fn read_trace(path: &Path) -> Result<TraceDocument> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read trace from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    debug!("Read {} bytes from {}", text.len(), path.display());

    let doc = TraceDocument::parse(&text)
        .with_context(|| format!("{} is not a valid trace", path.display()))?;
    if !doc.is_closed() {
        warn!(
            "{} has no closing bracket; the agent did not unload cleanly",
            path.display()
        );
    }
    Ok(doc)
}

fn check(path: &Path) -> Result<()> {
    let doc = read_trace(path)?;
    let state = if doc.is_closed() { "closed" } else { "unterminated" };
    println!("{}: {} record(s), {}", path.display(), doc.len(), state);
    Ok(())
}

fn convert(path: &Path, output: Option<&Path>, pretty: bool, filter: &EntryFilter) -> Result<()> {
    let doc = read_trace(path)?;
    let json = if filter.is_empty() {
        doc.to_strict_json(pretty)?
    } else {
        let entries: Vec<&TraceEntry> = filter.apply(doc.entries()).collect();
        debug!("{} of {} record(s) selected", entries.len(), doc.len());
        if pretty {
            serde_json::to_string_pretty(&entries)?
        } else {
            serde_json::to_string(&entries)?
        }
    };

    match output {
        Some(out) => std::fs::write(out, format!("{}\n", json))
            .with_context(|| format!("failed to write {}", out.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
