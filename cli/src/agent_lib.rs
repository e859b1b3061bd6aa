//! Locating the agent library for `jtrace agent-flag`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jtrace_protocol::platform::{agent_lib_name, AGENT_LIB_ENV};
use log::debug;

/// Resolve the agent library to an absolute path.
///
/// An explicit path wins, then `$JTRACE_AGENT_LIB`, then the library next to
/// the running binary (or in `../lib`).
pub fn find_agent_library(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return absolute(path);
    }

    if let Some(path) = std::env::var_os(AGENT_LIB_ENV) {
        debug!("Using {} from {}", Path::new(&path).display(), AGENT_LIB_ENV);
        return absolute(Path::new(&path));
    }

    let lib_name = agent_lib_name();
    let exe = std::env::current_exe().context("cannot determine the jtrace executable path")?;
    let mut candidates = Vec::new();
    if let Some(exe_dir) = exe.parent() {
        candidates.push(exe_dir.join(&lib_name));
        // {prefix}/bin/../lib/
        candidates.push(exe_dir.join("..").join("lib").join(&lib_name));
    }

    for candidate in &candidates {
        debug!("Looking for agent library at {}", candidate.display());
        if candidate.exists() {
            return absolute(candidate);
        }
    }

    anyhow::bail!(
        "agent library {} not found next to {}; pass --lib or set {}",
        lib_name,
        exe.display(),
        AGENT_LIB_ENV
    )
}

/// The JVM needs an absolute agent path; a missing file is reported up front.
fn absolute(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("agent library {} does not exist", path.display()))
}

/// Absolute form of the trace output path. The file itself need not exist.
pub fn absolute_output(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    Ok(cwd.join(path))
}
