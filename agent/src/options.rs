//! Agent options passed on the JVM command line.
//!
//! `-agentpath:/path/to/libjtrace_agent.so=output=/tmp/trace.json`
//!
//! The only recognized option is `output=`; everything after it is taken as
//! the path, commas included.

use std::ffi::{c_char, CStr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AgentError, Result};

const OUTPUT_OPTION: &str = "output=";

/// Environment variable holding the `env_logger` filter for the agent.
pub const LOG_ENV: &str = "JTRACE_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    /// Trace file, truncated on load.
    pub output: PathBuf,
}

impl AgentOptions {
    /// Parse the raw options string handed to `Agent_OnLoad`.
    ///
    /// # Safety
    /// `options` must be null or point to a NUL-terminated string.
    pub unsafe fn from_raw(options: *const c_char) -> Result<Self> {
        if options.is_null() {
            return Err(AgentError::MissingOptions);
        }
        let options = CStr::from_ptr(options)
            .to_str()
            .map_err(|_| AgentError::InvalidUtf8("agent options"))?;
        options.parse()
    }
}

impl FromStr for AgentOptions {
    type Err = AgentError;

    fn from_str(options: &str) -> Result<Self> {
        if options.is_empty() {
            return Err(AgentError::MissingOptions);
        }
        match options.strip_prefix(OUTPUT_OPTION) {
            Some(path) if !path.is_empty() => Ok(Self {
                output: PathBuf::from(path),
            }),
            _ => Err(AgentError::InvalidOptions(options.to_string())),
        }
    }
}

/// Initialize agent logging to stderr, filtered by `JTRACE_LOG`.
pub fn init_logging() {
    let env = env_logger::Env::new().filter_or(LOG_ENV, DEFAULT_LOG_FILTER);
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
}
