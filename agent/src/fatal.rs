//! Process-abort policy for unrecoverable agent failures.
//!
//! The entry points turn any error into a one-line diagnostic on stderr
//! followed by process exit. Everything below the entry points returns `Result`; only the
//! callers of [`guarantee`] decide to abort.

use std::fmt;
use std::panic::Location;

use log::error;

/// Exit status used when the agent aborts the process.
pub const EXIT_STATUS: i32 = 1;

/// A failed check and where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub file: &'static str,
    pub line: u32,
    pub message: String,
}

impl Failure {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(Location::caller(), message)
    }

    pub fn at(location: &'static Location<'static>, message: impl Into<String>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: check failed, aborting: {}",
            self.file, self.line, self.message
        )
    }
}

/// Unwrap `result`, or abort the process naming the caller's location.
///
/// The message uses the alternate format so `anyhow` context chains are
/// printed in full.
#[track_caller]
pub fn guarantee<T, E: fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => abort(Failure::at(Location::caller(), format!("{:#}", e))),
    }
}

/// Abort unless `condition` holds.
#[track_caller]
pub fn check(condition: bool, what: &str) {
    if !condition {
        abort(Failure::at(Location::caller(), what));
    }
}

/// Print the diagnostic and exit.
pub fn abort(failure: Failure) -> ! {
    error!("{}", failure.message);
    eprintln!("{}", failure);
    std::process::exit(EXIT_STATUS)
}
