//! The shared trace output.
//!
//! One sink per process. It writes `[` when opened and `]` when closed, and
//! every record in between is written under a single mutex, so the byte order
//! of the file is the order in which appenders acquired the lock.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use jtrace_protocol::{ARRAY_CLOSE, ARRAY_OPEN};
use log::{debug, info};

use crate::error::{AgentError, Result};

/// Lock-guarded trace output: Open until [`TraceSink::close`], then Closed.
pub struct TraceSink<W: Write + Send = File> {
    writer: Mutex<Option<W>>,
}

impl TraceSink<File> {
    /// Create or truncate `path` and write the opening bracket.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| AgentError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Writing trace to {}", path.display());
        Self::with_writer(file)
    }
}

impl<W: Write + Send> TraceSink<W> {
    /// Use `writer` as the output and write the opening bracket to it.
    pub fn with_writer(mut writer: W) -> Result<Self> {
        writer.write_all(ARRAY_OPEN.as_bytes())?;
        writer.flush()?;
        Ok(Self {
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Write one complete record.
    ///
    /// The lock is held for the write only; callers format beforehand.
    pub fn append(&self, record: &str) -> Result<()> {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let writer = guard.as_mut().ok_or(AgentError::SinkClosed)?;
        writer.write_all(record.as_bytes())?;
        Ok(())
    }

    /// Write the closing bracket and release the output.
    ///
    /// Returns the writer on the first call and `None` afterwards.
    pub fn close(&self) -> Result<Option<W>> {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let Some(mut writer) = guard.take() else {
            debug!("Trace output already closed");
            return Ok(None);
        };
        writer.write_all(ARRAY_CLOSE.as_bytes())?;
        writer.flush()?;
        info!("Trace output closed");
        Ok(Some(writer))
    }

    pub fn is_open(&self) -> bool {
        self.writer
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some())
    }
}
