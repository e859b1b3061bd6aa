use std::path::PathBuf;

use jtrace_protocol::FormatError;
use thiserror::Error;

use crate::sys::{jint, jvmtiError};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("missing agent options; expected output=<path>")]
    MissingOptions,

    #[error("invalid agent options '{0}'; expected output=<path>")]
    InvalidOptions(String),

    #[error("failed to open trace output {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write trace output: {0}")]
    Write(#[from] std::io::Error),

    #[error("trace output is already closed")]
    SinkClosed,

    #[error("{call} failed with JVMTI error {code}")]
    Jvmti { call: &'static str, code: jvmtiError },

    #[error("{call} failed with JNI error {code}")]
    Jni { call: &'static str, code: jint },

    #[error("{0} returned null")]
    NullResult(&'static str),

    #[error("event {0} has no callback slot")]
    UnknownEvent(u32),

    #[error("{0} is not available in this VM")]
    MissingFunction(&'static str),

    #[error("class name lookup is unavailable before VM start")]
    ClassNameUnavailable,

    #[error("tracer name is null")]
    NullTracer,

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("failed to format trace record: {0}")]
    Format(#[from] FormatError),

    #[error("agent is already loaded")]
    AlreadyLoaded,

    #[error("agent is not loaded")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, AgentError>;
