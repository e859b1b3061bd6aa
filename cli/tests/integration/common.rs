//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Path to the jtrace binary
pub fn jtrace_binary() -> PathBuf {
    // cargo test builds the binary and sets this env var
    PathBuf::from(env!("CARGO_BIN_EXE_jtrace"))
}

/// Run jtrace with `args`, logging from the environment suppressed.
pub fn run_jtrace(args: &[&str]) -> Output {
    Command::new(jtrace_binary())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove(jtrace_protocol::platform::AGENT_LIB_ENV)
        .output()
        .expect("failed to run jtrace")
}

/// Run jtrace with `stdin` piped in.
pub fn run_jtrace_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(jtrace_binary())
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn jtrace");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().expect("failed to wait for jtrace")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A trace as the agent writes it: trailing separator before the bracket.
pub const SAMPLE_TRACE: &str = concat!(
    "[\n",
    "{\"tracer\":\"reflect\", \"function\":\"forName\", \"class\":\"java.lang.Class\", ",
    "\"result\":\"ok\", \"args\":[\"com.example.Main\"]},\n",
    "{\"tracer\":\"reflect\", \"function\":\"forName\", \"class\":\"java.lang.Class\", ",
    "\"args\":[\"java.util.List\"]},\n",
    "{\"tracer\":\"reflect\", \"function\":\"invoke\", ",
    "\"class\":\"java.lang.reflect.Method\", \"args\":[1,true]},\n",
    "{\"tracer\":\"jni\", \"function\":\"RegisterNatives\", ",
    "\"args\":[\"com/example/Native\",3]},\n",
    "]",
);

pub fn write_trace(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
