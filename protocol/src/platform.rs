//! Platform-specific names for the loadable agent library.

/// Library file extension for the current platform.
pub const LIB_EXTENSION: &str = if cfg!(target_os = "macos") {
    "dylib"
} else if cfg!(target_os = "windows") {
    "dll"
} else {
    "so"
};

/// Library file prefix for the current platform.
pub const LIB_PREFIX: &str = if cfg!(target_os = "windows") { "" } else { "lib" };

/// Environment variable overriding the agent library location.
pub const AGENT_LIB_ENV: &str = "JTRACE_AGENT_LIB";

/// File name of the agent library built from the `jtrace-agent` crate.
pub fn agent_lib_name() -> String {
    format!("{}jtrace_agent.{}", LIB_PREFIX, LIB_EXTENSION)
}

/// The `-agentpath` JVM flag that loads `lib` and writes the trace to `output`.
pub fn agent_path_flag(lib: &std::path::Path, output: &std::path::Path) -> String {
    format!("-agentpath:{}=output={}", lib.display(), output.display())
}
