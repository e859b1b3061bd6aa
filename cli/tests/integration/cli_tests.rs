use crate::common::*;

#[test]
fn test_check_reports_count_and_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "t.json", SAMPLE_TRACE);
    let output = run_jtrace(&["check", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).ends_with(": 4 record(s), closed\n"));
}

#[test]
fn test_check_empty_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "t.json", "[\n]");
    let output = run_jtrace(&["check", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("0 record(s), closed"));
}

#[test]
fn test_check_unterminated_trace_warns() {
    let dir = tempfile::tempdir().unwrap();
    let unterminated = SAMPLE_TRACE.strip_suffix(']').unwrap();
    let path = write_trace(dir.path(), "t.json", unterminated);
    let output = run_jtrace(&["check", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("4 record(s), unterminated"));
    assert!(stderr(&output).contains("no closing bracket"));
}

#[test]
fn test_check_rejects_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "t.json", "{\"tracer\":\"jni\"}");
    let output = run_jtrace(&["check", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("is not a valid trace"));
}

#[test]
fn test_check_missing_file_fails() {
    let output = run_jtrace(&["check", "/nonexistent/trace.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to read"));
}

#[test]
fn test_check_reads_stdin() {
    let output = run_jtrace_with_stdin(&["check", "-"], SAMPLE_TRACE);
    assert!(output.status.success());
    assert!(stdout(&output).contains("4 record(s), closed"));
}

#[test]
fn test_summary_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "t.json", SAMPLE_TRACE);
    let output = run_jtrace(&["summary", path.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("4 record(s)\n"));
    assert!(text.contains("  3  reflect\n"));
    assert!(text.contains("  1  jni\n"));
    assert!(text.contains("  2  java.lang.Class.forName\n"));
}

#[test]
fn test_summary_with_filters() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "t.json", SAMPLE_TRACE);
    let output = run_jtrace(&[
        "summary",
        path.to_str().unwrap(),
        "--class",
        "java.lang.reflect.*",
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("1 record(s)\n"));
    assert!(text.contains("java.lang.reflect.Method.invoke"));
    assert!(!text.contains("jni"));
}

#[test]
fn test_convert_produces_strict_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "t.json", SAMPLE_TRACE);
    let output = run_jtrace(&["convert", path.to_str().unwrap()]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[2]["args"], serde_json::json!([1, true]));
    assert!(records[1].get("result").is_none());
}

#[test]
fn test_convert_to_file_with_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "t.json", SAMPLE_TRACE);
    let out = dir.path().join("strict.json");
    let output = run_jtrace(&[
        "convert",
        path.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--pretty",
        "--function",
        "forName",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("\n  {"), "expected indented output");
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
}

#[test]
fn test_agent_flag_with_explicit_library() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join(jtrace_protocol::platform::agent_lib_name());
    std::fs::write(&lib, b"").unwrap();
    let output = run_jtrace(&[
        "agent-flag",
        "--output",
        "/tmp/trace.json",
        "--lib",
        lib.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let expected = format!(
        "-agentpath:{}=output=/tmp/trace.json\n",
        lib.canonicalize().unwrap().display()
    );
    assert_eq!(stdout(&output), expected);
}

#[test]
fn test_agent_flag_missing_library_fails() {
    let output = run_jtrace(&[
        "agent-flag",
        "--output",
        "/tmp/trace.json",
        "--lib",
        "/nonexistent/libjtrace_agent.so",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not exist"));
}
