use audioscribe::infrastructure::observability::sanitize_for_log;

#[test]
fn given_short_transcript_when_sanitizing_then_returns_trimmed_text() {
    assert_eq!(sanitize_for_log("  hello world \n"), "hello world");
}

#[test]
fn given_blank_text_when_sanitizing_then_returns_empty_marker() {
    assert_eq!(sanitize_for_log("   "), "[EMPTY]");
}

#[test]
fn given_long_transcript_when_sanitizing_then_truncates_and_reports_length() {
    let text = "é".repeat(150);

    let sanitized = sanitize_for_log(&text);

    assert!(sanitized.starts_with(&"é".repeat(100)));
    assert!(sanitized.ends_with("... (150 chars total)"));
}

#[test]
fn given_credentials_in_text_when_sanitizing_then_values_are_redacted() {
    let sanitized = sanitize_for_log("call with Bearer abc123 and key=xyz&token=t0k");

    assert!(!sanitized.contains("abc123"));
    assert!(!sanitized.contains("xyz"));
    assert!(!sanitized.contains("t0k"));
    assert!(sanitized.contains("Bearer [REDACTED]"));
    assert!(sanitized.contains("key=[REDACTED]&token=[REDACTED]"));
}
