use std::time::Duration;

use url2pdf_lib::{ErrorCategory, RenderError};

#[test]
fn config_error_display_includes_message() {
    let err = RenderError::Config("server.bind must be HOST:PORT".to_string());

    assert_eq!(
        format!("{}", err),
        "Configuration error: server.bind must be HOST:PORT"
    );
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: RenderError = io_err.into();
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
}

#[test]
fn validation_error_is_the_bare_message() {
    let err = RenderError::validation("Body must contain url or html");

    assert_eq!(format!("{}", err), "Body must contain url or html");
    assert!(err.is_client_error());
}

#[test]
fn navigation_helper_includes_target() {
    let err = RenderError::navigation("https://x.test", "timed out after 30000ms");

    assert_eq!(
        format!("{}", err),
        "Navigation to https://x.test failed: timed out after 30000ms"
    );
    assert_eq!(err.category(), ErrorCategory::Navigation);
}

#[test]
fn scroll_timeout_reports_ceiling() {
    let err = RenderError::ScrollTimeout(Duration::from_secs(30));

    assert_eq!(
        format!("{}", err),
        "Scroll trigger did not finish within 30s"
    );
    assert!(!err.is_client_error());
}

#[test]
fn probe_helper_includes_url() {
    let err = RenderError::probe("https://x.test/page", "connection refused");

    assert_eq!(
        format!("{}", err),
        "Content-type probe for https://x.test/page failed: connection refused"
    );
}

#[test]
fn invalid_url_is_a_validation_failure() {
    let err: RenderError = url::Url::parse("not a url").unwrap_err().into();

    assert!(format!("{}", err).starts_with("Invalid URL: "));
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[test]
fn payload_serializes_category_in_lowercase() {
    let payload = RenderError::export("printing failed").to_payload();
    let json = serde_json::to_value(&payload).unwrap();

    assert_eq!(json["category"], "export");
    assert_eq!(json["message"], "PDF export failed: printing failed");
    assert!(json["remediation"].as_str().unwrap().contains("pdf options"));
}

#[test]
fn launch_failures_suggest_installing_chromium() {
    let payload = RenderError::browser("failed to launch browser: not found").to_payload();

    assert_eq!(payload.category, ErrorCategory::Browser);
    assert!(payload.remediation.unwrap().contains("--chrome"));
}
