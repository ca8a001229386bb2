use super::*;

#[test]
fn successful_request_returns_body() {
    let body = execute("test", || Ok("{\"ok\":true}".to_string())).expect("request should succeed");
    assert_eq!(body, "{\"ok\":true}");
}

#[test]
fn status_errors_are_classified() {
    let server = execute("test", || Err(ureq::Error::StatusCode(503)))
        .expect_err("5xx should fail");
    assert!(server.to_string().contains("Server error"));
    assert_eq!(status_of(&server), Some(503));

    let client = execute("test", || Err(ureq::Error::StatusCode(404)))
        .expect_err("4xx should fail");
    assert!(client.to_string().contains("Client error"));
    assert_eq!(status_of(&client), Some(404));
}

#[test]
fn transport_errors_have_no_status() {
    let error = execute("test", || Err(ureq::Error::ConnectionFailed))
        .expect_err("transport failure should fail");

    assert!(error.to_string().contains("Transport error"));
    assert_eq!(status_of(&error), None);
}

#[test]
fn request_runs_once() {
    let mut calls = 0;
    let _ = execute("test", || {
        calls += 1;
        Err(ureq::Error::StatusCode(500))
    });
    assert_eq!(calls, 1);
}

#[test]
fn status_survives_added_context() {
    let error = execute("test", || Err(ureq::Error::StatusCode(409)))
        .expect_err("conflict should fail")
        .context("Failed to create index 'hr-assistant'");

    assert_eq!(status_of(&error), Some(409));
    assert!(format!("{:#}", error).contains("Client error: HTTP 409"));
}

#[test]
fn status_is_not_read_from_message_text() {
    let error = anyhow!("Upstream said: Client error: HTTP 409");

    assert_eq!(status_of(&error), None);
}
