mod support;

use std::sync::Arc;

use serde_json::json;

use llmgate_common::UpstreamRequest;
use llmgate_core::{TransportErrorKind, retry_request};

use support::{Reply, ScriptedClient};

fn request() -> UpstreamRequest {
    UpstreamRequest::new("POST", "https://upstream.test/v1/chat/completions")
}

#[tokio::test]
async fn transport_failures_are_bounded_by_attempts() {
    let client = Arc::new(ScriptedClient::sequence(
        Vec::new(),
        Reply::Transport(TransportErrorKind::Connect),
    ));

    let outcome = retry_request(client.as_ref(), None, &request(), 2, &[503], None, false).await;

    assert_eq!(client.calls(), 3);
    assert_eq!(outcome.attempt, 2);
    assert_eq!(outcome.response.status, 503);
    assert!(!outcome.skipped);
    let body = outcome.response.body_json().unwrap();
    assert_eq!(body["error"]["type"], json!("upstream_unreachable"));
}

#[tokio::test]
async fn permanent_transport_errors_bail_immediately() {
    let client = Arc::new(ScriptedClient::sequence(
        Vec::new(),
        Reply::Transport(TransportErrorKind::Dns),
    ));

    let outcome = retry_request(client.as_ref(), None, &request(), 5, &[503], None, false).await;

    assert_eq!(client.calls(), 1);
    assert!(outcome.skipped);
    assert_eq!(outcome.response.status, 503);
}

#[tokio::test]
async fn transport_recovery_returns_the_good_response() {
    let client = Arc::new(ScriptedClient::sequence(
        vec![Reply::Transport(TransportErrorKind::Connect)],
        Reply::json(200, json!({"ok": true})),
    ));

    let outcome = retry_request(client.as_ref(), None, &request(), 2, &[], None, false).await;

    assert_eq!(client.calls(), 2);
    assert_eq!(outcome.attempt, 1);
    assert_eq!(outcome.response.status, 200);
}

#[tokio::test]
async fn retriable_status_returns_without_engine_retries() {
    // status-driven retries belong to the after-hook loop
    let client = Arc::new(ScriptedClient::always(503, json!({})));

    let outcome = retry_request(client.as_ref(), None, &request(), 3, &[503], None, false).await;

    assert_eq!(client.calls(), 1);
    assert_eq!(outcome.attempt, 0);
    assert!(!outcome.skipped);
}

#[tokio::test]
async fn retry_after_header_is_honored_when_enabled() {
    let client = Arc::new(ScriptedClient::sequence(
        vec![Reply::json_with_headers(
            429,
            json!({}),
            &[("retry-after", "0")],
        )],
        Reply::json(200, json!({"ok": true})),
    ));

    let outcome = retry_request(client.as_ref(), None, &request(), 2, &[429], None, true).await;

    assert_eq!(client.calls(), 2);
    assert_eq!(outcome.attempt, 1);
    assert_eq!(outcome.response.status, 200);
}

#[tokio::test]
async fn retry_after_is_ignored_when_disabled() {
    let client = Arc::new(ScriptedClient::sequence(
        vec![Reply::json_with_headers(
            429,
            json!({}),
            &[("retry-after", "0")],
        )],
        Reply::json(200, json!({})),
    ));

    let outcome = retry_request(client.as_ref(), None, &request(), 2, &[429], None, false).await;

    assert_eq!(client.calls(), 1);
    assert_eq!(outcome.response.status, 429);
}
