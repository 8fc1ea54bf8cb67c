//! Decides the upstream body shape from the method and content types.

use bytes::Bytes;
use serde_json::Value;

use llmgate_common::{RequestPayload, endpoints};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPlan {
    pub is_multipart: bool,
    pub is_proxy_audio: bool,
    pub as_json: bool,
}

pub fn plan_request_body(
    endpoint: &str,
    provider_content_type: Option<&str>,
    client_content_type: Option<&str>,
) -> BodyPlan {
    let multipart = |ct: Option<&str>| ct.is_some_and(|ct| ct.starts_with("multipart/form-data"));
    let is_multipart = multipart(provider_content_type)
        || (endpoint == endpoints::PROXY && multipart(client_content_type));
    let is_proxy_audio = endpoint == endpoints::PROXY
        && client_content_type.is_some_and(|ct| ct.starts_with("audio/"));
    let as_json = !is_multipart && !is_proxy_audio && client_content_type.is_some();
    BodyPlan {
        is_multipart,
        is_proxy_audio,
        as_json,
    }
}

/// Serialize the outgoing body, or `None` for bodyless requests.
pub fn construct_request_body(
    method: &str,
    plan: &BodyPlan,
    json_body: Option<&Value>,
    payload: &RequestPayload,
) -> Option<Bytes> {
    if method.eq_ignore_ascii_case("GET") {
        return None;
    }
    if plan.is_multipart || plan.is_proxy_audio {
        return payload.as_bytes().cloned();
    }
    if plan.as_json {
        return json_body.map(|body| Bytes::from(body.to_string()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_when_client_sent_json() {
        let plan = plan_request_body("chatComplete", None, Some("application/json"));
        assert!(plan.as_json);
        assert!(!plan.is_multipart);

        let body = construct_request_body(
            "POST",
            &plan,
            Some(&json!({"model": "m"})),
            &RequestPayload::Json(json!({"model": "m"})),
        );
        assert_eq!(body.unwrap(), Bytes::from(r#"{"model":"m"}"#));
    }

    #[test]
    fn provider_multipart_wins_over_json() {
        let plan = plan_request_body(
            "uploadFile",
            Some("multipart/form-data; boundary=x"),
            Some("multipart/form-data; boundary=x"),
        );
        assert!(plan.is_multipart);
        assert!(!plan.as_json);
    }

    #[test]
    fn proxy_audio_passes_bytes_through() {
        let plan = plan_request_body("proxy", None, Some("audio/mpeg"));
        assert!(plan.is_proxy_audio);
        let payload = RequestPayload::Binary(Bytes::from_static(b"\x00\x01"));
        let body = construct_request_body("POST", &plan, None, &payload);
        assert_eq!(body.unwrap(), Bytes::from_static(b"\x00\x01"));
    }

    #[test]
    fn no_client_content_type_means_no_body() {
        let plan = plan_request_body("chatComplete", None, None);
        assert!(!plan.as_json);
        let body = construct_request_body(
            "POST",
            &plan,
            Some(&json!({})),
            &RequestPayload::Empty,
        );
        assert!(body.is_none());
    }

    #[test]
    fn get_requests_never_carry_a_body() {
        let plan = plan_request_body("chatComplete", None, Some("application/json"));
        let body = construct_request_body(
            "GET",
            &plan,
            Some(&json!({"q": 1})),
            &RequestPayload::Json(json!({"q": 1})),
        );
        assert!(body.is_none());
    }
}
