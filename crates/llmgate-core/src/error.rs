//! Shapes thrown errors into uniform failure responses.

use serde_json::{Value, json};

use llmgate_common::{GATEWAY_EXCEPTION_HEADER, GatewayError, GatewayResponse};

const HOOKS_FAILED_MESSAGE: &str = "The guardrail checks defined in the config failed. \
     You can find more information in the `hook_results` object.";

/// Render an error as the wire-level failure response.
///
/// Gateway errors surface their message verbatim; router errors become a 400
/// without the gateway-exception marker; anything else hides behind a
/// generic message (the details go to diagnostics only).
pub fn shape_error_response(err: &GatewayError) -> GatewayResponse {
    match err {
        GatewayError::Router(message) => GatewayResponse::json(
            400,
            &json!({"status": "failure", "message": message}),
        ),
        GatewayError::Gateway(message) => GatewayResponse::json(
            500,
            &json!({"status": "failure", "message": message}),
        )
        .with_header(GATEWAY_EXCEPTION_HEADER, "true"),
        GatewayError::Internal(message) => {
            tracing::error!(event = "gateway_exception", error = %message);
            GatewayResponse::json(
                500,
                &json!({"status": "failure", "message": "Something went wrong"}),
            )
            .with_header(GATEWAY_EXCEPTION_HEADER, "true")
        }
    }
}

/// HTTP 446 response emitted when hooks vote to block.
pub fn hooks_failed_response(
    before_request_hooks: Vec<Value>,
    after_request_hooks: Vec<Value>,
) -> GatewayResponse {
    GatewayResponse::json(
        446,
        &json!({
            "error": {
                "message": HOOKS_FAILED_MESSAGE,
                "type": "hooks_failed",
                "param": null,
                "code": null,
            },
            "hook_results": {
                "before_request_hooks": before_request_hooks,
                "after_request_hooks": after_request_hooks,
            },
        }),
    )
    .with_header(GATEWAY_EXCEPTION_HEADER, "true")
}
