use async_trait::async_trait;
use serde_json::Value;

use llmgate_common::{GatewayError, GatewayResponse, Headers, UpstreamRequest, endpoints};
use llmgate_config::Target;

/// Provider-specific translation hooks consumed by the request pipeline.
///
/// Default transforms pass payloads through untouched; adapters override the
/// pieces their wire format actually diverges on.
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Provider's base URL for this target (before `custom_host` override).
    fn base_url(&self, target: &Target) -> Result<String, GatewayError>;

    /// Path for a pipeline endpoint, e.g. `chatComplete` -> `/chat/completions`.
    /// `proxy` maps to the empty path: the caller forwards its own path.
    fn endpoint_path(&self, endpoint: &str, target: &Target) -> Result<String, GatewayError>;

    /// Provider-mapped auth and protocol headers.
    fn request_headers(&self, target: &Target, endpoint: &str) -> Result<Headers, GatewayError>;

    fn transform_request(
        &self,
        _endpoint: &str,
        params: Value,
        _target: &Target,
    ) -> Result<Value, GatewayError> {
        Ok(params)
    }

    fn transform_response(
        &self,
        _endpoint: &str,
        _status: u16,
        body: Value,
        _strict_open_ai_compliance: bool,
    ) -> Result<Value, GatewayError> {
        Ok(body)
    }

    /// Custom full-request handler. When present the pipeline skips its own
    /// request transform and the retry engine delegates the fetch here.
    fn request_handler(&self) -> Option<&dyn ProviderRequestHandler> {
        None
    }
}

/// Replaces the standard upstream fetch for providers whose protocol is not
/// plain HTTP-with-JSON (e.g. signed AWS calls).
#[async_trait]
pub trait ProviderRequestHandler: Send + Sync {
    async fn handle(&self, request: &UpstreamRequest) -> Result<GatewayResponse, GatewayError>;
}

/// Final request URL for a leaf call: `custom_host` wins over the adapter's
/// base, then the endpoint path is appended.
pub fn resolve_request_url(
    adapter: &dyn ProviderAdapter,
    target: &Target,
    endpoint: &str,
) -> Result<String, GatewayError> {
    let base = match &target.custom_host {
        Some(host) => host.trim_end_matches('/').to_string(),
        None => adapter.base_url(target)?.trim_end_matches('/').to_string(),
    };
    let path = if endpoint == endpoints::PROXY {
        String::new()
    } else {
        adapter.endpoint_path(endpoint, target)?
    };
    Ok(format!("{base}{path}"))
}
