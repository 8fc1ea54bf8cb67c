use async_trait::async_trait;

use llmgate_common::GatewayResponse;

use crate::processor::RequestContext;

/// Pre-request validation collaborator (e.g. virtual-key budget checks).
/// Returning a response blocks the upstream call and emits that response
/// as the terminal outcome.
#[async_trait]
pub trait RequestValidator: Send + Sync {
    async fn validate(&self, ctx: &RequestContext) -> Option<GatewayResponse>;
}
