//! Recursive walk of the target tree: inheritance merging, shorthand
//! normalization, circuit-breaker filtering, and strategy dispatch.

use std::future::Future;
use std::pin::Pin;

use llmgate_common::{GatewayError, GatewayResponse, Headers, RequestPayload};
use llmgate_config::{InheritedConfig, Target};
use llmgate_hooks::{HookKind, HookStage, expand_shorthand};

use crate::breaker::CircuitBreakerSink as _;
use crate::context::GatewayContext;
use crate::error::shape_error_response;
use crate::processor::try_post;
use crate::strategy::strategy_for;

/// The client request as the routing layer sees it, shared by every leaf a
/// walk may try.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub payload: RequestPayload,
    pub headers: Headers,
    pub endpoint: String,
    pub method: String,
}

/// Walk the tree and return the terminal response.
///
/// This is the only entry that maps a propagated router error to its wire
/// shape (HTTP 400, no gateway-exception marker).
pub async fn execute_request(
    ctx: &GatewayContext,
    root: Target,
    payload: RequestPayload,
    headers: Headers,
    endpoint: impl Into<String>,
    method: impl Into<String>,
) -> GatewayResponse {
    let route = RouteRequest {
        payload,
        headers,
        endpoint: endpoint.into(),
        method: method.into(),
    };
    match try_targets_recursively(ctx, root, &route, String::new(), InheritedConfig::default())
        .await
    {
        Ok(response) => response,
        Err(err) => shape_error_response(&err),
    }
}

/// Recursive resolver. Returns `Err` only for router errors, which propagate
/// unchanged to the edge; every other failure is shaped into a response
/// here. The `json_path` accumulates `.targets[i]` segments identifying the
/// subtree that produced the response.
pub fn try_targets_recursively<'a>(
    ctx: &'a GatewayContext,
    target: Target,
    route: &'a RouteRequest,
    json_path: String,
    inherited: InheritedConfig,
) -> Pin<Box<dyn Future<Output = Result<GatewayResponse, GatewayError>> + Send + 'a>> {
    Box::pin(async move {
        let mut target = target;
        let mut inherited = inherited;

        // Base case: the root may declare default guardrails in shorthand;
        // expand them once into the inherited record.
        if inherited.is_empty() {
            if let Some(items) = target.default_input_guardrails.take()
                && !items.is_empty()
            {
                inherited.default_input_guardrails =
                    Some(expand_shorthand(&items, HookStage::Input, HookKind::Guardrail));
            }
            if let Some(items) = target.default_output_guardrails.take()
                && !items.is_empty()
            {
                inherited.default_output_guardrails =
                    Some(expand_shorthand(&items, HookStage::Output, HookKind::Guardrail));
            }
        }

        let current = inherited.merge_with(&target);
        current.apply_to(&mut target);
        normalize_hook_shorthand(&mut target);

        // Circuit-breaker filter: skip open children while at least one
        // healthy sibling remains. The node keeps its `targets` so the
        // conditional router can still resolve named references.
        let had_targets = target.targets.is_some();
        let mut children: Vec<(usize, Target)> = target
            .targets
            .clone()
            .map(|targets| targets.into_iter().enumerate().collect())
            .unwrap_or_default();
        if current.id.is_some() {
            let healthy: Vec<(usize, Target)> = children
                .iter()
                .filter(|(_, child)| child.is_open != Some(true))
                .cloned()
                .collect();
            if !healthy.is_empty() {
                children = healthy;
            }
        }

        let mode = target.strategy.as_ref().and_then(|spec| spec.mode);
        if let Some(mode) = mode
            && had_targets
        {
            let strategy = strategy_for(mode);
            return match strategy
                .execute(ctx, route, &target, children, &current, &json_path)
                .await
            {
                Ok(response) => Ok(response),
                Err(err @ GatewayError::Router(_)) => Err(err),
                Err(err) => {
                    tracing::error!(
                        event = "strategy_failed",
                        path = %json_path,
                        error = %err,
                    );
                    Ok(shape_error_response(&err))
                }
            };
        }

        // No strategy mode: the node is a leaf provider.
        let response = try_post(ctx, target.clone(), route, &json_path).await;
        if let (Some(id), Some(breaker)) = (&current.id, &ctx.breaker) {
            breaker
                .record(&response, id, target.cb_config.as_ref(), &json_path)
                .await;
        }
        Ok(response)
    })
}

/// Rewrite the node's guardrail/mutator shorthand into canonical hook
/// objects on the before/after hook lists.
fn normalize_hook_shorthand(target: &mut Target) {
    let mut before = target.before_request_hooks.take().unwrap_or_default();
    if let Some(items) = target.input_guardrails.take() {
        before.extend(expand_shorthand(&items, HookStage::Input, HookKind::Guardrail));
    }
    if let Some(items) = target.input_mutators.take() {
        before.extend(expand_shorthand(&items, HookStage::Input, HookKind::Mutator));
    }
    if !before.is_empty() {
        target.before_request_hooks = Some(before);
    }

    let mut after = target.after_request_hooks.take().unwrap_or_default();
    if let Some(items) = target.output_guardrails.take() {
        after.extend(expand_shorthand(&items, HookStage::Output, HookKind::Guardrail));
    }
    if let Some(items) = target.output_mutators.take() {
        after.extend(expand_shorthand(&items, HookStage::Output, HookKind::Mutator));
    }
    if !after.is_empty() {
        target.after_request_hooks = Some(after);
    }
}
