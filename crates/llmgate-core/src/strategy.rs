//! Target-selection policies: single, fallback, load-balance, conditional.

use async_trait::async_trait;
use rand::Rng;

use llmgate_common::{
    GATEWAY_EXCEPTION_HEADER, GatewayError, GatewayResponse, header_get,
};
use llmgate_config::{HEADER_METADATA, InheritedConfig, StrategyMode, StrategySpec, Target};
use serde_json::{Value, json};

use crate::conditional::{ConditionalRouter as _, RouteParams};
use crate::context::GatewayContext;
use crate::resolver::{RouteRequest, try_targets_recursively};

/// One child-selection policy. Strategies receive the resolver by calling
/// back into [`try_targets_recursively`]; children arrive paired with their
/// original index so the `json_path` stays truthful after breaker filtering.
#[async_trait]
pub trait RoutingStrategy: Send + Sync {
    async fn execute(
        &self,
        ctx: &GatewayContext,
        route: &RouteRequest,
        target: &Target,
        children: Vec<(usize, Target)>,
        inherited: &InheritedConfig,
        json_path: &str,
    ) -> Result<GatewayResponse, GatewayError>;
}

pub fn strategy_for(mode: StrategyMode) -> &'static dyn RoutingStrategy {
    match mode {
        StrategyMode::Single => &SingleStrategy,
        StrategyMode::Fallback => &FallbackStrategy,
        StrategyMode::Loadbalance => &LoadBalanceStrategy,
        StrategyMode::Conditional => &ConditionalStrategy,
    }
}

fn child_path(json_path: &str, index: usize) -> String {
    format!("{json_path}.targets[{index}]")
}

pub struct SingleStrategy;

#[async_trait]
impl RoutingStrategy for SingleStrategy {
    async fn execute(
        &self,
        ctx: &GatewayContext,
        route: &RouteRequest,
        _target: &Target,
        children: Vec<(usize, Target)>,
        inherited: &InheritedConfig,
        json_path: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        let (index, child) = children
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::gateway("single strategy has no targets"))?;
        try_targets_recursively(ctx, child, route, child_path(json_path, index), inherited.clone())
            .await
    }
}

pub struct FallbackStrategy;

impl FallbackStrategy {
    /// Stop walking siblings when the response satisfies the strategy's
    /// status expectations or carries the gateway-exception marker.
    fn should_stop(response: &GatewayResponse, spec: Option<&StrategySpec>) -> bool {
        if response.header(GATEWAY_EXCEPTION_HEADER) == Some("true") {
            return true;
        }
        match spec.and_then(|s| s.on_status_codes.as_ref()) {
            Some(codes) => !codes.contains(&response.status),
            None => response.is_ok(),
        }
    }
}

#[async_trait]
impl RoutingStrategy for FallbackStrategy {
    async fn execute(
        &self,
        ctx: &GatewayContext,
        route: &RouteRequest,
        target: &Target,
        children: Vec<(usize, Target)>,
        inherited: &InheritedConfig,
        json_path: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        let spec = target.strategy.as_ref();
        let mut last: Option<GatewayResponse> = None;
        for (index, child) in children {
            let response = try_targets_recursively(
                ctx,
                child,
                route,
                child_path(json_path, index),
                inherited.clone(),
            )
            .await?;
            if Self::should_stop(&response, spec) {
                return Ok(response);
            }
            last = Some(response);
        }
        last.ok_or_else(|| GatewayError::gateway("All fallback attempts failed"))
    }
}

pub struct LoadBalanceStrategy;

#[async_trait]
impl RoutingStrategy for LoadBalanceStrategy {
    async fn execute(
        &self,
        ctx: &GatewayContext,
        route: &RouteRequest,
        _target: &Target,
        children: Vec<(usize, Target)>,
        inherited: &InheritedConfig,
        json_path: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        let weight_of = |child: &Target| child.weight.unwrap_or(1.0).max(0.0);
        let total: f64 = children.iter().map(|(_, child)| weight_of(child)).sum();
        if total <= 0.0 {
            return Err(GatewayError::gateway(
                "No provider selected, please check the weights",
            ));
        }

        let mut roll = rand::rng().random_range(0.0..total);
        let mut position = children.len() - 1;
        for (pos, (_, child)) in children.iter().enumerate() {
            let weight = weight_of(child);
            if roll < weight {
                position = pos;
                break;
            }
            roll -= weight;
        }

        let (index, child) = children
            .into_iter()
            .nth(position)
            .ok_or_else(|| GatewayError::internal("load-balance selection out of range"))?;
        try_targets_recursively(ctx, child, route, child_path(json_path, index), inherited.clone())
            .await
    }
}

pub struct ConditionalStrategy;

#[async_trait]
impl RoutingStrategy for ConditionalStrategy {
    async fn execute(
        &self,
        ctx: &GatewayContext,
        route: &RouteRequest,
        target: &Target,
        children: Vec<(usize, Target)>,
        inherited: &InheritedConfig,
        json_path: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        let metadata = header_get(&route.headers, HEADER_METADATA)
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .unwrap_or_else(|| json!({}));
        let params = route
            .payload
            .as_json()
            .cloned()
            .unwrap_or_else(|| json!({}));

        let selection = ctx
            .conditional_router
            .select(target, &RouteParams { metadata, params })?;
        let (index, child) = children
            .into_iter()
            .find(|(original, _)| *original == selection)
            .ok_or_else(|| {
                GatewayError::router(format!(
                    "selected target index {selection} is not available"
                ))
            })?;
        try_targets_recursively(ctx, child, route, child_path(json_path, index), inherited.clone())
            .await
    }
}
