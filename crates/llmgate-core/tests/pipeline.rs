mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use llmgate_common::GatewayError;
use llmgate_config::{CacheConfig, Target};
use llmgate_core::{CacheStatus, MemoryCache, execute_request};
use llmgate_hooks::{CheckContext, CheckEvaluator, CheckVerdict, HooksManager};

use support::{ScriptedClient, client_headers, context_with, json_payload, openai_target};

struct AlwaysFail;

#[async_trait::async_trait]
impl CheckEvaluator for AlwaysFail {
    fn id(&self) -> &str {
        "default.alwaysFail"
    }

    async fn evaluate(&self, _ctx: CheckContext<'_>) -> Result<CheckVerdict, GatewayError> {
        Ok(CheckVerdict::fail())
    }
}

struct AlwaysPass;

#[async_trait::async_trait]
impl CheckEvaluator for AlwaysPass {
    fn id(&self) -> &str {
        "default.alwaysPass"
    }

    async fn evaluate(&self, _ctx: CheckContext<'_>) -> Result<CheckVerdict, GatewayError> {
        Ok(CheckVerdict::pass())
    }
}

struct RewriteModel;

#[async_trait::async_trait]
impl CheckEvaluator for RewriteModel {
    fn id(&self) -> &str {
        "default.rewriteModel"
    }

    async fn evaluate(&self, ctx: CheckContext<'_>) -> Result<CheckVerdict, GatewayError> {
        let mut rewritten = ctx.request_json.clone();
        rewritten["model"] = json!("internal-model");
        Ok(CheckVerdict {
            verdict: true,
            transformed_request: Some(rewritten),
            ..CheckVerdict::default()
        })
    }
}

fn hooks_with(evaluators: Vec<Arc<dyn CheckEvaluator>>) -> HooksManager {
    let mut manager = HooksManager::new();
    for evaluator in evaluators {
        manager.register(evaluator);
    }
    manager
}

fn cached_target() -> Target {
    let mut target = openai_target();
    target.cache = Some(CacheConfig::default());
    target
}

#[tokio::test]
async fn successful_responses_fill_the_cache_and_later_calls_hit() {
    let client = Arc::new(ScriptedClient::always(200, json!({"answer": 42})));
    let (ctx, logs) = context_with(client.clone());
    let ctx = ctx.with_cache(Arc::new(MemoryCache::new()));

    let first = execute_request(
        &ctx,
        cached_target(),
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;
    assert_eq!(first.status, 200);
    assert_eq!(client.calls(), 1);

    // the fill is fire-and-forget; give it a beat
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = execute_request(
        &ctx,
        cached_target(),
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;
    assert_eq!(second.status, 200);
    assert_eq!(second.body_json().unwrap(), json!({"answer": 42}));
    assert_eq!(client.calls(), 1, "cache hit must not refetch");

    let records = logs.records();
    assert_eq!(records[0].cache_status, Some(CacheStatus::Miss));
    assert_eq!(records[1].cache_status, Some(CacheStatus::Hit));
    assert!(records[1].cache_key.is_some());
}

#[tokio::test]
async fn hook_denied_responses_are_not_cached() {
    let client = Arc::new(ScriptedClient::always(200, json!({})));
    let (ctx, _) = context_with(client.clone());
    let cache = Arc::new(MemoryCache::new());
    let ctx = ctx
        .with_cache(cache)
        .with_hooks(Arc::new(hooks_with(vec![Arc::new(AlwaysFail)])));

    let mut target = cached_target();
    target.input_guardrails = Some(vec![json!({"deny": true, "alwaysFail": {}})]);

    let first = execute_request(
        &ctx,
        target.clone(),
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;
    assert_eq!(first.status, 446);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = execute_request(
        &ctx,
        target,
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;
    assert_eq!(second.status, 446, "denied responses must not be served from cache");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn after_hook_denial_maps_to_446_with_both_result_sets() {
    let client = Arc::new(ScriptedClient::always(200, json!({"ok": true})));
    let (ctx, _) = context_with(client.clone());
    let ctx = ctx.with_hooks(Arc::new(hooks_with(vec![Arc::new(AlwaysFail)])));

    let mut target = openai_target();
    target.output_guardrails = Some(vec![json!({"deny": true, "alwaysFail": {}})]);

    let response = execute_request(
        &ctx,
        target,
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;

    assert_eq!(response.status, 446);
    assert_eq!(client.calls(), 1);
    let body = response.body_json().unwrap();
    assert_eq!(
        body["hook_results"]["after_request_hooks"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn hook_results_are_attached_to_json_bodies() {
    let client = Arc::new(ScriptedClient::always(200, json!({"ok": true})));
    let (ctx, _) = context_with(client.clone());
    let ctx = ctx.with_hooks(Arc::new(hooks_with(vec![Arc::new(AlwaysPass)])));

    let mut target = openai_target();
    target.output_guardrails = Some(vec![json!({"alwaysPass": {}})]);

    let response = execute_request(
        &ctx,
        target,
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;

    assert_eq!(response.status, 200);
    let body = response.body_json().unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(
        body["hook_results"]["after_request_hooks"][0]["verdict"],
        json!(true)
    );
}

#[tokio::test]
async fn strict_compliance_suppresses_hook_results() {
    let client = Arc::new(ScriptedClient::always(200, json!({"ok": true})));
    let (ctx, _) = context_with(client.clone());
    let ctx = ctx.with_hooks(Arc::new(hooks_with(vec![Arc::new(AlwaysPass)])));

    let mut target = openai_target();
    target.output_guardrails = Some(vec![json!({"alwaysPass": {}})]);
    target.strict_open_ai_compliance = Some(true);

    let response = execute_request(
        &ctx,
        target,
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;

    let body = response.body_json().unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn input_mutators_rewrite_the_upstream_body() {
    let client = Arc::new(ScriptedClient::always(200, json!({})));
    let (ctx, _) = context_with(client.clone());
    let ctx = ctx.with_hooks(Arc::new(hooks_with(vec![Arc::new(RewriteModel)])));

    let mut target = openai_target();
    target.input_mutators = Some(vec![json!({"rewriteModel": {}})]);

    execute_request(
        &ctx,
        target,
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;

    let body = client.requests()[0].body.clone().unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["model"], json!("internal-model"));
}

#[tokio::test]
async fn default_guardrails_apply_to_every_leaf() {
    let client = Arc::new(ScriptedClient::always(200, json!({})));
    let (ctx, _) = context_with(client.clone());
    let ctx = ctx.with_hooks(Arc::new(hooks_with(vec![Arc::new(AlwaysFail)])));

    let mut root = Target {
        strategy: Some(llmgate_config::StrategySpec {
            mode: Some(llmgate_config::StrategyMode::Single),
            ..llmgate_config::StrategySpec::default()
        }),
        targets: Some(vec![openai_target()]),
        ..Target::default()
    };
    root.default_input_guardrails = Some(vec![json!({"deny": true, "alwaysFail": {}})]);

    let response = execute_request(
        &ctx,
        root,
        json_payload(),
        client_headers(),
        "chatComplete",
        "POST",
    )
    .await;

    assert_eq!(response.status, 446);
    assert_eq!(client.calls(), 0);
}
