//! Per-target request pipeline: before-hooks, provider request mapping,
//! cache lookup, pre-request validation, retrying execution with
//! after-hooks, and log emission.

use std::time::{Duration, Instant};

use serde_json::{Map, Value, json};

use llmgate_common::{GatewayError, GatewayResponse, Headers, UpstreamRequest, header_get};
use llmgate_config::{RetryConfig, Target};
use llmgate_hooks::HooksService;
use llmgate_provider::{ProviderAdapter, resolve_request_url};

use crate::body::{construct_request_body, plan_request_body};
use crate::cache::CacheStore;
use crate::context::GatewayContext;
use crate::validate::RequestValidator as _;
use crate::error::{hooks_failed_response, shape_error_response};
use crate::headers::{HeaderContext, build_final_headers};
use crate::logs::LogObject;
use crate::resolver::RouteRequest;
use crate::retry::retry_request;

/// Execution record for one leaf call. Created per processor invocation;
/// mutated only by hook transforms, provider request mapping, and URL
/// resolution.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub target: Target,
    pub endpoint: String,
    pub method: String,
    pub client_headers: Headers,
    pub request_url: String,
    pub params: Value,
    pub transformed_params: Option<Value>,
    pub is_stream: bool,
    pub retry: RetryConfig,
    pub request_timeout: Option<Duration>,
    pub strict_open_ai_compliance: bool,
}

/// Releases the hook span on terminal emission, and just as well when the
/// caller cancels mid-pipeline and the future unwinds.
struct SpanGuard {
    hooks: std::sync::Arc<dyn HooksService>,
    id: Option<String>,
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(id) = &self.id {
            self.hooks.close_span(id);
        }
    }
}

/// Run the pipeline for one leaf target. Never returns an error: failures
/// are shaped into the uniform failure response, and exactly one terminal
/// log record is emitted either way.
pub async fn try_post(
    ctx: &GatewayContext,
    target: Target,
    route: &RouteRequest,
    json_path: &str,
) -> GatewayResponse {
    let started = Instant::now();
    let mut log = LogObject::new(
        json_path,
        target.provider.clone(),
        &route.endpoint,
        &route.method,
    );
    let mut span_guard = SpanGuard {
        hooks: ctx.hooks.clone(),
        id: None,
    };

    let result = run_pipeline(ctx, &target, route, &mut log, &mut span_guard, started).await;
    match result {
        Ok(response) => response,
        Err(err) => {
            let response = shape_error_response(&err);
            log.emit(
                ctx.logs.as_ref(),
                Some(response.status),
                response.body_json(),
                None,
                0,
                started.elapsed(),
            );
            response
        }
    }
}

async fn run_pipeline(
    ctx: &GatewayContext,
    target: &Target,
    route: &RouteRequest,
    log: &mut LogObject,
    span_guard: &mut SpanGuard,
    started: Instant,
) -> Result<GatewayResponse, GatewayError> {
    let provider_name = target
        .provider
        .clone()
        .ok_or_else(|| GatewayError::gateway("target does not name a provider"))?;
    let adapter = ctx.registry.get(&provider_name).ok_or_else(|| {
        GatewayError::gateway(format!("unsupported provider: {provider_name}"))
    })?;

    let mut params = route
        .payload
        .as_json()
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    if let (Value::Object(obj), Some(overrides)) = (&mut params, &target.override_params) {
        for (key, value) in overrides {
            obj.insert(key.clone(), value.clone());
        }
    }
    let is_stream = params.get("stream").and_then(Value::as_bool).unwrap_or(false);

    let request_url = resolve_request_url(adapter.as_ref(), target, &route.endpoint)?;
    let mut rctx = RequestContext {
        target: target.clone(),
        endpoint: route.endpoint.clone(),
        method: route.method.clone(),
        client_headers: route.headers.clone(),
        request_url: request_url.clone(),
        params,
        transformed_params: None,
        is_stream,
        retry: target.retry.clone().unwrap_or_default(),
        request_timeout: target.request_timeout.map(Duration::from_millis),
        strict_open_ai_compliance: target.strict_open_ai_compliance.unwrap_or(false),
    };

    // One span per leaf call; the walk already expanded default guardrails
    // into canonical hooks and stamped them onto the leaf.
    let mut before_hooks = target.before_request_hooks.clone().unwrap_or_default();
    before_hooks.extend(target.default_input_guardrails.clone().unwrap_or_default());
    let mut after_hooks = target.after_request_hooks.clone().unwrap_or_default();
    after_hooks.extend(target.default_output_guardrails.clone().unwrap_or_default());
    let span = ctx
        .hooks
        .open_span(rctx.params.clone(), before_hooks, after_hooks);
    log.set_span_id(&span.id);
    span_guard.id = Some(span.id.clone());

    let before = ctx.hooks.run_before_request_hooks(&span.id).await;
    if before.should_deny {
        let response = hooks_failed_response(before.results, Vec::new());
        log.emit(
            ctx.logs.as_ref(),
            Some(response.status),
            response.body_json(),
            None,
            0,
            started.elapsed(),
        );
        return Ok(response);
    }
    if before.transformed && let Some(span_state) = ctx.hooks.span(&span.id) {
        rctx.params = span_state.request_json;
    }
    let before_results = before.results;

    if adapter.request_handler().is_none() {
        rctx.transformed_params =
            Some(adapter.transform_request(&rctx.endpoint, rctx.params.clone(), target)?);
    }

    let provider_headers = adapter.request_headers(target, &rctx.endpoint)?;
    let ignored = ctx.settings.ignored_proxy_headers();
    let forward: &[String] = target.forward_headers.as_deref().unwrap_or(&[]);
    let hctx = HeaderContext {
        client_headers: &route.headers,
        endpoint: &rctx.endpoint,
        method: &rctx.method,
        forward_headers: forward,
        ignored_proxy_headers: &ignored,
    };
    let final_headers = build_final_headers(&provider_headers, &hctx);
    let client_content_type = header_get(&route.headers, "content-type");
    let provider_content_type =
        header_get(&provider_headers, "content-type").or(Some("application/json"));
    let plan = plan_request_body(&rctx.endpoint, provider_content_type, client_content_type);
    let json_body = rctx.transformed_params.as_ref().or(Some(&rctx.params));
    let body = construct_request_body(&rctx.method, &plan, json_body, &route.payload);

    let request = UpstreamRequest {
        method: rctx.method.clone(),
        url: request_url.clone(),
        headers: final_headers,
        body,
        is_stream,
    };
    let logged_body = plan.as_json.then(|| json_body.cloned()).flatten();
    log.set_request(&request.url, &request.headers, logged_body);

    let cache_config = target.cache.clone();
    let cache = ctx
        .cache
        .lookup(&request_url, &rctx.params, cache_config.as_ref())
        .await;
    log.set_cache(cache.status, cache.key.clone());
    if let Some(cached) = cache.response {
        let cached = apply_response_transform(adapter.as_ref(), &rctx, cached)?;
        log.emit(
            ctx.logs.as_ref(),
            Some(cached.status),
            cached.body_json(),
            None,
            0,
            started.elapsed(),
        );
        return Ok(cached);
    }

    if let Some(validator) = &ctx.validator
        && let Some(response) = validator.validate(&rctx).await
    {
        log.emit(
            ctx.logs.as_ref(),
            Some(response.status),
            response.body_json(),
            None,
            0,
            started.elapsed(),
        );
        return Ok(response);
    }

    let outcome =
        execute_with_after_hooks(ctx, adapter.as_ref(), &rctx, &span.id, &request, &before_results, log)
            .await?;

    // fire-and-forget cache fill, main-path success only
    if outcome.response.is_ok()
        && let (Some(config), Some(key)) = (&cache_config, &cache.key)
        && let Some(bytes) = outcome.response.body_bytes()
    {
        let store = ctx.cache.clone();
        let key = key.clone();
        let status = outcome.response.status;
        let headers = outcome.response.headers.clone();
        let bytes = bytes.clone();
        let config = config.clone();
        tokio::spawn(async move {
            store.write(&key, status, &headers, &bytes, &config).await;
        });
    }

    log.emit(
        ctx.logs.as_ref(),
        Some(outcome.response.status),
        outcome.response.body_json(),
        outcome.original_response_json,
        outcome.retry_count,
        started.elapsed(),
    );
    Ok(outcome.response)
}

struct MainOutcome {
    response: GatewayResponse,
    retry_count: i32,
    original_response_json: Option<Value>,
}

/// Upstream execution with after-hooks; retries while the hook-mapped
/// response stays retriable and the budget allows, logging each abandoned
/// attempt.
async fn execute_with_after_hooks(
    ctx: &GatewayContext,
    adapter: &dyn ProviderAdapter,
    rctx: &RequestContext,
    span_id: &str,
    request: &UpstreamRequest,
    before_results: &[Value],
    log: &LogObject,
) -> Result<MainOutcome, GatewayError> {
    let on_status_codes = rctx.retry.effective_status_codes();
    let mut attempts_made: u32 = 0;
    loop {
        let attempt_started = Instant::now();
        let outcome = retry_request(
            ctx.client.as_ref(),
            adapter.request_handler(),
            request,
            rctx.retry.attempts,
            &on_status_codes,
            rctx.request_timeout,
            rctx.retry.honor_retry_after(),
        )
        .await;

        // The body is parsed only when synchronous after-hooks need it;
        // otherwise the upstream response passes through untouched.
        let parse = ctx.hooks.has_sync_after_hooks(span_id) && !outcome.response.is_stream();
        let (response, mapped_json, original_json) = if parse {
            match outcome.response.body_json() {
                Some(original) => {
                    let mapped = adapter.transform_response(
                        &rctx.endpoint,
                        outcome.response.status,
                        original.clone(),
                        rctx.strict_open_ai_compliance,
                    )?;
                    let response = outcome.response.with_json_body(&mapped);
                    (response, Some(mapped), Some(original))
                }
                None => (outcome.response, None, None),
            }
        } else {
            (outcome.response, None, None)
        };

        let status = response.status;
        let after = ctx
            .hooks
            .run_after_request_hooks(span_id, mapped_json.as_ref(), status)
            .await?;

        let denied = after.should_deny;
        let mut arh_response = if denied {
            hooks_failed_response(before_results.to_vec(), after.results.clone())
        } else if let Some(rewritten) = &after.response_json {
            response.with_json_body(rewritten)
        } else {
            response
        };

        // Surface hook results on JSON bodies unless strict OpenAI
        // compliance suppresses the extra field.
        if !denied
            && !rctx.strict_open_ai_compliance
            && !(before_results.is_empty() && after.results.is_empty())
            && let Some(mut body) = arh_response.body_json()
            && body.is_object()
        {
            body["hook_results"] = json!({
                "before_request_hooks": before_results,
                "after_request_hooks": after.results,
            });
            arh_response = arh_response.with_json_body(&body);
        }

        let remaining =
            rctx.retry.attempts as i64 - outcome.attempt as i64 - attempts_made as i64;
        let retriable = on_status_codes.contains(&arh_response.status);
        if remaining > 0 && !outcome.skipped && retriable {
            log.emit(
                ctx.logs.as_ref(),
                Some(arh_response.status),
                arh_response.body_json(),
                original_json,
                (attempts_made + outcome.attempt) as i32,
                attempt_started.elapsed(),
            );
            attempts_made = outcome.attempt + 1 + attempts_made;
            continue;
        }

        let last_attempt = outcome.attempt + attempts_made;
        let retry_count = if retriable || outcome.skipped {
            -1
        } else {
            last_attempt as i32
        };
        return Ok(MainOutcome {
            response: arh_response,
            retry_count,
            original_response_json: original_json,
        });
    }
}

fn apply_response_transform(
    adapter: &dyn ProviderAdapter,
    rctx: &RequestContext,
    response: GatewayResponse,
) -> Result<GatewayResponse, GatewayError> {
    match response.body_json() {
        Some(body) => {
            let mapped = adapter.transform_response(
                &rctx.endpoint,
                response.status,
                body,
                rctx.strict_open_ai_compliance,
            )?;
            Ok(response.with_json_body(&mapped))
        }
        None => Ok(response),
    }
}
