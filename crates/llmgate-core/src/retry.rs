//! Retrying upstream fetch.
//!
//! Division of labor with the after-hook loop: status-driven retries are the
//! loop's job (each one is logged as an intermediate attempt), so a
//! status-retriable response returns immediately with the attempt count so
//! far. The engine itself retries only what the loop cannot see -- transport
//! failures, and `Retry-After`-paced waits when the config opts in. The
//! engine never errors: transport exhaustion synthesizes a 503.

use std::time::{Duration, SystemTime};

use serde_json::json;
use time::OffsetDateTime;

use llmgate_common::{
    GatewayError, GatewayResponse, Headers, UpstreamRequest, header_get,
};
use llmgate_provider::ProviderRequestHandler;

use crate::error::shape_error_response;
use crate::upstream::{TransportError, UpstreamClient};

const BACKOFF_BASE_MS: u64 = 100;
const BACKOFF_CAP_MS: u64 = 10_000;
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

pub struct RetryOutcome {
    pub response: GatewayResponse,
    /// Attempts consumed by this engine invocation (0 = first try answered).
    pub attempt: u32,
    pub created_at: OffsetDateTime,
    /// The engine decided further retries are pointless (streaming response,
    /// permanent transport error); the after-hook loop must not retry either.
    pub skipped: bool,
}

/// Fetch with bounded retries. Calls the upstream at most
/// `max_attempts + 1` times.
#[allow(clippy::too_many_arguments)]
pub async fn retry_request(
    client: &dyn UpstreamClient,
    handler: Option<&dyn ProviderRequestHandler>,
    request: &UpstreamRequest,
    max_attempts: u32,
    on_status_codes: &[u16],
    request_timeout: Option<Duration>,
    use_retry_after_header: bool,
) -> RetryOutcome {
    let created_at = OffsetDateTime::now_utc();
    let mut attempt: u32 = 0;
    loop {
        let result = dispatch(client, handler, request, request_timeout).await;
        match result {
            Ok(response) => {
                if response.is_stream() {
                    return RetryOutcome {
                        response,
                        attempt,
                        created_at,
                        skipped: true,
                    };
                }
                let retriable = on_status_codes.contains(&response.status);
                if retriable
                    && use_retry_after_header
                    && attempt < max_attempts
                    && let Some(delay) = retry_after_delay(&response.headers)
                {
                    tracing::debug!(
                        event = "retry_after_wait",
                        status = response.status,
                        delay_ms = delay.as_millis() as u64,
                        attempt,
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return RetryOutcome {
                    response,
                    attempt,
                    created_at,
                    skipped: false,
                };
            }
            Err(err) if err.kind.is_permanent() => {
                return RetryOutcome {
                    response: transport_failure_response(&err),
                    attempt,
                    created_at,
                    skipped: true,
                };
            }
            Err(err) => {
                if attempt >= max_attempts {
                    return RetryOutcome {
                        response: transport_failure_response(&err),
                        attempt,
                        created_at,
                        skipped: false,
                    };
                }
                tokio::time::sleep(backoff_delay(attempt)).await;
                attempt += 1;
            }
        }
    }
}

async fn dispatch(
    client: &dyn UpstreamClient,
    handler: Option<&dyn ProviderRequestHandler>,
    request: &UpstreamRequest,
    request_timeout: Option<Duration>,
) -> Result<GatewayResponse, TransportError> {
    match handler {
        Some(handler) => match handler.handle(request).await {
            Ok(response) => Ok(response),
            // Handler rejections are gateway decisions, not transport noise:
            // surface them as the shaped response without further retries.
            Err(err @ GatewayError::Gateway(_)) => Ok(shape_error_response(&err)),
            Err(err) => Err(TransportError {
                kind: crate::upstream::TransportErrorKind::Other,
                message: err.to_string(),
            }),
        },
        None => client.send(request, request_timeout).await,
    }
}

fn transport_failure_response(err: &TransportError) -> GatewayResponse {
    GatewayResponse::json(
        503,
        &json!({
            "error": {
                "message": &err.message,
                "type": "upstream_unreachable",
                "param": null,
                "code": null,
            }
        }),
    )
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_MS.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(exp.min(BACKOFF_CAP_MS))
}

/// `Retry-After` as either delta-seconds or an HTTP-date, capped so a
/// misbehaving upstream cannot park the request.
fn retry_after_delay(headers: &Headers) -> Option<Duration> {
    let value = header_get(headers, "retry-after")?.trim();
    if value.is_empty() {
        return None;
    }
    let delay = match value.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => {
            let date = httpdate::parse_http_date(value).ok()?;
            date.duration_since(SystemTime::now()).ok()?
        }
    };
    Some(delay.min(MAX_RETRY_AFTER))
}
