//! Request routing and execution engine.
//!
//! The entry point is [`execute_request`]: it walks the target tree,
//! merging inherited configuration and dispatching to a strategy at each
//! inner node, and runs the per-target request pipeline at each leaf.
//! External collaborators (hooks, cache, circuit breaker, conditional
//! router, upstream I/O, log records) are reached through the
//! [`GatewayContext`].

pub mod body;
pub mod breaker;
pub mod cache;
pub mod conditional;
pub mod context;
pub mod error;
pub mod headers;
pub mod logs;
pub mod processor;
pub mod resolver;
pub mod retry;
pub mod strategy;
pub mod upstream;
pub mod validate;

pub use body::{BodyPlan, construct_request_body, plan_request_body};
pub use breaker::{CircuitBreakerSink, FailureWindowBreaker};
pub use cache::{CacheOutcome, CacheStatus, CacheStore, MemoryCache, NoopCache};
pub use conditional::{ConditionalRouter, QueryConditionalRouter, RouteParams};
pub use context::{GatewayContext, ProxySettings};
pub use error::{hooks_failed_response, shape_error_response};
pub use headers::{HeaderContext, build_final_headers, post_process_headers};
pub use logs::{LogObject, LogRecord, LogSink, MemoryLogSink, NoopLogSink};
pub use processor::{RequestContext, try_post};
pub use resolver::{RouteRequest, execute_request, try_targets_recursively};
pub use retry::{RetryOutcome, retry_request};
pub use strategy::{RoutingStrategy, strategy_for};
pub use upstream::{TransportError, TransportErrorKind, UpstreamClient, WreqUpstreamClient};
pub use validate::RequestValidator;
