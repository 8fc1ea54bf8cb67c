//! Hook runtime surface consumed by the routing core: guardrail/mutator
//! shorthand expansion, per-leaf spans, and the `HooksService` contract with
//! an in-process manager.
//!
//! The guardrail evaluation DSL itself is not here; checks are resolved
//! against pluggable [`CheckEvaluator`]s registered by the embedding
//! application.

pub mod manager;
pub mod model;
pub mod shorthand;
pub mod span;

pub use manager::{
    CheckContext, CheckEvaluator, CheckVerdict, HookPhaseOutcome, HooksManager, HooksService,
    NoopHooks,
};
pub use model::{HookKind, HookStage};
pub use shorthand::expand_shorthand;
pub use span::{HookSpan, SpanStore};
