//! Shared vocabulary for the llmgate routing core.
//!
//! This crate intentionally does **not** depend on any HTTP client or server
//! framework. It holds the error taxonomy, the header list type, and the
//! request/response shapes that every other crate speaks.

pub mod casing;
pub mod endpoints;
pub mod error;
pub mod headers;
pub mod payload;
pub mod request;
pub mod response;

pub use casing::{camel_case_keys, to_camel_case, to_kebab_case};
pub use error::GatewayError;
pub use headers::{
    Headers, header_append, header_contains, header_get, header_merge, header_remove, header_set,
    headers_from_http,
};
pub use payload::RequestPayload;
pub use request::UpstreamRequest;
pub use response::{ByteStream, GatewayResponse, ResponseBody};

/// Marker header stamped on core-emitted failure responses. Fallback honors
/// it to stop walking siblings; router errors are the one exception.
pub const GATEWAY_EXCEPTION_HEADER: &str = "x-portkey-gateway-exception";
