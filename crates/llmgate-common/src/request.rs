use bytes::Bytes;

use crate::headers::Headers;

/// Fully assembled upstream HTTP request, ready for the client (or a
/// provider's custom request handler) to send.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    /// Caller expects a streaming (SSE) response body.
    pub is_stream: bool,
}

impl UpstreamRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
            is_stream: false,
        }
    }
}
