use bytes::Bytes;
use serde_json::Value;

/// Request body as received from the front-end seam.
///
/// Bodies arrive fully buffered; the body constructor decides the upstream
/// shape from the method and content type, so the routing layer only needs
/// to distinguish structured JSON from opaque bytes.
#[derive(Debug, Clone)]
pub enum RequestPayload {
    Json(Value),
    /// Pre-encoded `multipart/form-data` body; the boundary travels in the
    /// client's content-type header.
    Multipart(Bytes),
    /// Opaque passthrough bytes (raw audio and other binary proxy bodies).
    Binary(Bytes),
    Empty,
}

impl RequestPayload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RequestPayload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RequestPayload::Multipart(bytes) | RequestPayload::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, RequestPayload::Json(_))
    }
}
