use bytes::Bytes;
use serde_json::Value;

use crate::headers::{Headers, header_get, header_set};

/// Streamed response body; the upstream client forwards chunks as they
/// arrive and closes the channel on EOF or idle timeout.
pub type ByteStream = tokio::sync::mpsc::Receiver<Bytes>;

#[derive(Debug)]
pub enum ResponseBody {
    Bytes(Bytes),
    Stream(ByteStream),
}

/// Response flowing back through the routing core. Status is the raw wire
/// status; headers use the shared case-insensitive list.
#[derive(Debug)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: ResponseBody,
}

impl GatewayResponse {
    pub fn new(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::Bytes(body),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = Headers::new();
        header_set(&mut headers, "content-type", "application/json");
        Self::new(status, headers, Bytes::from(body.to_string()))
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.body, ResponseBody::Stream(_))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        header_set(&mut self.headers, name, value);
        self
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Bytes(bytes) => Some(bytes),
            ResponseBody::Stream(_) => None,
        }
    }

    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(self.body_bytes()?).ok()
    }

    /// Replace the buffered body, keeping status and headers.
    pub fn with_json_body(mut self, body: &Value) -> Self {
        self.body = ResponseBody::Bytes(Bytes::from(body.to_string()));
        header_set(&mut self.headers, "content-type", "application/json");
        self
    }
}
