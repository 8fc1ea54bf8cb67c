use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::time::timeout;

use llmgate_common::{GatewayResponse, Headers, ResponseBody, UpstreamRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Dns,
    Tls,
    Other,
}

impl TransportErrorKind {
    /// Kinds where another attempt cannot succeed; the retry engine bails
    /// instead of burning attempts.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportErrorKind::Dns | TransportErrorKind::Tls)
    }
}

#[derive(Debug, Clone)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Upstream I/O seam. The retry engine talks to this; tests substitute
/// scripted implementations.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send(
        &self,
        request: &UpstreamRequest,
        request_timeout: Option<Duration>,
    ) -> Result<GatewayResponse, TransportError>;
}

pub struct WreqUpstreamClient {
    client: wreq::Client,
    stream_idle_timeout: Duration,
}

impl WreqUpstreamClient {
    pub fn new() -> Result<Self, wreq::Error> {
        let client = wreq::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            stream_idle_timeout: STREAM_IDLE_TIMEOUT,
        })
    }
}

#[async_trait]
impl UpstreamClient for WreqUpstreamClient {
    async fn send(
        &self,
        request: &UpstreamRequest,
        request_timeout: Option<Duration>,
    ) -> Result<GatewayResponse, TransportError> {
        let mut builder = self
            .client
            .request(parse_method(&request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = match request_timeout {
            Some(bound) => timeout(bound, builder.send())
                .await
                .map_err(|_| TransportError {
                    kind: TransportErrorKind::Timeout,
                    message: format!("upstream fetch exceeded {}ms", bound.as_millis()),
                })?
                .map_err(map_wreq_error)?,
            None => builder.send().await.map_err(map_wreq_error)?,
        };

        convert_response(response, request.is_stream, self.stream_idle_timeout).await
    }
}

fn parse_method(method: &str) -> wreq::Method {
    if method.eq_ignore_ascii_case("GET") {
        wreq::Method::GET
    } else if method.eq_ignore_ascii_case("PUT") {
        wreq::Method::PUT
    } else if method.eq_ignore_ascii_case("PATCH") {
        wreq::Method::PATCH
    } else if method.eq_ignore_ascii_case("DELETE") {
        wreq::Method::DELETE
    } else {
        wreq::Method::POST
    }
}

async fn convert_response(
    response: wreq::Response,
    want_stream: bool,
    stream_idle_timeout: Duration,
) -> Result<GatewayResponse, TransportError> {
    let status = response.status().as_u16();
    let headers = headers_from_wreq(response.headers());

    let is_success = (200..300).contains(&status);
    if !is_success || !want_stream {
        let body = response.bytes().await.map_err(map_wreq_error)?;
        return Ok(GatewayResponse::new(status, headers, body));
    }

    let (tx, rx) = tokio::sync::mpsc::channel::<Bytes>(16);
    tokio::spawn(async move {
        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::time::timeout(stream_idle_timeout, stream.next()).await;
            let Ok(item) = next else {
                break;
            };
            let Some(Ok(chunk)) = item else {
                break;
            };
            if tx.send(chunk).await.is_err() {
                break;
            }
        }
    });

    Ok(GatewayResponse {
        status,
        headers,
        body: ResponseBody::Stream(rx),
    })
}

fn headers_from_wreq(map: &wreq::header::HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in map {
        if let Ok(value) = value.to_str() {
            out.push((name.as_str().to_string(), value.to_string()));
        }
    }
    out
}

fn map_wreq_error(err: wreq::Error) -> TransportError {
    let message = err.to_string();
    let lowered = message.to_ascii_lowercase();
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        if lowered.contains("dns") || lowered.contains("resolve") {
            TransportErrorKind::Dns
        } else if lowered.contains("tls") || lowered.contains("ssl") {
            TransportErrorKind::Tls
        } else {
            TransportErrorKind::Connect
        }
    } else if lowered.contains("tls") || lowered.contains("ssl") {
        TransportErrorKind::Tls
    } else {
        TransportErrorKind::Other
    };
    TransportError { kind, message }
}
