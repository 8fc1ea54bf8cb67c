/// Error taxonomy for the routing core.
///
/// The kind decides how the error shaper renders the failure: `Gateway`
/// surfaces its message verbatim at 500, `Router` becomes a 400 without the
/// gateway-exception marker, and `Internal` is hidden behind a generic
/// message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The gateway decided the request cannot proceed.
    #[error("{0}")]
    Gateway(String),
    /// Conditional routing failed to select a target.
    #[error("{0}")]
    Router(String),
    /// Any other failure inside the pipeline.
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn gateway(message: impl Into<String>) -> Self {
        GatewayError::Gateway(message.into())
    }

    pub fn router(message: impl Into<String>) -> Self {
        GatewayError::Router(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::Internal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            GatewayError::Gateway(message)
            | GatewayError::Router(message)
            | GatewayError::Internal(message) => message,
        }
    }
}
