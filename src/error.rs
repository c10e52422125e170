use thiserror::Error;

/// Errors produced by the live update client.
///
/// None of these are fatal: the session loop logs them and retries, and the
/// view logs and drops them.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed STOMP frame: {0}")]
    Frame(String),

    #[error("handshake rejected: {0}")]
    Handshake(String),

    #[error("handshake timed out after {0} ms")]
    HandshakeTimeout(u64),

    #[error("collection reload timed out after {0} ms")]
    ReloadTimeout(u64),

    #[error("connection closed")]
    Closed,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {0:?}")]
    ApiStatus(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LiveError>;
