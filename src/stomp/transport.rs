//! WebSocket transport for STOMP frames
//!
//! One STOMP frame per WebSocket text message, carried over
//! tokio-tungstenite. The session layer only sees [`Transport`] and
//! [`Connection`], so it can be driven by an in-memory pair in tests.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{LiveError, Result};
use crate::stomp::Frame;

/// Opens connections to the message broker.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    fn open(&self) -> impl Future<Output = Result<Self::Connection>> + Send;
}

/// A bidirectional frame stream owned by exactly one session.
pub trait Connection: Send + 'static {
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<()>> + Send;

    /// Next frame from the broker. Heart-beats are skipped; `None` means the
    /// peer closed the connection.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Frame>>> + Send;
}

/// STOMP sub-protocols offered during the WebSocket upgrade.
const STOMP_SUBPROTOCOLS: &str = "v12.stomp, v11.stomp, v10.stomp";

pub struct WsTransport {
    url: String,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        url::Url::parse(&url)?;
        Ok(Self { url })
    }
}

impl Transport for WsTransport {
    type Connection = WsConnection;

    async fn open(&self) -> Result<WsConnection> {
        log::info!("[WebSocket] Connecting to {}", self.url);

        let mut request = self.url.as_str().into_client_request()?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            STOMP_SUBPROTOCOLS
                .parse()
                .map_err(|_| LiveError::Frame("invalid sub-protocol header".to_string()))?,
        );

        let (stream, response) = tokio_tungstenite::connect_async(request).await?;
        log::info!(
            "[WebSocket] Connected successfully (status: {})",
            response.status()
        );

        Ok(WsConnection { stream })
    }
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        log::debug!("[WebSocket] Sending {} frame", frame.command);
        self.stream.send(Message::Text(frame.encode().into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame>> {
        while let Some(msg_result) = self.stream.next().await {
            let text = match msg_result {
                Ok(Message::Text(text)) => text.as_str().to_string(),
                Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("[WebSocket] Dropping non-UTF-8 binary message: {}", e);
                        continue;
                    }
                },
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                        .unwrap_or((1000, String::new()));
                    log::info!("[WebSocket] Received close: {} {}", code, reason);
                    return None;
                }
                Err(e) => {
                    log::error!("[WebSocket] Read error: {}", e);
                    return Some(Err(e.into()));
                }
            };

            log::debug!(
                "[WebSocket] Received: {}",
                text.chars().take(100).collect::<String>()
            );
            match Frame::decode(&text) {
                Ok(Some(frame)) => return Some(Ok(frame)),
                Ok(None) => continue,
                // One frame per message, so a bad frame does not desync the stream.
                Err(e) => log::warn!("[WebSocket] Dropping malformed frame: {}", e),
            }
        }
        None
    }
}
