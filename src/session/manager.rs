//! Broker session lifecycle
//!
//! Owns the single STOMP session: opens it, subscribes every registered
//! topic, routes `MESSAGE` frames to their handlers and, whenever the session
//! fails or drops, waits a fixed delay and starts over. Retries never stop
//! and the delay never grows.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LiveConfig;
use crate::error::{LiveError, Result};
use crate::session::state::{Action, SessionEvent, SessionStatus};
use crate::stomp::{Command, Connection, Frame, Transport};

/// Receives the bodies of messages delivered on one topic.
pub trait MessageHandler: Send + Sync + 'static {
    fn handle(&self, body: &str);
}

/// A topic to subscribe to on every successful connection.
#[derive(Clone)]
pub struct Subscription {
    pub destination: String,
    pub handler: Arc<dyn MessageHandler>,
}

impl Subscription {
    pub fn new(destination: impl Into<String>, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            destination: destination.into(),
            handler,
        }
    }
}

/// A connected session. Its subscriptions die with it.
pub(crate) struct ActiveSession<C> {
    pub(crate) session_id: String,
    conn: C,
    subscriptions: HashMap<String, Subscription>,
}

pub struct SessionManager<T: Transport> {
    transport: T,
    config: Arc<LiveConfig>,
    subscriptions: Vec<Subscription>,
    status: SessionStatus,
}

impl<T: Transport> SessionManager<T> {
    pub fn new(transport: T, config: Arc<LiveConfig>, subscriptions: Vec<Subscription>) -> Self {
        Self {
            transport,
            config,
            subscriptions,
            status: SessionStatus::default(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status.clone()
    }

    /// Drive the session forever.
    pub async fn run(self) {
        let mut active: Option<ActiveSession<T::Connection>> = None;
        let mut action = self.status.apply(SessionEvent::ConnectRequested);

        loop {
            action = match action {
                Action::OpenTransport => match self.connect().await {
                    Ok(session) => {
                        log::info!("[Session] Connected (session {})", session.session_id);
                        active = Some(session);
                        self.status.apply(SessionEvent::HandshakeSucceeded)
                    }
                    Err(e) => {
                        log::warn!("[Session] Connection failed: {}", e);
                        self.status.apply(SessionEvent::HandshakeFailed)
                    }
                },
                Action::Subscribe => {
                    match self.subscribe_all(active.as_mut()).await {
                        Ok(count) => log::info!("[Session] Subscribed to {} topics", count),
                        Err(e) => log::warn!("[Session] Subscription failed: {}", e),
                    }
                    if let Some(session) = active.as_mut() {
                        self.pump(session).await;
                    }
                    active = None;
                    log::warn!("[Session] Connection lost");
                    self.status.apply(SessionEvent::ConnectionLost)
                }
                Action::ScheduleRetry | Action::Ignore => {
                    let delay = self.config.reconnect_delay();
                    log::info!("[Session] Reconnecting in {} ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                    self.status.apply(SessionEvent::RetryTimerFired)
                }
            };
        }
    }

    /// Open the transport and perform the STOMP handshake. Both share one
    /// deadline, so an unreachable host fails as fast as a silent broker.
    pub(crate) async fn connect(&self) -> Result<ActiveSession<T::Connection>> {
        let timeout = self.config.handshake_timeout();
        tokio::time::timeout(timeout, self.handshake())
            .await
            .map_err(|_| LiveError::HandshakeTimeout(timeout.as_millis() as u64))?
    }

    async fn handshake(&self) -> Result<ActiveSession<T::Connection>> {
        let mut conn = self.transport.open().await?;

        let host = self.config.stomp_host();
        conn.send(Frame::connect(
            &host,
            self.config.login.as_deref(),
            self.config.passcode.as_deref(),
        ))
        .await?;

        let reply = conn.recv().await.ok_or(LiveError::Closed)??;
        match reply.command {
            Command::Connected => Ok(ActiveSession {
                session_id: reply.header("session").unwrap_or("-").to_string(),
                conn,
                subscriptions: HashMap::new(),
            }),
            Command::Error => Err(LiveError::Handshake(
                reply
                    .header("message")
                    .map(str::to_string)
                    .unwrap_or(reply.body),
            )),
            other => Err(LiveError::Handshake(format!("unexpected {} frame", other))),
        }
    }

    /// Subscribe every registered topic on the given session.
    ///
    /// A no-op returning 0 unless the state is `Connected` and a session
    /// exists.
    pub(crate) async fn subscribe_all(
        &self,
        session: Option<&mut ActiveSession<T::Connection>>,
    ) -> Result<usize> {
        let Some(session) = session else {
            log::debug!("[Session] No session, skipping subscriptions");
            return Ok(0);
        };
        if !self.status.is_connected() {
            log::debug!("[Session] Not connected, skipping subscriptions");
            return Ok(0);
        }

        for (index, subscription) in self.subscriptions.iter().enumerate() {
            let id = format!("sub-{}", index);
            session
                .conn
                .send(Frame::subscribe(&id, &subscription.destination))
                .await?;
            log::debug!("[Session] Subscribed {} to {}", id, subscription.destination);
            session.subscriptions.insert(id, subscription.clone());
        }
        Ok(session.subscriptions.len())
    }

    /// Read frames until the connection ends.
    async fn pump(&self, session: &mut ActiveSession<T::Connection>) {
        while let Some(frame) = session.conn.recv().await {
            match frame {
                Ok(frame) => route(session, frame),
                Err(e) => {
                    log::error!("[Session] Read error: {}", e);
                    break;
                }
            }
        }
    }
}

fn route<C>(session: &ActiveSession<C>, frame: Frame) {
    match frame.command {
        Command::Message => {
            let subscription = frame
                .header("subscription")
                .and_then(|id| session.subscriptions.get(id))
                .or_else(|| {
                    let destination = frame.header("destination")?;
                    session
                        .subscriptions
                        .values()
                        .find(|s| s.destination == destination)
                });

            match subscription {
                Some(subscription) => {
                    log::debug!(
                        "[Session] Message on {} ({} bytes)",
                        subscription.destination,
                        frame.body.len()
                    );
                    subscription.handler.handle(&frame.body);
                }
                None => log::debug!(
                    "[Session] Message for unknown subscription {:?}",
                    frame.header("subscription")
                ),
            }
        }
        Command::Error => log::error!(
            "[Session] Broker error: {}",
            frame.header("message").unwrap_or(&frame.body)
        ),
        other => log::debug!("[Session] Ignoring {} frame", other),
    }
}
