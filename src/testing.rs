//! In-memory transport and collection source for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{LiveError, Result};
use crate::live::{ApiEnvelope, CollectionSource, Domain};
use crate::stomp::{Connection, Frame, Transport};

/// What the next `open()` call does.
pub(crate) enum Script {
    Accept,
    Refuse,
    /// Never completes, like a host that drops every packet.
    Hang,
}

pub(crate) struct MockTransport {
    attempts: Arc<AtomicUsize>,
    script: Mutex<VecDeque<Script>>,
    servers: mpsc::UnboundedSender<ServerEnd>,
}

impl MockTransport {
    /// Opens follow `script`; once it is exhausted every open is refused.
    /// Accepted connections hand their broker side to the returned receiver.
    pub(crate) fn new(script: Vec<Script>) -> (Self, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, rx) = mpsc::unbounded_channel();
        let transport = Self {
            attempts: Arc::new(AtomicUsize::new(0)),
            script: Mutex::new(script.into()),
            servers,
        };
        (transport, rx)
    }

    pub(crate) fn attempts(&self) -> Arc<AtomicUsize> {
        self.attempts.clone()
    }
}

impl Transport for MockTransport {
    type Connection = MockConnection;

    async fn open(&self) -> Result<MockConnection> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Accept) => {
                let (to_client, incoming) = mpsc::unbounded_channel();
                let (outgoing, from_client) = mpsc::unbounded_channel();
                let _ = self.servers.send(ServerEnd {
                    to_client,
                    from_client,
                });
                Ok(MockConnection { incoming, outgoing })
            }
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Refuse) | None => Err(LiveError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            ))),
        }
    }
}

pub(crate) struct MockConnection {
    incoming: mpsc::UnboundedReceiver<Frame>,
    outgoing: mpsc::UnboundedSender<Frame>,
}

impl Connection for MockConnection {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        self.outgoing.send(frame).map_err(|_| LiveError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<Frame>> {
        self.incoming.recv().await.map(Ok)
    }
}

/// The broker's side of a mock connection. Dropping it closes the connection.
pub(crate) struct ServerEnd {
    to_client: mpsc::UnboundedSender<Frame>,
    from_client: mpsc::UnboundedReceiver<Frame>,
}

impl ServerEnd {
    pub(crate) fn send(&self, frame: Frame) {
        let _ = self.to_client.send(frame);
    }

    pub(crate) async fn expect(&mut self) -> Frame {
        self.from_client.recv().await.expect("client hung up")
    }

    pub(crate) fn try_expect(&mut self) -> Option<Frame> {
        self.from_client.try_recv().ok()
    }
}

/// Collection source that serves canned envelopes and counts fetches.
/// An envelope that is not an object fails to decode, like a garbled body.
#[derive(Clone, Default)]
pub(crate) struct MockSource {
    responses: Arc<Mutex<HashMap<Domain, Value>>>,
    fetches: Arc<Mutex<Vec<Domain>>>,
    latency: Duration,
}

impl MockSource {
    pub(crate) fn with_response(self, domain: Domain, envelope: Value) -> Self {
        self.set_response(domain, envelope);
        self
    }

    /// Change what later fetches of `domain` answer.
    pub(crate) fn set_response(&self, domain: Domain, envelope: Value) {
        self.responses.lock().unwrap().insert(domain, envelope);
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn fetches(&self) -> Vec<Domain> {
        self.fetches.lock().unwrap().clone()
    }
}

impl CollectionSource for MockSource {
    async fn fetch(&self, domain: Domain) -> Result<ApiEnvelope> {
        self.fetches.lock().unwrap().push(domain);
        // Answer with the state as of the request, like a server would.
        let response = self.responses.lock().unwrap().get(&domain).cloned();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match response {
            Some(envelope) => Ok(serde_json::from_value(envelope)?),
            None => Err(LiveError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no canned response",
            ))),
        }
    }
}
