use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::LiveConfig;
use crate::error::Result;
use crate::live::{
    CollectionRenderer, CollectionSource, HttpSource, ListRenderer, LiveView, SharedDocument,
    topic_subscriptions,
};
use crate::session::{ConnectionState, SessionManager, SessionStatus};
use crate::stomp::{Transport, WsTransport};

/// Handle to a running live update client.
///
/// The session runs on a tokio task; dropping the handle stops it.
pub struct LiveClient {
    document: SharedDocument,
    status: SessionStatus,
    task: JoinHandle<()>,
}

impl LiveClient {
    /// Connect to the configured broker and REST API. Must be called from
    /// within a tokio runtime.
    pub fn start(config: LiveConfig, document: SharedDocument) -> Result<Self> {
        config.validate()?;
        let transport = WsTransport::new(config.server_url.as_str())?;
        let source = HttpSource::from_config(&config)?;
        Ok(Self::start_with(config, document, transport, source, ListRenderer))
    }

    /// Start with explicit transport, collection source and renderer.
    pub fn start_with<T, S, R>(
        config: LiveConfig,
        document: SharedDocument,
        transport: T,
        source: S,
        renderer: R,
    ) -> Self
    where
        T: Transport,
        S: CollectionSource,
        R: CollectionRenderer,
    {
        let config = Arc::new(config);
        let view = LiveView::new(document.clone(), source, renderer, config.clone());
        let manager = SessionManager::new(transport, config, topic_subscriptions(&view));
        let status = manager.status();

        log::info!("[LiveClient] Starting");
        let task = tokio::spawn(manager.run());
        Self {
            document,
            status,
            task,
        }
    }

    pub fn status(&self) -> ConnectionState {
        self.status.get()
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn document(&self) -> SharedDocument {
        self.document.clone()
    }

    /// Stop the session. Pending toast and highlight timers still fire.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        log::info!("[LiveClient] Stopping");
        self.task.abort();
    }
}
