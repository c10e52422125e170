//! Live view
//!
//! Turns parsed notifications into document changes: patch in place and
//! toast, or reload the collection when the entity is not on screen.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::LiveConfig;
use crate::error::LiveError;
use crate::live::dom::{SharedDocument, lock_document};
use crate::live::patch::{CLASS_STOCK_UPDATED, PatchOutcome, patch};
use crate::live::reload::{ApiEnvelope, CollectionSource, ReloadTracker};
use crate::live::render::CollectionRenderer;
use crate::live::toast::{append_toast, schedule_class_removal, schedule_toast_expiry};
use crate::live::topics::{Domain, Notification};

/// What [`LiveView::apply`] did with a notification.
#[derive(Debug)]
pub enum Applied {
    Patched { toast: bool },
    Reloading(JoinHandle<()>),
    /// The entity was missing and its collection is already being reloaded;
    /// that reload fetches once more before it ends.
    ReloadInFlight,
}

pub struct LiveView<S: CollectionSource, R: CollectionRenderer> {
    document: SharedDocument,
    source: S,
    renderer: R,
    config: Arc<LiveConfig>,
    reloads: Arc<ReloadTracker>,
}

impl<S: CollectionSource, R: CollectionRenderer> LiveView<S, R> {
    pub fn new(
        document: SharedDocument,
        source: S,
        renderer: R,
        config: Arc<LiveConfig>,
    ) -> Arc<Self> {
        Arc::new(Self {
            document,
            source,
            renderer,
            config,
            reloads: Arc::new(ReloadTracker::default()),
        })
    }

    pub fn document(&self) -> SharedDocument {
        self.document.clone()
    }

    /// Patch the entity in place, or reload its collection if it is not in
    /// the document. Must be called from within a tokio runtime.
    pub fn apply(self: &Arc<Self>, notification: &Notification) -> Applied {
        let (outcome, toast) = {
            let mut doc = lock_document(&self.document);
            match patch(&mut doc, notification) {
                PatchOutcome::Patched { message, highlighted } => {
                    let toast = append_toast(&mut doc, &self.config.toast_container_id, &message);
                    log::debug!("[LiveView] {}", message);
                    (Some(highlighted), toast)
                }
                PatchOutcome::Missing => (None, None),
            }
        };

        let Some(highlighted) = outcome else {
            log::debug!(
                "[LiveView] {} {} not on screen, reloading",
                notification.domain(),
                notification.entity_id()
            );
            return match self.reload(notification.domain()) {
                Some(handle) => Applied::Reloading(handle),
                None => Applied::ReloadInFlight,
            };
        };

        if let Some(node) = highlighted {
            schedule_class_removal(
                self.document.clone(),
                node,
                CLASS_STOCK_UPDATED,
                self.config.highlight_duration(),
            );
        }
        if let Some(node) = toast {
            schedule_toast_expiry(
                self.document.clone(),
                node,
                self.config.toast_duration(),
                self.config.toast_fade(),
            );
        }
        Applied::Patched {
            toast: toast.is_some(),
        }
    }

    /// Refetch and re-render one collection. Returns `None` when a reload for
    /// the domain is already in flight; that reload then runs once more, so an
    /// entity created after its request went out is still picked up.
    pub fn reload(self: &Arc<Self>, domain: Domain) -> Option<JoinHandle<()>> {
        let Some(mut ticket) = self.reloads.try_begin(domain) else {
            log::debug!("[LiveView] Reload of {} already in flight, queued", domain);
            return None;
        };

        let view = self.clone();
        Some(tokio::spawn(async move {
            loop {
                view.reload_once(domain).await;
                if !ticket.finish() {
                    break;
                }
                log::debug!("[LiveView] {} requested again during reload, refetching", domain);
            }
        }))
    }

    async fn reload_once(&self, domain: Domain) {
        let timeout = self.config.reload_timeout();
        let records = match tokio::time::timeout(timeout, self.source.fetch(domain)).await {
            Ok(envelope) => envelope.and_then(ApiEnvelope::into_records),
            Err(_) => Err(LiveError::ReloadTimeout(timeout.as_millis() as u64)),
        };
        match records {
            Ok(records) => {
                let mut doc = lock_document(&self.document);
                self.renderer.render(domain, &mut doc, &records);
                log::info!("[LiveView] Reloaded {} ({} records)", domain, records.len());
            }
            Err(e) => log::error!("[LiveView] Failed to reload {}: {}", domain, e),
        }
    }
}
