//! Fallback reloads
//!
//! When an update cannot be patched in place the whole collection is fetched
//! again from the REST API and re-rendered.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::LiveConfig;
use crate::error::{LiveError, Result};
use crate::live::topics::Domain;

/// `{status, data}` envelope returned by the collection endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

impl ApiEnvelope {
    /// The records, if the API reported success and sent any data.
    pub fn into_records(self) -> Result<Vec<Value>> {
        match (self.status.as_deref(), self.data) {
            (Some("success"), Some(data)) => Ok(data),
            (status, _) => Err(LiveError::ApiStatus(
                status.unwrap_or("<missing>").to_string(),
            )),
        }
    }
}

/// Source of authoritative collections.
pub trait CollectionSource: Send + Sync + 'static {
    fn fetch(&self, domain: Domain) -> impl Future<Output = Result<ApiEnvelope>> + Send;
}

pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    /// Every request is bounded by `timeout`, so a server that never answers
    /// cannot hold a reload open.
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &LiveConfig) -> Result<Self> {
        Self::new(config.api_base()?, config.reload_timeout())
    }
}

impl CollectionSource for HttpSource {
    async fn fetch(&self, domain: Domain) -> Result<ApiEnvelope> {
        let url = self.base.join(domain.collection_path())?;
        log::debug!("[Reload] GET {}", url);

        let response = self.client.get(url).send().await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Tracks which domains have a reload in flight.
///
/// A request for a domain that is already reloading is not dropped: it marks
/// the domain dirty, and the running reload fetches once more when it ends.
#[derive(Debug, Default)]
pub struct ReloadTracker {
    /// Domains being reloaded, with their dirty flag.
    in_flight: Mutex<HashMap<Domain, bool>>,
}

impl ReloadTracker {
    /// Claim the domain. `None` if a reload for it is already running, in
    /// which case that reload is asked to run again.
    pub fn try_begin(self: &Arc<Self>, domain: Domain) -> Option<ReloadTicket> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dirty) = in_flight.get_mut(&domain) {
            *dirty = true;
            return None;
        }
        in_flight.insert(domain, false);
        Some(ReloadTicket {
            tracker: self.clone(),
            domain,
            released: false,
        })
    }

    pub fn is_in_flight(&self, domain: Domain) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&domain)
    }
}

/// Releases the domain's claim when finished or dropped.
#[derive(Debug)]
pub struct ReloadTicket {
    tracker: Arc<ReloadTracker>,
    domain: Domain,
    released: bool,
}

impl ReloadTicket {
    /// Called after each fetch. Returns `true` if another request came in
    /// meanwhile and the domain must be fetched again; otherwise releases the
    /// claim. Both happen under one lock, so no request is lost in between.
    pub fn finish(&mut self) -> bool {
        if self.released {
            return false;
        }
        let mut in_flight = self
            .tracker
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match in_flight.get_mut(&self.domain) {
            Some(dirty) if *dirty => {
                *dirty = false;
                true
            }
            _ => {
                in_flight.remove(&self.domain);
                self.released = true;
                false
            }
        }
    }
}

impl Drop for ReloadTicket {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.tracker
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.domain);
    }
}
