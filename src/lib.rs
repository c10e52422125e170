//! # Live updates for a restaurant point-of-sale view
//!
//! Keeps an in-memory view of tables, orders and inventory in sync with the
//! backend. Updates arrive as JSON over STOMP on three topics and are applied
//! to the document in place; anything that cannot be patched triggers a reload
//! of the collection from the REST API. The broker session reconnects on its
//! own after any failure.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mesa_live::live::Document;
//! use mesa_live::{LiveClient, LiveConfig};
//!
//! #[tokio::main]
//! async fn main() -> mesa_live::Result<()> {
//!     let mut doc = Document::new();
//!     let body = doc.body();
//!     let toasts = doc.append_new(body, "div");
//!     doc.set_id(toasts, "notifications");
//!
//!     let config = LiveConfig::default()
//!         .with_server_url("ws://localhost:8080/ws-native")
//!         .with_api_base_url("http://localhost:8080");
//!
//!     let client = LiveClient::start(config, doc.shared())?;
//!     tokio::signal::ctrl_c().await?;
//!     client.shutdown();
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod error;
pub mod live;
pub mod session;
pub mod stomp;

mod client;
#[cfg(test)]
mod testing;

pub use client::LiveClient;
pub use config::LiveConfig;
pub use error::{LiveError, Result};
pub use session::ConnectionState;
