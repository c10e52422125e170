use std::time::Duration;

use mesa_live::live::{Document, SharedDocument, lock_document};
use mesa_live::{LiveClient, LiveConfig};
use tracing_subscriber::filter::LevelFilter;

/// Containers the live view writes into.
const CONTAINERS: [&str; 4] = ["notifications", "mesas", "pedidos", "inventario"];

fn seed_document() -> SharedDocument {
    let mut doc = Document::new();
    let body = doc.body();
    for id in CONTAINERS {
        let node = doc.append_new(body, "div");
        doc.set_id(node, id);
    }
    doc.shared()
}

#[tokio::main]
async fn main() -> mesa_live::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    // Optional path to a JSON config file; defaults target a local backend.
    let config = match std::env::args().nth(1) {
        Some(path) => LiveConfig::load_from_file(path)?,
        None => LiveConfig::default(),
    };

    let document = seed_document();
    let client = LiveClient::start(config, document.clone())?;

    let mut ticker = tokio::time::interval(Duration::from_secs(10));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outline = lock_document(&document).outline();
                log::info!("[Console] Session {}\n{}", client.status(), outline);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.shutdown();
    Ok(())
}
