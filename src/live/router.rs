use std::sync::Arc;

use crate::live::reload::CollectionSource;
use crate::live::render::CollectionRenderer;
use crate::live::topics::{Domain, Inbound, parse_notification};
use crate::live::view::LiveView;
use crate::session::{MessageHandler, Subscription};

/// Handles messages on one domain's topic.
///
/// Bodies that do not parse are logged and dropped; a `tipo` other than the
/// topic's own is ignored.
pub struct TopicHandler<S: CollectionSource, R: CollectionRenderer> {
    domain: Domain,
    view: Arc<LiveView<S, R>>,
}

impl<S: CollectionSource, R: CollectionRenderer> TopicHandler<S, R> {
    pub fn new(domain: Domain, view: Arc<LiveView<S, R>>) -> Self {
        Self { domain, view }
    }
}

impl<S: CollectionSource, R: CollectionRenderer> MessageHandler for TopicHandler<S, R> {
    fn handle(&self, body: &str) {
        match parse_notification(self.domain, body) {
            Ok(Inbound::Update(notification)) => {
                log::debug!(
                    "[Router] {} update for {}",
                    self.domain,
                    notification.entity_id()
                );
                self.view.apply(&notification);
            }
            Ok(Inbound::Ignored { tipo }) => {
                log::debug!("[Router] Ignoring tipo {:?} on {}", tipo, self.domain.destination());
            }
            Err(e) => {
                log::warn!(
                    "[Router] Dropping unreadable message on {}: {}",
                    self.domain.destination(),
                    e
                );
            }
        }
    }
}

/// One subscription per domain, all feeding the same view.
pub fn topic_subscriptions<S: CollectionSource, R: CollectionRenderer>(
    view: &Arc<LiveView<S, R>>,
) -> Vec<Subscription> {
    Domain::ALL
        .into_iter()
        .map(|domain| {
            Subscription::new(
                domain.destination(),
                Arc::new(TopicHandler::new(domain, view.clone())),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::LiveConfig;
    use crate::live::ListRenderer;
    use crate::live::dom::{Document, lock_document};
    use crate::testing::MockSource;

    fn seeded() -> Document {
        let mut doc = Document::new();
        let body = doc.body();
        let notifications = doc.append_new(body, "div");
        doc.set_id(notifications, "notifications");
        for id in ["mesa-1", "pedido-1", "inventario-1"] {
            let row = doc.append_new(body, "div");
            doc.set_id(row, id);
            let status = doc.append_new(row, "span");
            doc.add_class(status, "estado-pedido");
            let stock = doc.append_new(row, "span");
            doc.add_class(stock, "stock");
        }
        doc
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_tipo_changes_nothing_on_any_topic() {
        let document = seeded().shared();
        let source = MockSource::default();
        let view = LiveView::new(
            document.clone(),
            source.clone(),
            ListRenderer,
            Arc::new(LiveConfig::default()),
        );
        let before = lock_document(&document).outline();

        let bodies = [
            (Domain::Tables, r#"{"tipo":"PEDIDO_ACTUALIZADO","mesaId":"1","ocupada":true}"#),
            (Domain::Orders, r#"{"tipo":"MESA_ACTUALIZADA","pedidoId":"1","estado":"LISTO"}"#),
            (Domain::Inventory, r#"{"tipo":"ALERTA_INVENTARIO","productoId":"1","stockNuevo":1}"#),
        ];
        for (domain, body) in bodies {
            TopicHandler::new(domain, view.clone()).handle(body);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(lock_document(&document).outline(), before);
        assert!(source.fetches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_message_is_dropped() {
        let document = seeded().shared();
        let source = MockSource::default();
        let view = LiveView::new(
            document.clone(),
            source.clone(),
            ListRenderer,
            Arc::new(LiveConfig::default()),
        );
        let before = lock_document(&document).outline();

        let handler = TopicHandler::new(Domain::Orders, view);
        handler.handle("{not json");
        handler.handle(r#"{"tipo":"PEDIDO_ACTUALIZADO"}"#);

        assert_eq!(lock_document(&document).outline(), before);
        assert!(source.fetches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_tipo_patches() {
        let document = seeded().shared();
        let view = LiveView::new(
            document.clone(),
            MockSource::default(),
            ListRenderer,
            Arc::new(LiveConfig::default()),
        );

        let body = r#"{"tipo":"PEDIDO_ACTUALIZADO","pedidoId":"1","mesaId":"1","estado":"LISTO"}"#;
        TopicHandler::new(Domain::Orders, view).handle(body);

        let doc = lock_document(&document);
        let row = doc.get_element_by_id("pedido-1").unwrap();
        let status = doc.query_selector_class(row, "estado-pedido").unwrap();
        assert_eq!(doc.text(status), Some("LISTO"));
        let container = doc.get_element_by_id("notifications").unwrap();
        assert_eq!(doc.element(container).unwrap().children().len(), 1);
    }

    #[test]
    fn test_one_subscription_per_topic() {
        let view = LiveView::new(
            Document::new().shared(),
            MockSource::default(),
            ListRenderer,
            Arc::new(LiveConfig::default()),
        );
        let destinations: Vec<String> = topic_subscriptions(&view)
            .into_iter()
            .map(|s| s.destination)
            .collect();
        assert_eq!(destinations, ["/topic/mesas", "/topic/pedidos", "/topic/inventario"]);
    }
}
