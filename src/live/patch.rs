//! Incremental patch handlers
//!
//! Each handler touches only the attributes of its domain on the entity's
//! element. If the element is not in the document the handler changes
//! nothing and reports `Missing`, and the caller reloads the collection.

use crate::live::dom::{Document, NodeId};
use crate::live::topics::{
    Domain, InventoryUpdate, Notification, OrderUpdate, TableUpdate, format_stock,
};

pub const CLASS_OCCUPIED: &str = "ocupada";
pub const CLASS_FREE: &str = "libre";
pub const CLASS_ORDER_STATUS: &str = "estado-pedido";
pub const CLASS_STOCK: &str = "stock";
pub const CLASS_STOCK_UPDATED: &str = "stock-updated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched {
        /// Toast text.
        message: String,
        /// Node that got the transient highlight class, if any.
        highlighted: Option<NodeId>,
    },
    Missing,
}

pub fn patch(doc: &mut Document, notification: &Notification) -> PatchOutcome {
    match notification {
        Notification::Table(update) => patch_table(doc, update),
        Notification::Order(update) => patch_order(doc, update),
        Notification::Inventory(update) => patch_inventory(doc, update),
    }
}

pub fn patch_table(doc: &mut Document, update: &TableUpdate) -> PatchOutcome {
    let Some(node) = doc.get_element_by_id(&Domain::Tables.element_id(&update.table_id)) else {
        return PatchOutcome::Missing;
    };

    let (add, remove) = if update.is_occupied() {
        (CLASS_OCCUPIED, CLASS_FREE)
    } else {
        (CLASS_FREE, CLASS_OCCUPIED)
    };
    doc.add_class(node, add);
    doc.remove_class(node, remove);

    let name = update.table_name.as_deref().unwrap_or(&update.table_id);
    PatchOutcome::Patched {
        message: format!("Mesa {} actualizada", name),
        highlighted: None,
    }
}

pub fn patch_order(doc: &mut Document, update: &OrderUpdate) -> PatchOutcome {
    let Some(node) = doc.get_element_by_id(&Domain::Orders.element_id(&update.order_id)) else {
        return PatchOutcome::Missing;
    };

    if let Some(status) = doc.query_selector_class(node, CLASS_ORDER_STATUS) {
        doc.set_text(status, &update.status);
        doc.set_class_name(
            status,
            &format!(
                "{} estado-{}",
                CLASS_ORDER_STATUS,
                update.status.to_lowercase()
            ),
        );
    }

    PatchOutcome::Patched {
        message: format!("Pedido actualizado: {}", update.status),
        highlighted: None,
    }
}

pub fn patch_inventory(doc: &mut Document, update: &InventoryUpdate) -> PatchOutcome {
    let Some(node) = doc.get_element_by_id(&Domain::Inventory.element_id(&update.product_id)) else {
        return PatchOutcome::Missing;
    };

    let mut highlighted = None;
    if let (Some(stock), Some(value)) = (
        doc.query_selector_class(node, CLASS_STOCK),
        update.new_stock.as_ref(),
    ) {
        doc.set_text(stock, &format_stock(value));
        doc.add_class(stock, CLASS_STOCK_UPDATED);
        highlighted = Some(stock);
    }

    PatchOutcome::Patched {
        message: format!(
            "Inventario actualizado: {}",
            update.product_name.as_deref().unwrap_or("Producto")
        ),
        highlighted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: &str, occupied: bool) -> TableUpdate {
        TableUpdate {
            table_id: id.to_string(),
            table_name: Some(format!("Mesa {}", id)),
            occupied: Some(occupied),
        }
    }

    fn doc_with(domain: Domain, id: &str, child_class: Option<&str>) -> (Document, NodeId) {
        let mut doc = Document::new();
        let node = doc.append_new(doc.body(), "div");
        doc.set_id(node, &domain.element_id(id));
        if let Some(class) = child_class {
            let child = doc.append_new(node, "span");
            doc.add_class(child, class);
        }
        (doc, node)
    }

    #[test]
    fn test_table_classes_are_exclusive() {
        let (mut doc, node) = doc_with(Domain::Tables, "4", None);

        for occupied in [true, false, true, true, false] {
            let outcome = patch_table(&mut doc, &table("4", occupied));
            assert!(matches!(outcome, PatchOutcome::Patched { .. }));
            let is_occupied = doc.has_class(node, CLASS_OCCUPIED);
            let is_free = doc.has_class(node, CLASS_FREE);
            assert_eq!(is_occupied, occupied);
            assert_ne!(is_occupied, is_free);
        }
    }

    #[test]
    fn test_table_message_uses_name() {
        let (mut doc, _) = doc_with(Domain::Tables, "4", None);
        let outcome = patch_table(&mut doc, &table("4", true));
        assert_eq!(
            outcome,
            PatchOutcome::Patched {
                message: "Mesa Mesa 4 actualizada".to_string(),
                highlighted: None,
            }
        );
    }

    #[test]
    fn test_missing_element_changes_nothing() {
        let (mut doc, _) = doc_with(Domain::Tables, "4", None);
        let before = doc.outline();
        assert_eq!(patch_table(&mut doc, &table("5", true)), PatchOutcome::Missing);
        assert_eq!(doc.outline(), before);
    }

    #[test]
    fn test_order_status_text_and_class() {
        let (mut doc, node) = doc_with(Domain::Orders, "o1", Some(CLASS_ORDER_STATUS));
        let update = OrderUpdate {
            order_id: "o1".to_string(),
            status: "EN_PREPARACION".to_string(),
        };

        let outcome = patch_order(&mut doc, &update);
        let status = doc.query_selector_class(node, CLASS_ORDER_STATUS).unwrap();
        assert_eq!(doc.text(status), Some("EN_PREPARACION"));
        assert_eq!(
            doc.element(status).unwrap().classes(),
            ["estado-pedido", "estado-en_preparacion"]
        );
        assert_eq!(
            outcome,
            PatchOutcome::Patched {
                message: "Pedido actualizado: EN_PREPARACION".to_string(),
                highlighted: None,
            }
        );
    }

    #[test]
    fn test_inventory_sets_stock_and_highlight() {
        let (mut doc, node) = doc_with(Domain::Inventory, "p1", Some(CLASS_STOCK));
        let update = InventoryUpdate {
            product_id: "p1".to_string(),
            product_name: Some("Arroz".to_string()),
            new_stock: Some(serde_json::Number::from(8)),
        };

        let outcome = patch_inventory(&mut doc, &update);
        let stock = doc.query_selector_class(node, CLASS_STOCK).unwrap();
        assert_eq!(doc.text(stock), Some("8"));
        assert!(doc.has_class(stock, CLASS_STOCK_UPDATED));
        assert_eq!(
            outcome,
            PatchOutcome::Patched {
                message: "Inventario actualizado: Arroz".to_string(),
                highlighted: Some(stock),
            }
        );
    }

    #[test]
    fn test_inventory_without_stock_value_only_toasts() {
        let (mut doc, node) = doc_with(Domain::Inventory, "p1", Some(CLASS_STOCK));
        let update = InventoryUpdate {
            product_id: "p1".to_string(),
            product_name: None,
            new_stock: None,
        };

        let outcome = patch_inventory(&mut doc, &update);
        let stock = doc.query_selector_class(node, CLASS_STOCK).unwrap();
        assert!(!doc.has_class(stock, CLASS_STOCK_UPDATED));
        assert_eq!(
            outcome,
            PatchOutcome::Patched {
                message: "Inventario actualizado: Producto".to_string(),
                highlighted: None,
            }
        );
    }

    #[test]
    fn test_inventory_patch_is_idempotent() {
        let (mut doc, node) = doc_with(Domain::Inventory, "p1", Some(CLASS_STOCK));
        let update = InventoryUpdate {
            product_id: "p1".to_string(),
            product_name: None,
            new_stock: Some(serde_json::Number::from(3)),
        };

        patch_inventory(&mut doc, &update);
        let once = doc.outline();
        patch_inventory(&mut doc, &update);
        assert_eq!(doc.outline(), once);
        let stock = doc.query_selector_class(node, CLASS_STOCK).unwrap();
        assert_eq!(doc.text(stock), Some("3"));
    }
}
