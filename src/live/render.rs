use serde_json::Value;

use crate::live::dom::{Document, NodeId};
use crate::live::patch::{CLASS_FREE, CLASS_OCCUPIED, CLASS_ORDER_STATUS, CLASS_STOCK};
use crate::live::topics::{Domain, format_stock, json_id};

/// Rebuilds a whole collection from the records returned by a reload.
pub trait CollectionRenderer: Send + Sync + 'static {
    fn render(&self, domain: Domain, doc: &mut Document, records: &[Value]);
}

/// Default renderer: one `div` per record inside the domain's list
/// container, shaped so the patch handlers can find what they patch.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListRenderer;

impl CollectionRenderer for ListRenderer {
    fn render(&self, domain: Domain, doc: &mut Document, records: &[Value]) {
        let Some(container) = doc.get_element_by_id(domain.list_container_id()) else {
            log::warn!(
                "[Render] No #{} container, skipping {} records",
                domain.list_container_id(),
                records.len()
            );
            return;
        };

        doc.clear_children(container);
        let mut rendered = 0;
        for record in records {
            let Some(id) = record_id(domain, record) else {
                log::debug!("[Render] Skipping {} record without id", domain);
                continue;
            };
            let item = doc.append_new(container, "div");
            doc.set_id(item, &domain.element_id(&id));
            match domain {
                Domain::Tables => render_table(doc, item, record),
                Domain::Orders => render_order(doc, item, record),
                Domain::Inventory => render_inventory(doc, item, record),
            }
            rendered += 1;
        }
        log::debug!("[Render] Rendered {} {}", rendered, domain);
    }
}

/// The id a record is addressed by in update messages.
fn record_id(domain: Domain, record: &Value) -> Option<String> {
    let keys: &[&str] = match domain {
        Domain::Inventory => &["productoId", "_id", "id"],
        Domain::Tables | Domain::Orders => &["_id", "id"],
    };
    keys.iter().find_map(|k| record.get(*k).and_then(json_id))
}

fn text_field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn labelled(doc: &mut Document, parent: NodeId, class: &str, text: &str) -> NodeId {
    let node = doc.append_new(parent, "span");
    doc.add_class(node, class);
    doc.set_text(node, text);
    node
}

fn render_table(doc: &mut Document, item: NodeId, record: &Value) {
    let occupied = record
        .get("ocupada")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    doc.add_class(item, "mesa");
    doc.add_class(item, if occupied { CLASS_OCCUPIED } else { CLASS_FREE });
    labelled(doc, item, "nombre-mesa", text_field(record, "nombre"));
}

fn render_order(doc: &mut Document, item: NodeId, record: &Value) {
    let status = text_field(record, "estado");
    doc.add_class(item, "pedido");
    labelled(doc, item, "mesa", text_field(record, "mesa"));
    let node = labelled(doc, item, CLASS_ORDER_STATUS, status);
    if !status.is_empty() {
        doc.add_class(node, &format!("estado-{}", status.to_lowercase()));
    }
}

fn render_inventory(doc: &mut Document, item: NodeId, record: &Value) {
    let stock = match record.get("cantidadActual") {
        Some(Value::Number(n)) => format_stock(n),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    doc.add_class(item, "inventario");
    labelled(doc, item, "nombre", text_field(record, "productoNombre"));
    labelled(doc, item, CLASS_STOCK, &stock);
}
