use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use crate::error::Result;

/// The three collections the view tracks. Each has one topic, one element id
/// scheme and one fallback endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Tables,
    Orders,
    Inventory,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Tables, Domain::Orders, Domain::Inventory];

    pub fn destination(&self) -> &'static str {
        match self {
            Domain::Tables => "/topic/mesas",
            Domain::Orders => "/topic/pedidos",
            Domain::Inventory => "/topic/inventario",
        }
    }

    /// The `tipo` a message must carry to be handled on this topic.
    pub fn expected_tipo(&self) -> &'static str {
        match self {
            Domain::Tables => "MESA_ACTUALIZADA",
            Domain::Orders => "PEDIDO_ACTUALIZADO",
            Domain::Inventory => "INVENTARIO_ACTUALIZADO",
        }
    }

    pub fn collection_path(&self) -> &'static str {
        match self {
            Domain::Tables => "/api/mesas",
            Domain::Orders => "/api/pedidos",
            Domain::Inventory => "/api/inventario",
        }
    }

    /// Id of the element that holds the rendered collection.
    pub fn list_container_id(&self) -> &'static str {
        match self {
            Domain::Tables => "mesas",
            Domain::Orders => "pedidos",
            Domain::Inventory => "inventario",
        }
    }

    fn element_prefix(&self) -> &'static str {
        match self {
            Domain::Tables => "mesa",
            Domain::Orders => "pedido",
            Domain::Inventory => "inventario",
        }
    }

    /// Element id of one entity. Patch handlers and renderers both go
    /// through here.
    pub fn element_id(&self, entity_id: &str) -> String {
        format!("{}-{}", self.element_prefix(), entity_id)
    }

    pub fn from_destination(destination: &str) -> Option<Domain> {
        Domain::ALL
            .into_iter()
            .find(|d| d.destination() == destination)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.list_container_id())
    }
}

/// Render a JSON id (string or number) as text.
pub fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn entity_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    json_id(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

/// Format a stock number the way it should read on screen: `12`, not `12.0`.
pub fn format_stock(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableUpdate {
    #[serde(rename = "mesaId", deserialize_with = "entity_id")]
    pub table_id: String,
    #[serde(rename = "nombreMesa", default)]
    pub table_name: Option<String>,
    #[serde(rename = "ocupada", default)]
    pub occupied: Option<bool>,
}

impl TableUpdate {
    pub fn is_occupied(&self) -> bool {
        self.occupied.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderUpdate {
    #[serde(rename = "pedidoId", deserialize_with = "entity_id")]
    pub order_id: String,
    #[serde(rename = "estado")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InventoryUpdate {
    #[serde(rename = "productoId", deserialize_with = "entity_id")]
    pub product_id: String,
    #[serde(rename = "nombreProducto", default)]
    pub product_name: Option<String>,
    #[serde(rename = "stockNuevo", default)]
    pub new_stock: Option<Number>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Table(TableUpdate),
    Order(OrderUpdate),
    Inventory(InventoryUpdate),
}

impl Notification {
    pub fn domain(&self) -> Domain {
        match self {
            Notification::Table(_) => Domain::Tables,
            Notification::Order(_) => Domain::Orders,
            Notification::Inventory(_) => Domain::Inventory,
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            Notification::Table(u) => &u.table_id,
            Notification::Order(u) => &u.order_id,
            Notification::Inventory(u) => &u.product_id,
        }
    }
}

/// Outcome of reading one message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Update(Notification),
    /// Valid JSON whose `tipo` is not the one this topic handles.
    Ignored { tipo: Option<String> },
}

/// Parse a message body received on `domain`'s topic.
pub fn parse_notification(domain: Domain, body: &str) -> Result<Inbound> {
    let value: Value = serde_json::from_str(body)?;
    let tipo = value.get("tipo").and_then(Value::as_str);
    if tipo != Some(domain.expected_tipo()) {
        return Ok(Inbound::Ignored {
            tipo: tipo.map(str::to_string),
        });
    }

    let notification = match domain {
        Domain::Tables => Notification::Table(serde_json::from_value(value)?),
        Domain::Orders => Notification::Order(serde_json::from_value(value)?),
        Domain::Inventory => Notification::Inventory(serde_json::from_value(value)?),
    };
    Ok(Inbound::Update(notification))
}
