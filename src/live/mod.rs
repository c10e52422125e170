//! # Live view
//!
//! Applies the broker's update messages to an in-memory document: tables,
//! orders and inventory are patched in place when their element is on
//! screen, announced with a transient toast, and reloaded wholesale from the
//! REST API when they are not.

mod dom;
mod patch;
mod reload;
mod render;
mod router;
mod toast;
mod topics;
mod view;

pub use dom::{Document, Element, NodeId, SharedDocument, lock_document};
pub use patch::{
    CLASS_FREE, CLASS_OCCUPIED, CLASS_ORDER_STATUS, CLASS_STOCK, CLASS_STOCK_UPDATED, PatchOutcome,
    patch, patch_inventory, patch_order, patch_table,
};
pub use reload::{ApiEnvelope, CollectionSource, HttpSource, ReloadTicket, ReloadTracker};
pub use render::{CollectionRenderer, ListRenderer};
pub use router::{TopicHandler, topic_subscriptions};
pub use toast::{CLASS_FADEOUT, CLASS_NOTIFICATION, append_toast};
pub use topics::{
    Domain, Inbound, InventoryUpdate, Notification, OrderUpdate, TableUpdate, parse_notification,
};
pub use view::{Applied, LiveView};
