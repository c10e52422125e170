use std::time::Duration;

use tokio::task::JoinHandle;

use crate::live::dom::{Document, NodeId, SharedDocument, lock_document};

pub const CLASS_NOTIFICATION: &str = "notification";
pub const CLASS_FADEOUT: &str = "fadeout";

/// Append a toast to the container. Returns `None` when the document has no
/// such container.
pub fn append_toast(doc: &mut Document, container_id: &str, message: &str) -> Option<NodeId> {
    let container = doc.get_element_by_id(container_id)?;
    let toast = doc.append_new(container, "div");
    doc.add_class(toast, CLASS_NOTIFICATION);
    doc.set_text(toast, message);
    Some(toast)
}

/// Fade the toast after `shown`, then remove it `fade` later.
pub fn schedule_toast_expiry(
    document: SharedDocument,
    toast: NodeId,
    shown: Duration,
    fade: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(shown).await;
        lock_document(&document).add_class(toast, CLASS_FADEOUT);
        tokio::time::sleep(fade).await;
        lock_document(&document).remove(toast);
    })
}

/// Drop `class` from `node` after `after`. A node removed in the meantime is
/// left alone.
pub fn schedule_class_removal(
    document: SharedDocument,
    node: NodeId,
    class: &'static str,
    after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        lock_document(&document).remove_class(node, class);
    })
}
