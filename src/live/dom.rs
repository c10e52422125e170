//! In-memory document model
//!
//! A minimal element tree: tags, ids, class lists and text. It is what the
//! patch handlers mutate and what a host application renders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Document shared between the session task, timers and the host.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Lock the document. A panic in another holder does not make it unusable.
pub fn lock_document(document: &SharedDocument) -> MutexGuard<'_, Document> {
    document.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    classes: Vec<String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[derive(Debug)]
pub struct Document {
    nodes: HashMap<NodeId, Element>,
    ids: HashMap<String, NodeId>,
    body: NodeId,
    next_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let body = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(body, Element::new("body"));
        Self {
            nodes,
            ids: HashMap::new(),
            body,
            next_id: 1,
        }
    }

    pub fn shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(&node)
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let node = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(node, Element::new(tag));
        node
    }

    /// Create an element and append it to `parent` in one step.
    pub fn append_new(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_element(tag);
        self.append_child(parent, node);
        node
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        let Some(element) = self.nodes.get_mut(&node) else {
            return;
        };
        if let Some(old) = element.id.replace(id.to_string()) {
            self.ids.remove(&old);
        }
        self.ids.insert(id.to_string(), node);
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Move `child` under `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || !self.exists(parent) || !self.exists(child) {
            return false;
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
        true
    }

    /// Remove `node` and its whole subtree. The body cannot be removed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.body || !self.exists(node) {
            return false;
        }
        self.detach(node);
        self.drop_subtree(node);
        true
    }

    pub fn clear_children(&mut self, node: NodeId) {
        let children = match self.nodes.get_mut(&node) {
            Some(element) => std::mem::take(&mut element.children),
            None => return,
        };
        for child in children {
            self.drop_subtree(child);
        }
    }

    /// First descendant of `root` (depth-first, `root` excluded) carrying `class`.
    pub fn query_selector_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(&root)?
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(node) = stack.pop() {
            let element = self.nodes.get(&node)?;
            if element.classes.iter().any(|c| c == class) {
                return Some(node);
            }
            stack.extend(element.children.iter().rev().copied());
        }
        None
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.nodes.get_mut(&node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.nodes.get_mut(&node) {
            element.classes.retain(|c| c != class);
        }
    }

    /// Replace the class list with the whitespace-separated `class_name`.
    pub fn set_class_name(&mut self, node: NodeId, class_name: &str) {
        if let Some(element) = self.nodes.get_mut(&node) {
            element.classes.clear();
            for class in class_name.split_whitespace() {
                if !element.classes.iter().any(|c| c == class) {
                    element.classes.push(class.to_string());
                }
            }
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|e| e.text.as_str())
    }

    /// Set the text content. Like the browser's `textContent`, this drops
    /// any children.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if !self.exists(node) {
            return;
        }
        self.clear_children(node);
        if let Some(element) = self.nodes.get_mut(&node) {
            element.text = text.to_string();
        }
    }

    /// Indented one-line-per-element dump, e.g. `div#mesa-1.mesa.libre "Mesa 1"`.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.body, 0, &mut out);
        out
    }

    fn write_outline(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(element) = self.nodes.get(&node) else {
            return;
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&element.tag);
        if let Some(id) = &element.id {
            out.push('#');
            out.push_str(id);
        }
        for class in &element.classes {
            out.push('.');
            out.push_str(class);
        }
        if !element.text.is_empty() {
            out.push_str(&format!(" {:?}", element.text));
        }
        out.push('\n');
        for child in &element.children {
            self.write_outline(*child, depth + 1, out);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|e| e.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != node);
        }
    }

    fn drop_subtree(&mut self, node: NodeId) {
        let Some(element) = self.nodes.remove(&node) else {
            return;
        };
        if let Some(id) = element.id {
            if self.ids.get(&id) == Some(&node) {
                self.ids.remove(&id);
            }
        }
        for child in element.children {
            self.drop_subtree(child);
        }
    }
}
