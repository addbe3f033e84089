use std::fmt::Write as _;

use crate::collections::{map::HashMap, HandlerMap};
use crate::events::Event;
use crate::host::{Host, HostError, HostHandle};
use crate::node::NodeId;
use crate::props::{Callback, EventKind};

/// Per-kind counts of calls the document has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounts {
    pub created: usize,
    pub inserted: usize,
    pub removed: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub text_updates: usize,
    pub handlers_attached: usize,
    pub handlers_detached: usize,
}

impl MutationCounts {
    /// Creates, inserts, removes and attribute or text writes. Handler
    /// reattachment is not counted.
    pub fn visible(&self) -> usize {
        self.created
            + self.inserted
            + self.removed
            + self.attributes_set
            + self.attributes_removed
            + self.text_updates
    }
}

enum DocKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        handlers: HandlerMap,
    },
    Text(String),
}

struct DocNode {
    kind: DocKind,
    parent: Option<HostHandle>,
    children: Vec<HostHandle>,
}

/// In-memory external tree for tests, benchmarks and headless hosts.
///
/// Detached nodes stay alive in the arena, as a browser keeps them alive
/// while something still references them.
pub struct MemoryDocument {
    nodes: Vec<DocNode>, // indexed by HostHandle
    bindings: HashMap<HostHandle, NodeId>,
    root: HostHandle,
    mutations: MutationCounts,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates a document with an empty `body` root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            bindings: HashMap::new(),
            root: HostHandle(0),
            mutations: MutationCounts::default(),
        };
        doc.root = doc.alloc(DocKind::Element {
            tag: "body".to_owned(),
            attributes: Vec::new(),
            handlers: HandlerMap::default(),
        });
        doc
    }

    /// Creates a document whose body holds one `div` with the given id.
    pub fn with_mount_point(id: &str) -> (Self, HostHandle) {
        let mut doc = Self::new();
        let mount = doc.create_mount_point(id);
        (doc, mount)
    }

    pub fn root(&self) -> HostHandle {
        self.root
    }

    /// Appends an empty `div id=...` to the body without counting it as a
    /// mutation.
    pub fn create_mount_point(&mut self, id: &str) -> HostHandle {
        let handle = self.alloc(DocKind::Element {
            tag: "div".to_owned(),
            attributes: vec![("id".to_owned(), id.to_owned())],
            handlers: HandlerMap::default(),
        });
        self.link(self.root, handle, None);
        handle
    }

    pub fn mutations(&self) -> MutationCounts {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = MutationCounts::default();
    }

    pub fn tag(&self, node: HostHandle) -> Option<&str> {
        match &self.node(node)?.kind {
            DocKind::Element { tag, .. } => Some(tag),
            DocKind::Text(_) => None,
        }
    }

    pub fn text(&self, node: HostHandle) -> Option<&str> {
        match &self.node(node)?.kind {
            DocKind::Text(text) => Some(text),
            DocKind::Element { .. } => None,
        }
    }

    pub fn attribute(&self, node: HostHandle, name: &str) -> Option<&str> {
        match &self.node(node)?.kind {
            DocKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            DocKind::Text(_) => None,
        }
    }

    pub fn children(&self, node: HostHandle) -> &[HostHandle] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn has_handler(&self, node: HostHandle, event: EventKind) -> bool {
        match self.node(node).map(|n| &n.kind) {
            Some(DocKind::Element { handlers, .. }) => handlers.contains_key(&event),
            _ => false,
        }
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_attached(&self, node: HostHandle) -> bool {
        let mut cursor = Some(node);
        while let Some(handle) = cursor {
            if handle == self.root {
                return true;
            }
            cursor = self.node(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Depth-first search below `from` for an element whose attribute
    /// `name` equals `value`.
    pub fn find_by_attribute(
        &self,
        from: HostHandle,
        name: &str,
        value: &str,
    ) -> Option<HostHandle> {
        if self.attribute(from, name) == Some(value) {
            return Some(from);
        }
        self.children(from)
            .iter()
            .find_map(|&child| self.find_by_attribute(child, name, value))
    }

    /// Invokes the handler attached directly to `event.target`.
    pub fn fire(&self, event: &Event) -> bool {
        let handler = match self.node(event.target).map(|n| &n.kind) {
            Some(DocKind::Element { handlers, .. }) => handlers.get(&event.kind).cloned(),
            _ => None,
        };
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    /// Detaches `node` from its parent outside the reconciler, as another
    /// script on the page might.
    pub fn detach(&mut self, node: HostHandle) {
        if let Some(parent) = self.node(node).and_then(|n| n.parent) {
            self.unlink(parent, node);
        }
    }

    /// Markup of `node` and its subtree.
    pub fn render_html(&self, node: HostHandle) -> String {
        let mut out = String::new();
        self.write_html(&mut out, node);
        out
    }

    /// Markup of the children of `node`.
    pub fn inner_html(&self, node: HostHandle) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(&mut out, child);
        }
        out
    }

    fn write_html(&self, out: &mut String, handle: HostHandle) {
        let Some(node) = self.node(handle) else {
            return;
        };
        match &node.kind {
            DocKind::Text(text) => out.push_str(text),
            DocKind::Element {
                tag, attributes, ..
            } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(out, child);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn alloc(&mut self, kind: DocKind) -> HostHandle {
        let handle = HostHandle(self.nodes.len() as u64);
        self.nodes.push(DocNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        handle
    }

    fn node(&self, handle: HostHandle) -> Option<&DocNode> {
        self.nodes.get(handle.0 as usize)
    }

    fn node_mut(&mut self, handle: HostHandle) -> Option<&mut DocNode> {
        self.nodes.get_mut(handle.0 as usize)
    }

    fn check(&self, handle: HostHandle) -> Result<(), HostError> {
        self.node(handle)
            .map(|_| ())
            .ok_or(HostError::UnknownHandle { handle })
    }

    fn is_ancestor(&self, ancestor: HostHandle, of: HostHandle) -> bool {
        let mut cursor = Some(of);
        while let Some(handle) = cursor {
            if handle == ancestor {
                return true;
            }
            cursor = self.node(handle).and_then(|n| n.parent);
        }
        false
    }

    fn unlink(&mut self, parent: HostHandle, child: HostHandle) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = None;
        }
    }

    fn link(&mut self, parent: HostHandle, child: HostHandle, at: Option<usize>) {
        if let Some(p) = self.node_mut(parent) {
            match at {
                Some(at) => p.children.insert(at, child),
                None => p.children.push(child),
            }
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn insert(
        &mut self,
        parent: HostHandle,
        child: HostHandle,
        reference: Option<HostHandle>,
    ) -> Result<(), HostError> {
        self.check(parent)?;
        self.check(child)?;
        if self.is_ancestor(child, parent) {
            return Err(HostError::WouldCycle { parent, child });
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.node(reference).and_then(|n| n.parent) != Some(parent) {
                return Err(HostError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }
        if let Some(old_parent) = self.node(child).and_then(|n| n.parent) {
            self.unlink(old_parent, child);
        }
        let at = reference.and_then(|reference| {
            self.children(parent)
                .iter()
                .position(|&sibling| sibling == reference)
        });
        self.link(parent, child, at);
        self.mutations.inserted += 1;
        Ok(())
    }
}

impl Host for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> HostHandle {
        self.mutations.created += 1;
        self.alloc(DocKind::Element {
            tag: tag.to_owned(),
            attributes: Vec::new(),
            handlers: HandlerMap::default(),
        })
    }

    fn create_text_node(&mut self, text: &str) -> HostHandle {
        self.mutations.created += 1;
        self.alloc(DocKind::Text(text.to_owned()))
    }

    fn set_text(&mut self, node: HostHandle, text: &str) {
        if let Some(DocKind::Text(current)) =
            self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind)
        {
            current.clear();
            current.push_str(text);
            self.mutations.text_updates += 1;
        }
    }

    fn set_attribute(&mut self, node: HostHandle, name: &str, value: &str) {
        if let Some(DocKind::Element { attributes, .. }) =
            self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind)
        {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, current)) => *current = value.to_owned(),
                None => attributes.push((name.to_owned(), value.to_owned())),
            }
            self.mutations.attributes_set += 1;
        }
    }

    fn remove_attribute(&mut self, node: HostHandle, name: &str) {
        if let Some(DocKind::Element { attributes, .. }) =
            self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind)
        {
            attributes.retain(|(n, _)| n != name);
            self.mutations.attributes_removed += 1;
        }
    }

    fn attach_handler(&mut self, node: HostHandle, event: EventKind, handler: Callback) {
        if let Some(DocKind::Element { handlers, .. }) =
            self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind)
        {
            handlers.insert(event, handler);
            self.mutations.handlers_attached += 1;
        }
    }

    fn detach_handler(&mut self, node: HostHandle, event: EventKind) {
        if let Some(DocKind::Element { handlers, .. }) =
            self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind)
        {
            handlers.remove(&event);
            self.mutations.handlers_detached += 1;
        }
    }

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError> {
        self.insert(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: HostHandle,
        child: HostHandle,
        reference: HostHandle,
    ) -> Result<(), HostError> {
        self.insert(parent, child, Some(reference))
    }

    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError> {
        self.check(parent)?;
        self.check(child)?;
        if self.node(child).and_then(|n| n.parent) != Some(parent) {
            return Err(HostError::NotAChild { parent, child });
        }
        self.unlink(parent, child);
        self.mutations.removed += 1;
        Ok(())
    }

    fn child_at(&self, parent: HostHandle, index: usize) -> Option<HostHandle> {
        self.children(parent).get(index).copied()
    }

    fn child_count(&self, parent: HostHandle) -> usize {
        self.children(parent).len()
    }

    fn parent_of(&self, node: HostHandle) -> Option<HostHandle> {
        self.node(node).and_then(|n| n.parent)
    }

    fn element_by_id(&self, id: &str) -> Option<HostHandle> {
        self.find_by_attribute(self.root, "id", id)
    }

    fn bind(&mut self, node: HostHandle, record: NodeId) {
        self.bindings.insert(node, record);
    }

    fn bound(&self, node: HostHandle) -> Option<NodeId> {
        self.bindings.get(&node).copied()
    }
}
