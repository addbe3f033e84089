use std::fmt;
use std::rc::Rc;

use crate::collections::HandlerMap;
use crate::host::HostHandle;
use crate::key::StableKey;
use crate::props::{AttrId, Callback, EventKind, Prop, PropName, PropValue, Tag};

/// Generation-tagged handle into a [`NodePool`].
///
/// A handle whose record has since been released no longer resolves; lookups
/// report [`NodeError::Stale`] instead of reading a reused record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    Stale { id: NodeId },
    Unmounted { id: NodeId },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::Stale { id } => write!(f, "node {id} is stale; its record was recycled"),
            NodeError::Unmounted { id } => write!(f, "node {id} has no external node"),
        }
    }
}

impl std::error::Error for NodeError {}

pub type Hook = Rc<dyn Fn(HostHandle)>;

/// Lifecycle hooks. Each fires once per physical mutation of its kind.
#[derive(Clone, Default)]
pub struct Hooks {
    pub on_add: Option<Hook>,
    pub on_before_move: Option<Hook>,
    pub on_move: Option<Hook>,
    pub on_remove: Option<Hook>,
}

impl Hooks {
    pub(crate) fn fire(hook: &Option<Hook>, handle: HostHandle) {
        if let Some(hook) = hook {
            hook(handle);
        }
    }

    fn is_empty(&self) -> bool {
        self.on_add.is_none()
            && self.on_before_move.is_none()
            && self.on_move.is_none()
            && self.on_remove.is_none()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_add", &self.on_add.is_some())
            .field("on_before_move", &self.on_before_move.is_some())
            .field("on_move", &self.on_move.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .finish()
    }
}

/// One element or text leaf of a generation's tree.
pub struct Node {
    pub(crate) tag: Tag,
    pub(crate) text: String,
    pub(crate) attributes: Vec<(AttrId, String)>,
    pub(crate) bubbling: HandlerMap,
    pub(crate) non_bubbling: Vec<(EventKind, Callback)>,
    pub(crate) hooks: Hooks,
    pub(crate) children: Vec<NodeId>,
    pub(crate) key: StableKey,
    // Scratch links owned by the index, reconciler and pool.
    pub(crate) matched: Option<NodeId>,
    pub(crate) handle: Option<HostHandle>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) pending_removal: bool,
}

impl Node {
    fn new() -> Self {
        Self {
            tag: Tag::Fragment,
            text: String::new(),
            attributes: Vec::new(),
            bubbling: HandlerMap::default(),
            non_bubbling: Vec::new(),
            hooks: Hooks::default(),
            children: Vec::new(),
            key: StableKey::default(),
            matched: None,
            handle: None,
            parent: None,
            next: None,
            pending_removal: false,
        }
    }

    /// Clears every field. Buffers keep their capacity.
    fn reset(&mut self) {
        self.tag = Tag::Fragment;
        self.text.clear();
        self.attributes.clear();
        self.bubbling.clear();
        self.non_bubbling.clear();
        self.hooks = Hooks::default();
        self.children.clear();
        self.key.clear();
        self.matched = None;
        self.handle = None;
        self.parent = None;
        self.next = None;
        self.pending_removal = false;
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn is_text(&self) -> bool {
        self.tag.is_text()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &[(AttrId, String)] {
        &self.attributes
    }

    pub fn attribute(&self, id: AttrId) -> Option<&str> {
        self.attributes
            .binary_search_by_key(&id, |(attr, _)| *attr)
            .ok()
            .map(|at| self.attributes[at].1.as_str())
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        if kind.bubbles() {
            self.bubbling.contains_key(&kind)
        } else {
            self.non_bubbling.iter().any(|(k, _)| *k == kind)
        }
    }

    pub fn direct_events(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.non_bubbling.iter().map(|(kind, _)| *kind)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn key(&self) -> &StableKey {
        &self.key
    }

    pub fn handle(&self) -> Option<HostHandle> {
        self.handle
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn handler(&self, kind: EventKind) -> Option<Callback> {
        if kind.bubbles() {
            self.bubbling.get(&kind).cloned()
        } else {
            self.non_bubbling
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, cb)| cb.clone())
        }
    }

    /// Routes each prop into the attribute list or one of the handler
    /// tables, then restores the sorted-by-id invariant.
    pub(crate) fn populate(&mut self, props: Vec<Prop>) {
        for prop in props {
            match (prop.name, prop.value) {
                (PropName::Attr(id), PropValue::Text(value)) => {
                    self.attributes.push((id, value));
                }
                (PropName::Event(kind), PropValue::Handler(handler)) if kind.bubbles() => {
                    self.bubbling.insert(kind, handler);
                }
                (PropName::Event(kind), PropValue::Handler(handler)) => {
                    self.non_bubbling.push((kind, handler));
                }
                (PropName::Attr(id), PropValue::Handler(_)) => {
                    log::warn!("attribute {} given a callback on <{}>; dropped", id.name(), self.tag);
                }
                (PropName::Event(kind), PropValue::Text(_)) => {
                    log::warn!("event {kind} given a string value on <{}>; dropped", self.tag);
                }
            }
        }
        // Stable sorts; for a repeated id the last occurrence wins.
        self.attributes.sort_by_key(|(id, _)| *id);
        dedup_keep_last(&mut self.attributes, |(id, _)| *id);
        self.non_bubbling.sort_by_key(|(kind, _)| *kind);
        dedup_keep_last(&mut self.non_bubbling, |(kind, _)| *kind);
    }
}

fn dedup_keep_last<T, K: PartialEq>(items: &mut Vec<T>, key: impl Fn(&T) -> K) {
    let mut write = 0;
    for read in 0..items.len() {
        let last_of_run = read + 1 == items.len() || key(&items[read]) != key(&items[read + 1]);
        if last_of_run {
            items.swap(write, read);
            write += 1;
        }
    }
    items.truncate(write);
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("tag", &self.tag);
        if self.is_text() {
            s.field("text", &self.text);
        }
        s.field("key", &format_args!("{}", self.key))
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .field("handle", &self.handle);
        if !self.hooks.is_empty() {
            s.field("hooks", &self.hooks);
        }
        s.finish()
    }
}

/// Singly linked list of records threaded through their `next` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeList {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl NodeList {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub(crate) fn push(&mut self, pool: &mut NodePool, id: NodeId) -> Result<(), NodeError> {
        pool.get_mut(id)?.next = None;
        match self.tail {
            Some(tail) => pool.get_mut(tail)?.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        Ok(())
    }
}

struct Slot {
    generation: u32,
    live: bool,
    node: Node,
}

/// Arena of node records with an intrusive free list.
#[derive(Default)]
pub struct NodePool {
    slots: Vec<Slot>,
    free: Option<u32>,
    free_len: usize,
    growth_events: usize,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops a reset record off the free list, growing storage only when the
    /// list is empty.
    pub fn recycle(&mut self) -> NodeId {
        if let Some(index) = self.free {
            let slot = &mut self.slots[index as usize];
            self.free = slot.node.next.map(|next| next.index);
            self.free_len -= 1;
            slot.node.reset();
            slot.live = true;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            live: true,
            node: Node::new(),
        });
        self.growth_events += 1;
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Returns a record to the free list. Outstanding handles to it become
    /// stale.
    pub fn release(&mut self, id: NodeId) -> Result<(), NodeError> {
        self.get(id)?;
        let free_head = self.free.map(|index| NodeId {
            index,
            generation: self.slots[index as usize].generation,
        });
        let slot = &mut self.slots[id.index()];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.node.reset();
        slot.node.next = free_head;
        self.free = Some(id.index);
        self.free_len += 1;
        Ok(())
    }

    /// Releases every record of `list`. Returns how many were reclaimed.
    pub fn reclaim(&mut self, list: NodeList) -> Result<usize, NodeError> {
        let mut cursor = list.head;
        let mut reclaimed = 0;
        while let Some(id) = cursor {
            cursor = self.get(id)?.next;
            self.release(id)?;
            reclaimed += 1;
        }
        Ok(reclaimed)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, NodeError> {
        let slot = self
            .slots
            .get(id.index())
            .ok_or(NodeError::Missing { id })?;
        if !slot.live || slot.generation != id.generation {
            return Err(NodeError::Stale { id });
        }
        Ok(&slot.node)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, NodeError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(NodeError::Missing { id })?;
        if !slot.live || slot.generation != id.generation {
            return Err(NodeError::Stale { id });
        }
        Ok(&mut slot.node)
    }

    /// Appends `child` to `parent`'s children, splicing it out of any
    /// previous parent first.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.unlink(child)?;
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Splices `id` out of its parent's child list. Returns the index it
    /// occupied, or `None` if it had no parent.
    pub fn unlink(&mut self, id: NodeId) -> Result<Option<usize>, NodeError> {
        let Some(parent) = self.get_mut(id)?.parent.take() else {
            return Ok(None);
        };
        let siblings = &mut self.get_mut(parent)?.children;
        let index = siblings.iter().position(|&sibling| sibling == id);
        if let Some(index) = index {
            siblings.remove(index);
        }
        Ok(index)
    }

    /// Records currently handed out.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_len(&self) -> usize {
        self.free_len
    }

    /// How many times `recycle` had to grow storage.
    pub fn growth_events(&self) -> usize {
        self.growth_events
    }
}

impl fmt::Debug for NodePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePool")
            .field("live", &self.len())
            .field("free", &self.free_len)
            .field("growth_events", &self.growth_events)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
