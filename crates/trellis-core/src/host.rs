use std::fmt;

use crate::node::NodeId;
use crate::props::{Callback, EventKind};

/// Opaque handle to a node of the external tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(pub u64);

impl fmt::Display for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    UnknownHandle {
        handle: HostHandle,
    },
    NotAChild {
        parent: HostHandle,
        child: HostHandle,
    },
    WouldCycle {
        parent: HostHandle,
        child: HostHandle,
    },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::UnknownHandle { handle } => write!(f, "unknown external node {handle}"),
            HostError::NotAChild { parent, child } => {
                write!(f, "{child} is not a child of {parent}")
            }
            HostError::WouldCycle { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Document environment the reconciler mutates.
///
/// Inserting a node that is already attached moves it. The reconciler treats
/// a failed removal as already done, and retries a failed `insert_before` as
/// an append.
pub trait Host {
    fn create_element(&mut self, tag: &str) -> HostHandle;
    fn create_text_node(&mut self, text: &str) -> HostHandle;
    fn set_text(&mut self, node: HostHandle, text: &str);

    fn set_attribute(&mut self, node: HostHandle, name: &str, value: &str);
    fn remove_attribute(&mut self, node: HostHandle, name: &str);

    /// Attaches a handler for an event that does not bubble, replacing any
    /// previous one for the same event.
    fn attach_handler(&mut self, node: HostHandle, event: EventKind, handler: Callback);
    fn detach_handler(&mut self, node: HostHandle, event: EventKind);

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError>;
    fn insert_before(
        &mut self,
        parent: HostHandle,
        child: HostHandle,
        reference: HostHandle,
    ) -> Result<(), HostError>;
    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError>;

    fn child_at(&self, parent: HostHandle, index: usize) -> Option<HostHandle>;
    fn child_count(&self, parent: HostHandle) -> usize;
    fn parent_of(&self, node: HostHandle) -> Option<HostHandle>;

    fn element_by_id(&self, id: &str) -> Option<HostHandle>;

    /// Records which node currently owns `node`, for event and focus lookups.
    fn bind(&mut self, node: HostHandle, record: NodeId);
    fn bound(&self, node: HostHandle) -> Option<NodeId>;

    fn clear_children(&mut self, parent: HostHandle) {
        while let Some(child) = self.child_at(parent, 0) {
            if let Err(err) = self.remove_child(parent, child) {
                log::warn!("clearing {parent} stopped early: {err}");
                break;
            }
        }
    }
}
