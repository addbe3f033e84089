use crate::host::{Host, HostHandle};
use crate::node::NodePool;
use crate::props::EventKind;

/// Host event handed to callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: HostHandle,
    pub value: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind, target: HostHandle) -> Self {
        Self {
            kind,
            target,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Resolves `event.target` to its node and runs handlers for it.
///
/// Bubbling events walk the parent chain and run every matching handler on
/// the way up. Other events only run the target's own handler. Returns the
/// number of handlers invoked.
pub(crate) fn dispatch<H: Host + ?Sized>(pool: &NodePool, host: &H, event: &Event) -> usize {
    let Some(mut cursor) = host.bound(event.target) else {
        log::trace!("no node bound to {} for {}", event.target, event.kind);
        return 0;
    };
    let mut invoked = 0;
    loop {
        let Ok(node) = pool.get(cursor) else {
            log::debug!("node {cursor} bound to {} is stale", event.target);
            break;
        };
        let handler = node.handler(event.kind);
        let parent = node.parent();
        if let Some(handler) = handler {
            handler(event);
            invoked += 1;
        }
        if !event.kind.bubbles() {
            break;
        }
        match parent {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    invoked
}
