//! Diff/patch walk over two generations of child lists.
//!
//! Each level walks the old and new child lists in lock step and classifies
//! the pair under the cursors:
//!
//! * both text: reuse the old text node, rewriting its content if needed;
//! * new text only: create a text node before the old node;
//! * new matches the old node at the cursor: sync in place;
//! * new matches elsewhere and the old node at the cursor is focused: move
//!   the match here (bring and sync);
//! * new matches a later unclaimed sibling: mark the siblings in between for
//!   removal and sync the match where it stands (skip ahead);
//! * new matches anywhere else: bring and sync;
//! * no match: create a fresh subtree before the old node.
//!
//! Old nodes left after the loop are removed. New nodes left are brought
//! when they matched and created otherwise.

use std::fmt;

use crate::focus::FocusSet;
use crate::host::{Host, HostHandle};
use crate::node::{Hooks, NodeError, NodeId, NodePool};

/// What one pass did to the external tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub created: usize,
    pub removed: usize,
    pub moved: usize,
    pub synced: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub handlers_attached: usize,
    pub handlers_detached: usize,
    pub text_updates: usize,
}

impl fmt::Display for PatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} removed={} moved={} synced={} attrs+={} attrs-={} text={}",
            self.created,
            self.removed,
            self.moved,
            self.synced,
            self.attributes_set,
            self.attributes_removed,
            self.text_updates
        )
    }
}

/// Cursor into one level's old child list.
pub(crate) struct Frame {
    old_parent: NodeId,
    cursor: usize,
}

pub(crate) struct Reconciler<'a, H: Host + ?Sized> {
    pool: &'a mut NodePool,
    host: &'a mut H,
    focus: &'a FocusSet,
    pending: &'a mut Vec<NodeId>,
    frames: &'a mut Vec<Frame>,
    stats: PatchStats,
}

impl<'a, H: Host + ?Sized> Reconciler<'a, H> {
    pub(crate) fn new(
        pool: &'a mut NodePool,
        host: &'a mut H,
        focus: &'a FocusSet,
        pending: &'a mut Vec<NodeId>,
        frames: &'a mut Vec<Frame>,
    ) -> Self {
        pending.clear();
        frames.clear();
        Self {
            pool,
            host,
            focus,
            pending,
            frames,
            stats: PatchStats::default(),
        }
    }

    /// Mounts `root`'s children into an emptied `container`.
    pub(crate) fn rebuild(mut self, root: NodeId, container: HostHandle) -> Result<PatchStats, NodeError> {
        self.host.clear_children(container);
        self.pool.get_mut(root)?.handle = Some(container);
        let mut n = 0;
        while let Some(child) = self.child(root, n)? {
            self.add(child, container, None)?;
            n += 1;
        }
        Ok(self.stats)
    }

    pub(crate) fn diff_patch(
        mut self,
        old_root: NodeId,
        new_root: NodeId,
        container: HostHandle,
    ) -> Result<PatchStats, NodeError> {
        self.pool.get_mut(old_root)?.handle = Some(container);
        self.pool.get_mut(new_root)?.handle = Some(container);
        self.walk(old_root, new_root, container)?;
        self.flush_pending()?;
        Ok(self.stats)
    }

    fn walk(&mut self, old_parent: NodeId, new_parent: NodeId, container: HostHandle) -> Result<(), NodeError> {
        self.frames.push(Frame {
            old_parent,
            cursor: 0,
        });
        let result = self.walk_level(old_parent, new_parent, container);
        self.frames.pop();
        result
    }

    fn walk_level(&mut self, old_parent: NodeId, new_parent: NodeId, container: HostHandle) -> Result<(), NodeError> {
        let mut n = 0;
        loop {
            let Some(new) = self.child(new_parent, n)? else {
                break;
            };
            let Some(old) = self.child(old_parent, self.cursor())? else {
                break;
            };
            let new_node = self.pool.get(new)?;
            let old_node = self.pool.get(old)?;
            let new_is_text = new_node.is_text();
            let old_is_text = old_node.is_text();
            let matched = new_node.matched;
            let old_handle = old_node.handle;

            if new_is_text && old_is_text {
                log::trace!("{new}: text over text, retarget {old}");
                self.sync_text(old, new)?;
                self.advance();
            } else if new_is_text {
                log::trace!("{new}: text before {old}");
                self.add(new, container, old_handle)?;
            } else {
                match matched {
                    Some(m) if m == old => {
                        log::trace!("{new}: in place over {old}");
                        self.sync(old, new)?;
                        self.advance();
                    }
                    Some(m) if old_handle.is_some_and(|h| self.focus.is_focused(h)) => {
                        log::trace!("{new}: {old} is focused, bringing {m}");
                        self.bring_and_sync(new, m, container, old_handle)?;
                    }
                    Some(m) => match self.later_sibling(old_parent, m)? {
                        Some(at) => {
                            log::trace!("{new}: skipping ahead to {m}");
                            self.skip_to(old_parent, at)?;
                            self.sync(m, new)?;
                            self.advance();
                        }
                        None => {
                            log::trace!("{new}: bringing {m}");
                            self.bring_and_sync(new, m, container, old_handle)?;
                        }
                    },
                    None => {
                        log::trace!("{new}: no match, adding before {old}");
                        self.add(new, container, old_handle)?;
                    }
                }
            }
            n += 1;
        }

        while let Some(old) = self.child(old_parent, self.cursor())? {
            if self.pool.get(old)?.matched.is_some() {
                // Claimed by a new node still to come; removed at the end
                // unless that node brings it.
                log::trace!("{old}: claimed elsewhere, deferring removal");
                self.defer_removal(old)?;
                self.advance();
            } else {
                self.remove(old, container)?;
            }
        }
        // Skipped-over siblings may still be claimed by the rest of the list.
        while let Some(new) = self.child(new_parent, n)? {
            let node = self.pool.get(new)?;
            match node.matched.filter(|_| !node.is_text()) {
                Some(m) => {
                    log::trace!("{new}: past the old list, bringing {m}");
                    self.bring_and_sync(new, m, container, None)?;
                }
                None => self.add(new, container, None)?,
            }
            n += 1;
        }
        Ok(())
    }

    fn child(&self, parent: NodeId, index: usize) -> Result<Option<NodeId>, NodeError> {
        Ok(self.pool.get(parent)?.children.get(index).copied())
    }

    fn cursor(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.cursor)
    }

    fn advance(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.cursor += 1;
        }
    }

    /// Position of `m` after the cursor in `old_parent`'s list, if it is
    /// still waiting there.
    fn later_sibling(&self, old_parent: NodeId, m: NodeId) -> Result<Option<usize>, NodeError> {
        let node = self.pool.get(m)?;
        if node.parent != Some(old_parent) || node.pending_removal {
            return Ok(None);
        }
        let cursor = self.cursor();
        let siblings = &self.pool.get(old_parent)?.children;
        Ok(siblings
            .iter()
            .skip(cursor + 1)
            .position(|&sibling| sibling == m)
            .map(|offset| cursor + 1 + offset))
    }

    /// Marks the old siblings between the cursor and `at` for removal and
    /// moves the cursor onto `at`.
    fn skip_to(&mut self, old_parent: NodeId, at: usize) -> Result<(), NodeError> {
        for index in self.cursor()..at {
            let Some(skipped) = self.child(old_parent, index)? else {
                break;
            };
            self.defer_removal(skipped)?;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.cursor = at;
        }
        Ok(())
    }

    fn defer_removal(&mut self, old: NodeId) -> Result<(), NodeError> {
        self.pool.get_mut(old)?.pending_removal = true;
        self.pending.push(old);
        Ok(())
    }

    /// Splices `id` out of its old parent and pulls back any cursor that
    /// was past it.
    fn unlink(&mut self, id: NodeId) -> Result<(), NodeError> {
        let parent = self.pool.get(id)?.parent;
        if let (Some(parent), Some(index)) = (parent, self.pool.unlink(id)?) {
            for frame in self.frames.iter_mut() {
                if frame.old_parent == parent && index < frame.cursor {
                    frame.cursor -= 1;
                }
            }
        }
        Ok(())
    }

    /// Hands `handle` from its old node to `new`.
    fn transfer(&mut self, new: NodeId, handle: HostHandle) -> Result<(), NodeError> {
        let node = self.pool.get_mut(new)?;
        node.handle = Some(handle);
        node.matched = None;
        self.host.bind(handle, new);
        Ok(())
    }

    fn sync_text(&mut self, old: NodeId, new: NodeId) -> Result<(), NodeError> {
        let handle = self.pool.get(old)?.handle.ok_or(NodeError::Unmounted { id: old })?;
        self.transfer(new, handle)?;
        let old_text = &self.pool.get(old)?.text;
        let new_text = &self.pool.get(new)?.text;
        if old_text != new_text {
            self.host.set_text(handle, new_text);
            self.stats.text_updates += 1;
        }
        Ok(())
    }

    fn sync(&mut self, old: NodeId, new: NodeId) -> Result<(), NodeError> {
        let handle = self.pool.get(old)?.handle.ok_or(NodeError::Unmounted { id: old })?;
        self.transfer(new, handle)?;
        self.sync_handlers(old, new, handle)?;
        self.sync_attributes(old, new, handle)?;
        self.stats.synced += 1;
        let old_has_children = !self.pool.get(old)?.children.is_empty();
        let new_has_children = !self.pool.get(new)?.children.is_empty();
        if old_has_children || new_has_children {
            self.walk(old, new, handle)?;
        }
        Ok(())
    }

    /// Sorted merge over the directly attached handlers. Handlers present on
    /// both sides are reattached, since each generation's callbacks capture
    /// that generation's state.
    fn sync_handlers(&mut self, old: NodeId, new: NodeId, handle: HostHandle) -> Result<(), NodeError> {
        let pool = &*self.pool;
        let olds = &pool.get(old)?.non_bubbling;
        let news = &pool.get(new)?.non_bubbling;
        let (mut i, mut j) = (0, 0);
        loop {
            match (olds.get(i), news.get(j)) {
                (Some((old_kind, _)), Some((new_kind, handler))) if old_kind == new_kind => {
                    self.host.attach_handler(handle, *new_kind, handler.clone());
                    self.stats.handlers_attached += 1;
                    i += 1;
                    j += 1;
                }
                (Some((old_kind, _)), Some((new_kind, _))) if old_kind < new_kind => {
                    self.host.detach_handler(handle, *old_kind);
                    self.stats.handlers_detached += 1;
                    i += 1;
                }
                (Some((old_kind, _)), None) => {
                    self.host.detach_handler(handle, *old_kind);
                    self.stats.handlers_detached += 1;
                    i += 1;
                }
                (_, Some((new_kind, handler))) => {
                    self.host.attach_handler(handle, *new_kind, handler.clone());
                    self.stats.handlers_attached += 1;
                    j += 1;
                }
                (None, None) => break,
            }
        }
        Ok(())
    }

    fn sync_attributes(&mut self, old: NodeId, new: NodeId, handle: HostHandle) -> Result<(), NodeError> {
        let pool = &*self.pool;
        let olds = &pool.get(old)?.attributes;
        let news = &pool.get(new)?.attributes;
        let (mut i, mut j) = (0, 0);
        loop {
            match (olds.get(i), news.get(j)) {
                (Some((old_id, old_value)), Some((new_id, new_value))) if old_id == new_id => {
                    if old_value != new_value {
                        self.host.set_attribute(handle, &new_id.name(), new_value);
                        self.stats.attributes_set += 1;
                    }
                    i += 1;
                    j += 1;
                }
                (Some((old_id, _)), Some((new_id, _))) if old_id < new_id => {
                    self.host.remove_attribute(handle, &old_id.name());
                    self.stats.attributes_removed += 1;
                    i += 1;
                }
                (Some((old_id, _)), None) => {
                    self.host.remove_attribute(handle, &old_id.name());
                    self.stats.attributes_removed += 1;
                    i += 1;
                }
                (_, Some((new_id, new_value))) => {
                    self.host.set_attribute(handle, &new_id.name(), new_value);
                    self.stats.attributes_set += 1;
                    j += 1;
                }
                (None, None) => break,
            }
        }
        Ok(())
    }

    fn bring_and_sync(
        &mut self,
        new: NodeId,
        m: NodeId,
        container: HostHandle,
        reference: Option<HostHandle>,
    ) -> Result<(), NodeError> {
        self.pool.get_mut(m)?.pending_removal = false;
        self.unlink(m)?;
        let handle = self.pool.get(m)?.handle.ok_or(NodeError::Unmounted { id: m })?;
        let hooks = self.pool.get(new)?.hooks.clone();
        Hooks::fire(&hooks.on_before_move, handle);
        self.insert(container, handle, reference);
        Hooks::fire(&hooks.on_move, handle);
        self.stats.moved += 1;
        self.sync(m, new)
    }

    /// Creates the external subtree for `new` and inserts it before
    /// `reference`, or at the end.
    fn add(&mut self, new: NodeId, container: HostHandle, reference: Option<HostHandle>) -> Result<(), NodeError> {
        let handle = self.create(new)?;
        self.insert(container, handle, reference);
        Hooks::fire(&self.pool.get(new)?.hooks.on_add.clone(), handle);
        Ok(())
    }

    fn create(&mut self, id: NodeId) -> Result<HostHandle, NodeError> {
        let node = self.pool.get(id)?;
        let handle = if node.is_text() {
            self.host.create_text_node(&node.text)
        } else {
            let handle = self.host.create_element(node.tag.name());
            for (attr, value) in &node.attributes {
                self.host.set_attribute(handle, &attr.name(), value);
                self.stats.attributes_set += 1;
            }
            for (kind, handler) in &node.non_bubbling {
                self.host.attach_handler(handle, *kind, handler.clone());
                self.stats.handlers_attached += 1;
            }
            handle
        };
        self.stats.created += 1;
        self.transfer(id, handle)?;
        let mut n = 0;
        while let Some(child) = self.child(id, n)? {
            let child_handle = self.create(child)?;
            self.insert(handle, child_handle, None);
            Hooks::fire(&self.pool.get(child)?.hooks.on_add.clone(), child_handle);
            n += 1;
        }
        Ok(handle)
    }

    fn remove(&mut self, old: NodeId, container: HostHandle) -> Result<(), NodeError> {
        let node = self.pool.get(old)?;
        let handle = node.handle;
        let hook = node.hooks.on_remove.clone();
        match handle {
            Some(handle) => {
                Hooks::fire(&hook, handle);
                match self.host.remove_child(container, handle) {
                    Ok(()) => self.stats.removed += 1,
                    Err(err) => log::warn!("removing {old} skipped: {err}"),
                }
            }
            None => log::warn!("removing {old} skipped: it was never mounted"),
        }
        self.unlink(old)
    }

    fn insert(&mut self, container: HostHandle, child: HostHandle, reference: Option<HostHandle>) {
        let result = match reference {
            Some(reference) => self.host.insert_before(container, child, reference),
            None => self.host.append_child(container, child),
        };
        let Err(err) = result else {
            return;
        };
        if reference.is_some() {
            log::warn!("inserting {child} into {container} failed ({err}); appending instead");
            if let Err(err) = self.host.append_child(container, child) {
                log::warn!("appending {child} to {container} failed: {err}");
            }
        } else {
            log::warn!("appending {child} to {container} failed: {err}");
        }
    }

    /// Removes old nodes that a skip-ahead marked and nothing brought back.
    fn flush_pending(&mut self) -> Result<(), NodeError> {
        for i in 0..self.pending.len() {
            let id = self.pending[i];
            let node = self.pool.get(id)?;
            if !node.pending_removal {
                continue;
            }
            let container = match node.parent {
                Some(parent) => self.pool.get(parent)?.handle,
                None => node.handle.and_then(|handle| self.host.parent_of(handle)),
            };
            self.pool.get_mut(id)?.pending_removal = false;
            match container {
                Some(container) => self.remove(id, container)?,
                None => log::warn!("removing {id} skipped: no external parent"),
            }
        }
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
