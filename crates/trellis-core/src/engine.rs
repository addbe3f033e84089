use crate::build::RenderContext;
use crate::events::{self, Event};
use crate::focus::FocusSet;
use crate::host::{Host, HostHandle};
use crate::index::{DuplicateKeys, KeyIndex};
use crate::key::KeyBuilder;
use crate::node::{Node, NodeError, NodeId, NodeList, NodePool};
use crate::props::Tag;
use crate::reconcile::{Frame, PatchStats, Reconciler};

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Bucket count of the key index, rounded up to a power of two.
    pub index_buckets: usize,
    /// Log the duplicate-key report after every pass.
    pub report_duplicates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_buckets: 4096,
            report_duplicates: true,
        }
    }
}

/// One mounted tree's reconciliation state.
///
/// Every pass is `start_generation`, then `build`, then `rebuild` (first
/// pass) or `diff_patch` against the previous root. Records of a generation
/// stay alive through the following pass and are reclaimed when the one
/// after it starts.
pub struct Engine {
    config: EngineConfig,
    pool: NodePool,
    index: KeyIndex,
    keys: KeyBuilder,
    focus: FocusSet,
    // Records the index does not track: text leaves, roots, loose records.
    current: NodeList,
    previous: NodeList,
    pending: Vec<NodeId>,
    frames: Vec<Frame>,
    generation: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            index: KeyIndex::new(config.index_buckets),
            config,
            pool: NodePool::new(),
            keys: KeyBuilder::new(),
            focus: FocusSet::new(),
            current: NodeList::default(),
            previous: NodeList::default(),
            pending: Vec::new(),
            frames: Vec::new(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generations started so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Opens a new generation and reclaims the one before the previous.
    /// Returns how many records went back to the pool.
    pub fn start_generation(&mut self) -> Result<usize, NodeError> {
        let freed = self.index.start_generation(&mut self.pool)?;
        let mut reclaimed = self.pool.reclaim(freed)?;
        let retired = std::mem::replace(&mut self.previous, self.current);
        self.current = NodeList::default();
        reclaimed += self.pool.reclaim(retired)?;
        self.keys.reset();
        self.generation += 1;
        log::debug!(
            "generation {} started; {reclaimed} records reclaimed, {} free",
            self.generation,
            self.pool.free_len()
        );
        Ok(reclaimed)
    }

    /// Builds the new generation's tree under a fresh root record.
    pub fn build(&mut self, f: impl FnOnce(&mut RenderContext<'_>)) -> Result<NodeId, NodeError> {
        let root = self.pool.recycle();
        self.pool.get_mut(root)?.tag = Tag::Fragment;
        self.current.push(&mut self.pool, root)?;
        let mut cx = RenderContext::new(
            &mut self.pool,
            &mut self.index,
            &mut self.keys,
            &mut self.current,
            root,
        );
        f(&mut cx);
        let result = cx.finish();
        debug_assert!(self.keys.is_balanced(), "unbalanced key stack after build");
        if !self.keys.is_balanced() {
            let stray = self.keys.reset();
            log::error!("key stack unbalanced after build; {stray} stray tokens dropped");
        }
        result.map(|()| root)
    }

    /// Mounts `root`'s children into `container` without diffing.
    pub fn rebuild<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        root: NodeId,
        container: HostHandle,
    ) -> Result<PatchStats, NodeError> {
        let stats = Reconciler::new(
            &mut self.pool,
            host,
            &self.focus,
            &mut self.pending,
            &mut self.frames,
        )
        .rebuild(root, container)?;
        log::debug!("rebuild into {container}: {stats}");
        Ok(stats)
    }

    /// Patches `container` from the tree under `old_root` to the tree under
    /// `new_root`.
    pub fn diff_patch<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        old_root: NodeId,
        new_root: NodeId,
        container: HostHandle,
    ) -> Result<PatchStats, NodeError> {
        let stats = Reconciler::new(
            &mut self.pool,
            host,
            &self.focus,
            &mut self.pending,
            &mut self.frames,
        )
        .diff_patch(old_root, new_root, container)?;
        log::debug!("patch {old_root} -> {new_root}: {stats}");
        Ok(stats)
    }

    /// Hands out a loose record. It lives as long as the current
    /// generation's records do.
    pub fn recycle(&mut self) -> Result<NodeId, NodeError> {
        let id = self.pool.recycle();
        self.current.push(&mut self.pool, id)?;
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, NodeError> {
        self.pool.get(id)
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Key collisions seen while building the current generation.
    pub fn duplicate_keys(&self) -> &DuplicateKeys {
        self.index.duplicates()
    }

    pub fn focus(&self) -> &FocusSet {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusSet {
        &mut self.focus
    }

    /// Marks `target` and its ancestors below `container` as focused,
    /// replacing the previous focus chain.
    pub fn focus_in<H: Host + ?Sized>(&mut self, host: &H, target: HostHandle, container: HostHandle) {
        self.focus.clear();
        let mut cursor = Some(target);
        while let Some(handle) = cursor {
            if handle == container {
                break;
            }
            self.focus.add(handle);
            cursor = host.parent_of(handle);
        }
    }

    pub fn focus_out(&mut self) {
        self.focus.clear();
    }

    /// Runs the handlers `event` reaches. Returns how many ran.
    pub fn dispatch<H: Host + ?Sized>(&self, host: &H, event: &Event) -> usize {
        events::dispatch(&self.pool, host, event)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
