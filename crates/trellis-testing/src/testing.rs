use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis_core::{
    App, EngineConfig, Event, EventKind, Host, HostHandle, MemoryDocument, Mount, MutationCounts,
    NodeError, PatchStats, Runtime, RuntimeScheduler,
};

/// Id of the element every [`TestMount`] renders into.
pub const MOUNT_POINT: &str = "app";

/// Scheduler that only counts frame requests. Tests drive frames by hand.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    frames: AtomicUsize,
}

impl CountingScheduler {
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl RuntimeScheduler for CountingScheduler {
    fn schedule_frame(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

/// An app mounted into a fresh [`MemoryDocument`], with helpers to drive
/// frames and poke at the resulting tree.
pub struct TestMount<A: App> {
    mount: Mount<MemoryDocument, A>,
    scheduler: Arc<CountingScheduler>,
    target: HostHandle,
}

impl<A: App> TestMount<A> {
    pub fn new(app: A) -> Self {
        Self::with_config(app, EngineConfig::default())
    }

    pub fn with_config(app: A, config: EngineConfig) -> Self {
        let (doc, target) = MemoryDocument::with_mount_point(MOUNT_POINT);
        let scheduler = Arc::new(CountingScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            mount: Mount::with_runtime(doc, MOUNT_POINT, app, runtime, config),
            scheduler,
            target,
        }
    }

    /// Runs one pass whether or not one was requested.
    pub fn render(&mut self) -> Result<PatchStats, NodeError> {
        Ok(self.mount.render()?.unwrap_or_default())
    }

    /// Runs the requested pass, if there is one.
    pub fn pump(&mut self) -> Result<Option<PatchStats>, NodeError> {
        self.mount.on_frame()
    }

    pub fn request_render(&self) -> bool {
        self.mount.request_render()
    }

    pub fn frames_requested(&self) -> usize {
        self.scheduler.frames()
    }

    pub fn target(&self) -> HostHandle {
        self.target
    }

    /// Markup below the mount point.
    pub fn html(&self) -> String {
        self.document().inner_html(self.target)
    }

    pub fn document(&self) -> &MemoryDocument {
        self.mount.host()
    }

    pub fn document_mut(&mut self) -> &mut MemoryDocument {
        self.mount.host_mut()
    }

    pub fn mutations(&self) -> MutationCounts {
        self.document().mutations()
    }

    pub fn reset_mutations(&mut self) {
        self.mount.host_mut().reset_mutations();
    }

    /// External children of the mount point, in order.
    pub fn child_handles(&self) -> Vec<HostHandle> {
        self.document().children(self.target).to_vec()
    }

    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<HostHandle> {
        self.document().find_by_attribute(self.target, name, value)
    }

    pub fn mount(&self) -> &Mount<MemoryDocument, A> {
        &self.mount
    }

    pub fn app_mut(&mut self) -> &mut A {
        self.mount.app_mut()
    }

    /// Focuses `target` the way a focus event would.
    pub fn focus(&mut self, target: HostHandle) -> usize {
        self.mount.focus_in(target);
        self.fire(Event::new(EventKind::Focus, target))
    }

    pub fn blur(&mut self, target: HostHandle) -> usize {
        self.mount.focus_out();
        self.fire(Event::new(EventKind::Blur, target))
    }

    pub fn click(&mut self, target: HostHandle) -> usize {
        self.fire(Event::new(EventKind::Click, target))
    }

    pub fn input(&mut self, target: HostHandle, value: &str) -> usize {
        self.fire(Event::new(EventKind::Input, target).with_value(value))
    }

    /// Delivers `event` to the mounted tree. Returns how many handlers ran.
    pub fn fire(&mut self, event: Event) -> usize {
        self.mount.dispatch(&event)
    }

    /// Whether `handle` is still a descendant of the mount point.
    pub fn is_mounted_node(&self, handle: HostHandle) -> bool {
        let doc = self.document();
        let mut cursor = doc.parent_of(handle);
        while let Some(parent) = cursor {
            if parent == self.target {
                return true;
            }
            cursor = doc.parent_of(parent);
        }
        false
    }
}
