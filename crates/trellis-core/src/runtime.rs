use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    render_scheduled: Cell<bool>,
    passes: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            render_scheduled: Cell::new(false),
            passes: Cell::new(0),
        }
    }

    fn request_render(&self) -> bool {
        if self.render_scheduled.replace(true) {
            return false;
        }
        self.scheduler.schedule_frame();
        true
    }
}

/// Render-request state shared by one mount and the callbacks it hands out.
///
/// A request raises the "already scheduled" flag and asks the scheduler for a
/// frame only on the false-to-true transition, so any number of requests
/// before the pass runs collapse into one frame.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    /// Returns `true` if this call scheduled a frame, `false` if one was
    /// already pending.
    pub fn request_render(&self) -> bool {
        self.inner.request_render()
    }

    pub fn render_requested(&self) -> bool {
        self.inner.render_scheduled.get()
    }

    /// Number of completed passes.
    pub fn passes(&self) -> u64 {
        self.inner.passes.get()
    }

    pub(crate) fn begin_render(&self) {
        self.inner.render_scheduled.set(true);
    }

    pub(crate) fn finish_render(&self) {
        self.inner.passes.set(self.inner.passes.get() + 1);
        self.inner.render_scheduled.set(false);
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

/// Weak handle given to apps and event callbacks so they can ask for a
/// re-render without keeping the mount alive.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn request_render(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.request_render())
            .unwrap_or(false)
    }

    pub fn render_requested(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.render_scheduled.get())
            .unwrap_or(false)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingScheduler {
        frames: AtomicUsize,
    }

    impl RuntimeScheduler for CountingScheduler {
        fn schedule_frame(&self) {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn requests_coalesce_until_the_pass_finishes() {
        let scheduler = Arc::new(CountingScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        let handle = runtime.handle();

        assert!(runtime.request_render());
        assert!(!handle.request_render());
        assert!(!runtime.request_render());
        assert_eq!(scheduler.frames.load(Ordering::SeqCst), 1);

        runtime.begin_render();
        assert!(!handle.request_render(), "requests during a pass are no-ops");
        runtime.finish_render();

        assert!(!runtime.render_requested());
        assert!(handle.request_render());
        assert_eq!(scheduler.frames.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.passes(), 1);
    }

    #[test]
    fn handle_outliving_runtime_is_inert() {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let handle = runtime.handle();
        drop(runtime);
        assert!(!handle.is_alive());
        assert!(!handle.request_render());
    }
}
