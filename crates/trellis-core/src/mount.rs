use std::sync::Arc;

use crate::build::RenderContext;
use crate::engine::{Engine, EngineConfig};
use crate::events::Event;
use crate::host::{Host, HostHandle};
use crate::node::{NodeError, NodeId};
use crate::reconcile::PatchStats;
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};

/// Application rendered by a [`Mount`].
pub trait App {
    /// Called once after mounting, before the first pass.
    fn start(&mut self, _runtime: RuntimeHandle) {}

    fn render(&mut self, cx: &mut RenderContext<'_>);
}

impl<F> App for F
where
    F: FnMut(&mut RenderContext<'_>),
{
    fn render(&mut self, cx: &mut RenderContext<'_>) {
        self(cx)
    }
}

/// An app mounted under one external element.
pub struct Mount<H: Host, A: App> {
    host: H,
    app: A,
    engine: Engine,
    runtime: Runtime,
    container: Option<HostHandle>,
    root: Option<NodeId>,
}

impl<H: Host, A: App> Mount<H, A> {
    pub fn new(host: H, target_id: &str, app: A) -> Self {
        Self::with_runtime(
            host,
            target_id,
            app,
            Runtime::new(Arc::new(DefaultScheduler)),
            EngineConfig::default(),
        )
    }

    /// Mounts under the element whose id is `target_id`. Without such an
    /// element the mount stays inert: nothing renders and nothing fails.
    pub fn with_runtime(
        host: H,
        target_id: &str,
        mut app: A,
        runtime: Runtime,
        config: EngineConfig,
    ) -> Self {
        let container = host.element_by_id(target_id);
        match container {
            Some(container) => {
                app.start(runtime.handle());
                runtime.request_render();
                log::debug!("mounted under #{target_id} ({container})");
            }
            None => log::error!("mount target #{target_id} not found; nothing will render"),
        }
        Self {
            host,
            app,
            engine: Engine::new(config),
            runtime,
            container,
            root: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.container.is_some()
    }

    /// Runs one pass unconditionally. Returns `None` on an inert mount.
    pub fn render(&mut self) -> Result<Option<PatchStats>, NodeError> {
        let Some(container) = self.container else {
            return Ok(None);
        };
        self.runtime.begin_render();
        let result = self.pass(container);
        self.runtime.finish_render();
        match result {
            Ok(stats) => Ok(Some(stats)),
            Err(err) => {
                log::error!("render pass failed: {err}; next pass remounts");
                self.root = None;
                Err(err)
            }
        }
    }

    /// Runs a pass if one was requested since the last.
    pub fn on_frame(&mut self) -> Result<Option<PatchStats>, NodeError> {
        if !self.runtime.render_requested() {
            return Ok(None);
        }
        self.render()
    }

    fn pass(&mut self, container: HostHandle) -> Result<PatchStats, NodeError> {
        self.engine.start_generation()?;
        let app = &mut self.app;
        let new_root = self.engine.build(|cx| app.render(cx))?;
        let stats = match self.root {
            Some(old_root) => {
                self.engine
                    .diff_patch(&mut self.host, old_root, new_root, container)?
            }
            None => self.engine.rebuild(&mut self.host, new_root, container)?,
        };
        let duplicates = self.engine.duplicate_keys();
        if self.engine.config().report_duplicates && !duplicates.is_empty() {
            log::warn!("{duplicates}");
        }
        self.root = Some(new_root);
        Ok(stats)
    }

    pub fn request_render(&self) -> bool {
        self.runtime.request_render()
    }

    pub fn should_render(&self) -> bool {
        self.is_mounted() && self.runtime.render_requested()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    /// App state changed through here is picked up by the next pass; call
    /// [`request_render`](Self::request_render) to schedule one.
    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    /// Root record of the last completed pass.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn container(&self) -> Option<HostHandle> {
        self.container
    }

    /// Runs the handlers `event` reaches. Returns how many ran.
    pub fn dispatch(&self, event: &Event) -> usize {
        self.engine.dispatch(&self.host, event)
    }

    pub fn focus_in(&mut self, target: HostHandle) {
        if let Some(container) = self.container {
            self.engine.focus_in(&self.host, target, container);
        }
    }

    pub fn focus_out(&mut self) {
        self.engine.focus_out();
    }
}
