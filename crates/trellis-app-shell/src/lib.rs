use trellis_core::{App, EngineConfig, Event, EventKind, Host, HostHandle, Mount, PatchStats};
use trellis_runtime_std::StdRuntime;

/// Owns a mount and the runtime that schedules it, and routes host events
/// into the mounted tree.
pub struct AppShell<H: Host, A: App> {
    runtime: StdRuntime,
    mount: Mount<H, A>,
    last_stats: Option<PatchStats>,
}

impl<H: Host, A: App> AppShell<H, A> {
    pub fn new(host: H, target_id: &str, app: A) -> Self {
        Self::with_config(host, target_id, app, EngineConfig::default())
    }

    pub fn with_config(host: H, target_id: &str, app: A, config: EngineConfig) -> Self {
        let runtime = StdRuntime::new();
        let mount = Mount::with_runtime(host, target_id, app, runtime.runtime(), config);
        let mut shell = Self {
            runtime,
            mount,
            last_stats: None,
        };
        shell.update();
        shell
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_mounted()
    }

    /// Whether a pass is pending. Does not consume the request.
    pub fn should_render(&self) -> bool {
        self.mount.should_render()
    }

    /// Runs the pending pass, if any, and clears the scheduler's frame flag.
    pub fn update(&mut self) {
        self.runtime.take_frame_request();
        match self.mount.on_frame() {
            Ok(Some(stats)) => {
                log::debug!("frame: {stats}");
                self.last_stats = Some(stats);
            }
            Ok(None) => {}
            Err(err) => log::error!("render failed: {err}"),
        }
    }

    /// Statistics of the last pass that ran.
    pub fn last_stats(&self) -> Option<PatchStats> {
        self.last_stats
    }

    /// Delivers a host event. Focus and blur also move the focus chain the
    /// reconciler protects. Returns how many handlers ran.
    pub fn dispatch_event(&mut self, event: &Event) -> usize {
        match event.kind {
            EventKind::Focus => self.mount.focus_in(event.target),
            EventKind::Blur => self.mount.focus_out(),
            _ => {}
        }
        let invoked = self.mount.dispatch(event);
        log::trace!("{} on {} ran {invoked} handler(s)", event.kind, event.target);
        invoked
    }

    pub fn focus_in(&mut self, target: HostHandle) {
        self.mount.focus_in(target);
    }

    pub fn focus_out(&mut self) {
        self.mount.focus_out();
    }

    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.runtime.set_frame_waker(waker);
    }

    pub fn runtime(&self) -> &StdRuntime {
        &self.runtime
    }

    pub fn mount(&self) -> &Mount<H, A> {
        &self.mount
    }

    pub fn host(&self) -> &H {
        self.mount.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.mount.host_mut()
    }

    pub fn app_mut(&mut self) -> &mut A {
        self.mount.app_mut()
    }
}
