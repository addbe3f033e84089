use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use trellis_app_shell::AppShell;
use trellis_core::{
    App, AttrId, ElementSpec, Event, EventKind, MemoryDocument, RenderContext, RuntimeHandle, Tag,
};

#[test]
fn static_content_settles() {
    let (doc, mount) = MemoryDocument::with_mount_point("app");
    let mut shell = AppShell::new(doc, "app", |cx: &mut RenderContext<'_>| {
        cx.element(ElementSpec::new(Tag::Ul), |cx| {
            for label in ["one", "two"] {
                cx.element(ElementSpec::new(Tag::Li).key(label), |cx| {
                    cx.text(label);
                });
            }
        });
    });

    assert!(shell.is_mounted());
    assert_eq!(
        shell.host().inner_html(mount),
        "<ul><li>one</li><li>two</li></ul>"
    );
    assert_eq!(shell.last_stats().map(|stats| stats.created), Some(5));

    // The initial pass consumed the mount's request; nothing else is queued.
    shell.runtime().take_frame_request();
    assert!(!shell.should_render());
    shell.update();
    assert_eq!(shell.host().mutations().created, 5);
}

struct Toggle {
    on: Rc<Cell<bool>>,
    runtime: Option<RuntimeHandle>,
}

impl App for Toggle {
    fn start(&mut self, runtime: RuntimeHandle) {
        self.runtime = Some(runtime);
    }

    fn render(&mut self, cx: &mut RenderContext<'_>) {
        let on = self.on.clone();
        let runtime = self.runtime.clone();
        let label = if on.get() { "on" } else { "off" };
        cx.element(
            ElementSpec::new(Tag::Button)
                .attr(AttrId::TITLE, label)
                .on(EventKind::Click, move |_| {
                    on.set(!on.get());
                    if let Some(runtime) = &runtime {
                        runtime.request_render();
                    }
                }),
            |cx| {
                cx.text(label);
            },
        );
    }
}

#[test]
fn clicks_request_a_frame_and_update_in_place() {
    let (doc, mount) = MemoryDocument::with_mount_point("app");
    let app = Toggle {
        on: Rc::new(Cell::new(false)),
        runtime: None,
    };
    let mut shell = AppShell::new(doc, "app", app);
    let button = shell.host().children(mount)[0];
    shell.runtime().take_frame_request();

    assert_eq!(shell.dispatch_event(&Event::new(EventKind::Click, button)), 1);
    assert!(shell.should_render());
    shell.update();

    assert_eq!(shell.host().children(mount), [button]);
    assert_eq!(shell.host().inner_html(mount), "<button title=\"on\">on</button>");
    let stats = shell.last_stats().expect("second pass");
    assert_eq!(stats.created, 0);
    assert_eq!(stats.attributes_set, 1);
    assert_eq!(stats.text_updates, 1);
}

#[test]
fn focus_events_track_the_focused_chain() {
    let (doc, mount) = MemoryDocument::with_mount_point("app");
    let mut shell = AppShell::new(doc, "app", |cx: &mut RenderContext<'_>| {
        cx.element(ElementSpec::new(Tag::Form), |cx| {
            cx.leaf(ElementSpec::new(Tag::Input).on(EventKind::Focus, |_| {}));
        });
    });
    let form = shell.host().children(mount)[0];
    let input = shell.host().children(form)[0];

    assert_eq!(shell.dispatch_event(&Event::new(EventKind::Focus, input)), 1);
    assert_eq!(shell.mount().engine().focus().len(), 2);
    shell.dispatch_event(&Event::new(EventKind::Blur, input));
    assert!(shell.mount().engine().focus().is_empty());
}

#[test]
fn a_missing_mount_point_is_inert() {
    let doc = MemoryDocument::new();
    let shell = AppShell::new(doc, "app", |cx: &mut RenderContext<'_>| {
        cx.text("unreachable");
    });
    assert!(!shell.is_mounted());
    assert!(shell.last_stats().is_none());
    assert!(!shell.should_render());
}

#[test]
fn the_waker_fires_when_the_app_asks_for_a_frame() {
    let (doc, _) = MemoryDocument::with_mount_point("app");
    let shell = AppShell::new(doc, "app", |cx: &mut RenderContext<'_>| {
        cx.text("idle");
    });
    let woke = Arc::new(AtomicBool::new(false));
    let flag = woke.clone();
    shell.set_frame_waker(move || flag.store(true, Ordering::SeqCst));

    assert!(shell.mount().request_render());
    assert!(woke.load(Ordering::SeqCst));
    assert!(shell.should_render());
}

#[test]
fn polling_for_a_frame_leaves_the_request_pending() {
    let (doc, _) = MemoryDocument::with_mount_point("app");
    let mut shell = AppShell::new(doc, "app", |cx: &mut RenderContext<'_>| {
        cx.text("idle");
    });
    assert!(shell.mount().request_render());

    assert!(shell.should_render());
    assert!(shell.should_render());
    shell.update();

    assert!(!shell.should_render());
    assert!(!shell.runtime().take_frame_request());
    assert_eq!(shell.runtime().runtime().passes(), 2);
}
