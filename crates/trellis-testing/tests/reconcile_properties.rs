use trellis_core::{App, ElementSpec, RenderContext, Tag};
use trellis_testing::TestMount;

/// Keyed list rendered straight into the mount point. An item named
/// "input" renders as a text field.
#[derive(Default)]
struct Keyed {
    items: Vec<&'static str>,
}

impl Keyed {
    fn new(items: &[&'static str]) -> Self {
        Self {
            items: items.to_vec(),
        }
    }
}

impl App for Keyed {
    fn render(&mut self, cx: &mut RenderContext<'_>) {
        for &item in &self.items {
            let tag = if item == "input" { Tag::Input } else { Tag::Li };
            cx.leaf(ElementSpec::new(tag).key(item).class(item));
        }
    }
}

fn mounted(items: &[&'static str]) -> TestMount<Keyed> {
    let mut mount = TestMount::new(Keyed::new(items));
    mount.pump().expect("first frame");
    mount
}

fn show(mount: &mut TestMount<Keyed>, items: &[&'static str]) -> trellis_core::PatchStats {
    mount.app_mut().items = items.to_vec();
    mount.request_render();
    mount.pump().expect("frame").expect("requested frame")
}

fn root_keys(mount: &TestMount<Keyed>) -> Vec<String> {
    let engine = mount.mount().engine();
    let root = mount.mount().root().expect("rendered");
    engine
        .node(root)
        .expect("root")
        .children()
        .iter()
        .map(|&id| engine.node(id).expect("child").key().to_string())
        .collect()
}

#[test]
fn unchanged_siblings_build_equal_keys() {
    let mut mount = mounted(&["a", "b", "c"]);
    let first = root_keys(&mount);
    show(&mut mount, &["a", "b", "c"]);
    assert_eq!(root_keys(&mount), first);
}

#[test]
fn identical_generations_cause_no_mutations() {
    let mut mount = mounted(&["a", "b", "c"]);
    mount.reset_mutations();
    let stats = show(&mut mount, &["a", "b", "c"]);
    assert_eq!(mount.mutations().visible(), 0);
    assert_eq!(stats.created + stats.removed + stats.moved, 0);
}

#[test]
fn reordered_list_keeps_its_handles() {
    let mut mount = mounted(&["1", "2", "3"]);
    let before = mount.child_handles();

    let stats = show(&mut mount, &["3", "1", "2"]);
    assert_eq!(mount.child_handles(), [before[2], before[0], before[1]]);
    assert_eq!(stats.created, 0);
    assert_eq!(stats.removed, 0);
}

#[test]
fn dropped_head_is_removed_not_moved_around() {
    let mut mount = mounted(&["1", "2", "3"]);
    let before = mount.child_handles();
    mount.reset_mutations();

    let stats = show(&mut mount, &["2", "3"]);
    assert_eq!(mount.child_handles(), before[1..]);
    assert_eq!(stats.moved, 0);
    assert_eq!(stats.removed, 1);
    assert_eq!(mount.mutations().inserted, 0);
    assert!(!mount.is_mounted_node(before[0]));
}

#[test]
fn focused_field_survives_a_swap() {
    let mut mount = mounted(&["input", "label"]);
    let field = mount.find_by_attr("class", "input").expect("field");
    mount.focus(field);

    let stats = show(&mut mount, &["label", "input"]);
    assert_eq!(stats.created, 0);
    assert_eq!(stats.removed, 0);
    assert_eq!(mount.child_handles()[1], field);
    assert!(mount.is_mounted_node(field));
    assert_eq!(mount.html(), "<li class=\"label\"></li><input class=\"input\"></input>");
}

#[test]
fn removing_then_adding_back_recycles_records() {
    const N: usize = 12;
    let names: Vec<&'static str> = (0..N)
        .map(|i| &*Box::leak(format!("row-{i}").into_boxed_str()))
        .collect();

    let mut mount = mounted(&names);
    show(&mut mount, &names);
    show(&mut mount, &names);
    let warm = mount.mount().engine().pool().growth_events();

    show(&mut mount, &[]);
    assert!(mount.child_handles().is_empty());
    show(&mut mount, &names);
    assert_eq!(mount.child_handles().len(), N);

    let growth = mount.mount().engine().pool().growth_events() - warm;
    assert!(growth <= N, "{growth} growth events");
}

#[test]
fn colliding_keys_are_reported_and_the_pass_completes() {
    let mut mount = mounted(&["x", "x"]);
    assert_eq!(mount.child_handles().len(), 2);
    assert_eq!(mount.mount().engine().duplicate_keys().len(), 1);

    show(&mut mount, &["x", "y"]);
    assert!(mount.mount().engine().duplicate_keys().is_empty());
}

#[test]
fn render_requests_coalesce_into_one_frame() {
    let mut mount = mounted(&["a"]);
    let frames = mount.frames_requested();
    assert!(mount.request_render());
    assert!(!mount.request_render());
    assert_eq!(mount.frames_requested(), frames + 1);

    assert!(mount.pump().expect("frame").is_some());
    assert!(mount.pump().expect("idle").is_none());
}
