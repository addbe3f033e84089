use super::*;

#[derive(Default)]
struct Fixture {
    pool: NodePool,
    index: KeyIndex,
    keys: KeyBuilder,
    unkeyed: NodeList,
}

impl Fixture {
    fn build(&mut self, f: impl FnOnce(&mut RenderContext<'_>)) -> NodeId {
        self.index.start_generation(&mut self.pool).expect("start generation");
        let root = self.pool.recycle();
        let mut cx = RenderContext::new(
            &mut self.pool,
            &mut self.index,
            &mut self.keys,
            &mut self.unkeyed,
            root,
        );
        f(&mut cx);
        cx.finish().expect("build");
        assert!(self.keys.is_balanced());
        root
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.pool.get(id).expect("node").children().to_vec()
    }

    fn key(&self, id: NodeId) -> String {
        self.pool.get(id).expect("node").key().to_string()
    }

    fn keys_of(&self, parent: NodeId) -> Vec<String> {
        self.children(parent).into_iter().map(|id| self.key(id)).collect()
    }
}

#[test]
fn fragment_children_land_in_the_enclosing_element() {
    let mut fx = Fixture::default();
    let root = fx.build(|cx| {
        cx.leaf(ElementSpec::new(Tag::Div));
        cx.fragment(|cx| {
            cx.leaf(ElementSpec::new(Tag::Span));
            cx.leaf(ElementSpec::new(Tag::Span));
        });
        cx.leaf(ElementSpec::new(Tag::P));
    });

    assert_eq!(fx.keys_of(root), ["0", "1/0", "1/1", "2"]);
    let tags: Vec<_> = fx
        .children(root)
        .into_iter()
        .map(|id| fx.pool.get(id).expect("child").tag())
        .collect();
    assert_eq!(tags, [Tag::Div, Tag::Span, Tag::Span, Tag::P]);
    for child in fx.children(root) {
        assert_eq!(fx.pool.get(child).expect("child").parent(), Some(root));
    }
}

#[test]
fn text_takes_no_position_and_has_no_key() {
    let mut fx = Fixture::default();
    let root = fx.build(|cx| {
        cx.text("a");
        cx.leaf(ElementSpec::new(Tag::Div));
        cx.text("b");
        cx.leaf(ElementSpec::new(Tag::Div));
    });

    let children = fx.children(root);
    assert_eq!(children.len(), 4);
    assert_eq!(fx.key(children[1]), "0");
    assert_eq!(fx.key(children[3]), "1");
    let text = fx.pool.get(children[2]).expect("text");
    assert!(text.is_text());
    assert_eq!(text.text(), "b");
    assert!(text.key().is_empty());
    assert_eq!(fx.unkeyed.len(), 2);
}

#[test]
fn children_get_keys_relative_to_their_parent() {
    let mut fx = Fixture::default();
    let root = fx.build(|cx| {
        cx.leaf(ElementSpec::new(Tag::Hr));
        cx.element(ElementSpec::new(Tag::Ul), |cx| {
            cx.leaf(ElementSpec::new(Tag::Li));
            cx.leaf(ElementSpec::new(Tag::Li).key("last"));
        });
    });

    let ul = fx.children(root)[1];
    assert_eq!(fx.keys_of(ul), ["1/0", "1/'last'"]);
}

#[test]
fn list_items_are_keyed_by_item() {
    let mut fx = Fixture::default();
    let root = fx.build(|cx| {
        cx.list(
            ["x", "y"],
            |item| item.to_string(),
            |cx, item| {
                cx.leaf(ElementSpec::new(Tag::Li).class(item));
            },
        );
    });

    assert_eq!(fx.keys_of(root), ["0/'x'/0", "0/'y'/0"]);
}

#[test]
fn an_id_anchors_the_keys_below_it() {
    let mut fx = Fixture::default();
    let root = fx.build(|cx| {
        cx.fragment(|cx| {
            cx.element(ElementSpec::new(Tag::Form).id("login"), |cx| {
                cx.leaf(ElementSpec::new(Tag::Input));
            });
        });
    });

    let form = fx.children(root)[0];
    assert_eq!(fx.key(form), "#login");
    assert_eq!(fx.keys_of(form), ["#login/0"]);
    assert_eq!(
        fx.pool.get(form).expect("form").attribute(AttrId::ID),
        Some("login")
    );
}

#[test]
fn identical_builds_match_node_for_node() {
    let mut fx = Fixture::default();
    let render = |cx: &mut RenderContext<'_>| {
        cx.element(ElementSpec::new(Tag::Div), |cx| {
            cx.leaf(ElementSpec::new(Tag::Span).key("a"));
            cx.text("hello");
            cx.leaf(ElementSpec::new(Tag::Span).key("b"));
        });
    };
    let first = fx.build(render);
    let second = fx.build(render);

    let old_div = fx.children(first)[0];
    let new_div = fx.children(second)[0];
    assert_eq!(fx.key(old_div), fx.key(new_div));
    assert_eq!(fx.pool.get(new_div).expect("div").matched, Some(old_div));

    let old_spans = fx.children(old_div);
    let new_spans = fx.children(new_div);
    assert_eq!(fx.pool.get(new_spans[0]).expect("a").matched, Some(old_spans[0]));
    assert_eq!(fx.pool.get(new_spans[2]).expect("b").matched, Some(old_spans[2]));
    // Text is never matched through the index.
    assert_eq!(fx.pool.get(new_spans[1]).expect("text").matched, None);
}

#[test]
fn sibling_keys_that_collide_are_reported() {
    let mut fx = Fixture::default();
    fx.build(|cx| {
        cx.leaf(ElementSpec::new(Tag::Li).key("x"));
        cx.leaf(ElementSpec::new(Tag::Li).key("x"));
    });
    assert_eq!(fx.index.duplicates().len(), 1);
    assert!(fx.index.duplicates().to_string().contains("'x'"));
}

#[test]
fn hooks_and_props_reach_the_record() {
    let mut fx = Fixture::default();
    let root = fx.build(|cx| {
        cx.leaf(
            ElementSpec::new(Tag::Input)
                .attr(AttrId::VALUE, "v")
                .on(EventKind::Click, |_| {})
                .on(EventKind::Blur, |_| {})
                .on_add(|_| {}),
        );
    });

    let input = fx.pool.get(fx.children(root)[0]).expect("input");
    assert_eq!(input.attribute(AttrId::VALUE), Some("v"));
    assert!(input.has_handler(EventKind::Click));
    assert_eq!(input.direct_events().collect::<Vec<_>>(), [EventKind::Blur]);
    assert!(input.hooks.on_add.is_some());
    assert!(input.hooks.on_remove.is_none());
}

#[test]
fn unwinding_child_closure_restores_the_enclosing_scope() {
    let mut fx = Fixture::default();
    let mut outer = None;
    let root = fx.build(|cx| {
        outer = cx.element(ElementSpec::new(Tag::Div).key("outer"), |cx| {
            let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                cx.element(ElementSpec::new(Tag::Span).key("inner"), |_| {
                    panic!("child closure failed");
                });
            }));
            assert!(unwound.is_err());
            cx.leaf(ElementSpec::new(Tag::P).key("after"));
        });
        cx.leaf(ElementSpec::new(Tag::P).key("sibling"));
    });

    let outer = outer.expect("outer");
    assert_eq!(fx.keys_of(outer), ["'outer'/'inner'", "'outer'/'after'"]);
    for child in fx.children(outer) {
        assert_eq!(fx.pool.get(child).expect("child").parent(), Some(outer));
    }
    assert_eq!(fx.keys_of(root), ["'outer'", "'sibling'"]);
}
