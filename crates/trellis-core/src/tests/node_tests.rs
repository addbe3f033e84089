use super::*;
use crate::key::KeyToken;
use std::cell::Cell;

fn populated(pool: &mut NodePool) -> NodeId {
    let id = pool.recycle();
    let node = pool.get_mut(id).expect("fresh record");
    node.tag = Tag::Input;
    node.text.push_str("stale text");
    node.key = StableKey::from_tokens(vec![KeyToken::Position(9)]);
    node.populate(vec![
        Prop::attr(AttrId::VALUE, "hello"),
        Prop::attr(AttrId::CLASS, "field"),
        Prop::on(EventKind::Focus, |_| {}),
        Prop::on(EventKind::Click, |_| {}),
    ]);
    node.hooks.on_add = Some(Rc::new(|_| {}));
    node.handle = Some(HostHandle(77));
    node.matched = Some(id);
    node.pending_removal = true;
    id
}

#[test]
fn recycled_record_carries_no_stale_state() {
    let mut pool = NodePool::new();
    let first = populated(&mut pool);
    let child = pool.recycle();
    pool.append_child(first, child).expect("append");

    pool.release(child).expect("release child");
    pool.release(first).expect("release parent");

    let reused = pool.recycle();
    assert_eq!(reused.index(), first.index());
    let node = pool.get(reused).expect("reused record");
    assert_eq!(node.tag(), Tag::Fragment);
    assert!(node.text().is_empty());
    assert!(node.attributes().is_empty());
    assert!(node.bubbling.is_empty());
    assert!(node.non_bubbling.is_empty());
    assert!(node.hooks.is_empty());
    assert!(node.children().is_empty());
    assert!(node.key().is_empty());
    assert_eq!(node.matched, None);
    assert_eq!(node.handle(), None);
    assert_eq!(node.parent(), None);
    assert_eq!(node.next, None);
    assert!(!node.pending_removal);
}

#[test]
fn released_handles_become_stale() {
    let mut pool = NodePool::new();
    let id = pool.recycle();
    pool.release(id).expect("release");
    assert_eq!(pool.get(id).unwrap_err(), NodeError::Stale { id });

    let reused = pool.recycle();
    assert_eq!(reused.index(), id.index());
    assert_ne!(reused, id);
    assert!(pool.get(id).is_err());
    assert!(pool.get(reused).is_ok());
    assert_eq!(pool.release(id), Err(NodeError::Stale { id }));
}

#[test]
fn recycle_prefers_the_free_list_over_growth() {
    let mut pool = NodePool::new();
    let ids: Vec<_> = (0..4).map(|_| pool.recycle()).collect();
    assert_eq!(pool.growth_events(), 4);

    let mut list = NodeList::default();
    for id in &ids {
        list.push(&mut pool, *id).expect("push");
    }
    assert_eq!(pool.reclaim(list), Ok(4));
    assert_eq!(pool.free_len(), 4);
    assert_eq!(pool.len(), 0);

    for _ in 0..4 {
        pool.recycle();
    }
    assert_eq!(pool.growth_events(), 4);
    pool.recycle();
    assert_eq!(pool.growth_events(), 5);
    assert_eq!(pool.capacity(), 5);
}

#[test]
fn unlink_reports_the_vacated_index() {
    let mut pool = NodePool::new();
    let parent = pool.recycle();
    let children: Vec<_> = (0..3).map(|_| pool.recycle()).collect();
    for child in &children {
        pool.append_child(parent, *child).expect("append");
    }

    assert_eq!(pool.unlink(children[1]), Ok(Some(1)));
    assert_eq!(
        pool.get(parent).expect("parent").children(),
        &[children[0], children[2]]
    );
    assert_eq!(pool.unlink(children[1]), Ok(None));
}

#[test]
fn append_moves_a_child_between_parents() {
    let mut pool = NodePool::new();
    let left = pool.recycle();
    let right = pool.recycle();
    let child = pool.recycle();
    pool.append_child(left, child).expect("append left");
    pool.append_child(right, child).expect("append right");
    assert!(pool.get(left).expect("left").children().is_empty());
    assert_eq!(pool.get(right).expect("right").children(), &[child]);
    assert_eq!(pool.get(child).expect("child").parent(), Some(right));
}

#[test]
fn populate_sorts_and_routes_props() {
    let mut pool = NodePool::new();
    let id = pool.recycle();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    let node = pool.get_mut(id).expect("record");
    node.populate(vec![
        Prop::attr(AttrId::VALUE, "a"),
        Prop::on(EventKind::MouseLeave, |_| {}),
        Prop::attr(AttrId::STYLE, "color: red"),
        Prop::on(EventKind::Click, move |_| counter.set(counter.get() + 1)),
        Prop::on(EventKind::Focus, |_| {}),
        Prop::attr(AttrId::VALUE, "b"),
        Prop::new(PropName::Attr(AttrId::TITLE), Rc::new(|_: &crate::Event| {}) as Callback),
        Prop::new(PropName::Event(EventKind::Input), "not a handler"),
    ]);

    assert_eq!(
        node.attributes(),
        &[(AttrId::STYLE, "color: red".to_owned()), (AttrId::VALUE, "b".to_owned())]
    );
    assert_eq!(
        node.direct_events().collect::<Vec<_>>(),
        vec![EventKind::Focus, EventKind::MouseLeave]
    );
    assert!(node.has_handler(EventKind::Click));
    assert!(!node.has_handler(EventKind::Input));
    assert_eq!(node.attribute(AttrId::TITLE), None);

    let handler = node.handler(EventKind::Click).expect("click handler");
    handler(&crate::Event::new(EventKind::Click, HostHandle(1)));
    assert_eq!(clicks.get(), 1);
}
