use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::events::Event;
use crate::host::HostHandle;
use crate::index::KeyIndex;
use crate::key::{Identity, KeyBuilder, KeyToken};
use crate::node::{Hooks, NodeError, NodeId, NodeList, NodePool};
use crate::props::{AttrId, EventKind, Prop, PropName, PropValue, Tag};

/// Description of one element: tag, props, optional explicit key and
/// lifecycle hooks.
#[derive(Clone, Debug)]
pub struct ElementSpec {
    tag: Tag,
    props: Vec<Prop>,
    key: Option<Rc<str>>,
    hooks: Hooks,
}

impl ElementSpec {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            props: Vec::new(),
            key: None,
            hooks: Hooks::default(),
        }
    }

    pub fn attr(mut self, id: AttrId, value: impl Into<String>) -> Self {
        self.props.push(Prop::attr(id, value));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr(AttrId::CLASS, value)
    }

    /// Sets the `id` attribute, which also becomes the node's identity.
    pub fn id(self, value: impl Into<String>) -> Self {
        self.attr(AttrId::ID, value)
    }

    pub fn on(mut self, kind: EventKind, handler: impl Fn(&Event) + 'static) -> Self {
        self.props.push(Prop::on(kind, handler));
        self
    }

    pub fn prop(mut self, prop: Prop) -> Self {
        self.props.push(prop);
        self
    }

    pub fn props(mut self, props: impl IntoIterator<Item = Prop>) -> Self {
        self.props.extend(props);
        self
    }

    pub fn key(mut self, key: impl fmt::Display) -> Self {
        self.key = Some(Rc::from(key.to_string()));
        self
    }

    pub fn on_add(mut self, hook: impl Fn(HostHandle) + 'static) -> Self {
        self.hooks.on_add = Some(Rc::new(hook));
        self
    }

    pub fn on_before_move(mut self, hook: impl Fn(HostHandle) + 'static) -> Self {
        self.hooks.on_before_move = Some(Rc::new(hook));
        self
    }

    pub fn on_move(mut self, hook: impl Fn(HostHandle) + 'static) -> Self {
        self.hooks.on_move = Some(Rc::new(hook));
        self
    }

    pub fn on_remove(mut self, hook: impl Fn(HostHandle) + 'static) -> Self {
        self.hooks.on_remove = Some(Rc::new(hook));
        self
    }

    fn id_value(&self) -> Option<Rc<str>> {
        // The last `id` wins, matching how attributes are deduplicated.
        self.props.iter().rev().find_map(|prop| match (&prop.name, &prop.value) {
            (PropName::Attr(AttrId::ID), PropValue::Text(id)) => Some(Rc::from(id.as_str())),
            _ => None,
        })
    }
}

struct Scope {
    parent: NodeId,
    next_position: u32,
}

/// Builds one generation's tree.
///
/// Borrowed for the duration of a single build. Children are appended to
/// the enclosing element; fragments and keyed groups add a key token but no
/// node of their own.
pub struct RenderContext<'a> {
    pool: &'a mut NodePool,
    index: &'a mut KeyIndex,
    keys: &'a mut KeyBuilder,
    unkeyed: &'a mut NodeList,
    scopes: Vec<Scope>,
    error: Option<NodeError>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        pool: &'a mut NodePool,
        index: &'a mut KeyIndex,
        keys: &'a mut KeyBuilder,
        unkeyed: &'a mut NodeList,
        root: NodeId,
    ) -> Self {
        Self {
            pool,
            index,
            keys,
            unkeyed,
            scopes: vec![Scope {
                parent: root,
                next_position: 0,
            }],
            error: None,
        }
    }

    pub(crate) fn finish(self) -> Result<(), NodeError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Adds an element and builds its children.
    pub fn element(
        &mut self,
        spec: ElementSpec,
        children: impl FnOnce(&mut RenderContext<'a>),
    ) -> Option<NodeId> {
        let position = self.next_position();
        let token = Identity {
            id: spec.id_value(),
            key: spec.key.clone(),
            position: Some(position),
        }
        .token();
        let id = match self.create_element(spec, &token) {
            Ok(id) => id,
            Err(err) => {
                self.fail(err);
                return None;
            }
        };
        self.nested(token, id, children);
        Some(id)
    }

    /// Adds an element without children.
    pub fn leaf(&mut self, spec: ElementSpec) -> Option<NodeId> {
        self.element(spec, |_| {})
    }

    /// Adds a text leaf. Text consumes no position and carries no key.
    pub fn text(&mut self, text: impl AsRef<str>) -> Option<NodeId> {
        match self.create_text(text.as_ref()) {
            Ok(id) => Some(id),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    /// Groups children under one positional token. The children land in the
    /// enclosing element's list.
    pub fn fragment(&mut self, children: impl FnOnce(&mut RenderContext<'a>)) {
        let token = KeyToken::Position(self.next_position());
        let parent = self.current_parent();
        self.nested(token, parent, children);
    }

    /// Like [`fragment`](Self::fragment), identified by `key` instead of its
    /// position.
    pub fn with_key(
        &mut self,
        key: impl fmt::Display,
        children: impl FnOnce(&mut RenderContext<'a>),
    ) {
        self.next_position();
        let token = KeyToken::Key(Rc::from(key.to_string()));
        let parent = self.current_parent();
        self.nested(token, parent, children);
    }

    /// Renders one keyed group per item, all inside a single fragment.
    pub fn list<T, K: fmt::Display>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        key_of: impl Fn(&T) -> K,
        mut render: impl FnMut(&mut RenderContext<'a>, T),
    ) {
        self.fragment(|cx| {
            for item in items {
                let key = key_of(&item);
                cx.with_key(key, |cx| render(cx, item));
            }
        });
    }

    fn create_element(&mut self, spec: ElementSpec, token: &KeyToken) -> Result<NodeId, NodeError> {
        let key = self.keys.build_with(token);
        let parent = self.current_parent();
        let id = self.pool.recycle();
        let node = self.pool.get_mut(id)?;
        node.tag = spec.tag;
        node.key = key;
        node.hooks = spec.hooks;
        node.populate(spec.props);
        self.pool.append_child(parent, id)?;
        self.index.match_node(self.pool, id)?;
        Ok(id)
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId, NodeError> {
        let parent = self.current_parent();
        let id = self.pool.recycle();
        let node = self.pool.get_mut(id)?;
        node.tag = Tag::Text;
        node.text.push_str(text);
        self.pool.append_child(parent, id)?;
        self.unkeyed.push(self.pool, id)?;
        Ok(id)
    }

    fn nested(
        &mut self,
        token: KeyToken,
        parent: NodeId,
        children: impl FnOnce(&mut RenderContext<'a>),
    ) {
        let mut scope = NestedScope::enter(self, token, parent);
        children(&mut *scope);
    }

    fn next_position(&mut self) -> u32 {
        match self.scopes.last_mut() {
            Some(scope) => {
                let position = scope.next_position;
                scope.next_position += 1;
                position
            }
            None => 0,
        }
    }

    fn current_parent(&self) -> NodeId {
        // The root scope is pushed on construction and never popped.
        self.scopes[self.scopes.len() - 1].parent
    }

    fn fail(&mut self, err: NodeError) {
        log::error!("building node failed: {err}");
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

/// Open child scope of a [`RenderContext`]. Dropping it restores the key
/// and scope stacks, also when a child closure unwinds.
struct NestedScope<'c, 'a> {
    cx: &'c mut RenderContext<'a>,
    keys: usize,
    scopes: usize,
}

impl<'c, 'a> NestedScope<'c, 'a> {
    fn enter(cx: &'c mut RenderContext<'a>, token: KeyToken, parent: NodeId) -> Self {
        let keys = cx.keys.depth();
        let scopes = cx.scopes.len();
        cx.keys.push(token);
        cx.scopes.push(Scope {
            parent,
            next_position: 0,
        });
        Self { cx, keys, scopes }
    }
}

impl<'a> Deref for NestedScope<'_, 'a> {
    type Target = RenderContext<'a>;

    fn deref(&self) -> &RenderContext<'a> {
        self.cx
    }
}

impl<'a> DerefMut for NestedScope<'_, 'a> {
    fn deref_mut(&mut self) -> &mut RenderContext<'a> {
        self.cx
    }
}

impl Drop for NestedScope<'_, '_> {
    fn drop(&mut self) {
        self.cx.scopes.truncate(self.scopes);
        self.cx.keys.truncate(self.keys);
    }
}

#[cfg(test)]
#[path = "tests/build_tests.rs"]
mod tests;
