//! Tag, attribute and event tables plus the prop sum type used to populate
//! nodes.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::events::Event;

/// Handler invoked for a delegated or directly attached event.
pub type Callback = Rc<dyn Fn(&Event)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Text,
    Fragment,
    Div,
    Span,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    P,
    A,
    Button,
    Input,
    Textarea,
    Select,
    Option,
    Ul,
    Ol,
    Li,
    Table,
    Thead,
    Tbody,
    Tr,
    Td,
    Th,
    Form,
    Label,
    Img,
    Br,
    Hr,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Text => "#text",
            Tag::Fragment => "#fragment",
            Tag::Div => "div",
            Tag::Span => "span",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::P => "p",
            Tag::A => "a",
            Tag::Button => "button",
            Tag::Input => "input",
            Tag::Textarea => "textarea",
            Tag::Select => "select",
            Tag::Option => "option",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Form => "form",
            Tag::Label => "label",
            Tag::Img => "img",
            Tag::Br => "br",
            Tag::Hr => "hr",
        }
    }

    pub fn is_text(self) -> bool {
        self == Tag::Text
    }

    pub fn is_fragment(self) -> bool {
        self == Tag::Fragment
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric attribute id. Attribute lists are sorted by this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub u16);

impl AttrId {
    pub const STYLE: AttrId = AttrId(100);
    pub const CLASS: AttrId = AttrId(101);
    pub const ID: AttrId = AttrId(110);
    pub const TYPE: AttrId = AttrId(111);
    pub const VALUE: AttrId = AttrId(112);
    pub const PLACEHOLDER: AttrId = AttrId(113);
    pub const NAME: AttrId = AttrId(114);
    pub const HREF: AttrId = AttrId(115);
    pub const SRC: AttrId = AttrId(116);
    pub const ALT: AttrId = AttrId(117);
    pub const TITLE: AttrId = AttrId(118);
    pub const FOR: AttrId = AttrId(119);
    pub const ROLE: AttrId = AttrId(120);
    pub const TABINDEX: AttrId = AttrId(121);
    pub const CHECKED: AttrId = AttrId(130);
    pub const DISABLED: AttrId = AttrId(131);
    pub const READONLY: AttrId = AttrId(132);
    pub const SELECTED: AttrId = AttrId(133);
    pub const AUTOFOCUS: AttrId = AttrId(134);
    pub const HIDDEN: AttrId = AttrId(135);

    const CUSTOM_BASE: u16 = 10_000;

    /// Application-defined attribute `n`, rendered as `data-{n}`.
    pub fn custom(n: u16) -> AttrId {
        AttrId(Self::CUSTOM_BASE.saturating_add(n))
    }

    pub fn name(self) -> Cow<'static, str> {
        let name = match self {
            AttrId::STYLE => "style",
            AttrId::CLASS => "class",
            AttrId::ID => "id",
            AttrId::TYPE => "type",
            AttrId::VALUE => "value",
            AttrId::PLACEHOLDER => "placeholder",
            AttrId::NAME => "name",
            AttrId::HREF => "href",
            AttrId::SRC => "src",
            AttrId::ALT => "alt",
            AttrId::TITLE => "title",
            AttrId::FOR => "for",
            AttrId::ROLE => "role",
            AttrId::TABINDEX => "tabindex",
            AttrId::CHECKED => "checked",
            AttrId::DISABLED => "disabled",
            AttrId::READONLY => "readonly",
            AttrId::SELECTED => "selected",
            AttrId::AUTOFOCUS => "autofocus",
            AttrId::HIDDEN => "hidden",
            AttrId(id) if id >= Self::CUSTOM_BASE => {
                return Cow::Owned(format!("data-{}", id - Self::CUSTOM_BASE));
            }
            AttrId(id) => return Cow::Owned(format!("data-attr-{id}")),
        };
        Cow::Borrowed(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    DoubleClick,
    Input,
    Change,
    Submit,
    KeyDown,
    KeyUp,
    KeyPress,
    Focus,
    Blur,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::DoubleClick => "dblclick",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Submit => "submit",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
            EventKind::KeyPress => "keypress",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::MouseMove => "mousemove",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
        }
    }

    /// Bubbling events go through the delegated listener; the rest are
    /// attached to each external node.
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            EventKind::Focus | EventKind::Blur | EventKind::MouseEnter | EventKind::MouseLeave
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropName {
    Attr(AttrId),
    Event(EventKind),
}

#[derive(Clone)]
pub enum PropValue {
    Text(String),
    Handler(Callback),
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PropValue::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        PropValue::Handler(value)
    }
}

/// One literal for both data attributes and event handlers.
#[derive(Clone, Debug)]
pub struct Prop {
    pub name: PropName,
    pub value: PropValue,
}

impl Prop {
    pub fn new(name: PropName, value: impl Into<PropValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    pub fn attr(id: AttrId, value: impl Into<String>) -> Self {
        Self::new(PropName::Attr(id), PropValue::Text(value.into()))
    }

    pub fn on(kind: EventKind, handler: impl Fn(&Event) + 'static) -> Self {
        let handler: Callback = Rc::new(handler);
        Self::new(PropName::Event(kind), handler)
    }
}
