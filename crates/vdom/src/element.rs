//! Declarative tree description.
//!
//! Invariants:
//! - Elements are immutable once built; props are shared behind `Rc`, so
//!   cloning an element (or handing its props to a fiber) never copies the map.
//! - The reserved `children` key never appears in `Props::values`; children
//!   live in `Props::children` as already-normalized elements.
//! - Every child that is not an element becomes a text element whose only
//!   property is `nodeValue`.

use crate::value::{EventHandler, PropValue};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// Reserved property name holding child elements.
pub const CHILDREN_KEY: &str = "children";
/// Property carrying the content of a text element.
pub const NODE_VALUE_KEY: &str = "nodeValue";
/// Properties whose name starts with this prefix are event handlers.
pub const EVENT_PREFIX: &str = "on";

/// Event name for a handler property (`onClick` -> `click`), or `None` for
/// plain properties.
///
/// Event names are case-insensitive, so `onClick` and `onclick` name the same
/// event. Both stay separate properties: each attaches its own listener and
/// is diffed on its own key, so a node carrying both has two `click`
/// listeners and dropping one key leaves the other attached.
pub fn event_name(prop: &str) -> Option<String> {
    let rest = prop.strip_prefix(EVENT_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

/// Identifies the native primitive an element maps to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Tag(Arc<str>),
    Text,
}

impl ElementType {
    pub fn tag(name: impl Into<Arc<str>>) -> Self {
        ElementType::Tag(name.into())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ElementType::Text)
    }

    pub fn tag_name(&self) -> Option<&str> {
        match self {
            ElementType::Tag(name) => Some(name),
            ElementType::Text => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    values: BTreeMap<Arc<str>, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Props of a synthetic root: no values, the given children.
    pub fn with_children(children: Vec<Element>) -> Self {
        Self {
            values: BTreeMap::new(),
            children,
        }
    }

    /// Insert a property. The reserved `children` key is ignored.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: impl Into<PropValue>) {
        let name = name.into();
        if &*name == CHILDREN_KEY {
            log::debug!(target: "vdom", "ignoring reserved `children` property; pass children separately");
            return;
        }
        self.values.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Non-children properties, in a deterministic (name) order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &PropValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Props
where
    K: Into<Arc<str>>,
    V: Into<PropValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        let mut props = Props::new();
        for (name, value) in pairs {
            props.insert(name, value);
        }
        props
    }
}

impl<K, V> From<Vec<(K, V)>> for Props
where
    K: Into<Arc<str>>,
    V: Into<PropValue>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        let mut props = Props::new();
        for (name, value) in pairs {
            props.insert(name, value);
        }
        props
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

/// A child position in `create_element`: either an element or a plain value
/// that will be wrapped in a text element.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Element(Element),
    Value(PropValue),
}

impl Child {
    fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Value(value) => create_text_element(value),
        }
    }
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Child::Element(value)
    }
}

impl From<PropValue> for Child {
    fn from(value: PropValue) -> Self {
        Child::Value(value)
    }
}

macro_rules! child_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Value(PropValue::from(value))
                }
            }
        )*
    };
}

child_from_value!(&str, String, Arc<str>, i64, i32, u32, usize, f64, bool);

/// Build an element, normalizing every non-element child into a text element.
pub fn create_element<C>(ty: impl Into<Arc<str>>, props: impl Into<Props>, children: C) -> Element
where
    C: IntoIterator,
    C::Item: Into<Child>,
{
    let mut props = props.into();
    props.children = children
        .into_iter()
        .map(|child| child.into().into_element())
        .collect();
    Element {
        ty: ElementType::Tag(ty.into()),
        props: Rc::new(props),
    }
}

/// Wrap a plain value as `{type: Text, props: {nodeValue: value, children: []}}`.
pub fn create_text_element(value: impl Into<PropValue>) -> Element {
    let mut values = BTreeMap::new();
    values.insert(Arc::from(NODE_VALUE_KEY), value.into());
    Element {
        ty: ElementType::Text,
        props: Rc::new(Props {
            values,
            children: Vec::new(),
        }),
    }
}

impl Element {
    /// Start building a tag element with no props and no children.
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Element {
            ty: ElementType::Tag(tag.into()),
            props: Rc::new(Props::new()),
        }
    }

    pub fn text(value: impl Into<PropValue>) -> Self {
        create_text_element(value)
    }

    pub fn prop(mut self, name: impl Into<Arc<str>>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props).insert(name, value);
        self
    }

    /// Attach an event handler under `on<Event>` (e.g. `on("click", ..)` sets `onClick`).
    pub fn on(self, event: &str, handler: EventHandler) -> Self {
        let name = handler_prop_name(event);
        self.prop(name, handler)
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        let element = child.into().into_element();
        Rc::make_mut(&mut self.props).children.push(element);
        self
    }

    pub fn children<C>(mut self, children: C) -> Self
    where
        C: IntoIterator,
        C::Item: Into<Child>,
    {
        let props = Rc::make_mut(&mut self.props);
        props
            .children
            .extend(children.into_iter().map(|c| c.into().into_element()));
        self
    }

    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }

    pub fn child_elements(&self) -> &[Element] {
        self.props.children()
    }

    /// Number of elements in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .props
            .children()
            .iter()
            .map(Element::subtree_len)
            .sum::<usize>()
    }
}

fn handler_prop_name(event: &str) -> String {
    let mut name = String::with_capacity(event.len() + 2);
    name.push_str(EVENT_PREFIX);
    let mut chars = event.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    name
}
