//! Declarative descriptions consumed by the reconciler.
//!
//! An [`Element`] is an immutable description of one tree position: a host
//! tag or a [`Component`], an optional key, an opaque ref and its [`Props`].
//! `props.children` holds at most one [`Child`].

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::error::RenderError;
use crate::hooks::HookCx;

pub type Key = Rc<str>;

/// Opaque reference attached to an element. The reconciler carries it but
/// never inspects it.
pub type ElementRef = Rc<dyn Any>;

/// Signature of a function component.
pub type ComponentFn = fn(&mut HookCx, &Props) -> anyhow::Result<Child>;

/// Listener stored in props under an `on*` name.
pub type EventHandler = Rc<dyn Fn(&Event) -> Result<(), RenderError>>;

/// A named function component.
///
/// Two components are the same type only when both the name and the function
/// address match, so identical bodies folded by the compiler stay distinct.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: ComponentFn,
}

impl Component {
    pub const fn new(name: &'static str, render: ComponentFn) -> Self {
        Self { name, render }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render_fn(&self) -> ComponentFn {
        self.render
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.render as *const () == other.render as *const ()
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// Builds a [`Component`] named after the function path.
#[macro_export]
macro_rules! component {
    ($render:path) => {
        $crate::Component::new(stringify!($render), $render)
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    Host(Rc<str>),
    Component(Component),
}

impl ElementType {
    pub fn host_tag(&self) -> Option<&str> {
        match self {
            ElementType::Host(tag) => Some(tag),
            ElementType::Component(_) => None,
        }
    }

    pub fn component(&self) -> Option<Component> {
        match self {
            ElementType::Host(_) => None,
            ElementType::Component(component) => Some(*component),
        }
    }
}

#[derive(Clone)]
pub struct Element {
    element_type: ElementType,
    key: Option<Key>,
    element_ref: Option<ElementRef>,
    props: Props,
}

impl Element {
    /// Describes a host node such as `div`.
    pub fn host(tag: impl Into<Rc<str>>) -> Self {
        Self::new(ElementType::Host(tag.into()))
    }

    /// Describes a function component.
    pub fn component(component: Component) -> Self {
        Self::new(ElementType::Component(component))
    }

    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            key: None,
            element_ref: None,
            props: Props::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_ref(mut self, element_ref: ElementRef) -> Self {
        self.element_ref = Some(element_ref);
        self
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props = self.props.with(name, value);
        self
    }

    /// Registers `handler` for events named `event` (for example `onClick`).
    pub fn on(
        mut self,
        event: impl Into<String>,
        handler: impl Fn(&Event) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.props = self.props.with(event, PropValue::Handler(Rc::new(handler)));
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.props = self.props.with_children(child);
        self
    }

    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn element_ref(&self) -> Option<&ElementRef> {
        self.element_ref.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type", &self.element_type)
            .field("key", &self.key)
            .field("has_ref", &self.element_ref.is_some())
            .field("props", &self.props)
            .finish()
    }
}

/// The value of `props.children`.
#[derive(Clone, Debug, Default)]
pub enum Child {
    #[default]
    Empty,
    Element(Rc<Element>),
    Text(Rc<str>),
    /// Several children. Multi-child reconciliation is not supported; the
    /// reconciler logs and treats this shape as producing no children.
    List(Vec<Child>),
}

impl Child {
    pub fn text(content: impl Into<Rc<str>>) -> Self {
        Child::Text(content.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Child::Empty)
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Child::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// Returns whether `child` is an element description.
pub fn is_valid_element(child: &Child) -> bool {
    child.as_element().is_some()
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(Rc::new(element))
    }
}

impl From<Rc<Element>> for Child {
    fn from(element: Rc<Element>) -> Self {
        Child::Element(element)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.into())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text.into())
    }
}

impl From<Vec<Child>> for Child {
    fn from(children: Vec<Child>) -> Self {
        Child::List(children)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(child: Option<T>) -> Self {
        child.map(Into::into).unwrap_or_default()
    }
}

macro_rules! text_child_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Child {
            fn from(value: $ty) -> Self {
                Child::Text(value.to_string().into())
            }
        })*
    };
}

text_child_from_number!(i32, i64, u32, u64, usize, f32, f64);

#[derive(Clone)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn is_handler(&self) -> bool {
        matches!(self, PropValue::Handler(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Handler(_) => f.write_str("<handler>"),
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => write!(f, "{value:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

#[derive(Clone, Default)]
struct PropsInner {
    values: HashMap<String, PropValue>,
    children: Child,
}

/// Immutable property map. Cloning shares the underlying storage.
#[derive(Clone, Default)]
pub struct Props {
    inner: Rc<PropsInner>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.inner)
            .values
            .insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: impl Into<Child>) -> Self {
        Rc::make_mut(&mut self.inner).children = children.into();
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.inner.values.get(name)
    }

    pub fn children(&self) -> &Child {
        &self.inner.children
    }

    pub fn handler(&self, event: &str) -> Option<&EventHandler> {
        match self.inner.values.get(event) {
            Some(PropValue::Handler(handler)) => Some(handler),
            _ => None,
        }
    }

    /// Iterates over every non-listener value.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.inner
            .values
            .iter()
            .filter(|(_, value)| !value.is_handler())
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.inner.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values.is_empty() && self.inner.children.is_empty()
    }

    /// Returns whether any attribute differs between `self` and `other`.
    /// Listeners and children are not attributes.
    pub fn attributes_differ(&self, other: &Props) -> bool {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return false;
        }
        let count = |props: &Props| props.attributes().count();
        if count(self) != count(other) {
            return true;
        }
        self.attributes()
            .any(|(name, value)| other.get(name) != Some(value))
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.inner.values.keys().collect();
        names.sort();
        let mut map = f.debug_map();
        for name in names {
            map.entry(name, &self.inner.values[name]);
        }
        if !self.inner.children.is_empty() {
            map.entry(&"children", &self.inner.children);
        }
        map.finish()
    }
}

/// Event delivered to an [`EventHandler`].
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: String,
    pub value: Option<PropValue>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<PropValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(_cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
        Ok(Child::Empty)
    }

    fn other_leaf(_cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
        Ok(Child::text("other"))
    }

    #[test]
    fn component_identity_requires_name_and_function() {
        let a = component!(leaf);
        assert_eq!(a, Component::new("leaf", leaf));
        assert_ne!(a, Component::new("renamed", leaf));
        assert_ne!(a, component!(other_leaf));
        assert_eq!(a.name(), "leaf");
    }

    #[test]
    fn numbers_become_text_children() {
        match Child::from(89989789) {
            Child::Text(text) => assert_eq!(&*text, "89989789"),
            other => panic!("unexpected child {other:?}"),
        }
        assert!(Child::from(None::<&str>).is_empty());
    }

    #[test]
    fn listeners_are_not_attributes() {
        let old = Props::new()
            .with("class", "counter")
            .with("onClick", PropValue::Handler(Rc::new(|_: &Event| Ok(()))));
        let new = Props::new()
            .with("class", "counter")
            .with("onClick", PropValue::Handler(Rc::new(|_: &Event| Ok(()))));
        assert!(!old.attributes_differ(&new));
        assert_eq!(old.attributes().count(), 1);
        assert!(old.handler("onClick").is_some());

        let changed = new.clone().with("class", "counter active");
        assert!(new.attributes_differ(&changed));
        let extra = new.clone().with("title", "x");
        assert!(new.attributes_differ(&extra));
    }

    #[test]
    fn builder_populates_element() {
        let element = Element::host("div")
            .with_key("k")
            .prop("id", "root")
            .child("hello");
        assert_eq!(element.element_type().host_tag(), Some("div"));
        assert_eq!(element.key().map(|k| &**k), Some("k"));
        assert_eq!(element.props().get("id").and_then(PropValue::as_str), Some("root"));
        assert!(matches!(element.props().children(), Child::Text(t) if &**t == "hello"));
        assert!(is_valid_element(&element.into()));
    }
}
