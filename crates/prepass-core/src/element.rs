//! Element types and component traits.
//!
//! A [`Node`] is one of a closed set of shapes. The engine classifies a node
//! with a single `match`; there is no probing of hidden fields.

use crate::class::ClassType;
use crate::context::AnyContext;
use crate::hooks::RenderCx;
use crate::lazy::LazyComponent;
use crate::thenable::RenderResult;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// A node in the component tree.
#[derive(Clone, Default)]
pub enum Node {
    /// Renders nothing (null, booleans, undefined).
    #[default]
    Empty,
    /// A text leaf.
    Text(Rc<str>),
    /// A list of sibling nodes.
    List(Vec<Node>),
    /// A fragment-like grouping (fragment, strict mode, profiler).
    Fragment(Vec<Node>),
    /// A host element such as `div`.
    Host(HostElement),
    /// A user-defined function or class component.
    Component(ComponentElement),
    /// Provides a context value to its subtree.
    Provider(ProviderElement),
    /// Renders a function of the current context value.
    Consumer(ConsumerElement),
    /// A component loaded on demand.
    Lazy(LazyElement),
    /// A forwarded-ref wrapper around a component.
    ForwardRef(WrapperElement),
    /// A memoized wrapper around a component.
    Memo(WrapperElement),
    /// Children rendered into another container.
    Portal(PortalElement),
    /// A suspense boundary.
    Suspense(SuspenseElement),
}

impl Node {
    pub fn text(text: impl Into<Rc<str>>) -> Self {
        Node::Text(text.into())
    }

    pub fn list(children: impl IntoIterator<Item = Node>) -> Self {
        Node::List(children.into_iter().collect())
    }

    pub fn fragment(children: impl IntoIterator<Item = Node>) -> Self {
        Node::Fragment(children.into_iter().collect())
    }

    pub fn host(tag: impl Into<Rc<str>>, children: impl IntoIterator<Item = Node>) -> Self {
        Node::Host(HostElement {
            tag: tag.into(),
            children: children.into_iter().collect(),
        })
    }

    pub fn portal(children: impl IntoIterator<Item = Node>) -> Self {
        Node::Portal(PortalElement {
            children: children.into_iter().collect(),
        })
    }

    pub fn suspense(fallback: Node, children: impl IntoIterator<Item = Node>) -> Self {
        Node::Suspense(SuspenseElement {
            fallback: Box::new(fallback),
            children: children.into_iter().collect(),
        })
    }

    pub fn forward_ref(inner: &ComponentType, props: Props) -> Self {
        Node::ForwardRef(WrapperElement {
            inner: inner.clone(),
            props,
        })
    }

    pub fn memo(inner: &ComponentType, props: Props) -> Self {
        Node::Memo(WrapperElement {
            inner: inner.clone(),
            props,
        })
    }

    /// The component this node mounts, if it is a component element or a
    /// forward-ref / memo wrapper.
    pub fn component_type(&self) -> Option<&ComponentType> {
        match self {
            Node::Component(element) => Some(&element.component),
            Node::ForwardRef(wrapper) | Node::Memo(wrapper) => Some(&wrapper.inner),
            _ => None,
        }
    }

    /// Short variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Empty => "empty",
            Node::Text(_) => "text",
            Node::List(_) => "list",
            Node::Fragment(_) => "fragment",
            Node::Host(_) => "host",
            Node::Component(_) => "component",
            Node::Provider(_) => "provider",
            Node::Consumer(_) => "consumer",
            Node::Lazy(_) => "lazy",
            Node::ForwardRef(_) => "forward_ref",
            Node::Memo(_) => "memo",
            Node::Portal(_) => "portal",
            Node::Suspense(_) => "suspense",
        }
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::text(text)
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::List(children)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(node: Option<T>) -> Self {
        node.map_or(Node::Empty, Into::into)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => f.write_str("Empty"),
            Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Node::List(children) => f.debug_tuple("List").field(children).finish(),
            Node::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            Node::Host(host) => f.debug_tuple("Host").field(&host.tag).finish(),
            Node::Component(element) => f
                .debug_tuple("Component")
                .field(&element.component.name())
                .finish(),
            Node::Provider(provider) => f
                .debug_tuple("Provider")
                .field(&provider.context.id())
                .finish(),
            Node::Consumer(consumer) => f
                .debug_tuple("Consumer")
                .field(&consumer.context.id())
                .finish(),
            Node::Lazy(lazy) => f.debug_tuple("Lazy").field(&lazy.component.status()).finish(),
            Node::ForwardRef(wrapper) => f
                .debug_tuple("ForwardRef")
                .field(&wrapper.inner.name())
                .finish(),
            Node::Memo(wrapper) => f.debug_tuple("Memo").field(&wrapper.inner.name()).finish(),
            Node::Portal(_) => f.write_str("Portal"),
            Node::Suspense(_) => f.write_str("Suspense"),
        }
    }
}

// ============================================================================
// Props
// ============================================================================

/// Component props: an optional typed payload plus children.
#[derive(Clone, Default)]
pub struct Props {
    data: Option<Value>,
    children: Vec<Node>,
}

impl Props {
    pub fn new<T: 'static>(data: T) -> Self {
        Self {
            data: Some(Value::new(data)),
            children: Vec::new(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// Borrow the payload as `T`.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data.as_ref().and_then(Value::get)
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The children passed to this component, as a single node.
    pub fn children(&self) -> Node {
        Node::List(self.children.clone())
    }
}

// ============================================================================
// Element payloads
// ============================================================================

#[derive(Clone)]
pub struct HostElement {
    pub tag: Rc<str>,
    pub children: Vec<Node>,
}

#[derive(Clone)]
pub struct ComponentElement {
    pub component: ComponentType,
    pub props: Props,
}

#[derive(Clone)]
pub struct ProviderElement {
    pub context: AnyContext,
    pub value: Value,
    pub children: Vec<Node>,
}

/// Render function of a consumer element.
pub type ConsumerRender = Rc<dyn Fn(&Value) -> Node>;

#[derive(Clone)]
pub struct ConsumerElement {
    pub context: AnyContext,
    pub render: ConsumerRender,
}

#[derive(Clone)]
pub struct LazyElement {
    pub component: LazyComponent,
    pub props: Props,
}

/// A forward-ref or memo wrapper. Both unwrap to `inner` with the same props.
#[derive(Clone)]
pub struct WrapperElement {
    pub inner: ComponentType,
    pub props: Props,
}

#[derive(Clone)]
pub struct PortalElement {
    pub children: Vec<Node>,
}

#[derive(Clone)]
pub struct SuspenseElement {
    pub fallback: Box<Node>,
    pub children: Vec<Node>,
}

// ============================================================================
// Components
// ============================================================================

type RenderFn = Box<dyn Fn(&mut RenderCx<'_>) -> RenderResult>;

/// A function component.
pub struct FunctionComponent {
    name: String,
    render: RenderFn,
    context_types: Vec<String>,
}

impl FunctionComponent {
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&mut RenderCx<'_>) -> RenderResult + 'static,
    {
        Self {
            name: name.into(),
            render: Box::new(render),
            context_types: Vec::new(),
        }
    }

    /// Declare the legacy context keys this component reads.
    pub fn with_context_types(mut self, keys: &[&str]) -> Self {
        self.context_types = keys.iter().map(|key| key.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context_types(&self) -> &[String] {
        &self.context_types
    }

    pub fn render(&self, cx: &mut RenderCx<'_>) -> RenderResult {
        (self.render)(cx)
    }
}

/// The type of a user-defined component.
#[derive(Clone)]
pub enum ComponentType {
    Function(Rc<FunctionComponent>),
    Class(Rc<ClassType>),
}

impl ComponentType {
    /// Shorthand for a function component without legacy context.
    pub fn function<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&mut RenderCx<'_>) -> RenderResult + 'static,
    {
        FunctionComponent::new(name, render).into()
    }

    pub fn name(&self) -> &str {
        match self {
            ComponentType::Function(function) => function.name(),
            ComponentType::Class(class) => class.name(),
        }
    }

    /// Whether both refer to the same component definition.
    pub fn ptr_eq(&self, other: &ComponentType) -> bool {
        match (self, other) {
            (ComponentType::Function(a), ComponentType::Function(b)) => Rc::ptr_eq(a, b),
            (ComponentType::Class(a), ComponentType::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Create an element mounting this component.
    pub fn element(&self, props: Props) -> Node {
        Node::Component(ComponentElement {
            component: self.clone(),
            props,
        })
    }
}

impl From<FunctionComponent> for ComponentType {
    fn from(function: FunctionComponent) -> Self {
        ComponentType::Function(Rc::new(function))
    }
}

impl From<ClassType> for ComponentType {
    fn from(class: ClassType) -> Self {
        ComponentType::Class(Rc::new(class))
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Function(function) => {
                f.debug_tuple("Function").field(&function.name).finish()
            }
            ComponentType::Class(class) => f.debug_tuple("Class").field(&class.name()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn props_expose_payload_and_children() {
        let props = Props::new(7_i32).with_children([Node::text("a"), Node::Empty]);
        assert_eq!(props.get::<i32>(), Some(&7));
        assert!(props.get::<String>().is_none());
        match props.children() {
            Node::List(children) => assert_eq!(children.len(), 2),
            other => panic!("unexpected children {:?}", other),
        }
    }

    #[test]
    fn component_identity_is_by_definition() {
        let a = ComponentType::function("A", |_| Ok(Node::Empty));
        let b = ComponentType::function("A", |_| Ok(Node::Empty));
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.name(), "A");
    }

    #[test]
    fn element_reports_its_component() {
        let a = ComponentType::function("A", |_| Ok(Node::Empty));
        let node = a.element(Props::none());
        assert_eq!(node.kind(), "component");
        assert!(node.component_type().is_some_and(|c| c.ptr_eq(&a)));
        assert!(Node::text("x").component_type().is_none());
    }

    #[test]
    fn option_converts_to_empty() {
        let node: Node = None::<&str>.into();
        assert!(matches!(node, Node::Empty));
    }
}
