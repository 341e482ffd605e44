//! Context propagation.
//!
//! Two mechanisms live here:
//!
//! - **Provided context** ([`Context`], [`ContextStore`]): each context has a
//!   stack of values. Entering a provider pushes, leaving it pops, and a
//!   consumer sees the top of the stack or the context's default.
//! - **Legacy context** ([`LegacyContext`]): an ownership-chain map of named
//!   values. A class component's `get_child_context` output is merged into a
//!   copy of its parent's map; the parent's map is never mutated.
//!
//! Both can be captured in a snapshot when a subtree suspends and reinstated
//! when it resumes.
//!
//! # Example
//!
//! ```ignore
//! let theme = create_context(String::from("light"));
//!
//! let label = ComponentType::function("Label", {
//!     let theme = theme.clone();
//!     move |cx| {
//!         let current = cx.use_context(&theme)?;
//!         Ok(Node::text(current))
//!     }
//! });
//!
//! let tree = theme.provider(String::from("dark"), [label.element(Props::none())]);
//! ```

use crate::element::{ConsumerElement, Node, ProviderElement};
use crate::value::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of a context.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContextId(u64);

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

fn next_context_id() -> ContextId {
    ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// A context with its type erased, as carried by provider and consumer nodes.
#[derive(Clone, Debug)]
pub struct AnyContext {
    id: ContextId,
    default: Value,
}

impl AnyContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }
}

/// A typed context handle.
pub struct Context<T> {
    inner: AnyContext,
    default: Rc<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            default: Rc::clone(&self.default),
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + 'static> Context<T> {
    pub fn new(default: T) -> Self {
        Self {
            inner: AnyContext {
                id: next_context_id(),
                default: Value::new(default.clone()),
            },
            default: Rc::new(default),
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn as_any(&self) -> &AnyContext {
        &self.inner
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// A provider element making `value` visible to `children`.
    pub fn provider(&self, value: T, children: impl IntoIterator<Item = Node>) -> Node {
        Node::Provider(ProviderElement {
            context: self.inner.clone(),
            value: Value::new(value),
            children: children.into_iter().collect(),
        })
    }

    /// A consumer element rendering `render` with the current value.
    pub fn consumer<F>(&self, render: F) -> Node
    where
        F: Fn(&T) -> Node + 'static,
    {
        Node::Consumer(ConsumerElement {
            context: self.inner.clone(),
            render: Rc::new(move |value: &Value| value.get::<T>().map_or(Node::Empty, &render)),
        })
    }
}

/// Create a context with a default value.
pub fn create_context<T: Clone + 'static>(default: T) -> Context<T> {
    Context::new(default)
}

// ============================================================================
// Context Store
// ============================================================================

/// Per-context stacks of provided values.
#[derive(Default, Debug)]
pub struct ContextStore {
    stacks: HashMap<ContextId, Vec<Value>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store whose stacks hold exactly the snapshot's values.
    pub fn from_snapshot(snapshot: &ContextSnapshot) -> Self {
        let stacks = snapshot
            .values
            .iter()
            .map(|(id, value)| (*id, vec![value.clone()]))
            .collect();
        Self { stacks }
    }

    pub fn push(&mut self, id: ContextId, value: Value) {
        self.stacks.entry(id).or_default().push(value);
    }

    pub fn pop(&mut self, id: ContextId) -> Option<Value> {
        let stack = self.stacks.get_mut(&id)?;
        let value = stack.pop();
        if stack.is_empty() {
            self.stacks.remove(&id);
        }
        value
    }

    /// The value a consumer of `context` sees right now.
    pub fn read(&self, context: &AnyContext) -> Value {
        self.stacks
            .get(&context.id)
            .and_then(|stack| stack.last())
            .unwrap_or(&context.default)
            .clone()
    }

    /// Typed read of the current value.
    pub fn read_typed<T: Clone + 'static>(&self, context: &Context<T>) -> T {
        self.read(context.as_any())
            .get::<T>()
            .cloned()
            .unwrap_or_else(|| context.default_value().clone())
    }

    pub fn depth(&self, id: ContextId) -> usize {
        self.stacks.get(&id).map_or(0, Vec::len)
    }

    /// Capture the value currently on top of every stack.
    pub fn snapshot(&self) -> ContextSnapshot {
        let values = self
            .stacks
            .iter()
            .filter_map(|(id, stack)| stack.last().map(|value| (*id, value.clone())))
            .collect();
        ContextSnapshot {
            values: Rc::new(values),
        }
    }
}

/// Top-of-stack values captured from a [`ContextStore`].
#[derive(Clone, Default, Debug)]
pub struct ContextSnapshot {
    values: Rc<HashMap<ContextId, Value>>,
}

impl ContextSnapshot {
    pub fn get(&self, id: ContextId) -> Option<&Value> {
        self.values.get(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Legacy context
// ============================================================================

/// Child-context entries returned by `get_child_context`.
pub type LegacyValues = HashMap<String, Value>;

/// Copy-on-write map of legacy context values.
#[derive(Clone, Default, Debug)]
pub struct LegacyContext {
    values: Rc<LegacyValues>,
}

impl LegacyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed lookup.
    pub fn value<T: 'static>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(Value::get)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A new map holding this map's entries overlaid with `child`.
    pub fn merge(&self, child: LegacyValues) -> Self {
        if child.is_empty() {
            return self.clone();
        }
        let mut values = (*self.values).clone();
        values.extend(child);
        Self {
            values: Rc::new(values),
        }
    }

    /// The subset of entries named in `keys`.
    pub fn mask<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        if keys.is_empty() {
            return Self::default();
        }
        let values = keys
            .iter()
            .filter_map(|key| {
                let key = key.as_ref();
                self.values.get(key).map(|value| (key.to_string(), value.clone()))
            })
            .collect();
        Self {
            values: Rc::new(values),
        }
    }

    pub fn ptr_eq(&self, other: &LegacyContext) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

impl FromIterator<(String, Value)> for LegacyContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: Rc::new(iter.into_iter().collect()),
        }
    }
}
