//! Class components.
//!
//! A class component is a [`ClassType`] (the definition) plus one
//! [`ClassInstance`] per mounted element. The prepass drives the mount-time
//! part of the lifecycle only:
//!
//! 1. construct the component from props
//! 2. seed state from [`ClassComponent::initial_state`]
//! 3. `get_derived_state_from_props`, or `component_will_mount` when the
//!    class does not derive state
//! 4. apply updates queued through the [`Updater`]
//! 5. render, then collect child context
//!
//! Nothing here runs effects or commit-phase methods.

use crate::context::{ContextStore, LegacyContext, LegacyValues};
use crate::element::{Node, Props};
use crate::hooks::RenderCx;
use crate::thenable::{Fault, Interrupt, RenderResult};
use crate::value::Value;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Lifecycle methods a class component may implement.
///
/// Only `render` is required.
pub trait ClassComponent {
    /// State the instance starts with.
    fn initial_state(&self) -> Option<Value> {
        None
    }

    /// Derive state from props before the first render.
    ///
    /// Returning `Some` marks the class as deriving state, which disables
    /// `component_will_mount`. The returned value replaces the whole state;
    /// classes that want to keep fields of `state` copy them over.
    fn get_derived_state_from_props(&self, _props: &Props, _state: Option<&Value>) -> Option<Value> {
        None
    }

    /// Called before the first render when no state is derived from props.
    fn component_will_mount(&mut self, _updater: &Updater) {}

    fn render(&mut self, cx: &mut RenderCx<'_>) -> RenderResult;

    /// Legacy context contributed to descendants.
    fn get_child_context(&self, _cx: &RenderCx<'_>) -> Option<LegacyValues> {
        None
    }

    /// State to switch to after catching `fault` from a descendant.
    ///
    /// Only consulted for classes declared with [`ClassType::error_boundary`].
    fn get_derived_state_from_error(&self, _fault: &Fault) -> Option<Value> {
        None
    }
}

type Construct = Box<dyn Fn(&Props) -> Box<dyn ClassComponent>>;

/// Definition of a class component.
pub struct ClassType {
    name: String,
    construct: Construct,
    context_types: Vec<String>,
    child_context_types: Vec<String>,
    error_boundary: bool,
}

impl ClassType {
    pub fn new<C, F>(name: impl Into<String>, construct: F) -> Self
    where
        C: ClassComponent + 'static,
        F: Fn(&Props) -> C + 'static,
    {
        Self {
            name: name.into(),
            construct: Box::new(move |props: &Props| -> Box<dyn ClassComponent> {
                Box::new(construct(props))
            }),
            context_types: Vec::new(),
            child_context_types: Vec::new(),
            error_boundary: false,
        }
    }

    /// Declare the legacy context keys instances can read.
    pub fn context_types(mut self, keys: &[&str]) -> Self {
        self.context_types = keys.iter().map(|key| key.to_string()).collect();
        self
    }

    /// Declare the legacy context keys instances may provide.
    pub fn child_context_types(mut self, keys: &[&str]) -> Self {
        self.child_context_types = keys.iter().map(|key| key.to_string()).collect();
        self
    }

    /// Mark the class as an error boundary.
    pub fn error_boundary(mut self) -> Self {
        self.error_boundary = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_error_boundary(&self) -> bool {
        self.error_boundary
    }

    pub fn declared_context_types(&self) -> &[String] {
        &self.context_types
    }

    pub fn declared_child_context_types(&self) -> &[String] {
        &self.child_context_types
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassType")
            .field("name", &self.name)
            .field("context_types", &self.context_types)
            .field("child_context_types", &self.child_context_types)
            .field("error_boundary", &self.error_boundary)
            .finish()
    }
}

// ============================================================================
// Updater
// ============================================================================

type StateUpdate = Box<dyn FnOnce(Option<&Value>) -> Value>;

/// Update queue handed to lifecycle methods.
///
/// During a prepass no instance is ever mounted, so updates are only queued.
/// They are applied in order right before the next render of the instance.
#[derive(Default)]
pub struct Updater {
    queue: RefCell<Vec<StateUpdate>>,
    forced: Cell<bool>,
}

impl Updater {
    /// Always false; nothing is mounted during a prepass.
    pub fn is_mounted(&self) -> bool {
        false
    }

    pub fn enqueue_force_update(&self) {
        self.forced.set(true);
    }

    /// Discard queued updates and set state to `state`.
    pub fn enqueue_replace_state(&self, state: Value) {
        let mut queue = self.queue.borrow_mut();
        queue.clear();
        queue.push(Box::new(move |_| state));
    }

    /// Queue a state update computed from the state at apply time.
    pub fn enqueue_set_state(&self, update: impl FnOnce(Option<&Value>) -> Value + 'static) {
        self.queue.borrow_mut().push(Box::new(update));
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty() || self.forced.get()
    }

    /// Apply every queued update to `state`.
    fn flush(&self, state: &RefCell<Option<Value>>) {
        self.forced.set(false);
        let updates = std::mem::take(&mut *self.queue.borrow_mut());
        for update in updates {
            let next = update(state.borrow().as_ref());
            *state.borrow_mut() = Some(next);
        }
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("queued", &self.queue.borrow().len())
            .field("forced", &self.forced.get())
            .finish()
    }
}

// ============================================================================
// Instance
// ============================================================================

/// Output of one class render.
pub struct ClassOutput {
    pub node: Node,
    /// Child context, filtered to the declared child context keys.
    pub child_context: Option<LegacyValues>,
}

/// A mounted class component.
pub struct ClassInstance {
    class: Rc<ClassType>,
    component: RefCell<Box<dyn ClassComponent>>,
    props: Props,
    context: LegacyContext,
    state: RefCell<Option<Value>>,
    updater: Updater,
    caught: RefCell<Option<Fault>>,
}

impl ClassInstance {
    /// Construct an instance and run its pre-render lifecycle.
    ///
    /// `legacy` is the full legacy context at the mount point; the instance
    /// keeps only the keys its class declares.
    pub fn construct(class: Rc<ClassType>, props: Props, legacy: &LegacyContext) -> Rc<Self> {
        let component = (class.construct)(&props);
        let state = component.initial_state();
        let context = legacy.mask(class.context_types.as_slice());
        let instance = Self {
            class,
            component: RefCell::new(component),
            props,
            context,
            state: RefCell::new(state),
            updater: Updater::default(),
            caught: RefCell::new(None),
        };

        let derived = {
            let component = instance.component.borrow();
            component.get_derived_state_from_props(&instance.props, instance.state.borrow().as_ref())
        };
        match derived {
            Some(partial) => instance.updater.enqueue_set_state(move |_| partial),
            None => instance
                .component
                .borrow_mut()
                .component_will_mount(&instance.updater),
        }
        instance.updater.flush(&instance.state);

        Rc::new(instance)
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn class(&self) -> &Rc<ClassType> {
        &self.class
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The masked legacy context this instance reads.
    pub fn context(&self) -> &LegacyContext {
        &self.context
    }

    pub fn state(&self) -> Ref<'_, Option<Value>> {
        self.state.borrow()
    }

    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    pub fn is_boundary(&self) -> bool {
        self.class.error_boundary
    }

    /// Record a fault caught from a descendant and derive error state.
    pub fn catch(&self, fault: Fault) {
        let derived = self.component.borrow().get_derived_state_from_error(&fault);
        if let Some(state) = derived {
            *self.state.borrow_mut() = Some(state);
        }
        *self.caught.borrow_mut() = Some(fault);
    }

    pub fn caught(&self) -> Option<Fault> {
        self.caught.borrow().clone()
    }

    /// Apply pending updates and render.
    pub fn render(&self, contexts: &ContextStore) -> Result<ClassOutput, Interrupt> {
        self.updater.flush(&self.state);

        let mut component = self.component.borrow_mut();
        let mut cx = RenderCx::new(&self.props, contexts)
            .with_legacy_context(self.context.clone())
            .with_state(self.state.borrow().clone())
            .with_fault(self.caught());

        let node = component.render(&mut cx)?;
        let child_context = component
            .get_child_context(&cx)
            .map(|values| self.filter_child_context(values));

        Ok(ClassOutput { node, child_context })
    }

    fn filter_child_context(&self, mut values: LegacyValues) -> LegacyValues {
        let declared = &self.class.child_context_types;
        values.retain(|key, _| declared.iter().any(|d| d == key));
        values
    }
}

impl fmt::Debug for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInstance")
            .field("class", &self.class.name)
            .field("state", &self.state.borrow())
            .field("caught", &self.caught.borrow().is_some())
            .finish()
    }
}
