//! React-style hooks backed by a per-instance slot list.
//!
//! Every function component instance owns a [`HookList`]. Each hook call
//! during a render consumes the next slot, so a hook is identified by its
//! position in the call sequence, not by a name or key. When a render is
//! abandoned because something suspended, the list is rewound and the next
//! render starts from slot 0 again, picking up every value stored so far.
//!
//! Hooks are reached through the [`RenderCx`] handed to the component:
//!
//! ```ignore
//! let counter = ComponentType::function("Counter", |cx| {
//!     let (count, set_count) = cx.use_state(|| 0)?;
//!     let doubled = cx.use_memo(|| count * 2, Some(count))?;
//!     let renders = cx.use_ref(|| 0)?;
//!     *renders.borrow_mut() += 1;
//!
//!     if count == 0 {
//!         set_count.set(1); // render-phase update, re-renders once
//!     }
//!     Ok(Node::text(format!("{} / {}", count, doubled)))
//! });
//! ```
//!
//! # Available Hooks
//!
//! | Hook | Purpose |
//! |------|---------|
//! | [`RenderCx::use_state`] | State with a `(value, setter)` pair |
//! | [`RenderCx::use_state_with`] | State whose initializer may suspend |
//! | [`RenderCx::use_reducer`] | State updated through a reducer |
//! | [`RenderCx::use_memo`] | Value recomputed only when dependencies change |
//! | [`RenderCx::use_callback`] | Memoized callback |
//! | [`RenderCx::use_ref`] | Mutable box that persists across renders |
//! | [`RenderCx::use_context`] | Current value of a provided context |
//! | [`RenderCx::use_id`] | Stable identifier for the instance and slot |
//! | [`RenderCx::use_effect`] | Effect slot; effects never run during a prepass |
//!
//! # Rules of Hooks
//!
//! Hooks must be called in the **exact same order** on every render. A
//! completed render that calls a different number of hooks than the previous
//! completed render fails with [`HookError::CountMismatch`]; a slot reused by a
//! different hook fails with [`HookError::OrderMismatch`]. Hooks called from a
//! class component, or on a list that is not rendering, fail with
//! [`HookError::OutsideRender`]. All of these surface as faults of the render
//! that made the call.

use crate::context::{Context, ContextStore, LegacyContext};
use crate::element::{Node, Props};
use crate::error::HookError;
use crate::thenable::{Fault, Interrupt};
use crate::value::Value;
use std::any::{Any, type_name};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Hook slot list
// ============================================================================

/// Metadata about a hook slot, for debugging.
#[derive(Debug, Clone)]
pub struct HookMeta {
    /// The hook function name (e.g. "use_state", "use_memo").
    pub hook_type: &'static str,
    /// The type of value stored.
    pub value_type: &'static str,
}

struct HookSlot {
    value: Box<dyn Any>,
    meta: HookMeta,
}

/// Ordered hook slots of one component instance.
pub struct HookList {
    /// Stored hook values, indexed by call order
    slots: Vec<HookSlot>,
    /// Next slot to hand out during the current render
    cursor: usize,
    rendering: bool,
    /// Hook count of the last completed render
    expected_count: Option<usize>,
    /// Number of completed renders
    render_count: usize,
    /// Bumped by state setters
    generation: Rc<Cell<u64>>,
    instance: u64,
}

impl HookList {
    /// Create an empty list for the instance with the given id.
    pub fn new(instance: u64) -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            rendering: false,
            expected_count: None,
            render_count: 0,
            generation: Rc::new(Cell::new(0)),
            instance,
        }
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Reset the cursor and begin a render pass.
    pub fn begin_render(&mut self) {
        self.cursor = 0;
        self.rendering = true;
    }

    /// Validate the hook count and finish a completed render pass.
    pub fn end_render(&mut self) -> Result<(), HookError> {
        self.rendering = false;
        let actual = self.cursor;
        if let Some(expected) = self.expected_count {
            if expected != actual {
                return Err(HookError::CountMismatch {
                    expected,
                    actual,
                    render: self.render_count,
                });
            }
        }
        self.expected_count = Some(actual);
        self.render_count += 1;
        Ok(())
    }

    /// Abandon the current render pass. Stored slots are kept.
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.rendering = false;
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current update generation. Changes whenever a setter writes.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn debug_info(&self) -> Vec<HookMeta> {
        self.slots.iter().map(|slot| slot.meta.clone()).collect()
    }

    /// Get the value at the next slot, creating it with `init` on first use.
    ///
    /// If `init` fails the slot is not created and the cursor does not
    /// advance, so the next render retries the initializer.
    fn use_hook<T: Clone + 'static>(
        &mut self,
        hook_type: &'static str,
        init: impl FnOnce() -> Result<T, Interrupt>,
    ) -> Result<T, Interrupt> {
        if !self.rendering {
            return Err(HookError::OutsideRender { hook: hook_type }.into());
        }

        let index = self.cursor;
        if let Some(slot) = self.slots.get(index) {
            if slot.meta.hook_type != hook_type {
                return Err(HookError::OrderMismatch {
                    index,
                    previous: slot.meta.hook_type,
                    current: hook_type,
                }
                .into());
            }
            let value = slot
                .value
                .downcast_ref::<T>()
                .cloned()
                .ok_or(HookError::TypeMismatch {
                    index,
                    stored: slot.meta.value_type,
                })?;
            self.cursor += 1;
            return Ok(value);
        }

        let value = init()?;
        self.slots.push(HookSlot {
            value: Box::new(value.clone()),
            meta: HookMeta {
                hook_type,
                value_type: type_name::<T>(),
            },
        });
        self.cursor += 1;
        Ok(value)
    }
}

impl fmt::Debug for HookList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookList")
            .field("instance", &self.instance)
            .field("slots", &self.debug_info())
            .field("cursor", &self.cursor)
            .field("render_count", &self.render_count)
            .finish()
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Setter returned by [`RenderCx::use_state`].
///
/// Writes are applied immediately. A write made while the owning instance
/// is rendering makes the engine render it again.
pub struct StateSetter<T> {
    cell: Rc<RefCell<T>>,
    generation: Rc<Cell<u64>>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            generation: Rc::clone(&self.generation),
        }
    }
}

impl<T> StateSetter<T> {
    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = value;
        self.generation.set(self.generation.get() + 1);
    }

    /// Replace the value with one computed from the current value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&*self.cell.borrow());
        self.set(next);
    }
}

struct ReducerSlot<S, A> {
    state: RefCell<S>,
    reducer: RefCell<Rc<dyn Fn(&S, A) -> S>>,
}

/// Dispatcher returned by [`RenderCx::use_reducer`].
pub struct Dispatch<S, A> {
    slot: Rc<ReducerSlot<S, A>>,
    generation: Rc<Cell<u64>>,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            generation: Rc::clone(&self.generation),
        }
    }
}

impl<S, A> Dispatch<S, A> {
    pub fn dispatch(&self, action: A) {
        let reducer = Rc::clone(&*self.slot.reducer.borrow());
        let next = reducer(&*self.slot.state.borrow(), action);
        *self.slot.state.borrow_mut() = next;
        self.generation.set(self.generation.get() + 1);
    }
}

/// Handle to a value created by [`RenderCx::use_ref`].
pub struct RefHandle<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> RefHandle<T> {
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }

    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
    }

    /// Whether both handles point at the same box.
    pub fn ptr_eq(&self, other: &RefHandle<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> RefHandle<T> {
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

struct MemoState<T, D> {
    value: Option<Rc<T>>,
    deps: Option<D>,
}

// ============================================================================
// Render context
// ============================================================================

/// Everything a component can see while it renders.
pub struct RenderCx<'a> {
    props: &'a Props,
    contexts: &'a ContextStore,
    hooks: Option<&'a mut HookList>,
    legacy: LegacyContext,
    state: Option<Value>,
    fault: Option<Fault>,
}

impl<'a> RenderCx<'a> {
    pub fn new(props: &'a Props, contexts: &'a ContextStore) -> Self {
        Self {
            props,
            contexts,
            hooks: None,
            legacy: LegacyContext::new(),
            state: None,
            fault: None,
        }
    }

    /// Attach the hook list of the rendering function component.
    pub fn with_hooks(mut self, hooks: &'a mut HookList) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Set the (already masked) legacy context visible to the component.
    pub fn with_legacy_context(mut self, legacy: LegacyContext) -> Self {
        self.legacy = legacy;
        self
    }

    pub fn with_state(mut self, state: Option<Value>) -> Self {
        self.state = state;
        self
    }

    pub fn with_fault(mut self, fault: Option<Fault>) -> Self {
        self.fault = fault;
        self
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    /// The children passed to this component.
    pub fn children(&self) -> Node {
        self.props.children()
    }

    pub fn legacy_context(&self) -> &LegacyContext {
        &self.legacy
    }

    /// Class state, as `T`.
    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.state.as_ref().and_then(Value::get)
    }

    /// The fault delivered to a boundary that is re-rendering after catching it.
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// Read a context without going through the hook list.
    pub fn read_context<T: Clone + 'static>(&self, context: &Context<T>) -> T {
        self.contexts.read_typed(context)
    }

    fn hooks(&mut self, hook: &'static str) -> Result<&mut HookList, HookError> {
        self.hooks
            .as_deref_mut()
            .ok_or(HookError::OutsideRender { hook })
    }

    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<(T, StateSetter<T>), Interrupt> {
        self.use_state_with(|| Ok(init()))
    }

    /// Like [`use_state`](Self::use_state), but the initializer may suspend
    /// or fail. A suspended initializer is retried on the next render.
    pub fn use_state_with<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> Result<T, Interrupt>,
    ) -> Result<(T, StateSetter<T>), Interrupt> {
        let hooks = self.hooks("use_state")?;
        let cell = hooks.use_hook("use_state", || init().map(|value| Rc::new(RefCell::new(value))))?;
        let setter = StateSetter {
            cell,
            generation: Rc::clone(&hooks.generation),
        };
        let value = setter.cell.borrow().clone();
        Ok((value, setter))
    }

    pub fn use_reducer<S, A>(
        &mut self,
        reducer: impl Fn(&S, A) -> S + 'static,
        init: impl FnOnce() -> S,
    ) -> Result<(S, Dispatch<S, A>), Interrupt>
    where
        S: Clone + 'static,
        A: 'static,
    {
        let reducer: Rc<dyn Fn(&S, A) -> S> = Rc::new(reducer);
        let hooks = self.hooks("use_reducer")?;
        let slot = hooks.use_hook("use_reducer", || {
            Ok(Rc::new(ReducerSlot {
                state: RefCell::new(init()),
                reducer: RefCell::new(Rc::clone(&reducer)),
            }))
        })?;
        *slot.reducer.borrow_mut() = reducer;
        let value = slot.state.borrow().clone();
        Ok((
            value,
            Dispatch {
                slot,
                generation: Rc::clone(&hooks.generation),
            },
        ))
    }

    /// Memoize `compute` on `deps`. `None` recomputes on every render.
    ///
    /// The returned `Rc` is the same allocation for as long as the
    /// dependencies compare equal.
    pub fn use_memo<T, D>(
        &mut self,
        compute: impl FnOnce() -> T,
        deps: Option<D>,
    ) -> Result<Rc<T>, Interrupt>
    where
        T: 'static,
        D: PartialEq + 'static,
    {
        let slot = self.hooks("use_memo")?.use_hook("use_memo", || {
            Ok(Rc::new(RefCell::new(MemoState::<T, D> {
                value: None,
                deps: None,
            })))
        })?;
        let mut state = slot.borrow_mut();

        if let (Some(value), Some(previous), Some(next)) = (&state.value, &state.deps, &deps) {
            if previous == next {
                return Ok(Rc::clone(value));
            }
        }

        let value = Rc::new(compute());
        state.value = Some(Rc::clone(&value));
        state.deps = deps;
        Ok(value)
    }

    pub fn use_callback<F, D>(&mut self, callback: F, deps: Option<D>) -> Result<Rc<F>, Interrupt>
    where
        F: 'static,
        D: PartialEq + 'static,
    {
        self.use_memo(|| callback, deps)
    }

    /// A box whose contents persist verbatim across renders.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Result<RefHandle<T>, Interrupt> {
        let inner = self
            .hooks("use_ref")?
            .use_hook("use_ref", || Ok(Rc::new(RefCell::new(init()))))?;
        Ok(RefHandle { inner })
    }

    /// Read the current value of `context`.
    pub fn use_context<T: Clone + 'static>(&mut self, context: &Context<T>) -> Result<T, Interrupt> {
        let hooks = self.hooks("use_context")?;
        if !hooks.is_rendering() {
            return Err(HookError::OutsideRender { hook: "use_context" }.into());
        }
        Ok(self.contexts.read_typed(context))
    }

    /// An identifier stable for this instance and call position.
    pub fn use_id(&mut self) -> Result<Rc<str>, Interrupt> {
        let hooks = self.hooks("use_id")?;
        let id = format!(":p{}-{}:", hooks.instance, hooks.cursor);
        hooks.use_hook("use_id", || Ok(Rc::<str>::from(id)))
    }

    /// Reserve an effect slot. Effects never run during a prepass.
    pub fn use_effect<D: 'static>(
        &mut self,
        _effect: impl FnOnce() + 'static,
        _deps: Option<D>,
    ) -> Result<(), Interrupt> {
        self.hooks("use_effect")?.use_hook("use_effect", || Ok(()))
    }

    /// Reserve a layout-effect slot. Like [`use_effect`](Self::use_effect), never run.
    pub fn use_layout_effect<D: 'static>(
        &mut self,
        _effect: impl FnOnce() + 'static,
        _deps: Option<D>,
    ) -> Result<(), Interrupt> {
        self.hooks("use_layout_effect")?
            .use_hook("use_layout_effect", || Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::create_context;

    fn render<R>(hooks: &mut HookList, f: impl FnOnce(&mut RenderCx<'_>) -> R) -> R {
        let props = Props::none();
        let contexts = ContextStore::new();
        hooks.begin_render();
        let mut cx = RenderCx::new(&props, &contexts).with_hooks(hooks);
        f(&mut cx)
    }

    #[test]
    fn state_persists_across_renders() {
        let mut hooks = HookList::new(0);

        let setter = render(&mut hooks, |cx| {
            let (value, setter) = cx.use_state(|| 42).unwrap();
            assert_eq!(value, 42);
            setter
        });
        hooks.end_render().unwrap();
        setter.set(100);

        render(&mut hooks, |cx| {
            let (value, _) = cx.use_state(|| 0).unwrap();
            assert_eq!(value, 100);
        });
        hooks.end_render().unwrap();
    }

    #[test]
    fn setter_bumps_generation() {
        let mut hooks = HookList::new(0);
        let before = hooks.generation();
        render(&mut hooks, |cx| {
            let (_, setter) = cx.use_state(|| 1).unwrap();
            setter.update(|n| n + 1);
        });
        assert_eq!(hooks.generation(), before + 1);
    }

    #[test]
    fn suspended_initializer_is_retried_without_a_slot() {
        let mut hooks = HookList::new(0);

        let result = render(&mut hooks, |cx| {
            cx.use_state_with::<i32>(|| Err(Interrupt::Suspend(crate::Thenable::resolved())))
        });
        assert!(result.is_err_and(|i| i.is_suspend()));
        assert!(hooks.is_empty());
        hooks.rewind();

        render(&mut hooks, |cx| {
            let (value, _) = cx.use_state_with(|| Ok("loaded")).unwrap();
            assert_eq!(value, "loaded");
        });
        hooks.end_render().unwrap();
        assert_eq!(hooks.len(), 1);
    }

    #[test]
    fn memo_is_identical_while_deps_match() {
        let mut hooks = HookList::new(0);
        let mut computed = 0;

        let first = render(&mut hooks, |cx| {
            cx.use_memo(|| { computed += 1; String::from("v") }, Some(1)).unwrap()
        });
        hooks.end_render().unwrap();
        let second = render(&mut hooks, |cx| {
            cx.use_memo(|| { computed += 1; String::from("w") }, Some(1)).unwrap()
        });
        hooks.end_render().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(computed, 1);

        let third = render(&mut hooks, |cx| {
            cx.use_memo(|| { computed += 1; String::from("x") }, Some(2)).unwrap()
        });
        assert_eq!(*third, "x");
        assert_eq!(computed, 2);
    }

    #[test]
    fn memo_without_deps_always_recomputes() {
        let mut hooks = HookList::new(0);
        let first = render(&mut hooks, |cx| cx.use_memo(|| 1, None::<()>).unwrap());
        hooks.end_render().unwrap();
        let second = render(&mut hooks, |cx| cx.use_memo(|| 1, None::<()>).unwrap());
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn ref_survives_rewind() {
        let mut hooks = HookList::new(0);
        let first = render(&mut hooks, |cx| {
            let handle = cx.use_ref(|| 0).unwrap();
            handle.set(42);
            handle
        });
        hooks.rewind();

        let second = render(&mut hooks, |cx| cx.use_ref(|| 0).unwrap());
        assert!(first.ptr_eq(&second));
        assert_eq!(second.get(), 42);
    }

    #[test]
    fn reducer_applies_actions() {
        let mut hooks = HookList::new(0);
        let dispatch = render(&mut hooks, |cx| {
            let (value, dispatch) = cx.use_reducer(|n: &i32, by: i32| n + by, || 1).unwrap();
            assert_eq!(value, 1);
            dispatch
        });
        hooks.end_render().unwrap();
        dispatch.dispatch(4);

        render(&mut hooks, |cx| {
            let (value, _) = cx.use_reducer(|n: &i32, by: i32| n + by, || 1).unwrap();
            assert_eq!(value, 5);
        });
    }

    #[test]
    fn id_is_stable_per_slot() {
        let mut hooks = HookList::new(7);
        let first = render(&mut hooks, |cx| cx.use_id().unwrap());
        hooks.end_render().unwrap();
        let second = render(&mut hooks, |cx| cx.use_id().unwrap());
        assert_eq!(first, second);
        assert_eq!(&*first, ":p7-0:");
    }

    #[test]
    fn use_context_reads_provided_value() {
        let ctx = create_context("default");
        let mut contexts = ContextStore::new();
        contexts.push(ctx.id(), Value::new("provided"));
        let props = Props::none();
        let mut hooks = HookList::new(0);
        hooks.begin_render();

        let mut cx = RenderCx::new(&props, &contexts).with_hooks(&mut hooks);
        assert_eq!(cx.use_context(&ctx).unwrap(), "provided");
        assert_eq!(cx.read_context(&ctx), "provided");
    }

    #[test]
    fn hooks_without_a_list_fail() {
        let props = Props::none();
        let contexts = ContextStore::new();
        let mut cx = RenderCx::new(&props, &contexts);

        let Err(Interrupt::Fault(fault)) = cx.use_state(|| 0) else {
            panic!("expected a fault");
        };
        assert!(matches!(
            fault.downcast_ref::<HookError>(),
            Some(HookError::OutsideRender { hook: "use_state" })
        ));
    }

    #[test]
    fn hook_on_idle_list_fails() {
        let props = Props::none();
        let contexts = ContextStore::new();
        let mut hooks = HookList::new(0);
        let mut cx = RenderCx::new(&props, &contexts).with_hooks(&mut hooks);
        assert!(cx.use_ref(|| 0).is_err());
    }

    #[test]
    fn count_mismatch_is_reported() {
        let mut hooks = HookList::new(0);
        render(&mut hooks, |cx| {
            cx.use_state(|| 0).unwrap();
            cx.use_state(|| 0).unwrap();
        });
        hooks.end_render().unwrap();

        render(&mut hooks, |cx| {
            cx.use_state(|| 0).unwrap();
        });
        assert!(matches!(
            hooks.end_render(),
            Err(HookError::CountMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn order_mismatch_is_reported() {
        let mut hooks = HookList::new(0);
        render(&mut hooks, |cx| {
            cx.use_state(|| 0).unwrap();
            cx.use_ref(|| 0).unwrap();
        });
        hooks.end_render().unwrap();

        let result = render(&mut hooks, |cx| cx.use_ref(|| 0).map(|_| ()));
        let Err(Interrupt::Fault(fault)) = result else {
            panic!("expected a fault");
        };
        assert!(matches!(
            fault.downcast_ref::<HookError>(),
            Some(HookError::OrderMismatch { index: 0, previous: "use_state", current: "use_ref" })
        ));
    }
}
