//! Depth-first walk over a tree.
//!
//! A [`Traversal`] keeps an explicit stack of sibling lists instead of
//! recursing, so a walk can stop after any node and be resumed later from
//! the queue. Each stack level may carry a [`Restore`] that undoes what its
//! parent node changed in the render state (a provided context value, a
//! merged legacy context, an enclosing boundary) once the level is finished.

mod class;
mod function;
mod lazy;

use crate::frame::{Boundary, BoundaryTarget, Frame, RenderFrame, Work};
use crate::render_state::{RenderSnapshot, RenderState};
use crate::scheduler::Engine;
use prepass_core::{
    ClassInstance, ComponentType, ContextId, Fault, HookList, LegacyContext, Node, Props, Thenable,
};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

pub(crate) struct Traversal {
    state: RenderState,
    stack: Vec<Level>,
}

struct Level {
    pending: VecDeque<Node>,
    restore: Option<Restore>,
}

/// Render state to reinstate when a level is finished.
pub(crate) struct Restore {
    legacy: LegacyContext,
    boundary: Option<Rc<Boundary>>,
    provided: Option<ContextId>,
}

impl Traversal {
    /// A walk of `root` from an empty render state.
    pub fn new(root: Node) -> Self {
        let mut traversal = Self {
            state: RenderState::new(),
            stack: Vec::new(),
        };
        traversal.descend(vec![root], None);
        traversal
    }

    /// An empty walk in the state captured by `snapshot`.
    pub fn resume(snapshot: &RenderSnapshot) -> Self {
        Self {
            state: RenderState::restore(snapshot),
            stack: Vec::new(),
        }
    }

    /// Visit nodes until the walk is finished or its time slice is spent.
    ///
    /// A walk that runs out of time puts itself at the head of the queue.
    pub fn run(mut self, engine: &mut Engine) -> Result<(), Fault> {
        let started = Instant::now();
        while let Some(level) = self.stack.last_mut() {
            match level.pending.pop_front() {
                Some(node) => self.visit(engine, node)?,
                None => {
                    if let Some(restore) = self.stack.pop().and_then(|level| level.restore) {
                        self.unwind(restore);
                    }
                }
            }

            if !self.stack.is_empty() && engine.budget_spent(started) {
                tracing::trace!(depth = self.stack.len(), "time slice spent, yielding");
                engine.queue.push_front(Frame::Yield(self));
                return Ok(());
            }
        }
        Ok(())
    }

    /// Queue `children` to be visited before any remaining siblings.
    pub fn descend(&mut self, children: Vec<Node>, restore: Option<Restore>) {
        self.stack.push(Level {
            pending: children.into(),
            restore,
        });
    }

    fn visit(&mut self, engine: &mut Engine, node: Node) -> Result<(), Fault> {
        match node {
            Node::Empty | Node::Text(_) => {}
            Node::List(children) | Node::Fragment(children) => self.descend(children, None),
            Node::Host(host) => self.descend(host.children, None),
            Node::Portal(portal) => self.descend(portal.children, None),
            Node::Provider(provider) => {
                let id = provider.context.id();
                let restore = self.restore_point(Some(id));
                self.state.contexts.push(id, provider.value);
                self.descend(provider.children, Some(restore));
            }
            Node::Consumer(consumer) => {
                let value = self.state.contexts.read(&consumer.context);
                let child = (consumer.render)(&value);
                self.descend(vec![child], None);
            }
            Node::Suspense(suspense) => {
                let boundary = Boundary::new(
                    BoundaryTarget::Suspense {
                        fallback: *suspense.fallback,
                    },
                    self.state.capture(),
                );
                let restore = self.restore_point(None);
                self.state.boundary = Some(Rc::new(boundary));
                self.descend(suspense.children, Some(restore));
            }
            Node::Component(ref element) => {
                let (component, props) = (element.component.clone(), element.props.clone());
                return self.mount(engine, component, props, &node);
            }
            Node::ForwardRef(ref wrapper) | Node::Memo(ref wrapper) => {
                let (component, props) = (wrapper.inner.clone(), wrapper.props.clone());
                return self.mount(engine, component, props, &node);
            }
            Node::Lazy(lazy) => return self.visit_lazy(engine, lazy.component, lazy.props),
        }
        Ok(())
    }

    /// Create an instance of `component`, show `node` to the visitor and
    /// render the instance.
    ///
    /// `node` is the element as written in the tree, so wrappers and lazy
    /// elements reach the visitor unchanged.
    fn mount(&mut self, engine: &mut Engine, component: ComponentType, props: Props, node: &Node) -> Result<(), Fault> {
        match component {
            ComponentType::Function(function) => {
                let suspended = engine.visitor.visit(node, None);
                let hooks = HookList::new(engine.next_instance());
                self.start(engine, suspended, Work::Function { function, props, hooks })
            }
            ComponentType::Class(class) => {
                let instance = ClassInstance::construct(class, props, &self.state.legacy);
                let suspended = engine.visitor.visit(node, Some(&instance));
                self.start(engine, suspended, Work::Class { instance })
            }
        }
    }

    fn start(&mut self, engine: &mut Engine, suspended: Option<Thenable>, work: Work) -> Result<(), Fault> {
        match suspended {
            Some(thenable) => {
                tracing::debug!(component = work.name(), "visitor suspended component");
                self.suspend(engine, thenable, work);
                Ok(())
            }
            None => self.perform(engine, work),
        }
    }

    /// Render the component described by `work` and queue its output.
    pub fn perform(&mut self, engine: &mut Engine, work: Work) -> Result<(), Fault> {
        match work {
            Work::Function {
                function,
                props,
                hooks,
            } => self.render_function(engine, function, props, hooks),
            Work::Class { instance } => self.render_class(engine, instance),
            Work::Lazy { component, props } => self.resume_lazy(engine, component, props),
        }
    }

    /// Park `work` until `thenable` settles.
    fn suspend(&mut self, engine: &mut Engine, thenable: Thenable, work: Work) {
        tracing::debug!(
            component = work.name(),
            queued = engine.queue.len() + 1,
            "component suspended"
        );
        engine.queue.push_back(Frame::Render(RenderFrame {
            thenable,
            snapshot: self.state.capture(),
            work,
        }));
    }

    /// Route a fault to the enclosing boundary, or fail the walk.
    fn fail(&mut self, engine: &mut Engine, fault: Fault) -> Result<(), Fault> {
        match &self.state.boundary {
            Some(boundary) => {
                tracing::debug!(?boundary, %fault, "fault routed to boundary");
                engine.queue.push_back(Frame::Catch {
                    fault,
                    boundary: Rc::clone(boundary),
                });
                Ok(())
            }
            None => Err(fault),
        }
    }

    fn restore_point(&self, provided: Option<ContextId>) -> Restore {
        Restore {
            legacy: self.state.legacy.clone(),
            boundary: self.state.boundary.clone(),
            provided,
        }
    }

    fn unwind(&mut self, restore: Restore) {
        if let Some(id) = restore.provided {
            self.state.contexts.pop(id);
        }
        self.state.legacy = restore.legacy;
        self.state.boundary = restore.boundary;
    }
}
