//! Deferred units of work.

use crate::render_state::RenderSnapshot;
use crate::visit::Traversal;
use prepass_core::{ClassInstance, Fault, FunctionComponent, HookList, LazyComponent, Node, Props, Thenable};
use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

pub(crate) type FrameQueue = VecDeque<Frame>;

pub(crate) enum Frame {
    /// A walk that ran out of its time slice. Resumed after one host turn.
    Yield(Traversal),
    /// A suspended component, rendered again once its thenable settles.
    Render(RenderFrame),
    /// A fault waiting to be delivered to a boundary.
    Catch { fault: Fault, boundary: Rc<Boundary> },
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Yield(_) => "yield",
            Frame::Render(_) => "render",
            Frame::Catch { .. } => "catch",
        }
    }
}

pub(crate) struct RenderFrame {
    pub thenable: Thenable,
    /// State at the point of suspension.
    pub snapshot: RenderSnapshot,
    pub work: Work,
}

/// What to render when a frame resumes.
pub(crate) enum Work {
    Function {
        function: Rc<FunctionComponent>,
        props: Props,
        /// Slots kept from the abandoned render.
        hooks: HookList,
    },
    Class {
        instance: Rc<ClassInstance>,
    },
    Lazy {
        component: LazyComponent,
        props: Props,
    },
}

impl Work {
    pub fn name(&self) -> &str {
        match self {
            Work::Function { function, .. } => function.name(),
            Work::Class { instance } => instance.name(),
            Work::Lazy { .. } => "lazy",
        }
    }
}

/// A catch point for faults raised below it.
///
/// A boundary recovers once. Faults reaching it after the first are dropped,
/// since its subtree has already been replaced by the recovery output.
pub(crate) struct Boundary {
    pub target: BoundaryTarget,
    /// State outside the boundary, used to render its recovery output.
    pub snapshot: RenderSnapshot,
    tripped: Cell<bool>,
}

impl Boundary {
    pub fn new(target: BoundaryTarget, snapshot: RenderSnapshot) -> Self {
        Self {
            target,
            snapshot,
            tripped: Cell::new(false),
        }
    }

    /// Mark the boundary as recovering. False if it already was.
    pub fn trip(&self) -> bool {
        !self.tripped.replace(true)
    }
}

pub(crate) enum BoundaryTarget {
    /// A suspense boundary; recovers by rendering its fallback.
    Suspense { fallback: Node },
    /// An error-boundary class; recovers by rendering again with the fault.
    Class { instance: Rc<ClassInstance> },
}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            BoundaryTarget::Suspense { .. } => f.write_str("Boundary(suspense)"),
            BoundaryTarget::Class { instance } => write!(f, "Boundary({})", instance.name()),
        }
    }
}
