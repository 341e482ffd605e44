//! Prepass - walk a component tree ahead of server rendering so that every
//! asynchronous data dependency has resolved before the real render runs.
//!
//! The walk renders each component once. A component that is not ready
//! returns [`Interrupt::Suspend`] with a [`Thenable`]; its subtree is parked
//! on a queue while the rest of the tree carries on, and it is rendered again
//! (with its hook state intact) once the thenable settles.
//!
//! # Quick Start
//!
//! ```ignore
//! use prepass::prelude::*;
//!
//! let profile = ComponentType::function("Profile", move |cx| {
//!     let user = cx.use_ref(|| None::<String>)?;
//!     if user.borrow().is_none() {
//!         let user = user.clone();
//!         return Err(Interrupt::suspend(async move {
//!             user.set(Some(fetch_user().await));
//!         }));
//!     }
//!     Ok(Node::text(user.get().unwrap_or_default()))
//! });
//!
//! prepass::run(profile.element(Props::none())).await?;
//! ```
//!
//! # What runs when
//!
//! [`run`] walks every subtree that does not suspend before it returns. The
//! returned [`Prepass`] future only has work left if something suspended, the
//! walk ran past its time slice, or a fault is waiting for a boundary.
//!
//! - Suspended components resume in the order they suspended.
//! - A walk that runs longer than [`PrepassConfig::yield_after`] hands control
//!   back to the runtime for one turn before continuing.
//! - Faults go to the nearest suspense boundary or error-boundary class. With
//!   no boundary, the prepass fails with that exact fault.
//!
//! # Visitors
//!
//! [`run_with`] takes a [`Visitor`] that sees every mounted component
//! element (and the instance, for class components) before it renders.
//! Returning a thenable from the visitor suspends that element.

mod config;
mod error;
mod frame;
mod render_state;
mod scheduler;
mod visit;
mod visitor;


pub mod prelude {
    //! Common imports for writing components and running a prepass.
    pub use crate::{run, run_with, Prepass, PrepassConfig, PrepassError, Visitor};
    pub use prepass_core::{
        create_context, ClassComponent, ClassInstance, ComponentType, Context, Fault,
        FunctionComponent, Interrupt, LazyComponent, LazyExport, Node, Props, RenderCx,
        RenderResult, Thenable, Updater, Value,
    };
}

pub use config::{PrepassConfig, DEFAULT_RE_RENDER_LIMIT, DEFAULT_YIELD_AFTER};
pub use error::PrepassError;
pub use visitor::Visitor;

pub use prepass_core as core;
pub use prepass_core::{Interrupt, Node, Thenable};

use futures_util::future::{self, FutureExt, LocalBoxFuture};
use scheduler::Engine;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::Instrument;
use visit::Traversal;

/// Prepass `root` with no visitor and the default configuration.
pub fn run(root: Node) -> Prepass {
    run_with(root, visitor::skip, PrepassConfig::default())
}

/// Prepass `root`, showing every mounted component to `visitor`.
///
/// Every subtree that does not suspend is walked before this returns. A
/// fault raised during that walk with no boundary to catch it is reported
/// by the returned future without doing any further work.
pub fn run_with<V>(root: Node, visitor: V, config: PrepassConfig) -> Prepass
where
    V: Visitor + 'static,
{
    let mut engine = Engine::new(Box::new(visitor), config);
    if let Err(fault) = engine.walk(Traversal::new(root)) {
        tracing::debug!(%fault, "prepass failed during the synchronous walk");
        return Prepass::settled(Err(PrepassError::Fault(fault)));
    }

    let queued = engine.queue.len();
    tracing::debug!(queued, "synchronous walk finished");
    Prepass {
        inner: engine
            .drain()
            .instrument(tracing::debug_span!("prepass", queued))
            .boxed_local(),
    }
}

/// The remaining work of a prepass.
///
/// Resolves once every suspended subtree has been rendered, or with the
/// first fault no boundary caught. Must be polled on the thread that
/// created it.
#[must_use = "suspended components are only resumed when the prepass is awaited"]
pub struct Prepass {
    inner: LocalBoxFuture<'static, Result<(), PrepassError>>,
}

impl Prepass {
    fn settled(result: Result<(), PrepassError>) -> Self {
        Self {
            inner: future::ready(result).boxed_local(),
        }
    }
}

impl Future for Prepass {
    type Output = Result<(), PrepassError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for Prepass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prepass").finish_non_exhaustive()
    }
}
