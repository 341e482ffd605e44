//! Suspension and fault values.
//!
//! A render either produces a [`Node`] or is interrupted. An interruption
//! is one of two very different things:
//!
//! - [`Interrupt::Suspend`]: the component is not ready yet. It hands the
//!   engine a [`Thenable`] to wait on and will be rendered again once it
//!   settles. This is not an error.
//! - [`Interrupt::Fault`]: something actually went wrong. The fault is routed
//!   to the nearest boundary or ends the whole prepass.
//!
//! # Example
//!
//! ```ignore
//! let loaded = Rc::new(Cell::new(false));
//!
//! let user = ComponentType::function("User", move |_cx| {
//!     if !loaded.get() {
//!         let loaded = loaded.clone();
//!         return Err(Interrupt::Suspend(Thenable::new(async move {
//!             loaded.set(true);
//!             Ok(())
//!         })));
//!     }
//!     Ok(Node::text("ready"))
//! });
//! ```

use crate::element::Node;
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// The outcome of rendering a component.
pub type RenderResult = Result<Node, Interrupt>;

// ============================================================================
// Fault
// ============================================================================

/// An error raised while rendering.
///
/// Clones share the underlying error, so the fault that reaches the caller
/// of a prepass can be compared by identity with the one a component raised.
#[derive(Clone)]
pub struct Fault(Rc<dyn Error + 'static>);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl Fault {
    pub fn new<E: Error + 'static>(error: E) -> Self {
        Self(Rc::new(error))
    }

    /// A fault carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Whether both faults wrap the very same error.
    pub fn ptr_eq(&self, other: &Fault) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

// ============================================================================
// Thenable
// ============================================================================

type Settle = LocalBoxFuture<'static, Result<(), Fault>>;

/// A pending result a render is waiting on.
///
/// Thenables are shared: cloning one gives another handle to the same
/// underlying future, which runs once no matter how many frames await it.
#[derive(Clone)]
pub struct Thenable {
    inner: Shared<Settle>,
}

impl Thenable {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), Fault>> + 'static,
    {
        Self {
            inner: future.boxed_local().shared(),
        }
    }

    /// Wait on any future, discarding its output.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future + 'static,
    {
        Self::new(future.map(|_| Ok(())))
    }

    /// A thenable that is already fulfilled.
    pub fn resolved() -> Self {
        Self::new(async { Ok(()) })
    }

    /// A thenable that is already rejected with `fault`.
    pub fn rejected(fault: Fault) -> Self {
        Self::new(async move { Err(fault) })
    }

    /// Whether the thenable has settled and been observed by some poll.
    pub fn is_settled(&self) -> bool {
        self.inner.peek().is_some()
    }
}

impl Future for Thenable {
    type Output = Result<(), Fault>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for Thenable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thenable")
            .field("settled", &self.is_settled())
            .finish()
    }
}

// ============================================================================
// Interrupt
// ============================================================================

/// Why a render did not produce output.
#[derive(Clone, Debug)]
pub enum Interrupt {
    /// Not ready; render again once the thenable settles.
    Suspend(Thenable),
    /// A real failure.
    Fault(Fault),
}

impl Interrupt {
    /// Suspend on an arbitrary future.
    pub fn suspend<F: Future + 'static>(future: F) -> Self {
        Interrupt::Suspend(Thenable::from_future(future))
    }

    /// Fail with any error type.
    pub fn fail<E: Error + 'static>(error: E) -> Self {
        Interrupt::Fault(Fault::new(error))
    }

    pub fn is_suspend(&self) -> bool {
        matches!(self, Interrupt::Suspend(_))
    }
}

impl From<Thenable> for Interrupt {
    fn from(thenable: Thenable) -> Self {
        Interrupt::Suspend(thenable)
    }
}

impl From<Fault> for Interrupt {
    fn from(fault: Fault) -> Self {
        Interrupt::Fault(fault)
    }
}
