//! Lazily loaded components.
//!
//! A [`LazyComponent`] wraps a loader that produces the real component on
//! demand. The payload moves through four states:
//!
//! ```text
//! Uninitialized --resolve--> Pending --ok--> Resolved
//!                                    \--err--> Rejected
//! ```
//!
//! The loader is invoked at most once per lazy component, no matter how many
//! elements reference it or how often it is resolved.

use crate::element::{ComponentType, LazyElement, Node, Props};
use crate::thenable::{Fault, Thenable};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

/// What a loader produced.
pub enum LazyExport {
    /// The component itself.
    Component(ComponentType),
    /// A module object; its `default` export is the component.
    Module { default: Option<ComponentType> },
    /// Anything else. Treated as an invalid export.
    Opaque,
}

impl LazyExport {
    fn into_component(self) -> Option<ComponentType> {
        match self {
            LazyExport::Component(component) => Some(component),
            LazyExport::Module { default } => default,
            LazyExport::Opaque => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LazyStatus {
    Uninitialized,
    Pending,
    Resolved,
    Rejected,
}

type Loader = Box<dyn FnOnce() -> LocalBoxFuture<'static, Result<LazyExport, Fault>>>;

enum LazyPayload {
    Uninitialized(Loader),
    /// The loader is running and has not returned its future yet.
    Loading,
    Pending(Thenable),
    Resolved(ComponentType),
    Rejected(Option<Fault>),
}

impl LazyPayload {
    fn status(&self) -> LazyStatus {
        match self {
            LazyPayload::Uninitialized(_) => LazyStatus::Uninitialized,
            LazyPayload::Loading | LazyPayload::Pending(_) => LazyStatus::Pending,
            LazyPayload::Resolved(_) => LazyStatus::Resolved,
            LazyPayload::Rejected(_) => LazyStatus::Rejected,
        }
    }
}

/// Result of asking a lazy component for its target.
#[derive(Debug)]
pub enum LazyResolution {
    Ready(ComponentType),
    /// Loading; render again once the thenable settles.
    Pending(Thenable),
    /// The loader failed or produced an invalid export.
    Failed,
}

/// A component whose definition is loaded on demand.
#[derive(Clone)]
pub struct LazyComponent {
    payload: Rc<RefCell<LazyPayload>>,
}

impl LazyComponent {
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<LazyExport, Fault>> + 'static,
    {
        let loader: Loader = Box::new(move || loader().boxed_local());
        Self {
            payload: Rc::new(RefCell::new(LazyPayload::Uninitialized(loader))),
        }
    }

    /// A lazy component that is already resolved.
    pub fn resolved(component: ComponentType) -> Self {
        Self {
            payload: Rc::new(RefCell::new(LazyPayload::Resolved(component))),
        }
    }

    pub fn status(&self) -> LazyStatus {
        self.payload.borrow().status()
    }

    pub fn element(&self, props: Props) -> Node {
        Node::Lazy(LazyElement {
            component: self.clone(),
            props,
        })
    }

    /// The resolved component, without starting a load.
    pub fn peek(&self) -> Option<ComponentType> {
        match &*self.payload.borrow() {
            LazyPayload::Resolved(component) => Some(component.clone()),
            _ => None,
        }
    }

    /// The rejection fault, if the loader itself failed.
    pub fn fault(&self) -> Option<Fault> {
        match &*self.payload.borrow() {
            LazyPayload::Rejected(fault) => fault.clone(),
            _ => None,
        }
    }

    /// Resolve the component, starting the loader on first use.
    ///
    /// The returned thenable always fulfills; once it has, the payload is
    /// either resolved or rejected.
    ///
    /// The loader may use this lazy component while it runs. Resolving it
    /// again from inside the loader yields an already-fulfilled thenable, so
    /// the caller simply asks again later.
    pub fn resolve(&self) -> LazyResolution {
        let loader = {
            let mut payload = self.payload.borrow_mut();
            match &*payload {
                LazyPayload::Resolved(component) => return LazyResolution::Ready(component.clone()),
                LazyPayload::Pending(thenable) => return LazyResolution::Pending(thenable.clone()),
                LazyPayload::Loading => return LazyResolution::Pending(Thenable::resolved()),
                LazyPayload::Rejected(_) => return LazyResolution::Failed,
                LazyPayload::Uninitialized(_) => {}
            }
            match std::mem::replace(&mut *payload, LazyPayload::Loading) {
                LazyPayload::Uninitialized(loader) => loader,
                _ => return LazyResolution::Failed,
            }
        };

        tracing::debug!("starting lazy component loader");
        let load = loader();
        let target = Rc::downgrade(&self.payload);
        let thenable = Thenable::new(async move {
            let settled = match load.await {
                Ok(export) => match export.into_component() {
                    Some(component) => {
                        tracing::debug!(component = component.name(), "lazy component resolved");
                        LazyPayload::Resolved(component)
                    }
                    None => {
                        tracing::debug!("lazy loader produced no component");
                        LazyPayload::Rejected(None)
                    }
                },
                Err(fault) => {
                    tracing::debug!(%fault, "lazy loader failed");
                    LazyPayload::Rejected(Some(fault))
                }
            };
            settle(&target, settled);
            Ok(())
        });

        *self.payload.borrow_mut() = LazyPayload::Pending(thenable.clone());
        LazyResolution::Pending(thenable)
    }
}

fn settle(target: &Weak<RefCell<LazyPayload>>, settled: LazyPayload) {
    if let Some(payload) = target.upgrade() {
        *payload.borrow_mut() = settled;
    }
}

impl fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyComponent")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn leaf() -> ComponentType {
        ComponentType::function("Leaf", |_| Ok(Node::text("leaf")))
    }

    #[tokio::test]
    async fn loader_runs_once_and_resolves() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let lazy = LazyComponent::new(move || {
            counter.set(counter.get() + 1);
            async { Ok(LazyExport::Component(leaf())) }
        });
        assert_eq!(lazy.status(), LazyStatus::Uninitialized);

        let LazyResolution::Pending(first) = lazy.resolve() else {
            panic!("expected pending");
        };
        let LazyResolution::Pending(second) = lazy.clone().resolve() else {
            panic!("expected pending");
        };
        assert_eq!(lazy.status(), LazyStatus::Pending);

        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(lazy.status(), LazyStatus::Resolved);
        assert!(matches!(lazy.resolve(), LazyResolution::Ready(c) if c.name() == "Leaf"));
    }

    #[tokio::test]
    async fn module_default_export_is_used() {
        let lazy = LazyComponent::new(|| async {
            Ok(LazyExport::Module {
                default: Some(leaf()),
            })
        });
        let LazyResolution::Pending(thenable) = lazy.resolve() else {
            panic!("expected pending");
        };
        thenable.await.unwrap();
        assert!(lazy.peek().is_some());
    }

    #[tokio::test]
    async fn invalid_export_rejects() {
        let lazy = LazyComponent::new(|| async { Ok(LazyExport::Opaque) });
        let LazyResolution::Pending(thenable) = lazy.resolve() else {
            panic!("expected pending");
        };
        assert!(thenable.await.is_ok());
        assert_eq!(lazy.status(), LazyStatus::Rejected);
        assert!(lazy.fault().is_none());
        assert!(matches!(lazy.resolve(), LazyResolution::Failed));
    }

    #[tokio::test]
    async fn loader_error_is_kept() {
        let fault = Fault::msg("chunk missing");
        let raised = fault.clone();
        let lazy = LazyComponent::new(move || async move { Err(raised) });
        let LazyResolution::Pending(thenable) = lazy.resolve() else {
            panic!("expected pending");
        };
        thenable.await.unwrap();
        assert!(lazy.fault().is_some_and(|f| f.ptr_eq(&fault)));
    }

    #[tokio::test]
    async fn loader_may_use_its_own_component() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<LazyComponent>>> = Rc::new(RefCell::new(None));
        let lazy = LazyComponent::new({
            let seen = seen.clone();
            let slot = slot.clone();
            move || {
                if let Some(this) = slot.borrow().as_ref() {
                    seen.borrow_mut().push(this.status());
                    assert!(matches!(this.resolve(), LazyResolution::Pending(_)));
                }
                async { Ok(LazyExport::Component(leaf())) }
            }
        });
        *slot.borrow_mut() = Some(lazy.clone());

        let LazyResolution::Pending(thenable) = lazy.resolve() else {
            panic!("expected pending");
        };
        assert_eq!(*seen.borrow(), vec![LazyStatus::Pending]);
        assert_eq!(lazy.status(), LazyStatus::Pending);

        thenable.await.unwrap();
        assert_eq!(lazy.status(), LazyStatus::Resolved);
        slot.borrow_mut().take();
    }

    #[test]
    fn pre_resolved_is_ready() {
        let lazy = LazyComponent::resolved(leaf());
        assert_eq!(lazy.status(), LazyStatus::Resolved);
        assert!(matches!(lazy.resolve(), LazyResolution::Ready(_)));
    }
}
