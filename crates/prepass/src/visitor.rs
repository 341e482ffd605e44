//! Caller-supplied visitor.

use prepass_core::{ClassInstance, Node, Thenable};

/// Observes every component element the prepass mounts.
///
/// Returning a thenable suspends the element: it is not rendered until the
/// thenable settles. For class components the freshly constructed instance is
/// passed along; updates queued on its [`Updater`](prepass_core::Updater) are
/// seen by its first render.
///
/// Any `FnMut(&Node, Option<&ClassInstance>) -> Option<Thenable>` closure is a
/// visitor.
pub trait Visitor {
    fn visit(&mut self, node: &Node, instance: Option<&ClassInstance>) -> Option<Thenable>;
}

impl<F> Visitor for F
where
    F: FnMut(&Node, Option<&ClassInstance>) -> Option<Thenable>,
{
    fn visit(&mut self, node: &Node, instance: Option<&ClassInstance>) -> Option<Thenable> {
        self(node, instance)
    }
}

/// Visitor that observes nothing and never suspends.
pub(crate) fn skip(_node: &Node, _instance: Option<&ClassInstance>) -> Option<Thenable> {
    None
}
