//! State threaded through a walk and captured at every suspension.
//!
//! A walk owns its [`RenderState`] outright. When a subtree suspends, the
//! parts of the state that subtree can observe are copied into a
//! [`RenderSnapshot`] stored on its frame; resuming the frame builds a fresh
//! state from that snapshot. Walks never share mutable state, so walks
//! resumed in any order cannot see each other's providers or legacy context.

use crate::frame::Boundary;
use prepass_core::{ContextSnapshot, ContextStore, LegacyContext};
use std::rc::Rc;

pub(crate) struct RenderState {
    pub contexts: ContextStore,
    pub legacy: LegacyContext,
    /// Nearest enclosing boundary.
    pub boundary: Option<Rc<Boundary>>,
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            contexts: ContextStore::new(),
            legacy: LegacyContext::new(),
            boundary: None,
        }
    }

    pub fn capture(&self) -> RenderSnapshot {
        RenderSnapshot {
            contexts: self.contexts.snapshot(),
            legacy: self.legacy.clone(),
            boundary: self.boundary.clone(),
        }
    }

    pub fn restore(snapshot: &RenderSnapshot) -> Self {
        Self {
            contexts: ContextStore::from_snapshot(&snapshot.contexts),
            legacy: snapshot.legacy.clone(),
            boundary: snapshot.boundary.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RenderSnapshot {
    contexts: ContextSnapshot,
    legacy: LegacyContext,
    pub boundary: Option<Rc<Boundary>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepass_core::{create_context, LegacyValues, Value};

    #[test]
    fn restore_reinstates_captured_values() {
        let ctx = create_context("default");
        let mut state = RenderState::new();
        state.contexts.push(ctx.id(), Value::new("outer"));
        state.contexts.push(ctx.id(), Value::new("inner"));
        state.legacy = state
            .legacy
            .merge(LegacyValues::from([("key".to_string(), Value::new(1))]));

        let snapshot = state.capture();
        state.contexts.pop(ctx.id());
        state.legacy = LegacyContext::new();

        let restored = RenderState::restore(&snapshot);
        assert_eq!(restored.contexts.read_typed(&ctx), "inner");
        assert_eq!(restored.legacy.value::<i32>("key"), Some(&1));
        assert!(restored.boundary.is_none());
    }
}
