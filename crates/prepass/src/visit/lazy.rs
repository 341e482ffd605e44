use super::Traversal;
use crate::frame::Work;
use crate::scheduler::Engine;
use prepass_core::{Fault, LazyComponent, LazyResolution, Props};

impl Traversal {
    pub(super) fn visit_lazy(&mut self, engine: &mut Engine, component: LazyComponent, props: Props) -> Result<(), Fault> {
        let node = component.element(props.clone());
        if !engine.config.resolve_lazy {
            return match component.peek() {
                Some(target) => self.mount(engine, target, props, &node),
                // Loading is up to the visitor; a thenable from it parks the
                // element until the visitor's load has settled.
                None => match engine.visitor.visit(&node, None) {
                    Some(thenable) => {
                        tracing::debug!(status = ?component.status(), "visitor suspended lazy component");
                        self.suspend(engine, thenable, Work::Lazy { component, props });
                        Ok(())
                    }
                    None => {
                        tracing::debug!(status = ?component.status(), "leaving lazy component unresolved");
                        Ok(())
                    }
                },
            };
        }

        match component.resolve() {
            LazyResolution::Ready(target) => self.mount(engine, target, props, &node),
            LazyResolution::Pending(thenable) => {
                self.suspend(engine, thenable, Work::Lazy { component, props });
                Ok(())
            }
            LazyResolution::Failed => {
                tracing::debug!("skipping lazy component that failed to load");
                Ok(())
            }
        }
    }

    /// Continue a lazy element whose thenable has settled.
    ///
    /// The visitor is not asked again about a payload that is still
    /// unresolved; the element renders nothing.
    pub(super) fn resume_lazy(&mut self, engine: &mut Engine, component: LazyComponent, props: Props) -> Result<(), Fault> {
        match component.peek() {
            Some(target) => {
                let node = component.element(props.clone());
                self.mount(engine, target, props, &node)
            }
            None if engine.config.resolve_lazy => self.visit_lazy(engine, component, props),
            None => {
                tracing::debug!(status = ?component.status(), "lazy component still unresolved after suspension");
                Ok(())
            }
        }
    }
}
