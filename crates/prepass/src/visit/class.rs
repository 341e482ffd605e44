use super::Traversal;
use crate::frame::{Boundary, BoundaryTarget, Work};
use crate::scheduler::Engine;
use prepass_core::{ClassInstance, ClassOutput, Fault, Interrupt};
use std::rc::Rc;

impl Traversal {
    pub(super) fn render_class(&mut self, engine: &mut Engine, instance: Rc<ClassInstance>) -> Result<(), Fault> {
        let ClassOutput { node, child_context } = match instance.render(&self.state.contexts) {
            Ok(output) => output,
            Err(Interrupt::Suspend(thenable)) => {
                self.suspend(engine, thenable, Work::Class { instance });
                return Ok(());
            }
            Err(Interrupt::Fault(fault)) => return self.fail(engine, fault),
        };

        let restore = self.restore_point(None);

        // A boundary that already caught a fault hands further faults upward.
        if instance.is_boundary() && instance.caught().is_none() {
            let boundary = Boundary::new(
                BoundaryTarget::Class {
                    instance: Rc::clone(&instance),
                },
                self.state.capture(),
            );
            self.state.boundary = Some(Rc::new(boundary));
        }
        if let Some(values) = child_context {
            self.state.legacy = self.state.legacy.merge(values);
        }

        self.descend(vec![node], Some(restore));
        Ok(())
    }
}
