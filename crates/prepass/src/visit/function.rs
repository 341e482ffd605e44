use super::Traversal;
use crate::frame::Work;
use crate::render_state::RenderState;
use crate::scheduler::Engine;
use prepass_core::{Fault, FunctionComponent, HookList, Interrupt, Props, RenderCx, RenderResult};
use std::rc::Rc;

impl Traversal {
    pub(super) fn render_function(
        &mut self,
        engine: &mut Engine,
        function: Rc<FunctionComponent>,
        props: Props,
        mut hooks: HookList,
    ) -> Result<(), Fault> {
        let limit = engine.config.re_render_limit;
        match render(&function, &props, &mut hooks, &self.state, limit) {
            Ok(node) => {
                self.descend(vec![node], None);
                Ok(())
            }
            Err(Interrupt::Suspend(thenable)) => {
                self.suspend(engine, thenable, Work::Function { function, props, hooks });
                Ok(())
            }
            Err(Interrupt::Fault(fault)) => self.fail(engine, fault),
        }
    }
}

/// Render `function`, repeating the render while it updates its own state.
///
/// A render that is interrupted leaves the hook list rewound to slot 0
/// with every slot created so far intact.
fn render(
    function: &FunctionComponent,
    props: &Props,
    hooks: &mut HookList,
    state: &RenderState,
    limit: usize,
) -> RenderResult {
    let legacy = state.legacy.mask(function.context_types());
    let mut re_renders = 0;

    loop {
        let generation = hooks.generation();
        hooks.begin_render();
        let result = {
            let mut cx = RenderCx::new(props, &state.contexts)
                .with_hooks(hooks)
                .with_legacy_context(legacy.clone());
            function.render(&mut cx)
        };

        let node = match result {
            Ok(node) => node,
            Err(interrupt) => {
                hooks.rewind();
                return Err(interrupt);
            }
        };

        if hooks.generation() == generation {
            hooks.end_render()?;
            return Ok(node);
        }
        if re_renders >= limit {
            tracing::warn!(
                component = function.name(),
                limit,
                "too many render-phase updates, keeping last output"
            );
            hooks.end_render()?;
            return Ok(node);
        }

        re_renders += 1;
        hooks.rewind();
    }
}
