//! Errors raised by misuse of the hooks API.

use crate::thenable::{Fault, Interrupt};

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error(
        "`{hook}` called outside of render; hooks can only be called while a function component renders"
    )]
    OutsideRender { hook: &'static str },

    #[error(
        "hook count mismatch: previous render had {expected} hooks, current render has {actual} (render {render})"
    )]
    CountMismatch {
        expected: usize,
        actual: usize,
        render: usize,
    },

    #[error(
        "hook order mismatch at index {index}: previous render called `{previous}`, current render called `{current}`"
    )]
    OrderMismatch {
        index: usize,
        previous: &'static str,
        current: &'static str,
    },

    #[error("hook value type mismatch at index {index}: slot holds `{stored}`")]
    TypeMismatch { index: usize, stored: &'static str },
}

impl From<HookError> for Interrupt {
    fn from(error: HookError) -> Self {
        Interrupt::Fault(Fault::new(error))
    }
}
