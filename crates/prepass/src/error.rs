//! Errors that end a prepass.

use prepass_core::Fault;

#[derive(Debug, thiserror::Error)]
pub enum PrepassError {
    /// A component failed and no boundary encloses it.
    #[error("render failed: {0}")]
    Fault(Fault),

    /// A suspension was rejected and no boundary encloses it.
    #[error("suspension rejected: {0}")]
    Rejected(Fault),
}

impl PrepassError {
    /// The fault exactly as it was raised.
    pub fn fault(&self) -> &Fault {
        match self {
            PrepassError::Fault(fault) | PrepassError::Rejected(fault) => fault,
        }
    }

    pub fn into_fault(self) -> Fault {
        match self {
            PrepassError::Fault(fault) | PrepassError::Rejected(fault) => fault,
        }
    }
}
