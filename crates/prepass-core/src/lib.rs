//! Core types shared by the prepass engine and the components it walks.

pub mod class;
pub mod context;
pub mod element;
pub mod error;
pub mod hooks;
pub mod lazy;
pub mod thenable;
pub mod value;

pub use class::{ClassComponent, ClassInstance, ClassOutput, ClassType, Updater};
pub use context::{
    create_context, AnyContext, Context, ContextId, ContextSnapshot, ContextStore, LegacyContext,
    LegacyValues,
};
pub use element::{
    ComponentElement, ComponentType, ConsumerElement, FunctionComponent, HostElement,
    LazyElement, Node, PortalElement, Props, ProviderElement, SuspenseElement, WrapperElement,
};
pub use error::HookError;
pub use hooks::{Dispatch, HookList, HookMeta, RefHandle, RenderCx, StateSetter};
pub use lazy::{LazyComponent, LazyExport, LazyResolution, LazyStatus};
pub use thenable::{Fault, Interrupt, RenderResult, Thenable};
pub use value::Value;
