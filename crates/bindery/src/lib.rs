#![forbid(unsafe_code)]

//! Bindery public facade crate.
//!
//! [`Bindery`] bundles a member resolver, a weak allocator and an observer
//! provider into one explicitly passed context. The [`prelude`] re-exports
//! the types most bindings need.

pub mod context;
#[cfg(feature = "tracing-json")]
pub mod logging;

pub use context::Bindery;

pub mod prelude {
    pub use bindery_core as core;
    pub use bindery_observe as observe;

    pub use crate::context::Bindery;
    pub use bindery_core::{
        BindingError, BindingObject, ChangeEvent, DynamicObject, MemberBuilder, MemberDescriptor,
        ObservableList, TypeBuilder, TypeRef, Value, ValueType,
    };
    pub use bindery_observe::{
        LastMember, MemberPath, ObserverConfig, ObserverFlags, ObserverListener, PathObserver,
        Resolution,
    };
}
