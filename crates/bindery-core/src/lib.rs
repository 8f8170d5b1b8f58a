#![forbid(unsafe_code)]

//! Object model for Bindery member paths.
//!
//! This crate provides the pieces a path observer walks over:
//!
//! - [`types`]: registration-time type descriptors and member tables.
//! - [`value`]: the dynamic [`Value`] flowing through paths.
//! - [`object`]: the [`BindingObject`] trait and [`DynamicObject`].
//! - [`member`]: [`MemberDescriptor`] and its builder.
//! - [`notify`]: weak change notification with RAII subscriptions.
//! - [`weak`]: non-owning value handles and the injectable allocator.
//! - [`collections`]: the built-in [`ObservableList`].
//! - [`primitives`]: runtime types for primitive values.

pub mod collections;
pub mod error;
pub mod member;
pub mod notify;
pub mod object;
pub mod primitives;
pub mod sync;
pub mod types;
pub mod value;
pub mod weak;

pub use collections::ObservableList;
pub use error::{BindingError, Result};
pub use member::{MemberBuilder, MemberDescriptor, MemberFlags, MemberKind};
pub use notify::{ChangeEvent, ChangeListener, ChangeNotifier, Subscription};
pub use object::{BindingObject, DynamicObject, ObjectRef};
pub use types::{TypeBuilder, TypeInfo, TypeKey, TypeKind, TypeRef};
pub use value::{Value, ValueType};
pub use weak::{StdWeakAllocator, WeakAllocator, WeakValue};
