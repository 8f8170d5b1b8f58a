#![forbid(unsafe_code)]

//! Path observers.
//!
//! A [`PathObserver`] keeps a resolved view of `target.path` over a live
//! object graph. It resolves lazily (first listener or first query),
//! subscribes to every observable intermediate link, re-resolves whenever a
//! link changes, and tells its [`ObserverListener`]s about the outcome.
//!
//! | Kind | Path | Notes |
//! |------|------|-------|
//! | [`ObserverKind::Empty`] | `""` | last member is the target itself |
//! | [`ObserverKind::SinglePath`] | `Name` | target and member, no intermediates |
//! | [`ObserverKind::MultiPath`] | `A.B.C` | every intermediate link observed |
//! | [`ObserverKind::RootMultiPath`] | `A.B.C` | only the first link observed |
//! | `Method*` | any | also tracks a method or event on the terminal value |
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──(listener / query)──▶ Resolving ──▶ Resolved | Unavailable | Failed
//!        │                                  ▲                     │
//!        │                                  └──(link changed)─────┘
//!        └──────────────(dispose)──────────▶ Disposed
//! ```
//!
//! # Invariants
//!
//! 1. At most one resolution pass runs at a time per observer. A change that
//!    lands during a pass marks the observer dirty and triggers exactly one
//!    follow-up pass (unless update coalescing is disabled).
//! 2. A pass ends in exactly one of: resolved, unavailable (an intermediate
//!    value was absent, or an optional member was missing) or failed.
//! 3. The observer holds the target and the penultimate value weakly unless
//!    [`ObserverFlags::RETAIN_TARGET`] is set.
//! 4. Removing the last listener drops only the terminal (and method)
//!    subscription; intermediate subscriptions live until the next pass or
//!    disposal.
//! 5. `dispose` is idempotent, and a no-op with
//!    [`ObserverFlags::NON_DISPOSABLE`]. A pass finishing after disposal
//!    discards its result.
//!
//! # Failure Modes
//!
//! - Resolution errors (missing member, failing getter, panicking getter) are
//!   stored as the last error and delivered through
//!   [`ObserverListener::on_error`]; they never propagate to the code that
//!   raised the change.
//! - A panicking listener is logged and skipped; other listeners still run.

mod base;
mod empty;
mod listeners;
mod method;
mod multi;
mod single;
#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use bindery_core::{BindingError, ChangeEvent, MemberDescriptor, Result, Value};
use bitflags::bitflags;

pub use base::PathObserver;
pub(crate) use base::ObserverParts;

bitflags! {
    /// Configuration flags of an observer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObserverFlags: u8 {
        /// Subscribe to intermediate links and re-resolve on change.
        const OBSERVABLE = 1 << 0;
        /// A missing member makes the path unavailable instead of failing.
        const OPTIONAL = 1 << 1;
        /// Reuse the previous member chain and only re-read values.
        const HAS_STABLE_PATH = 1 << 2;
        /// Observe only the first link of a multi-segment path.
        const ROOT_ONLY = 1 << 3;
        /// Ignore `dispose`; the owner reuses the observer.
        const NON_DISPOSABLE = 1 << 4;
        /// Hold the target strongly.
        const RETAIN_TARGET = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    Empty,
    SinglePath,
    MultiPath,
    RootMultiPath,
    MethodEmpty,
    MethodSingle,
    MethodMulti,
}

impl ObserverKind {
    pub const fn is_method(self) -> bool {
        matches!(self, Self::MethodEmpty | Self::MethodSingle | Self::MethodMulti)
    }
}

/// Tri-state outcome of a query: unavailability is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Unavailable,
    Failed(BindingError),
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BindingError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Resolved(value) => Resolution::Resolved(f(value)),
            Self::Unavailable => Resolution::Unavailable,
            Self::Failed(err) => Resolution::Failed(err),
        }
    }
}

/// The terminal member together with the value it is evaluated against.
#[derive(Clone, PartialEq)]
pub struct LastMember {
    target: Value,
    member: MemberDescriptor,
}

impl LastMember {
    pub(crate) fn new(target: Value, member: MemberDescriptor) -> Self {
        Self { target, member }
    }

    /// The penultimate value (the object holding the member).
    pub fn target(&self) -> &Value {
        &self.target
    }

    pub fn member(&self) -> &MemberDescriptor {
        &self.member
    }

    pub fn get_value(&self) -> Result<Value> {
        self.member.get_value(&self.target)
    }

    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        self.member.set_value(&self.target, value.into())
    }
}

impl fmt::Debug for LastMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LastMember")
            .field("target", &self.target)
            .field("member", &self.member.name())
            .finish()
    }
}

/// The root target and the full resolved member chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMembers {
    target: Value,
    members: Arc<[MemberDescriptor]>,
}

impl PathMembers {
    pub fn target(&self) -> &Value {
        &self.target
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn last(&self) -> Option<&MemberDescriptor> {
        self.members.last()
    }
}

/// Receiver of observer notifications. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait ObserverListener: Send + Sync {
    /// A resolution pass finished (resolved or unavailable).
    fn on_path_members_changed(&self, observer: &PathObserver) {}

    /// The terminal member changed, or the tracked event fired.
    fn on_last_member_changed(&self, observer: &PathObserver, event: &ChangeEvent) {}

    /// A resolution pass failed.
    fn on_error(&self, observer: &PathObserver, error: &BindingError) {}
}
