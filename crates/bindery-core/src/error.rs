//! Error taxonomy shared by every Bindery crate.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Surfaced as |
//! |---------|-------|-------------|
//! | Unknown member | Path segment has no member on the type | [`BindingError::InvalidBindingMember`] |
//! | Duplicate registration | Attached member registered twice without rewrite | [`BindingError::DuplicateBindingMember`] |
//! | Accessor failure | Getter/setter/indexer rejected the call | [`BindingError::Accessor`] and friends |
//! | Use after dispose | Observer queried after `dispose()` | [`BindingError::Disposed`] |
//!
//! Errors are `Clone` so an observer can store the last one and hand it to
//! every listener.

use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindingError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("invalid binding member: '{path}' is not a member of '{type_name}'")]
    InvalidBindingMember { type_name: Arc<str>, path: Arc<str> },

    #[error("duplicate binding member: '{path}' is already registered on '{type_name}'")]
    DuplicateBindingMember { type_name: Arc<str>, path: Arc<str> },

    #[error("member '{member}' is not readable")]
    NotReadable { member: Arc<str> },

    #[error("member '{member}' is not writable")]
    NotWritable { member: Arc<str> },

    #[error("member '{member}' cannot be invoked")]
    NotInvocable { member: Arc<str> },

    #[error("member '{member}' expects a '{expected}' target, got '{actual}'")]
    TargetMismatch {
        member: Arc<str>,
        expected: Arc<str>,
        actual: Arc<str>,
    },

    #[error("member '{member}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        member: Arc<str>,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} is out of range (length {len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("{0}")]
    Accessor(String),

    #[error("observer has been disposed")]
    Disposed,
}

impl BindingError {
    #[must_use]
    pub fn invalid_member(type_name: impl Into<Arc<str>>, path: impl Into<Arc<str>>) -> Self {
        Self::InvalidBindingMember {
            type_name: type_name.into(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn duplicate_member(type_name: impl Into<Arc<str>>, path: impl Into<Arc<str>>) -> Self {
        Self::DuplicateBindingMember {
            type_name: type_name.into(),
            path: path.into(),
        }
    }

    /// Free-form failure raised by a user accessor.
    #[must_use]
    pub fn accessor(message: impl Into<String>) -> Self {
        Self::Accessor(message.into())
    }

    /// Whether the error comes from caller misuse rather than a failing read.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidBindingMember { .. } | Self::DuplicateBindingMember { .. }
        )
    }
}
