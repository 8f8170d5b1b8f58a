//! Dynamic values flowing through member paths.

use std::fmt;
use std::sync::Arc;

use crate::object::{BindingObject, ObjectRef};
use crate::primitives;
use crate::types::{TypeKey, TypeRef};

/// A value read from or written to a member.
///
/// `Null` and `Unset` are both *absent*: `Null` is an explicit empty value,
/// `Unset` means nothing was ever stored. Objects compare by identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Unset,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Object(ObjectRef),
}

impl Value {
    /// Wrap a binding object.
    pub fn object<T: BindingObject>(object: Arc<T>) -> Self {
        Self::Object(object)
    }

    /// Whether the value is `Null` or `Unset`.
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Null | Self::Unset)
    }

    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow the wrapped object as a concrete type.
    pub fn downcast_ref<T: BindingObject>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Runtime type of the value; `None` for absent values.
    #[must_use]
    pub fn runtime_type(&self) -> Option<TypeRef> {
        match self {
            Self::Null | Self::Unset => None,
            Self::Bool(_) => Some(primitives::boolean()),
            Self::Int(_) => Some(primitives::int64()),
            Self::Float(_) => Some(primitives::double()),
            Self::Str(_) => Some(primitives::string()),
            Self::Object(o) => Some(o.type_info()),
        }
    }

    /// Human-readable type name, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> Arc<str> {
        match self.runtime_type() {
            Some(ty) => ty.shared_name(),
            None if self.is_unset() => Arc::from("unset"),
            None => Arc::from("null"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Unset, Self::Unset) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Unset => f.write_str("Unset"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Object(o) => write!(f, "Object({})", o.type_info().name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Declared type of a member's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Any,
    Bool,
    Int,
    Float,
    Str,
    Object(TypeKey),
}
