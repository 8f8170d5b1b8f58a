//! Non-owning handles to values.
//!
//! Observers must never keep the observed graph alive. [`WeakValue`] holds
//! objects through [`Weak`] and stores primitives inline. Hosts may supply
//! their own [`WeakAllocator`]; [`StdWeakAllocator`] is the default.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::object::BindingObject;
use crate::value::Value;

#[derive(Clone)]
enum Repr {
    Inline(Value),
    Object(Weak<dyn BindingObject>),
}

/// Weak handle to a [`Value`].
#[derive(Clone)]
pub struct WeakValue {
    repr: Repr,
}

impl WeakValue {
    #[must_use]
    pub fn new(value: &Value) -> Self {
        let repr = match value {
            Value::Object(object) => Repr::Object(Arc::downgrade(object)),
            other => Repr::Inline(other.clone()),
        };
        Self { repr }
    }

    /// Recover the value, or `None` once the object was dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<Value> {
        match &self.repr {
            Repr::Inline(value) => Some(value.clone()),
            Repr::Object(weak) => weak.upgrade().map(Value::Object),
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        match &self.repr {
            Repr::Inline(_) => true,
            Repr::Object(weak) => weak.strong_count() > 0,
        }
    }

    /// Address identity of the referenced object, if this handle points at
    /// one. Stays stable after the object dies.
    #[must_use]
    pub fn id(&self) -> Option<usize> {
        match &self.repr {
            Repr::Inline(_) => None,
            Repr::Object(weak) => Some(weak.as_ptr().cast::<()>() as usize),
        }
    }

    /// Whether this handle refers to `value` (identity for objects).
    #[must_use]
    pub fn refers_to(&self, value: &Value) -> bool {
        match (&self.repr, value) {
            (Repr::Object(weak), Value::Object(object)) => {
                std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(object))
            }
            (Repr::Inline(inline), other) => inline == other,
            _ => false,
        }
    }
}

impl fmt::Debug for WeakValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Inline(value) => f.debug_tuple("WeakValue").field(value).finish(),
            Repr::Object(_) => f
                .debug_struct("WeakValue")
                .field("alive", &self.is_alive())
                .finish(),
        }
    }
}

/// Source of weak handles, injected into observers.
pub trait WeakAllocator: Send + Sync {
    fn downgrade(&self, value: &Value) -> WeakValue;
}

/// Default allocator backed by [`std::sync::Weak`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdWeakAllocator;

impl WeakAllocator for StdWeakAllocator {
    fn downgrade(&self, value: &Value) -> WeakValue {
        WeakValue::new(value)
    }
}
