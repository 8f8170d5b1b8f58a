#![forbid(unsafe_code)]

//! Bindable objects.
//!
//! Anything reachable through a member path implements [`BindingObject`].
//! Objects that publish change notifications expose a [`ChangeNotifier`].
//! [`DynamicObject`] is a ready-made property bag for types declared with
//! [`TypeBuilder::dynamic_property`](crate::types::TypeBuilder::dynamic_property).

use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock};

use ahash::AHashMap;

use crate::member::MemberBuilder;
use crate::notify::ChangeNotifier;
use crate::sync::{read, write};
use crate::types::TypeRef;
use crate::value::{Value, ValueType};

/// An object that member paths can walk through.
pub trait BindingObject: Any + Send + Sync {
    /// Runtime type, used to resolve members on this object.
    fn type_info(&self) -> TypeRef;

    /// Change notifier, for objects that publish member changes.
    fn notifier(&self) -> Option<&ChangeNotifier> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a binding object.
pub type ObjectRef = Arc<dyn BindingObject>;

/// Property bag whose members are declared on its [`TypeRef`].
///
/// Reading a slot that was never written yields [`Value::Unset`]. Writing a
/// different value raises a change notification on the slot's name.
pub struct DynamicObject {
    ty: TypeRef,
    slots: RwLock<AHashMap<Arc<str>, Value>>,
    notifier: ChangeNotifier,
}

impl DynamicObject {
    #[must_use]
    pub fn new(ty: &TypeRef) -> Arc<Self> {
        Arc::new(Self {
            ty: Arc::clone(ty),
            slots: RwLock::new(AHashMap::new()),
            notifier: ChangeNotifier::new(),
        })
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        read(&self.slots).get(name).cloned().unwrap_or(Value::Unset)
    }

    /// Store `value` in the `name` slot. Returns whether the slot changed.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        {
            let mut slots = write(&self.slots);
            if slots.get(name) == Some(&value) {
                return false;
            }
            slots.insert(Arc::from(name), value);
        }
        self.notifier.notify(name);
        true
    }

    /// Raise a change for every member at once.
    pub fn notify_all(&self) {
        self.notifier.notify("");
    }

    pub(crate) fn slot_member(name: &str, value_type: ValueType) -> MemberBuilder {
        let slot: Arc<str> = Arc::from(name);
        let write_slot = Arc::clone(&slot);
        MemberBuilder::property(name)
            .value_type(value_type)
            .observable()
            .get_as::<Self>(move |obj, _| Ok(obj.get(&slot)))
            .set_as::<Self>(move |obj, _, value| {
                obj.set(&write_slot, value);
                Ok(())
            })
    }
}

impl BindingObject for DynamicObject {
    fn type_info(&self) -> TypeRef {
        Arc::clone(&self.ty)
    }

    fn notifier(&self) -> Option<&ChangeNotifier> {
        Some(&self.notifier)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicObject")
            .field("type", &self.ty.name())
            .field("slots", &read(&self.slots).len())
            .finish()
    }
}
