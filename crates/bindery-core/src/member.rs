#![forbid(unsafe_code)]

//! Member descriptors: resolved handles to one accessible attribute of a type.
//!
//! A [`MemberDescriptor`] wraps the accessor closures registered for a
//! property, field, event, method or constant, together with its capability
//! [`MemberFlags`]. Descriptors are built through [`MemberBuilder`] (usually
//! inside a [`TypeBuilder`](crate::types::TypeBuilder)) and are immutable
//! afterwards; cloning is a reference-count bump.
//!
//! # Invariants
//!
//! 1. A descriptor never changes after construction. Binding indexer
//!    arguments produces a new descriptor.
//! 2. Two descriptors with the same declaring type, name, kind, flags, arity
//!    and bound arguments compare equal, whether or not they share storage.
//! 3. Static members always receive `Value::Null` as their target.
//!
//! # Failure Modes
//!
//! | Call | Missing capability | Error |
//! |------|--------------------|-------|
//! | `get_value` | not readable | [`BindingError::NotReadable`] |
//! | `set_value` | not writable | [`BindingError::NotWritable`] |
//! | `invoke` | no invoker | [`BindingError::NotInvocable`] |
//! | `invoke` | wrong argument count | [`BindingError::ArgumentCount`] |
//!
//! `try_observe` never fails; a member that cannot be observed on a target
//! yields `None`.

use std::fmt;
use std::sync::{Arc, Weak};

use bitflags::bitflags;

use crate::error::{BindingError, Result};
use crate::notify::{ChangeListener, Subscription};
use crate::object::BindingObject;
use crate::types::{TypeKey, TypeRef};
use crate::value::{Value, ValueType};

/// Reads a member: `(target, index arguments) -> value`.
pub type Getter = Arc<dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync>;
/// Writes a member: `(target, index arguments, value)`.
pub type Setter = Arc<dyn Fn(&Value, &[Value], Value) -> Result<()> + Send + Sync>;
/// Calls a method: `(target, arguments) -> result`.
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync>;
/// Custom subscription hook for members whose changes are not published
/// through the target's [`ChangeNotifier`](crate::notify::ChangeNotifier).
pub type ObserveFn = Arc<
    dyn Fn(&Value, &MemberDescriptor, Weak<dyn ChangeListener>) -> Option<Subscription>
        + Send
        + Sync,
>;

/// Target handed to static members.
static STATIC_TARGET: Value = Value::Null;

bitflags! {
    /// Capabilities of a member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const OBSERVABLE = 1 << 2;
        const STATIC = 1 << 3;
        /// Registered from outside the declaring type (attached members).
        const EXTENSION = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Field,
    Event,
    Method,
    Constant,
}

impl MemberKind {
    /// Whether members of this kind carry a value (as opposed to events and
    /// methods).
    #[inline]
    pub const fn is_accessor(self) -> bool {
        matches!(self, Self::Property | Self::Field | Self::Constant)
    }
}

// ---------------------------------------------------------------------------
// MemberBuilder
// ---------------------------------------------------------------------------

/// Builder for [`MemberDescriptor`].
///
/// Capability flags follow the registered closures: a getter makes the
/// member readable, a setter writable.
#[must_use]
pub struct MemberBuilder {
    name: Arc<str>,
    kind: MemberKind,
    flags: MemberFlags,
    value_type: ValueType,
    arity: usize,
    channel: Option<Arc<str>>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    invoker: Option<Invoker>,
    observe: Option<ObserveFn>,
}

impl MemberBuilder {
    fn new(name: impl Into<Arc<str>>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
            flags: MemberFlags::empty(),
            value_type: ValueType::Any,
            arity: 0,
            channel: None,
            getter: None,
            setter: None,
            invoker: None,
            observe: None,
        }
    }

    pub fn property(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, MemberKind::Property)
    }

    pub fn field(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, MemberKind::Field)
    }

    /// An event member. Events are observable on their own name.
    pub fn event(name: impl Into<Arc<str>>) -> Self {
        let mut builder = Self::new(name, MemberKind::Event);
        builder.flags |= MemberFlags::OBSERVABLE;
        builder
    }

    /// A method taking exactly `arity` arguments.
    pub fn method(name: impl Into<Arc<str>>, arity: usize) -> Self {
        let mut builder = Self::new(name, MemberKind::Method);
        builder.arity = arity;
        builder
    }

    /// An indexed property (`[a, b, ...]`) with `arity` index parameters.
    /// Indexer changes are published on the `Item[]` channel.
    pub fn indexer(arity: usize) -> Self {
        let mut builder = Self::new("Item", MemberKind::Property);
        builder.arity = arity;
        builder.channel = Some(Arc::from("Item[]"));
        builder
    }

    /// A constant value, readable and never observable.
    pub fn constant(name: impl Into<Arc<str>>, value: Value) -> Self {
        Self::new(name, MemberKind::Constant).getter(move |_, _| Ok(value.clone()))
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn getter(
        mut self,
        getter: impl Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.getter = Some(Arc::new(getter));
        self.flags |= MemberFlags::READABLE;
        self
    }

    pub fn setter(
        mut self,
        setter: impl Fn(&Value, &[Value], Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(Arc::new(setter));
        self.flags |= MemberFlags::WRITABLE;
        self
    }

    pub fn invoker(
        mut self,
        invoker: impl Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    /// Getter for targets of the concrete object type `T`.
    pub fn get_as<T: BindingObject>(
        self,
        getter: impl Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        let name = Arc::clone(&self.name);
        self.getter(move |target, args| getter(downcast_target::<T>(&name, target)?, args))
    }

    /// Setter for targets of the concrete object type `T`.
    pub fn set_as<T: BindingObject>(
        self,
        setter: impl Fn(&T, &[Value], Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        let name = Arc::clone(&self.name);
        self.setter(move |target, args, value| {
            setter(downcast_target::<T>(&name, target)?, args, value)
        })
    }

    /// Invoker for targets of the concrete object type `T`.
    pub fn invoke_as<T: BindingObject>(
        self,
        invoker: impl Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        let name = Arc::clone(&self.name);
        self.invoker(move |target, args| invoker(downcast_target::<T>(&name, target)?, args))
    }

    /// Publish changes through the target's notifier.
    pub fn observable(mut self) -> Self {
        self.flags |= MemberFlags::OBSERVABLE;
        self
    }

    /// Notification channel, when it differs from the member name.
    pub fn channel(mut self, channel: impl Into<Arc<str>>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Custom subscription hook. Implies [`MemberFlags::OBSERVABLE`].
    pub fn observe_with(
        mut self,
        observe: impl Fn(&Value, &MemberDescriptor, Weak<dyn ChangeListener>) -> Option<Subscription>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.observe = Some(Arc::new(observe));
        self.flags |= MemberFlags::OBSERVABLE;
        self
    }

    pub fn static_member(mut self) -> Self {
        self.flags |= MemberFlags::STATIC;
        self
    }

    pub fn extension(mut self) -> Self {
        self.flags |= MemberFlags::EXTENSION;
        self
    }

    pub(crate) fn build(self, declaring_type: TypeKey, declaring_name: &Arc<str>) -> MemberDescriptor {
        MemberDescriptor(Arc::new(MemberInner {
            name: self.name,
            kind: self.kind,
            flags: self.flags,
            value_type: self.value_type,
            declaring_type,
            declaring_type_name: Arc::clone(declaring_name),
            arity: self.arity,
            index_args: Arc::from(Vec::new()),
            channel: self.channel,
            getter: self.getter,
            setter: self.setter,
            invoker: self.invoker,
            observe: self.observe,
        }))
    }

    /// Finish a member declared on `ty` from outside its builder, typically
    /// an attached member.
    #[must_use]
    pub fn build_for(self, ty: &TypeRef) -> MemberDescriptor {
        self.build(ty.key(), &ty.shared_name())
    }
}

impl fmt::Debug for MemberBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberBuilder")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

fn downcast_target<'a, T: BindingObject>(member: &Arc<str>, target: &'a Value) -> Result<&'a T> {
    target
        .downcast_ref::<T>()
        .ok_or_else(|| BindingError::TargetMismatch {
            member: Arc::clone(member),
            expected: Arc::from(short_type_name::<T>()),
            actual: target.type_name(),
        })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

// ---------------------------------------------------------------------------
// MemberDescriptor
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct MemberInner {
    name: Arc<str>,
    kind: MemberKind,
    flags: MemberFlags,
    value_type: ValueType,
    declaring_type: TypeKey,
    declaring_type_name: Arc<str>,
    arity: usize,
    index_args: Arc<[Value]>,
    channel: Option<Arc<str>>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    invoker: Option<Invoker>,
    observe: Option<ObserveFn>,
}

/// Immutable, shared handle to one member of a type.
#[derive(Clone)]
pub struct MemberDescriptor(Arc<MemberInner>);

impl MemberDescriptor {
    /// Constant member whose value is the target itself.
    #[must_use]
    pub fn identity(ty: &TypeRef) -> Self {
        MemberBuilder::new("", MemberKind::Constant)
            .getter(|target, _| Ok(target.clone()))
            .build_for(ty)
    }

    /// Permissive read/write constant that reads `Unset` and ignores writes.
    #[must_use]
    pub fn placeholder(name: impl Into<Arc<str>>, ty: &TypeRef) -> Self {
        MemberBuilder::new(name, MemberKind::Constant)
            .getter(|_, _| Ok(Value::Unset))
            .setter(|_, _, _| Ok(()))
            .build_for(ty)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.0.kind
    }

    #[inline]
    pub fn flags(&self) -> MemberFlags {
        self.0.flags
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.0.value_type
    }

    #[inline]
    pub fn declaring_type(&self) -> TypeKey {
        self.0.declaring_type
    }

    pub fn declaring_type_name(&self) -> &str {
        &self.0.declaring_type_name
    }

    /// Index parameters for indexers, parameters for methods, zero otherwise.
    #[inline]
    pub fn arity(&self) -> usize {
        self.0.arity
    }

    pub fn is_indexer(&self) -> bool {
        self.0.kind == MemberKind::Property && self.0.arity > 0
    }

    /// Index arguments bound by the resolver.
    pub fn index_args(&self) -> &[Value] {
        &self.0.index_args
    }

    /// Channel on which changes to this member are published.
    pub fn channel(&self) -> &str {
        self.0.channel.as_deref().unwrap_or(&self.0.name)
    }

    pub fn is_readable(&self) -> bool {
        self.0.flags.contains(MemberFlags::READABLE)
    }

    pub fn is_writable(&self) -> bool {
        self.0.flags.contains(MemberFlags::WRITABLE)
    }

    pub fn is_observable(&self) -> bool {
        self.0.flags.contains(MemberFlags::OBSERVABLE)
    }

    pub fn is_static(&self) -> bool {
        self.0.flags.contains(MemberFlags::STATIC)
    }

    fn effective_target<'a>(&self, target: &'a Value) -> &'a Value {
        if self.is_static() { &STATIC_TARGET } else { target }
    }

    pub fn get_value(&self, target: &Value) -> Result<Value> {
        match &self.0.getter {
            Some(getter) if self.is_readable() => {
                getter(self.effective_target(target), &self.0.index_args)
            }
            _ => Err(BindingError::NotReadable {
                member: Arc::clone(&self.0.name),
            }),
        }
    }

    pub fn set_value(&self, target: &Value, value: Value) -> Result<()> {
        match &self.0.setter {
            Some(setter) if self.is_writable() => {
                setter(self.effective_target(target), &self.0.index_args, value)
            }
            _ => Err(BindingError::NotWritable {
                member: Arc::clone(&self.0.name),
            }),
        }
    }

    pub fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value> {
        let Some(invoker) = &self.0.invoker else {
            return Err(BindingError::NotInvocable {
                member: Arc::clone(&self.0.name),
            });
        };
        if args.len() != self.0.arity {
            return Err(BindingError::ArgumentCount {
                member: Arc::clone(&self.0.name),
                expected: self.0.arity,
                actual: args.len(),
            });
        }
        invoker(self.effective_target(target), args)
    }

    /// Subscribe `listener` to changes of this member on `target`.
    ///
    /// Returns `None` when the member is not observable or the target
    /// publishes no notifications.
    pub fn try_observe(
        &self,
        target: &Value,
        listener: Weak<dyn ChangeListener>,
    ) -> Option<Subscription> {
        if !self.is_observable() {
            return None;
        }
        if let Some(observe) = &self.0.observe {
            return observe(self.effective_target(target), self, listener);
        }
        let notifier = target.as_object()?.notifier()?;
        Some(notifier.subscribe(Some(self.channel()), listener))
    }

    /// Copy of this descriptor with `args` bound as index arguments.
    #[must_use]
    pub fn with_index_args(&self, args: Vec<Value>) -> Self {
        let mut inner = (*self.0).clone();
        inner.index_args = Arc::from(args);
        Self(Arc::new(inner))
    }

    /// Whether both handles share the same storage.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for MemberDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (&*self.0, &*other.0);
        a.declaring_type == b.declaring_type
            && a.name == b.name
            && a.kind == b.kind
            && a.flags == b.flags
            && a.arity == b.arity
            && a.index_args == b.index_args
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("MemberDescriptor");
        s.field("type", &self.0.declaring_type_name)
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("flags", &self.0.flags);
        if !self.0.index_args.is_empty() {
            s.field("index_args", &self.0.index_args);
        }
        s.finish()
    }
}
