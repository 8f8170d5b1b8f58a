#![forbid(unsafe_code)]

//! Registration-time type descriptors.
//!
//! A [`TypeInfo`] is the runtime shape of a bindable type: its name, its
//! position in the class/interface hierarchy, and the table of members it
//! declares. Tables are built once through [`TypeBuilder`] and never change,
//! which is what lets the resolver memoize structural lookups forever.
//!
//! # Invariants
//!
//! 1. Every type gets a process-unique [`TypeKey`]; equality and hashing of
//!    `TypeInfo` go through the key only.
//! 2. `is_assignable_from` is reflexive and follows the base chain plus every
//!    transitively implemented interface.
//! 3. `is_subclass_of` is strict (a type is never its own subclass) and only
//!    follows base classes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::member::{MemberBuilder, MemberDescriptor};
use crate::object::DynamicObject;
use crate::value::ValueType;

/// Global counter for unique type keys.
static TYPE_KEY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u64);

impl TypeKey {
    fn next() -> Self {
        Self(TYPE_KEY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw key value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Shared handle to a type descriptor.
pub type TypeRef = Arc<TypeInfo>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Primitive,
}

/// Immutable descriptor of a bindable type.
pub struct TypeInfo {
    key: TypeKey,
    name: Arc<str>,
    kind: TypeKind,
    base: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    members: Vec<MemberDescriptor>,
}

impl TypeInfo {
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared copy of the name, for error values and descriptors.
    #[must_use]
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Interfaces declared directly on this type (not inherited ones).
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Members declared directly on this type, in registration order.
    pub fn declared_members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Iterate this type followed by its base chain.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Every interface implemented by this type, its bases, or by other
    /// interfaces, without duplicates. Order is depth-first, nearest first.
    #[must_use]
    pub fn all_interfaces(&self) -> Vec<&TypeInfo> {
        let mut out: Vec<&TypeInfo> = Vec::new();
        let mut stack: Vec<&TypeInfo> = Vec::new();
        for ty in self.ancestors() {
            stack.extend(ty.interfaces.iter().rev().map(|i| &**i));
            while let Some(iface) = stack.pop() {
                if out.iter().any(|seen| seen.key == iface.key) {
                    continue;
                }
                out.push(iface);
                stack.extend(iface.interfaces.iter().rev().map(|i| &**i));
            }
        }
        out
    }

    /// Whether `self` appears strictly above `other` in the base-class chain.
    #[must_use]
    pub fn is_subclass_of(&self, other: &TypeInfo) -> bool {
        self.ancestors().skip(1).any(|ty| ty.key == other.key)
    }

    /// Whether a value of type `other` can be used where `self` is expected.
    #[must_use]
    pub fn is_assignable_from(&self, other: &TypeInfo) -> bool {
        if self.key == other.key || other.is_subclass_of(self) {
            return true;
        }
        self.is_interface() && other.all_interfaces().iter().any(|i| i.key == self.key)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("key", &self.key.0)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .field("members", &self.members.len())
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Iterator over a type and its base chain.
pub struct Ancestors<'a> {
    next: Option<&'a TypeInfo>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.base.as_deref();
        Some(current)
    }
}

/// Builder for [`TypeInfo`].
///
/// # Example
///
/// ```
/// use bindery_core::types::TypeBuilder;
/// use bindery_core::value::ValueType;
///
/// let named = TypeBuilder::interface("INamed").build();
/// let person = TypeBuilder::class("Person")
///     .implements(&named)
///     .dynamic_property("Name", ValueType::Str)
///     .build();
///
/// assert!(named.is_assignable_from(&person));
/// assert_eq!(person.declared_members().len(), 1);
/// ```
#[derive(Debug)]
pub struct TypeBuilder {
    key: TypeKey,
    name: Arc<str>,
    kind: TypeKind,
    base: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    members: Vec<MemberDescriptor>,
}

impl TypeBuilder {
    #[must_use]
    pub fn class(name: impl Into<Arc<str>>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    #[must_use]
    pub fn interface(name: impl Into<Arc<str>>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    pub(crate) fn primitive(name: impl Into<Arc<str>>) -> Self {
        Self::with_kind(name, TypeKind::Primitive)
    }

    fn with_kind(name: impl Into<Arc<str>>, kind: TypeKind) -> Self {
        Self {
            key: TypeKey::next(),
            name: name.into(),
            kind,
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Key the built type will carry. Useful for self-referential
    /// [`ValueType::Object`] declarations.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    #[must_use]
    pub fn extends(mut self, base: &TypeRef) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: &TypeRef) -> Self {
        self.interfaces.push(Arc::clone(interface));
        self
    }

    /// Declare a member on this type.
    #[must_use]
    pub fn member(mut self, member: MemberBuilder) -> Self {
        let member = member.build(self.key, &self.name);
        self.members.push(member);
        self
    }

    /// Declare an observable read/write property stored in a
    /// [`DynamicObject`] slot.
    #[must_use]
    pub fn dynamic_property(self, name: &str, value_type: ValueType) -> Self {
        let member = DynamicObject::slot_member(name, value_type);
        self.member(member)
    }

    #[must_use]
    pub fn build(self) -> TypeRef {
        Arc::new(TypeInfo {
            key: self.key,
            name: self.name,
            kind: self.kind,
            base: self.base,
            interfaces: self.interfaces,
            members: self.members,
        })
    }
}
