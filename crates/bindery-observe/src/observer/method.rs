//! Method tracking for method observers.
//!
//! The method (or event) is looked up on the terminal value: the value of the
//! last member, or the target itself for an empty path.

use bindery_core::{MemberDescriptor, Result, Value};

use crate::resolver::MemberResolver;

pub(super) struct MethodTarget {
    pub(super) value: Value,
    pub(super) member: MemberDescriptor,
}

/// `Ok(None)` when the terminal value is absent, when the last member cannot
/// be read (an event, a write-only property) or, on optional paths, when the
/// value has no such method.
pub(super) fn resolve(
    resolver: &MemberResolver,
    name: &str,
    penultimate: &Value,
    last: &MemberDescriptor,
    optional: bool,
) -> Result<Option<MethodTarget>> {
    if !last.is_readable() {
        return Ok(None);
    }
    let value = last.get_value(penultimate)?;
    let Some(ty) = value.runtime_type() else {
        return Ok(None);
    };
    let member = resolver.resolve_method(&ty, name, !optional)?;
    Ok(member.map(|member| MethodTarget { value, member }))
}
