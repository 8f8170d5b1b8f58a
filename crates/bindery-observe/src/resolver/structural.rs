//! Lookup over the declared member tables.

use bindery_core::{MemberDescriptor, MemberKind, TypeInfo};

use super::LookupKind;
use crate::path::{index_arguments, indexer_arity};

/// Find `segment` among the members `ty` declares or inherits.
///
/// Accessor lookups try properties (indexers by arity), then events, then
/// fields; method lookups try methods, then events. The base chain is
/// searched before interfaces.
pub(super) fn find_member(ty: &TypeInfo, segment: &str, lookup: LookupKind) -> Option<MemberDescriptor> {
    match lookup {
        LookupKind::Member => {
            if let Some(arity) = indexer_arity(segment) {
                return find_in_hierarchy(ty, |m| m.is_indexer() && m.arity() == arity)
                    .map(|m| m.with_index_args(index_arguments(segment)));
            }
            find_named(ty, segment, |k| k == MemberKind::Property)
                .or_else(|| find_named(ty, segment, |k| k == MemberKind::Event))
                .or_else(|| {
                    find_named(ty, segment, |k| {
                        matches!(k, MemberKind::Field | MemberKind::Constant)
                    })
                })
        }
        LookupKind::Method => find_named(ty, segment, |k| k == MemberKind::Method)
            .or_else(|| find_named(ty, segment, |k| k == MemberKind::Event)),
    }
}

fn find_named(
    ty: &TypeInfo,
    name: &str,
    kind: impl Fn(MemberKind) -> bool,
) -> Option<MemberDescriptor> {
    find_in_hierarchy(ty, |m| m.name() == name && kind(m.kind()))
}

fn find_in_hierarchy(
    ty: &TypeInfo,
    pred: impl Fn(&MemberDescriptor) -> bool,
) -> Option<MemberDescriptor> {
    let declared = ty
        .ancestors()
        .flat_map(TypeInfo::declared_members)
        .find(|&m| pred(m));
    declared
        .or_else(|| {
            ty.all_interfaces()
                .into_iter()
                .flat_map(TypeInfo::declared_members)
                .find(|&m| pred(m))
        })
        .cloned()
}
