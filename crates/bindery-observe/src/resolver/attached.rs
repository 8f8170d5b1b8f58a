//! Attached-member overlay table.

use std::sync::Arc;

use ahash::AHashMap;
use bindery_core::{MemberDescriptor, TypeRef};

use super::LookupKind;

pub(super) struct AttachedEntry {
    pub(super) ty: TypeRef,
    pub(super) member: MemberDescriptor,
}

/// Members registered at runtime, grouped by segment text. Entries of one
/// segment keep registration order.
#[derive(Default)]
pub(super) struct AttachedMembers {
    by_segment: AHashMap<Arc<str>, Vec<AttachedEntry>>,
}

/// Outcome of [`AttachedMembers::insert`].
pub(super) enum Inserted {
    New,
    Replaced,
    Duplicate,
}

impl AttachedMembers {
    pub(super) fn insert(
        &mut self,
        ty: &TypeRef,
        segment: &str,
        member: MemberDescriptor,
        rewrite: bool,
    ) -> Inserted {
        let entries = self.by_segment.entry(Arc::from(segment)).or_default();
        match entries.iter_mut().find(|e| e.ty.key() == ty.key()) {
            Some(_) if !rewrite => Inserted::Duplicate,
            Some(existing) => {
                existing.member = member;
                Inserted::Replaced
            }
            None => {
                entries.push(AttachedEntry {
                    ty: Arc::clone(ty),
                    member,
                });
                Inserted::New
            }
        }
    }

    pub(super) fn remove(&mut self, ty: &TypeRef, segment: &str) -> bool {
        let Some(entries) = self.by_segment.get_mut(segment) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.ty.key() != ty.key());
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.by_segment.remove(segment);
        }
        removed
    }

    pub(super) fn remove_type(&mut self, ty: &TypeRef) -> bool {
        let mut removed = false;
        self.by_segment.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| e.ty.key() != ty.key());
            removed |= entries.len() != before;
            !entries.is_empty()
        });
        removed
    }

    /// Members registered directly on `ty`, sorted by segment.
    pub(super) fn members_of(&self, ty: &TypeRef) -> Vec<(Arc<str>, MemberDescriptor)> {
        let mut out: Vec<(Arc<str>, MemberDescriptor)> = self
            .by_segment
            .iter()
            .flat_map(|(segment, entries)| {
                entries
                    .iter()
                    .filter(|e| e.ty.key() == ty.key())
                    .map(|e| (Arc::clone(segment), e.member.clone()))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub(super) fn len(&self) -> usize {
        self.by_segment.values().map(Vec::len).sum()
    }

    /// Most specific registration for `segment` that applies to `runtime`.
    ///
    /// A candidate is dropped when another candidate's declaring type is
    /// strictly more specific (assignable to it). The first survivor in
    /// registration order wins.
    pub(super) fn best_match(
        &self,
        runtime: &TypeRef,
        segment: &str,
        lookup: LookupKind,
    ) -> Option<MemberDescriptor> {
        let entries = self.by_segment.get(segment)?;
        let candidates: Vec<&AttachedEntry> = entries
            .iter()
            .filter(|e| lookup.accepts(e.member.kind()) && e.ty.is_assignable_from(runtime))
            .collect();
        let best = match candidates.as_slice() {
            [] => return None,
            [only] => only,
            all => all
                .iter()
                .find(|c| {
                    !all.iter().any(|o| {
                        o.ty.key() != c.ty.key() && c.ty.is_assignable_from(&o.ty)
                    })
                })
                .unwrap_or(&all[0]),
        };
        Some(best.member.clone())
    }
}
