#![forbid(unsafe_code)]

//! Member resolution with an attached-member overlay and layered caches.
//!
//! [`MemberResolver::resolve`] maps `(runtime type, path segment)` to a
//! [`MemberDescriptor`]. Lookup order:
//!
//! 1. The attached overlay (unless ignored), picking the most specific
//!    registration whose declaring type accepts the runtime type.
//! 2. The declared member tables of the type, its base chain and its
//!    interfaces.
//! 3. A permissive placeholder for segments starting with a configured
//!    fake-member prefix.
//!
//! # Caches
//!
//! | Cache | Key | Lifetime |
//! |-------|-----|----------|
//! | attached table | segment, then type | explicit registration |
//! | structural | (type, segment, lookup) | forever; member tables are immutable |
//! | merged | (type, segment, lookup, ignore overlay) | cleared on every overlay change |
//!
//! Each cache has its own lock. Overlay changes bump a generation counter and
//! clear the merged cache while still holding the overlay lock, so a result
//! computed against an older overlay is never stored.
//!
//! # Invariants
//!
//! 1. Repeated lookups with the same arguments return equal descriptors until
//!    the overlay changes.
//! 2. After `register_member(T, s, d, _)` returns, `resolve(T, s, false, _)`
//!    yields `d` (or a more specific registration).
//! 3. Negative results are cached like positive ones and invalidated the same
//!    way.

mod attached;
mod structural;

use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use ahash::AHashMap;
use bindery_core::sync::{lock, read, write};
use bindery_core::{BindingError, MemberDescriptor, MemberKind, Result, TypeKey, TypeRef};
use tracing::{debug, trace, warn};

use self::attached::{AttachedMembers, Inserted};
use crate::config::ObserverConfig;

/// Which member kinds a lookup accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LookupKind {
    /// Properties, fields, constants and events.
    Member,
    /// Methods and events.
    Method,
}

impl LookupKind {
    fn accepts(self, kind: MemberKind) -> bool {
        match self {
            Self::Member => kind != MemberKind::Method,
            Self::Method => matches!(kind, MemberKind::Method | MemberKind::Event),
        }
    }
}

/// Cache key with a precomputed hash.
#[derive(Debug, Clone)]
struct CacheKey {
    ty: TypeKey,
    segment: Arc<str>,
    lookup: LookupKind,
    ignore_attached: bool,
    hash: u64,
}

impl CacheKey {
    fn new(
        state: &ahash::RandomState,
        ty: TypeKey,
        segment: &str,
        lookup: LookupKind,
        ignore_attached: bool,
    ) -> Self {
        let hash = state.hash_one((ty, segment, lookup, ignore_attached));
        Self {
            ty,
            segment: Arc::from(segment),
            lookup,
            ignore_attached,
            hash,
        }
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.ty == other.ty
            && self.lookup == other.lookup
            && self.ignore_attached == other.ignore_attached
            && self.segment == other.segment
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

type Memo = AHashMap<CacheKey, Option<MemberDescriptor>>;

/// Snapshot of resolver cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub merged_hits: u64,
    pub merged_misses: u64,
    pub structural_hits: u64,
    pub structural_misses: u64,
    pub invalidations: u64,
    pub merged_entries: usize,
    pub structural_entries: usize,
    pub attached_members: usize,
}

#[derive(Default)]
struct Counters {
    merged_hits: AtomicU64,
    merged_misses: AtomicU64,
    structural_hits: AtomicU64,
    structural_misses: AtomicU64,
    invalidations: AtomicU64,
}

/// Resolves path segments to member descriptors.
pub struct MemberResolver {
    attached: RwLock<AttachedMembers>,
    structural: RwLock<Memo>,
    merged: Mutex<Memo>,
    generation: AtomicU64,
    hash_state: ahash::RandomState,
    fake_prefixes: Vec<String>,
    counters: Counters,
}

impl Default for MemberResolver {
    fn default() -> Self {
        Self::new(&ObserverConfig::default())
    }
}

impl MemberResolver {
    #[must_use]
    pub fn new(config: &ObserverConfig) -> Self {
        Self::with_fake_prefixes(config.fake_member_prefixes.clone())
    }

    #[must_use]
    pub fn with_fake_prefixes(prefixes: Vec<String>) -> Self {
        Self {
            attached: RwLock::new(AttachedMembers::default()),
            structural: RwLock::new(Memo::default()),
            merged: Mutex::new(Memo::default()),
            generation: AtomicU64::new(0),
            hash_state: ahash::RandomState::new(),
            fake_prefixes: prefixes.into_iter().filter(|p| !p.is_empty()).collect(),
            counters: Counters::default(),
        }
    }

    /// Resolve `segment` on `ty`.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidBindingMember`] when nothing matches and
    /// `throw_if_missing` is set.
    pub fn resolve(
        &self,
        ty: &TypeRef,
        segment: &str,
        ignore_attached: bool,
        throw_if_missing: bool,
    ) -> Result<Option<MemberDescriptor>> {
        let found = self.resolve_cached(ty, segment, LookupKind::Member, ignore_attached);
        missing_check(ty, segment, found, throw_if_missing)
    }

    /// Resolve a method (or event) named `name` on `ty`.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidBindingMember`] when nothing matches and
    /// `throw_if_missing` is set.
    pub fn resolve_method(
        &self,
        ty: &TypeRef,
        name: &str,
        throw_if_missing: bool,
    ) -> Result<Option<MemberDescriptor>> {
        let found = self.resolve_cached(ty, name, LookupKind::Method, false);
        missing_check(ty, name, found, throw_if_missing)
    }

    fn resolve_cached(
        &self,
        ty: &TypeRef,
        segment: &str,
        lookup: LookupKind,
        ignore_attached: bool,
    ) -> Option<MemberDescriptor> {
        let key = CacheKey::new(&self.hash_state, ty.key(), segment, lookup, ignore_attached);
        if let Some(hit) = lock(&self.merged).get(&key) {
            self.counters.merged_hits.fetch_add(1, Ordering::Relaxed);
            trace!(ty = %ty, segment, "member cache hit");
            return hit.clone();
        }
        self.counters.merged_misses.fetch_add(1, Ordering::Relaxed);

        let generation = self.generation.load(Ordering::Acquire);
        let overlay = if ignore_attached {
            None
        } else {
            read(&self.attached).best_match(ty, segment, lookup)
        };
        let found = overlay.or_else(|| self.resolve_structural(ty, segment, lookup));

        let mut merged = lock(&self.merged);
        if self.generation.load(Ordering::Acquire) == generation {
            merged.insert(key, found.clone());
        }
        drop(merged);

        debug!(
            ty = %ty,
            segment,
            found = found.is_some(),
            "resolved member"
        );
        found
    }

    fn resolve_structural(
        &self,
        ty: &TypeRef,
        segment: &str,
        lookup: LookupKind,
    ) -> Option<MemberDescriptor> {
        let key = CacheKey::new(&self.hash_state, ty.key(), segment, lookup, true);
        if let Some(hit) = read(&self.structural).get(&key) {
            self.counters.structural_hits.fetch_add(1, Ordering::Relaxed);
            return hit.clone();
        }
        self.counters.structural_misses.fetch_add(1, Ordering::Relaxed);

        let found = structural::find_member(ty, segment, lookup).or_else(|| {
            (lookup == LookupKind::Member && self.is_fake(segment))
                .then(|| MemberDescriptor::placeholder(segment, ty))
        });
        write(&self.structural)
            .entry(key)
            .or_insert(found)
            .clone()
    }

    fn is_fake(&self, segment: &str) -> bool {
        self.fake_prefixes.iter().any(|p| segment.starts_with(p.as_str()))
    }

    /// Register an attached member for `segment` on `ty`.
    ///
    /// # Errors
    ///
    /// [`BindingError::DuplicateBindingMember`] when `ty` already has a
    /// registration for `segment` and `rewrite` is false.
    pub fn register_member(
        &self,
        ty: &TypeRef,
        segment: &str,
        member: MemberDescriptor,
        rewrite: bool,
    ) -> Result<()> {
        let mut attached = write(&self.attached);
        match attached.insert(ty, segment, member, rewrite) {
            Inserted::Duplicate => {
                return Err(BindingError::duplicate_member(ty.shared_name(), segment));
            }
            Inserted::Replaced => {
                warn!(ty = %ty, segment, "attached member overwritten");
            }
            Inserted::New => {
                debug!(ty = %ty, segment, "attached member registered");
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Remove the registration for `segment` on `ty`. Returns whether one
    /// existed.
    pub fn unregister_member(&self, ty: &TypeRef, segment: &str) -> bool {
        let mut attached = write(&self.attached);
        let removed = attached.remove(ty, segment);
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Remove every registration made on `ty`. Returns whether any existed.
    pub fn unregister_all_members(&self, ty: &TypeRef) -> bool {
        let mut attached = write(&self.attached);
        let removed = attached.remove_type(ty);
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Members attached directly to `ty` (not inherited), sorted by segment.
    #[must_use]
    pub fn attached_members(&self, ty: &TypeRef) -> Vec<(Arc<str>, MemberDescriptor)> {
        read(&self.attached).members_of(ty)
    }

    /// Drop every memoized result. The overlay itself is kept.
    pub fn clear_caches(&self) {
        let _attached = read(&self.attached);
        self.generation.fetch_add(1, Ordering::AcqRel);
        write(&self.structural).clear();
        lock(&self.merged).clear();
    }

    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            merged_hits: self.counters.merged_hits.load(Ordering::Relaxed),
            merged_misses: self.counters.merged_misses.load(Ordering::Relaxed),
            structural_hits: self.counters.structural_hits.load(Ordering::Relaxed),
            structural_misses: self.counters.structural_misses.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            merged_entries: lock(&self.merged).len(),
            structural_entries: read(&self.structural).len(),
            attached_members: read(&self.attached).len(),
        }
    }

    /// Must be called with the overlay write lock held.
    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        lock(&self.merged).clear();
        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for MemberResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberResolver")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("fake_prefixes", &self.fake_prefixes)
            .field("stats", &self.stats())
            .finish()
    }
}

fn missing_check(
    ty: &TypeRef,
    segment: &str,
    found: Option<MemberDescriptor>,
    throw_if_missing: bool,
) -> Result<Option<MemberDescriptor>> {
    match found {
        None if throw_if_missing => Err(BindingError::invalid_member(ty.shared_name(), segment)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{MemberBuilder, TypeBuilder, Value, ValueType};

    fn person() -> TypeRef {
        TypeBuilder::class("Person")
            .dynamic_property("Name", ValueType::Str)
            .build()
    }

    fn constant(ty: &TypeRef, name: &str, value: i64) -> MemberDescriptor {
        MemberBuilder::constant(name, Value::Int(value))
            .extension()
            .build_for(ty)
    }

    #[test]
    fn structural_hit_and_miss() {
        let resolver = MemberResolver::default();
        let ty = person();
        let name = resolver.resolve(&ty, "Name", false, true).unwrap();
        assert_eq!(name.map(|m| m.kind()), Some(MemberKind::Property));
        assert_eq!(resolver.resolve(&ty, "Nope", false, false), Ok(None));
        assert_eq!(
            resolver.resolve(&ty, "Nope", false, true),
            Err(BindingError::invalid_member("Person", "Nope"))
        );
    }

    #[test]
    fn repeated_lookups_hit_the_merged_cache() {
        let resolver = MemberResolver::default();
        let ty = person();
        let first = resolver.resolve(&ty, "Name", false, true).unwrap();
        let second = resolver.resolve(&ty, "Name", false, true).unwrap();
        assert_eq!(first, second);
        let stats = resolver.stats();
        assert_eq!(stats.merged_hits, 1);
        assert_eq!(stats.merged_misses, 1);
        assert_eq!(stats.structural_misses, 1);
    }

    #[test]
    fn registration_replaces_cached_negative() {
        let resolver = MemberResolver::default();
        let ty = person();
        assert_eq!(resolver.resolve(&ty, "X", false, false), Ok(None));

        let attached = constant(&ty, "X", 1);
        resolver
            .register_member(&ty, "X", attached.clone(), true)
            .unwrap();
        assert_eq!(resolver.resolve(&ty, "X", false, false), Ok(Some(attached)));
        assert_eq!(resolver.resolve(&ty, "X", true, false), Ok(None));
    }

    #[test]
    fn duplicate_registration_fails_without_rewrite() {
        let resolver = MemberResolver::default();
        let ty = person();
        resolver
            .register_member(&ty, "X", constant(&ty, "X", 1), false)
            .unwrap();
        assert_eq!(
            resolver.register_member(&ty, "X", constant(&ty, "X", 2), false),
            Err(BindingError::duplicate_member("Person", "X"))
        );
    }

    #[tracing_test::traced_test]
    #[test]
    fn overwrite_logs_a_warning() {
        let resolver = MemberResolver::default();
        let ty = person();
        resolver
            .register_member(&ty, "X", constant(&ty, "X", 1), false)
            .unwrap();
        assert!(!logs_contain("attached member overwritten"));
        resolver
            .register_member(&ty, "X", constant(&ty, "X", 2), true)
            .unwrap();
        assert!(logs_contain("attached member overwritten"));
    }

    #[test]
    fn unregister_invalidates() {
        let resolver = MemberResolver::default();
        let ty = person();
        let attached = constant(&ty, "Name", 9);
        resolver
            .register_member(&ty, "Name", attached.clone(), false)
            .unwrap();
        assert_eq!(resolver.resolve(&ty, "Name", false, true), Ok(Some(attached)));

        assert!(resolver.unregister_member(&ty, "Name"));
        let name = resolver.resolve(&ty, "Name", false, true).unwrap().unwrap();
        assert!(name.is_writable());
        assert!(!resolver.unregister_all_members(&ty));
    }

    #[test]
    fn fake_prefix_yields_placeholder() {
        let resolver = MemberResolver::with_fake_prefixes(vec!["$".to_string()]);
        let ty = person();
        let fake = resolver.resolve(&ty, "$width", false, true).unwrap().unwrap();
        assert_eq!(fake.kind(), MemberKind::Constant);
        assert_eq!(fake.get_value(&Value::Null), Ok(Value::Unset));
        assert!(resolver.resolve_method(&ty, "$width", false).unwrap().is_none());
    }

    #[test]
    fn attached_members_lists_own_registrations() {
        let resolver = MemberResolver::default();
        let base = person();
        let derived = TypeBuilder::class("Employee").extends(&base).build();
        resolver
            .register_member(&base, "B", constant(&base, "B", 1), false)
            .unwrap();
        resolver
            .register_member(&derived, "A", constant(&derived, "A", 2), false)
            .unwrap();

        let names: Vec<String> = resolver
            .attached_members(&derived)
            .into_iter()
            .map(|(s, _)| s.to_string())
            .collect();
        assert_eq!(names, ["A"]);
        // Inherited registrations still resolve.
        assert!(resolver.resolve(&derived, "B", false, true).is_ok());
    }
}
