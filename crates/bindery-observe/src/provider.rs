#![forbid(unsafe_code)]

//! Observer construction.
//!
//! [`ObserverProvider`] picks the observer variant from the path shape and
//! flags, and injects the shared [`MemberResolver`] and [`WeakAllocator`].
//! Parsed paths are cached so identical binding expressions share one
//! [`MemberPath`].
//!
//! | Path | Flags | Method | Kind |
//! |------|-------|--------|------|
//! | empty | any | no | [`ObserverKind::Empty`] |
//! | one segment | any | no | [`ObserverKind::SinglePath`] |
//! | many segments | - | no | [`ObserverKind::MultiPath`] |
//! | many segments | `ROOT_ONLY` | no | [`ObserverKind::RootMultiPath`] |
//! | empty / one / many | any | yes | `MethodEmpty` / `MethodSingle` / `MethodMulti` |

use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use bindery_core::sync::lock;
use bindery_core::{StdWeakAllocator, Value, WeakAllocator};
use tracing::trace;

use crate::config::ObserverConfig;
use crate::observer::{ObserverFlags, ObserverKind, ObserverParts, PathObserver};
use crate::path::{MemberPath, PathKind};
use crate::resolver::MemberResolver;

/// Upper bound on cached path texts; the cache is flushed when reached.
const PATH_CACHE_LIMIT: usize = 4096;

/// Factory for path observers.
pub struct ObserverProvider {
    resolver: Arc<MemberResolver>,
    weak_allocator: Arc<dyn WeakAllocator>,
    config: ObserverConfig,
    paths: Mutex<AHashMap<Arc<str>, MemberPath>>,
}

impl Default for ObserverProvider {
    fn default() -> Self {
        Self::new(ObserverConfig::default())
    }
}

impl ObserverProvider {
    /// Provider with its own resolver and the standard weak allocator.
    #[must_use]
    pub fn new(config: ObserverConfig) -> Self {
        let resolver = Arc::new(MemberResolver::new(&config));
        Self::with_parts(resolver, Arc::new(StdWeakAllocator), config)
    }

    #[must_use]
    pub fn with_parts(
        resolver: Arc<MemberResolver>,
        weak_allocator: Arc<dyn WeakAllocator>,
        config: ObserverConfig,
    ) -> Self {
        Self {
            resolver,
            weak_allocator,
            config,
            paths: Mutex::new(AHashMap::new()),
        }
    }

    pub fn resolver(&self) -> &Arc<MemberResolver> {
        &self.resolver
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Flags used when the caller does not pass any.
    #[must_use]
    pub fn default_flags(&self) -> ObserverFlags {
        self.config.default_flags()
    }

    /// Parse `text`, reusing an earlier parse of the same text.
    pub fn parse_path(&self, text: &str) -> MemberPath {
        let mut paths = lock(&self.paths);
        if let Some(path) = paths.get(text) {
            return path.clone();
        }
        if paths.len() >= PATH_CACHE_LIMIT {
            trace!(entries = paths.len(), "path cache flushed");
            paths.clear();
        }
        let path = MemberPath::parse(text);
        paths.insert(Arc::from(text), path.clone());
        path
    }

    /// Observer for `path` on `target`.
    #[must_use]
    pub fn create_observer(
        &self,
        target: &Value,
        path: &MemberPath,
        flags: ObserverFlags,
    ) -> PathObserver {
        let kind = match (path.kind(), flags.contains(ObserverFlags::ROOT_ONLY)) {
            (PathKind::Empty, _) => ObserverKind::Empty,
            (PathKind::Single, _) => ObserverKind::SinglePath,
            (PathKind::Multi, false) => ObserverKind::MultiPath,
            (PathKind::Multi, true) => ObserverKind::RootMultiPath,
        };
        self.build(target, path, kind, flags, None)
    }

    /// Observer for `path` on `target` that also tracks the method (or
    /// event) `method` on the terminal value.
    ///
    /// A path ending on a member that cannot be read has no terminal value,
    /// so the method resolves as unavailable rather than failing.
    #[must_use]
    pub fn create_method_observer(
        &self,
        target: &Value,
        path: &MemberPath,
        method: &str,
        flags: ObserverFlags,
    ) -> PathObserver {
        let kind = match path.kind() {
            PathKind::Empty => ObserverKind::MethodEmpty,
            PathKind::Single => ObserverKind::MethodSingle,
            PathKind::Multi => ObserverKind::MethodMulti,
        };
        self.build(target, path, kind, flags, Some(Arc::from(method)))
    }

    /// Parse `text` and observe it with the configured default flags.
    #[must_use]
    pub fn observe(&self, target: &Value, text: &str) -> PathObserver {
        let path = self.parse_path(text);
        self.create_observer(target, &path, self.default_flags())
    }

    fn build(
        &self,
        target: &Value,
        path: &MemberPath,
        kind: ObserverKind,
        flags: ObserverFlags,
        method_name: Option<Arc<str>>,
    ) -> PathObserver {
        trace!(path = %path, ?kind, ?flags, "creating observer");
        PathObserver::new(ObserverParts {
            resolver: Arc::clone(&self.resolver),
            weak_allocator: Arc::clone(&self.weak_allocator),
            target: target.clone(),
            path: path.clone(),
            kind,
            flags,
            method_name,
            coalesce: self.config.coalesce_updates,
        })
    }
}

impl std::fmt::Debug for ObserverProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverProvider")
            .field("config", &self.config)
            .field("cached_paths", &lock(&self.paths).len())
            .finish()
    }
}
