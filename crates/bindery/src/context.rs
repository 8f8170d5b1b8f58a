//! Explicit binding context.

use std::sync::Arc;

use bindery_core::{MemberDescriptor, Result, StdWeakAllocator, TypeRef, Value, WeakAllocator};
use bindery_observe::{
    MemberResolver, ObserverConfig, ObserverProvider, PathObserver, Resolution,
};
use tracing::debug;

/// Resolver and observer factory shared by a set of bindings.
///
/// Cloning is cheap; clones share the resolver, its attached members and
/// its caches.
#[derive(Clone, Debug)]
pub struct Bindery {
    provider: Arc<ObserverProvider>,
}

impl Default for Bindery {
    fn default() -> Self {
        Self::new(ObserverConfig::default())
    }
}

impl Bindery {
    #[must_use]
    pub fn new(config: ObserverConfig) -> Self {
        Self::with_weak_allocator(config, Arc::new(StdWeakAllocator))
    }

    /// Context whose observers take weak handles from `weak_allocator`.
    #[must_use]
    pub fn with_weak_allocator(config: ObserverConfig, weak_allocator: Arc<dyn WeakAllocator>) -> Self {
        let resolver = Arc::new(MemberResolver::new(&config));
        debug!(?config, "bindery context created");
        Self {
            provider: Arc::new(ObserverProvider::with_parts(resolver, weak_allocator, config)),
        }
    }

    pub fn resolver(&self) -> &Arc<MemberResolver> {
        self.provider.resolver()
    }

    pub fn provider(&self) -> &Arc<ObserverProvider> {
        &self.provider
    }

    pub fn config(&self) -> &ObserverConfig {
        self.provider.config()
    }

    /// Observe `path` on `target` with the configured default flags.
    #[must_use]
    pub fn observe(&self, target: &Value, path: &str) -> PathObserver {
        self.provider.observe(target, path)
    }

    /// Observe `path` on `target` and track `method` on its terminal value.
    #[must_use]
    pub fn observe_method(&self, target: &Value, path: &str, method: &str) -> PathObserver {
        let path = self.provider.parse_path(path);
        self.provider
            .create_method_observer(target, &path, method, self.provider.default_flags())
    }

    /// Attach `member` to `ty` under `segment`.
    ///
    /// # Errors
    ///
    /// `DuplicateBindingMember` when a registration exists and `rewrite` is
    /// false.
    pub fn attach(&self, ty: &TypeRef, segment: &str, member: MemberDescriptor, rewrite: bool) -> Result<()> {
        self.resolver().register_member(ty, segment, member, rewrite)
    }

    /// Read `path` on `target` once, without keeping an observer around.
    ///
    /// `Ok(None)` when the path is unavailable.
    ///
    /// # Errors
    ///
    /// Any resolution or accessor error.
    pub fn read(&self, target: &Value, path: &str) -> Result<Option<Value>> {
        let observer = self.observe(target, path);
        let value = match observer.last_member() {
            Resolution::Resolved(last) => last.get_value().map(Some),
            Resolution::Unavailable => Ok(None),
            Resolution::Failed(err) => Err(err),
        };
        observer.dispose();
        value
    }
}
