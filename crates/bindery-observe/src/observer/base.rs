//! Observer core: lifecycle, update protocol and listener fan-out.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use bindery_core::sync::lock;
use bindery_core::{
    BindingError, ChangeEvent, ChangeListener, MemberDescriptor, Subscription, Value, WeakAllocator,
    WeakValue,
};
use tracing::{debug, trace, warn};

use super::empty::EmptyWalker;
use super::listeners::ListenerSet;
use super::method::{self, MethodTarget};
use super::multi::MultiWalker;
use super::single::SingleWalker;
use super::{
    LastMember, ObserverFlags, ObserverKind, ObserverListener, PathMembers, Resolution,
};
use crate::path::MemberPath;
use crate::resolver::MemberResolver;

// ---------------------------------------------------------------------------
// Walk protocol shared by the variants
// ---------------------------------------------------------------------------

/// Inputs of one resolution pass.
pub(super) struct WalkContext<'a> {
    pub(super) resolver: &'a MemberResolver,
    pub(super) target: &'a Value,
    pub(super) path: &'a MemberPath,
    pub(super) flags: ObserverFlags,
    /// Previous complete member chain, when the path is stable.
    pub(super) previous: Option<&'a [MemberDescriptor]>,
    /// Listener for intermediate links.
    pub(super) link: &'a Weak<dyn ChangeListener>,
}

impl WalkContext<'_> {
    /// Resolve `segment` on the runtime type of `value`.
    ///
    /// `Ok(None)` means "unavailable": the value is absent or the member is
    /// missing on an optional path.
    pub(super) fn member_at(
        &self,
        index: usize,
        value: &Value,
    ) -> bindery_core::Result<Option<MemberDescriptor>> {
        if let Some(member) = self.previous.and_then(|prev| prev.get(index)) {
            return Ok(Some(member.clone()));
        }
        let Some(ty) = value.runtime_type() else {
            return Ok(None);
        };
        let segment = &self.path.segments()[index];
        let optional = self.flags.contains(ObserverFlags::OPTIONAL);
        self.resolver.resolve(&ty, segment, false, !optional)
    }

    pub(super) fn is_observable(&self) -> bool {
        self.flags.contains(ObserverFlags::OBSERVABLE)
    }
}

pub(super) enum WalkStatus {
    Complete {
        penultimate: Value,
        members: Arc<[MemberDescriptor]>,
    },
    Unavailable,
    Failed(BindingError),
}

pub(super) struct WalkOutcome {
    pub(super) status: WalkStatus,
    pub(super) subscriptions: Vec<Subscription>,
}

impl WalkOutcome {
    pub(super) fn complete(
        penultimate: Value,
        members: Vec<MemberDescriptor>,
        subscriptions: Vec<Subscription>,
    ) -> Self {
        Self {
            status: WalkStatus::Complete {
                penultimate,
                members: members.into(),
            },
            subscriptions,
        }
    }

    pub(super) fn unavailable(subscriptions: Vec<Subscription>) -> Self {
        Self {
            status: WalkStatus::Unavailable,
            subscriptions,
        }
    }

    pub(super) fn failed(error: BindingError, subscriptions: Vec<Subscription>) -> Self {
        Self {
            status: WalkStatus::Failed(error),
            subscriptions,
        }
    }
}

/// One observer variant's way of walking its path.
pub(super) trait PathWalker: Send + Sync {
    fn walk(&self, ctx: &WalkContext<'_>) -> WalkOutcome;
}

// ---------------------------------------------------------------------------
// Links: notifier-facing listeners holding the observer weakly
// ---------------------------------------------------------------------------

/// Receives changes from intermediate links and re-resolves.
struct IntermediateLink {
    observer: Weak<ObserverShared>,
}

impl ChangeListener for IntermediateLink {
    fn on_change(&self, event: &ChangeEvent) {
        if let Some(shared) = self.observer.upgrade() {
            trace!(path = %shared.path, member = event.member(), "intermediate link changed");
            shared.request_update();
        }
    }
}

/// Receives changes of the terminal member (or tracked event) and forwards
/// them to listeners.
struct TerminalLink {
    observer: Weak<ObserverShared>,
}

impl ChangeListener for TerminalLink {
    fn on_change(&self, event: &ChangeEvent) {
        if let Some(shared) = self.observer.upgrade() {
            shared.raise_last_member_changed(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

enum TargetRef {
    Weak(WeakValue),
    Strong(Value),
    Cleared,
}

impl TargetRef {
    fn get(&self) -> Option<Value> {
        match self {
            Self::Weak(weak) => weak.upgrade(),
            Self::Strong(value) => Some(value.clone()),
            Self::Cleared => None,
        }
    }
}

#[derive(Clone)]
enum Status {
    Pending,
    Resolved,
    Unavailable,
    Failed(BindingError),
}

struct ObserverState {
    target: TargetRef,
    listeners: ListenerSet,
    status: Status,
    /// Last complete member chain.
    members: Option<Arc<[MemberDescriptor]>>,
    penultimate: Option<WeakValue>,
    last_error: Option<BindingError>,
    method: Option<(WeakValue, MemberDescriptor)>,
    link_subscriptions: Vec<Subscription>,
    terminal_subscription: Option<Subscription>,
    method_subscription: Option<Subscription>,
}

/// Subscriptions taken out of the state so they drop outside the lock:
/// (links, terminal, method).
type Released = (Vec<Subscription>, Option<Subscription>, Option<Subscription>);

impl ObserverState {
    fn release_all(&mut self) -> Released {
        (
            std::mem::take(&mut self.link_subscriptions),
            self.terminal_subscription.take(),
            self.method_subscription.take(),
        )
    }

    fn release_terminal(&mut self) -> Released {
        (
            Vec::new(),
            self.terminal_subscription.take(),
            self.method_subscription.take(),
        )
    }

    fn last_member(&self) -> Option<LastMember> {
        let member = self.members.as_ref()?.last()?.clone();
        let target = self.penultimate.as_ref()?.upgrade()?;
        Some(LastMember::new(target, member))
    }
}

struct ObserverShared {
    kind: ObserverKind,
    flags: ObserverFlags,
    path: MemberPath,
    method_name: Option<Arc<str>>,
    coalesce: bool,
    resolver: Arc<MemberResolver>,
    walker: Box<dyn PathWalker>,
    intermediate_link: Arc<IntermediateLink>,
    terminal_link: Arc<TerminalLink>,
    initialized: AtomicBool,
    updating: AtomicBool,
    dirty: AtomicBool,
    disposed: AtomicBool,
    state: Mutex<ObserverState>,
}

/// Everything needed to build an observer.
pub(crate) struct ObserverParts {
    pub(crate) resolver: Arc<MemberResolver>,
    pub(crate) weak_allocator: Arc<dyn WeakAllocator>,
    pub(crate) target: Value,
    pub(crate) path: MemberPath,
    pub(crate) kind: ObserverKind,
    pub(crate) flags: ObserverFlags,
    pub(crate) method_name: Option<Arc<str>>,
    pub(crate) coalesce: bool,
}

impl ObserverShared {
    fn handle(self: &Arc<Self>) -> PathObserver {
        PathObserver {
            shared: Arc::clone(self),
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Run a resolution pass now, or mark the in-flight one dirty.
    fn request_update(self: &Arc<Self>) {
        if self.is_disposed() {
            return;
        }
        if !self.coalesce {
            if self
                .updating
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let _updating = UpdatingGuard(&self.updating);
                self.resolve_pass();
            }
            return;
        }

        self.dirty.store(true, Ordering::Release);
        loop {
            if self
                .updating
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }
            {
                let _updating = UpdatingGuard(&self.updating);
                while self.dirty.swap(false, Ordering::AcqRel) && !self.is_disposed() {
                    self.resolve_pass();
                }
            }
            // A change may have landed between the last swap and the release.
            if self.is_disposed() || !self.dirty.load(Ordering::Acquire) {
                return;
            }
        }
    }

    /// Subscribe to the terminal member and look up the tracked method.
    /// Runs user getters and subscription hooks.
    fn attach_terminal(
        &self,
        status: &WalkStatus,
        has_listeners: bool,
        terminal_link: &Weak<dyn ChangeListener>,
    ) -> TerminalOutcome {
        let mut outcome = TerminalOutcome::default();
        let WalkStatus::Complete {
            penultimate,
            members,
        } = status
        else {
            return outcome;
        };
        let Some(last) = members.last() else {
            return outcome;
        };
        if has_listeners {
            outcome.terminal = last.try_observe(penultimate, terminal_link.clone());
        }
        if let Some(name) = &self.method_name {
            let optional = self.flags.contains(ObserverFlags::OPTIONAL);
            match method::resolve(&self.resolver, name, penultimate, last, optional) {
                Ok(Some(found)) => {
                    if has_listeners {
                        outcome.method_subscription =
                            found.member.try_observe(&found.value, terminal_link.clone());
                    }
                    outcome.method_target = Some(found);
                }
                Ok(None) => outcome.downgrade = Some(WalkStatus::Unavailable),
                Err(err) => outcome.downgrade = Some(WalkStatus::Failed(err)),
            }
        }
        outcome
    }

    fn resolve_pass(self: &Arc<Self>) {
        let (target, previous, has_listeners, released) = {
            let mut state = lock(&self.state);
            let previous = match state.status {
                Status::Resolved if self.flags.contains(ObserverFlags::HAS_STABLE_PATH) => {
                    state.members.clone()
                }
                _ => None,
            };
            (
                state.target.get(),
                previous,
                !state.listeners.is_empty(),
                state.release_all(),
            )
        };
        drop(released);
        self.initialized.store(true, Ordering::Release);

        let link: Weak<dyn ChangeListener> =
            Arc::downgrade(&self.intermediate_link) as Weak<dyn ChangeListener>;
        let outcome = match &target {
            None => WalkOutcome::unavailable(Vec::new()),
            Some(target) => {
                let ctx = WalkContext {
                    resolver: &self.resolver,
                    target,
                    path: &self.path,
                    flags: self.flags,
                    previous: previous.as_deref(),
                    link: &link,
                };
                catch_unwind(AssertUnwindSafe(|| self.walker.walk(&ctx)))
                    .unwrap_or_else(|panic| {
                        WalkOutcome::failed(accessor_panic(panic.as_ref()), Vec::new())
                    })
            }
        };
        let WalkOutcome {
            mut status,
            subscriptions,
        } = outcome;

        let terminal_link: Weak<dyn ChangeListener> =
            Arc::downgrade(&self.terminal_link) as Weak<dyn ChangeListener>;
        let TerminalOutcome {
            terminal,
            method_target,
            method_subscription,
            downgrade,
        } = catch_unwind(AssertUnwindSafe(|| {
            self.attach_terminal(&status, has_listeners, &terminal_link)
        }))
        .unwrap_or_else(|panic| TerminalOutcome {
            downgrade: Some(WalkStatus::Failed(accessor_panic(panic.as_ref()))),
            ..TerminalOutcome::default()
        });
        if let Some(replacement) = downgrade {
            status = replacement;
        }

        let (listeners, published, stale, late_listeners) = {
            let mut state = lock(&self.state);
            if self.is_disposed() {
                drop(state);
                debug!(path = %self.path, "discarding pass finished after dispose");
                return;
            }
            let stale: Released = (
                std::mem::replace(&mut state.link_subscriptions, subscriptions),
                std::mem::replace(&mut state.terminal_subscription, terminal),
                std::mem::replace(&mut state.method_subscription, method_subscription),
            );
            state.method = method_target.map(|m| (WeakValue::new(&m.value), m.member));
            let next = match status {
                WalkStatus::Complete {
                    penultimate,
                    members,
                } => {
                    state.penultimate = Some(WeakValue::new(&penultimate));
                    state.members = Some(members);
                    state.last_error = None;
                    Status::Resolved
                }
                WalkStatus::Unavailable => {
                    state.penultimate = None;
                    state.last_error = None;
                    Status::Unavailable
                }
                WalkStatus::Failed(err) => {
                    state.penultimate = None;
                    state.last_error = Some(err.clone());
                    Status::Failed(err)
                }
            };
            state.status = next.clone();
            let listeners = state.listeners.snapshot();
            let late = !has_listeners && !listeners.is_empty();
            (listeners, next, stale, late)
        };
        drop(stale);
        if late_listeners {
            self.subscribe_terminal();
        }

        match &published {
            Status::Failed(err) => {
                debug!(path = %self.path, error = %err, "path resolution failed");
                let observer = self.handle();
                fan_out(&listeners, |l| l.on_error(&observer, err));
            }
            status => {
                debug!(
                    path = %self.path,
                    resolved = matches!(status, Status::Resolved),
                    "path resolved"
                );
                let observer = self.handle();
                fan_out(&listeners, |l| l.on_path_members_changed(&observer));
            }
        }
    }

    fn raise_last_member_changed(self: &Arc<Self>, event: &ChangeEvent) {
        if self.is_disposed() {
            return;
        }
        let listeners = lock(&self.state).listeners.snapshot();
        let observer = self.handle();
        fan_out(&listeners, |l| l.on_last_member_changed(&observer, event));
    }

    /// Subscribe the terminal link on the current resolution, used when the
    /// first listener arrives after an earlier pass.
    fn subscribe_terminal(self: &Arc<Self>) {
        let (last, method) = {
            let state = lock(&self.state);
            if !matches!(state.status, Status::Resolved) || state.terminal_subscription.is_some() {
                return;
            }
            let method = state
                .method
                .as_ref()
                .and_then(|(value, member)| Some((value.upgrade()?, member.clone())));
            (state.last_member(), method)
        };
        let link: Weak<dyn ChangeListener> =
            Arc::downgrade(&self.terminal_link) as Weak<dyn ChangeListener>;
        let subscribed = catch_unwind(AssertUnwindSafe(|| {
            (
                last.and_then(|lm| lm.member().try_observe(lm.target(), link.clone())),
                method.and_then(|(value, member)| member.try_observe(&value, link)),
            )
        }));
        let (terminal, method_sub) = match subscribed {
            Ok(subscriptions) => subscriptions,
            Err(panic) => {
                self.fail_terminal(accessor_panic(panic.as_ref()));
                return;
            }
        };

        let mut state = lock(&self.state);
        if self.is_disposed() || state.listeners.is_empty() {
            return;
        }
        if state.terminal_subscription.is_none() {
            state.terminal_subscription = terminal;
        }
        if state.method_subscription.is_none() {
            state.method_subscription = method_sub;
        }
    }

    /// A terminal subscription hook panicked outside a pass.
    fn fail_terminal(self: &Arc<Self>, err: BindingError) {
        let (listeners, released) = {
            let mut state = lock(&self.state);
            if self.is_disposed() {
                return;
            }
            state.penultimate = None;
            state.last_error = Some(err.clone());
            state.status = Status::Failed(err.clone());
            (state.listeners.snapshot(), state.release_terminal())
        };
        drop(released);
        debug!(path = %self.path, error = %err, "terminal subscription failed");
        let observer = self.handle();
        fan_out(&listeners, |l| l.on_error(&observer, &err));
    }

    /// Resolve on first use, and on every query when nothing would tell us
    /// about changes.
    fn ensure_fresh(self: &Arc<Self>) {
        if self.is_disposed() {
            return;
        }
        let stale = !self.initialized.load(Ordering::Acquire)
            || (!self.flags.contains(ObserverFlags::OBSERVABLE)
                && !self.updating.load(Ordering::Acquire));
        if stale {
            self.request_update();
        }
    }
}

fn fan_out(listeners: &[Arc<dyn ObserverListener>], call: impl Fn(&dyn ObserverListener)) {
    for listener in listeners {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| call(listener.as_ref()))) {
            warn!(
                panic = panic_message(panic.as_ref()),
                "observer listener panicked"
            );
        }
    }
}

fn accessor_panic(panic: &(dyn Any + Send)) -> BindingError {
    BindingError::accessor(format!("accessor panicked: {}", panic_message(panic)))
}

/// Clears the in-flight flag on scope exit, unwinding included.
struct UpdatingGuard<'a>(&'a AtomicBool);

impl Drop for UpdatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct TerminalOutcome {
    terminal: Option<Subscription>,
    method_target: Option<MethodTarget>,
    method_subscription: Option<Subscription>,
    downgrade: Option<WalkStatus>,
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

// ---------------------------------------------------------------------------
// PathObserver: public handle
// ---------------------------------------------------------------------------

/// Handle to a path observer. Clones share the same observer.
#[derive(Clone)]
pub struct PathObserver {
    shared: Arc<ObserverShared>,
}

impl PathObserver {
    pub(crate) fn new(parts: ObserverParts) -> Self {
        let walker: Box<dyn PathWalker> = match parts.kind {
            ObserverKind::Empty | ObserverKind::MethodEmpty => Box::new(EmptyWalker),
            ObserverKind::SinglePath | ObserverKind::MethodSingle => Box::new(SingleWalker),
            ObserverKind::MultiPath | ObserverKind::RootMultiPath | ObserverKind::MethodMulti => {
                Box::new(MultiWalker {
                    root_only: parts.kind == ObserverKind::RootMultiPath
                        || parts.flags.contains(ObserverFlags::ROOT_ONLY),
                })
            }
        };
        let target = if parts.flags.contains(ObserverFlags::RETAIN_TARGET) {
            TargetRef::Strong(parts.target)
        } else {
            TargetRef::Weak(parts.weak_allocator.downgrade(&parts.target))
        };
        let shared = Arc::new_cyclic(|weak: &Weak<ObserverShared>| ObserverShared {
            kind: parts.kind,
            flags: parts.flags,
            path: parts.path,
            method_name: parts.method_name,
            coalesce: parts.coalesce,
            resolver: parts.resolver,
            walker,
            intermediate_link: Arc::new(IntermediateLink {
                observer: weak.clone(),
            }),
            terminal_link: Arc::new(TerminalLink {
                observer: weak.clone(),
            }),
            initialized: AtomicBool::new(false),
            updating: AtomicBool::new(false),
            dirty: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            state: Mutex::new(ObserverState {
                target,
                listeners: ListenerSet::default(),
                status: Status::Pending,
                members: None,
                penultimate: None,
                last_error: None,
                method: None,
                link_subscriptions: Vec::new(),
                terminal_subscription: None,
                method_subscription: None,
            }),
        });
        Self { shared }
    }

    pub fn kind(&self) -> ObserverKind {
        self.shared.kind
    }

    pub fn flags(&self) -> ObserverFlags {
        self.shared.flags
    }

    pub fn path(&self) -> &MemberPath {
        &self.shared.path
    }

    /// Method or event name tracked by method observers.
    pub fn method_name(&self) -> Option<&str> {
        self.shared.method_name.as_deref()
    }

    /// The target, if still alive and not disposed.
    pub fn target(&self) -> Option<Value> {
        lock(&self.shared.state).target.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.shared.state).listeners.len()
    }

    /// Error captured by the most recent pass, if it failed.
    pub fn last_error(&self) -> Option<BindingError> {
        lock(&self.shared.state).last_error.clone()
    }

    /// Add a listener, held weakly. The first listener triggers resolution
    /// (or re-subscribes the terminal member after an earlier pass).
    pub fn add_listener(&self, listener: Weak<dyn ObserverListener>) {
        if self.shared.is_disposed() {
            return;
        }
        let first = {
            let mut state = lock(&self.shared.state);
            let first = state.listeners.is_empty();
            state.listeners.add(listener);
            first
        };
        if first {
            if self.shared.initialized.load(Ordering::Acquire) {
                self.shared.subscribe_terminal();
            } else {
                self.shared.request_update();
            }
        }
    }

    /// Remove a listener. Removing the last one drops the terminal
    /// subscription only.
    pub fn remove_listener(&self, listener: &Weak<dyn ObserverListener>) -> bool {
        let released = {
            let mut state = lock(&self.shared.state);
            if !state.listeners.remove(listener) {
                return false;
            }
            if state.listeners.is_empty() {
                state.release_terminal()
            } else {
                Default::default()
            }
        };
        drop(released);
        true
    }

    /// Re-resolve the path now.
    pub fn update(&self) {
        self.shared.request_update();
    }

    /// The terminal member and the value holding it.
    pub fn last_member(&self) -> Resolution<LastMember> {
        if self.shared.is_disposed() {
            return Resolution::Failed(BindingError::Disposed);
        }
        self.shared.ensure_fresh();
        let state = lock(&self.shared.state);
        match &state.status {
            Status::Resolved => state
                .last_member()
                .map_or(Resolution::Unavailable, Resolution::Resolved),
            Status::Failed(err) => Resolution::Failed(err.clone()),
            Status::Pending | Status::Unavailable => Resolution::Unavailable,
        }
    }

    /// The root target and every resolved member.
    pub fn members(&self) -> Resolution<PathMembers> {
        if self.shared.is_disposed() {
            return Resolution::Failed(BindingError::Disposed);
        }
        self.shared.ensure_fresh();
        let state = lock(&self.shared.state);
        match &state.status {
            Status::Resolved => {
                match (state.target.get(), state.members.clone()) {
                    (Some(target), Some(members)) => {
                        Resolution::Resolved(PathMembers { target, members })
                    }
                    _ => Resolution::Unavailable,
                }
            }
            Status::Failed(err) => Resolution::Failed(err.clone()),
            Status::Pending | Status::Unavailable => Resolution::Unavailable,
        }
    }

    /// The tracked method (or event) and the terminal value it lives on.
    /// Always unavailable for non-method observers.
    pub fn method_member(&self) -> Resolution<LastMember> {
        if self.shared.is_disposed() {
            return Resolution::Failed(BindingError::Disposed);
        }
        if self.shared.method_name.is_none() {
            return Resolution::Unavailable;
        }
        self.shared.ensure_fresh();
        let state = lock(&self.shared.state);
        match &state.status {
            Status::Resolved => state
                .method
                .as_ref()
                .and_then(|(value, member)| Some(LastMember::new(value.upgrade()?, member.clone())))
                .map_or(Resolution::Unavailable, Resolution::Resolved),
            Status::Failed(err) => Resolution::Failed(err.clone()),
            Status::Pending | Status::Unavailable => Resolution::Unavailable,
        }
    }

    /// Release the target, every subscription and every listener.
    /// Idempotent; ignored with [`ObserverFlags::NON_DISPOSABLE`].
    pub fn dispose(&self) {
        if self.shared.flags.contains(ObserverFlags::NON_DISPOSABLE) {
            return;
        }
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let (released, listeners) = {
            let mut state = lock(&self.shared.state);
            state.target = TargetRef::Cleared;
            state.status = Status::Pending;
            state.members = None;
            state.penultimate = None;
            state.method = None;
            (
                state.release_all(),
                std::mem::take(&mut state.listeners),
            )
        };
        drop(released);
        drop(listeners);
        debug!(path = %self.shared.path, "observer disposed");
    }

    /// Whether both handles refer to the same observer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    #[cfg(test)]
    pub(crate) fn subscription_counts(&self) -> (usize, bool, bool) {
        let state = lock(&self.shared.state);
        (
            state.link_subscriptions.len(),
            state.terminal_subscription.is_some(),
            state.method_subscription.is_some(),
        )
    }
}

impl fmt::Debug for PathObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathObserver")
            .field("kind", &self.shared.kind)
            .field("path", &self.shared.path.raw())
            .field("flags", &self.shared.flags)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
