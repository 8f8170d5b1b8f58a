#![forbid(unsafe_code)]

//! Change notification for bindable objects.
//!
//! A [`ChangeNotifier`] lives inside an observable object and fans change
//! events out to [`ChangeListener`]s. Listeners are held weakly, so an object
//! never keeps its observers alive, and the [`Subscription`] token only holds
//! a weak reference back to the notifier, so an observer never keeps the
//! object alive either.
//!
//! # Invariants
//!
//! 1. Listeners are notified in subscription order.
//! 2. Dropping a [`Subscription`] removes the listener before the next
//!    notification cycle.
//! 3. Dead listeners (dropped without unsubscribing) are pruned lazily during
//!    notification.
//! 4. No internal lock is held while a listener runs, so listeners may
//!    subscribe, unsubscribe or raise further events re-entrantly.
//! 5. An event with an empty member name reaches every listener ("all members
//!    changed").

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use crate::sync::lock;
use crate::value::Value;

/// One change or event occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    member: Arc<str>,
    args: Value,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(member: impl Into<Arc<str>>, args: Value) -> Self {
        Self {
            member: member.into(),
            args,
        }
    }

    /// A property-changed event without arguments.
    #[must_use]
    pub fn property(member: impl Into<Arc<str>>) -> Self {
        Self::new(member, Value::Null)
    }

    /// Member or event name; empty means every member.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Event arguments (`Null` for plain property changes).
    pub fn args(&self) -> &Value {
        &self.args
    }

    pub fn is_all_members(&self) -> bool {
        self.member.is_empty()
    }
}

/// Receiver of change events.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

struct Entry {
    id: u64,
    channel: Option<Arc<str>>,
    listener: Weak<dyn ChangeListener>,
}

impl Entry {
    fn accepts(&self, event: &ChangeEvent) -> bool {
        match &self.channel {
            None => true,
            Some(channel) => event.is_all_members() || **channel == *event.member(),
        }
    }
}

#[derive(Default)]
struct NotifierState {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Subscriber list embedded in observable objects.
#[derive(Default)]
pub struct ChangeNotifier {
    state: Arc<Mutex<NotifierState>>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to one channel, or to every channel with `None`.
    ///
    /// The listener is held weakly; keep the returned token alive for as long
    /// as notifications are wanted.
    pub fn subscribe(
        &self,
        channel: Option<&str>,
        listener: Weak<dyn ChangeListener>,
    ) -> Subscription {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state.entries.push(Entry {
            id,
            channel: channel.map(Arc::from),
            listener,
        });
        Subscription {
            state: Arc::downgrade(&self.state),
            id,
        }
    }

    /// Raise a property-changed notification for `member`.
    pub fn notify(&self, member: &str) {
        self.raise(&ChangeEvent::property(member));
    }

    /// Deliver `event` to every matching live listener.
    pub fn raise(&self, event: &ChangeEvent) {
        let targets: Vec<Arc<dyn ChangeListener>> = {
            let mut state = lock(&self.state);
            let before = state.entries.len();
            let mut live = Vec::with_capacity(before);
            state.entries.retain(|entry| match entry.listener.upgrade() {
                Some(listener) => {
                    if entry.accepts(event) {
                        live.push(listener);
                    }
                    true
                }
                None => false,
            });
            let pruned = before - state.entries.len();
            if pruned > 0 {
                trace!(member = event.member(), pruned, "pruned dead change listeners");
            }
            live
        };
        for listener in targets {
            listener.on_change(event);
        }
    }

    /// Number of registered entries whose listener is still alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.state)
            .entries
            .iter()
            .filter(|e| e.listener.strong_count() > 0)
            .count()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// RAII token for a notifier subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    state: Weak<Mutex<NotifierState>>,
    id: u64,
}

impl Subscription {
    /// Unsubscribe now. Equivalent to dropping the token.
    pub fn unsubscribe(self) {}

    /// Whether the notifier this token points at still exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| lock(&state).entries.iter().any(|e| e.id == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state).entries.retain(|e| e.id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
