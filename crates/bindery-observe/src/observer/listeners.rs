//! Zero/one/many listener storage.

use std::sync::{Arc, Weak};

use super::ObserverListener;

/// Listeners of one observer, held weakly.
///
/// Most observers have exactly one listener (the binding that owns them), so
/// the single case avoids a vector.
#[derive(Default)]
pub(super) enum ListenerSet {
    #[default]
    None,
    One(Weak<dyn ObserverListener>),
    Many(Vec<Weak<dyn ObserverListener>>),
}

fn same(a: &Weak<dyn ObserverListener>, b: &Weak<dyn ObserverListener>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}

impl ListenerSet {
    pub(super) fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    pub(super) fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Many(all) => all.len(),
        }
    }

    pub(super) fn add(&mut self, listener: Weak<dyn ObserverListener>) {
        *self = match std::mem::take(self) {
            Self::None => Self::One(listener),
            Self::One(first) => Self::Many(vec![first, listener]),
            Self::Many(mut all) => {
                all.push(listener);
                Self::Many(all)
            }
        };
    }

    /// Remove the first entry pointing at `listener`.
    pub(super) fn remove(&mut self, listener: &Weak<dyn ObserverListener>) -> bool {
        match self {
            Self::None => false,
            Self::One(only) => {
                if same(only, listener) {
                    *self = Self::None;
                    true
                } else {
                    false
                }
            }
            Self::Many(all) => {
                let Some(pos) = all.iter().position(|l| same(l, listener)) else {
                    return false;
                };
                all.remove(pos);
                self.normalize();
                true
            }
        }
    }

    /// Live listeners, dropping dead entries on the way.
    pub(super) fn snapshot(&mut self) -> Vec<Arc<dyn ObserverListener>> {
        let live = match self {
            Self::None => Vec::new(),
            Self::One(only) => only.upgrade().into_iter().collect(),
            Self::Many(all) => {
                let mut live = Vec::with_capacity(all.len());
                all.retain(|l| match l.upgrade() {
                    Some(listener) => {
                        live.push(listener);
                        true
                    }
                    None => false,
                });
                live
            }
        };
        if let Self::One(only) = self {
            if only.strong_count() == 0 {
                *self = Self::None;
            }
        }
        self.normalize();
        live
    }

    fn normalize(&mut self) {
        if let Self::Many(all) = self {
            match all.len() {
                0 => *self = Self::None,
                1 => *self = Self::One(all.remove(0)),
                _ => {}
            }
        }
    }
}
