//! Multi-segment path walk.
//!
//! Every non-terminal member is observed (only the first one for root-only
//! observers), read, and its value becomes the next step's target. An absent
//! value stops the walk as unavailable; subscriptions made so far are kept so
//! the path re-resolves once the link is filled in again.

use super::base::{PathWalker, WalkContext, WalkOutcome};

pub(super) struct MultiWalker {
    pub(super) root_only: bool,
}

impl PathWalker for MultiWalker {
    fn walk(&self, ctx: &WalkContext<'_>) -> WalkOutcome {
        let count = ctx.path.len();
        let mut subscriptions = Vec::new();
        let mut members = Vec::with_capacity(count);
        let mut current = ctx.target.clone();

        for index in 0..count {
            if current.is_absent() {
                return WalkOutcome::unavailable(subscriptions);
            }
            let member = match ctx.member_at(index, &current) {
                Ok(Some(member)) => member,
                Ok(None) => return WalkOutcome::unavailable(subscriptions),
                Err(err) => return WalkOutcome::failed(err, subscriptions),
            };
            if index + 1 == count {
                members.push(member);
                break;
            }

            if ctx.is_observable() && (!self.root_only || index == 0) {
                subscriptions.extend(member.try_observe(&current, ctx.link.clone()));
            }
            let next = match member.get_value(&current) {
                Ok(value) => value,
                Err(err) => return WalkOutcome::failed(err, subscriptions),
            };
            members.push(member);
            current = next;
        }

        WalkOutcome::complete(current, members, subscriptions)
    }
}
