//! Empty path: the target is its own last member.

use bindery_core::MemberDescriptor;

use super::base::{PathWalker, WalkContext, WalkOutcome};

pub(super) struct EmptyWalker;

impl PathWalker for EmptyWalker {
    fn walk(&self, ctx: &WalkContext<'_>) -> WalkOutcome {
        match ctx.target.runtime_type() {
            Some(ty) => WalkOutcome::complete(
                ctx.target.clone(),
                vec![MemberDescriptor::identity(&ty)],
                Vec::new(),
            ),
            None => WalkOutcome::unavailable(Vec::new()),
        }
    }
}
