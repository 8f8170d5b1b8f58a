//! Single-segment path: one member on the target.

use super::base::{PathWalker, WalkContext, WalkOutcome};

pub(super) struct SingleWalker;

impl PathWalker for SingleWalker {
    fn walk(&self, ctx: &WalkContext<'_>) -> WalkOutcome {
        if ctx.target.is_absent() {
            return WalkOutcome::unavailable(Vec::new());
        }
        match ctx.member_at(0, ctx.target) {
            Ok(Some(member)) => WalkOutcome::complete(ctx.target.clone(), vec![member], Vec::new()),
            Ok(None) => WalkOutcome::unavailable(Vec::new()),
            Err(err) => WalkOutcome::failed(err, Vec::new()),
        }
    }
}
