use crate::base::{BaseSlot, BlockError, ContextPtr, StatSlot};
use crate::logging;
use lazy_static::lazy_static;
use std::sync::Arc;

const STAT_SLOT_ORDER: u32 = 1000;

lazy_static! {
    pub static ref DEFAULT_STAT_SLOT: Arc<Slot> = Arc::new(Slot {});
}

pub fn default_stat_slot() -> Arc<Slot> {
    DEFAULT_STAT_SLOT.clone()
}

/// Slot logs block events at WARN, naming the resource and the rule that
/// rejected it. It does no per-pass logging, since that would dominate
/// throughput on a healthy resource.
pub struct Slot {}

impl BaseSlot for Slot {
    fn order(&self) -> u32 {
        STAT_SLOT_ORDER
    }
}

impl StatSlot for Slot {
    fn on_entry_pass(&self, _ctx: ContextPtr) {}

    fn on_entry_blocked(&self, ctx: ContextPtr, block_error: Option<BlockError>) {
        cfg_if_async! {
            let ctx = ctx.read().unwrap(),
            let ctx = ctx.borrow()
        };
        match block_error {
            Some(err) => logging::warn!(
                "[Slot] Blocked, resource {}, error {}",
                ctx.resource().name(),
                err
            ),
            None => logging::warn!(
                "[Slot] Blocked, resource {}, reason unknown",
                ctx.resource().name()
            ),
        }
    }

    fn on_completed(&self, _ctx: ContextPtr) {}
}
