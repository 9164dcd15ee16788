use super::get_or_create_default_node;
use crate::base::{BaseSlot, ContextPtr, StatPrepareSlot};
use lazy_static::lazy_static;
use std::sync::Arc;

const PREPARE_SLOT_ORDER: u32 = 1000;

lazy_static! {
    pub static ref DEFAULT_NODE_SELECTOR_SLOT: Arc<NodeSelectorSlot> =
        Arc::new(NodeSelectorSlot {});
}

pub fn default_node_selector_slot() -> Arc<NodeSelectorSlot> {
    DEFAULT_NODE_SELECTOR_SLOT.clone()
}

/// NodeSelectorSlot resolves (and, on first sight, creates) the `DefaultNode`
/// for the entry's (resource, context) pair and attaches it to the context,
/// before any rule-check slot runs.
pub struct NodeSelectorSlot {}

impl BaseSlot for NodeSelectorSlot {
    fn order(&self) -> u32 {
        PREPARE_SLOT_ORDER
    }
}

impl StatPrepareSlot for NodeSelectorSlot {
    cfg_async! {
        fn prepare(&self, ctx: ContextPtr) {
            let node = get_or_create_default_node(
                ctx.read().unwrap().resource().name(),
                ctx.read().unwrap().name(),
                ctx.read().unwrap().resource().resource_type(),
            );
            ctx.write().unwrap().set_stat_node(node);
        }
    }

    cfg_not_async! {
        fn prepare(&self, ctx: ContextPtr) {
            let node = get_or_create_default_node(
                ctx.borrow().resource().name(),
                ctx.borrow().name(),
                ctx.borrow().resource().resource_type(),
            );
            ctx.borrow_mut().set_stat_node(node);
        }
    }
}
