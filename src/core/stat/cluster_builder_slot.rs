use super::{get_or_create_cluster_node, DefaultNode};
use crate::base::{BaseSlot, ContextPtr, StatPrepareSlot};
use crate::utils::AsAny;
use lazy_static::lazy_static;
use std::sync::Arc;

const PREPARE_SLOT_ORDER: u32 = 2000;

lazy_static! {
    pub static ref DEFAULT_CLUSTER_BUILDER_SLOT: Arc<ClusterBuilderSlot> =
        Arc::new(ClusterBuilderSlot {});
}

pub fn default_cluster_builder_slot() -> Arc<ClusterBuilderSlot> {
    DEFAULT_CLUSTER_BUILDER_SLOT.clone()
}

/// ClusterBuilderSlot resolves the resource's global `ClusterNode` and
/// attaches it to the entry's `DefaultNode` on first encounter, then
/// resolves (and attaches) the `OriginNode` for the context's origin so
/// origin-scoped flow rules have something to read.
pub struct ClusterBuilderSlot {}

impl BaseSlot for ClusterBuilderSlot {
    fn order(&self) -> u32 {
        PREPARE_SLOT_ORDER
    }
}

impl StatPrepareSlot for ClusterBuilderSlot {
    cfg_async! {
        fn prepare(&self, ctx: ContextPtr) {
            let cluster_node = get_or_create_cluster_node(
                ctx.read().unwrap().resource().name(),
                ctx.read().unwrap().resource().resource_type(),
            );
            let origin_node = cluster_node.get_or_create_origin_node(ctx.read().unwrap().origin());
            if let Some(node) = ctx.read().unwrap().stat_node() {
                if let Ok(default_node) = node.as_any_arc().downcast::<DefaultNode>() {
                    default_node.set_cluster_node(cluster_node.clone());
                }
            }
            ctx.write()
                .unwrap()
                .set_origin_node(origin_node.map(|n| n as Arc<dyn crate::base::StatNode>));
        }
    }

    cfg_not_async! {
        fn prepare(&self, ctx: ContextPtr) {
            let cluster_node = get_or_create_cluster_node(
                ctx.borrow().resource().name(),
                ctx.borrow().resource().resource_type(),
            );
            let origin_node = cluster_node.get_or_create_origin_node(ctx.borrow().origin());
            if let Some(node) = ctx.borrow().stat_node() {
                if let Ok(default_node) = node.as_any_arc().downcast::<DefaultNode>() {
                    default_node.set_cluster_node(cluster_node.clone());
                }
            }
            ctx.borrow_mut()
                .set_origin_node(origin_node.map(|n| n as Arc<dyn crate::base::StatNode>));
        }
    }
}
