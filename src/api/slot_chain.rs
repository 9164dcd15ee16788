use crate::base::SlotChain;
use crate::{authority, circuitbreaker, flow, log, stat, system};
use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    static ref GLOBAL_SLOT_CHAIN: Arc<SlotChain> = {
        let mut sc = SlotChain::new();

        // NodeSelectorSlot / ClusterBuilderSlot: build/attach the resource's
        // statistic node before any rule gets a chance to read it.
        sc.add_stat_prepare_slot(stat::default_node_selector_slot());
        sc.add_stat_prepare_slot(stat::default_cluster_builder_slot());

        sc.add_rule_check_slot(authority::default_slot());
        sc.add_rule_check_slot(system::default_slot());
        sc.add_rule_check_slot(flow::default_slot());
        sc.add_rule_check_slot(circuitbreaker::default_slot());

        // StatisticSlot
        sc.add_stat_slot(stat::default_resource_stat_slot());
        sc.add_stat_slot(log::default_stat_slot());
        sc.add_stat_slot(flow::default_stand_alone_stat_slot());
        sc.add_stat_slot(circuitbreaker::default_metric_stat_slot());

        Arc::new(sc)
    };
}

/// global_slot_chain returns the process-wide default chain used by
/// `EntryBuilder` unless a caller supplies its own via `with_slot_chain`.
pub fn global_slot_chain() -> Arc<SlotChain> {
    GLOBAL_SLOT_CHAIN.clone()
}
