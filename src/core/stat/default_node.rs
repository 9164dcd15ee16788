//! DefaultNode is the per-(resource, context) statistic: the node the
//! statistic slot writes through on every entry. Every write also bubbles
//! into the resource's shared `ClusterNode`, attached by `ClusterBuilderSlot`
//! on the first entry for a given context, so cluster-wide rule checks see
//! the same traffic without the statistic slot having to know about it.

use super::{ClusterNode, NodeStatistic};
use crate::base::{
    ConcurrencyStat, MetricEvent, MetricItem, MetricItemRetriever, ReadStat, ResourceType,
    StatNode, TimePredicate, WriteStat,
};
use crate::Result;
use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub struct DefaultNode {
    pub(crate) res_name: String,
    pub(crate) resource_type: ResourceType,
    pub(crate) context_name: String,
    stat: NodeStatistic,
    cluster_node: RwLock<Option<Arc<ClusterNode>>>,
}

impl DefaultNode {
    pub(crate) fn new(res_name: String, resource_type: ResourceType, context_name: String) -> Self {
        DefaultNode {
            res_name,
            resource_type,
            context_name,
            stat: NodeStatistic::new(),
            cluster_node: RwLock::new(None),
        }
    }

    pub fn cluster_node(&self) -> Option<Arc<ClusterNode>> {
        self.cluster_node.read().unwrap().clone()
    }

    pub fn set_cluster_node(&self, node: Arc<ClusterNode>) {
        *self.cluster_node.write().unwrap() = Some(node);
    }

    pub fn default_metric(&self) -> Arc<dyn ReadStat> {
        self.stat.default_metric()
    }
}

impl MetricItemRetriever for DefaultNode {
    fn metrics_on_condition(&self, predicate: &TimePredicate) -> Vec<MetricItem> {
        self.stat.metrics_on_condition(predicate)
    }
}

impl ReadStat for DefaultNode {
    fn qps(&self, event: MetricEvent) -> f64 {
        self.stat.qps(event)
    }
    fn qps_previous(&self, event: MetricEvent) -> f64 {
        self.stat.qps_previous(event)
    }
    fn sum(&self, event: MetricEvent) -> u64 {
        self.stat.sum(event)
    }
    fn min_rt(&self) -> f64 {
        self.stat.min_rt()
    }
    fn avg_rt(&self) -> f64 {
        self.stat.avg_rt()
    }
}

impl WriteStat for DefaultNode {
    fn add_count(&self, event: MetricEvent, count: u64) {
        self.stat.add_count(event, count);
        if let Some(cluster) = self.cluster_node() {
            cluster.add_count(event, count);
        }
    }

    fn update_concurrency(&self, concurrency: u32) {
        self.stat.update_concurrency(concurrency);
    }
}

impl ConcurrencyStat for DefaultNode {
    fn current_concurrency(&self) -> u32 {
        self.stat.current_concurrency()
    }

    fn increase_concurrency(&self) {
        self.stat.increase_concurrency();
        if let Some(cluster) = self.cluster_node() {
            cluster.increase_concurrency();
        }
    }

    fn decrease_concurrency(&self) {
        self.stat.decrease_concurrency();
        if let Some(cluster) = self.cluster_node() {
            cluster.decrease_concurrency();
        }
    }
}

impl StatNode for DefaultNode {
    fn generate_read_stat(&self, sample_count: u32, interval_ms: u32) -> Result<Arc<dyn ReadStat>> {
        self.stat.generate_read_stat(sample_count, interval_ms)
    }
}
