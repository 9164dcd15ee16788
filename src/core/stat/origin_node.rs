//! OriginNode holds the statistic for one calling origin of one resource,
//! created on demand by its resource's `ClusterNode` and capped by
//! `MAX_CONTEXT_NAME_SIZE` so a misbehaving caller can't grow the origin
//! map without bound.

use super::NodeStatistic;
use crate::base::{
    ConcurrencyStat, MetricEvent, MetricItem, MetricItemRetriever, ReadStat, ResourceType,
    StatNode, TimePredicate, WriteStat,
};
use crate::Result;
use std::sync::Arc;

#[derive(Debug)]
pub struct OriginNode {
    pub(crate) res_name: String,
    pub(crate) resource_type: ResourceType,
    pub(crate) origin: String,
    stat: NodeStatistic,
}

impl OriginNode {
    pub(crate) fn new(res_name: String, resource_type: ResourceType, origin: String) -> Self {
        OriginNode {
            res_name,
            resource_type,
            origin,
            stat: NodeStatistic::new(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl MetricItemRetriever for OriginNode {
    fn metrics_on_condition(&self, predicate: &TimePredicate) -> Vec<MetricItem> {
        self.stat.metrics_on_condition(predicate)
    }
}

impl ReadStat for OriginNode {
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

impl WriteStat for OriginNode {
    fn add_count(&self, event: MetricEvent, count: u64) {
        self.stat.add_count(event, count);
    }

    fn update_concurrency(&self, concurrency: u32) {
        self.stat.update_concurrency(concurrency);
    }
}

impl ConcurrencyStat for OriginNode {
    fn current_concurrency(&self) -> u32 {
        self.stat.current_concurrency()
    }

    fn increase_concurrency(&self) {
        self.stat.increase_concurrency()
    }

    fn decrease_concurrency(&self) {
        self.stat.decrease_concurrency()
    }
}

impl StatNode for OriginNode {
    fn generate_read_stat(&self, sample_count: u32, interval_ms: u32) -> Result<Arc<dyn ReadStat>> {
        self.stat.generate_read_stat(sample_count, interval_ms)
    }
}
