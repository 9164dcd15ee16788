//! ClusterNode is the per-resource statistic shared by every context and
//! every `DefaultNode` that enters the same resource: it's what rule
//! checking ultimately measures against for DIRECT and RELATED flow rules.
//! It also owns the resource's per-origin breakdown (`OriginNode`s),
//! created lazily as distinct callers are seen.

use super::{NodeStatistic, OriginNode};
use crate::{
    base::{
        ConcurrencyStat, MetricEvent, MetricItem, MetricItemRetriever, ReadStat, ResourceType,
        StatNode, TimePredicate, WriteStat, MAX_CONTEXT_NAME_SIZE,
    },
    logging, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub struct ClusterNode {
    pub(crate) res_name: String,
    pub(crate) resource_type: ResourceType,
    stat: NodeStatistic,
    origin_nodes: RwLock<HashMap<String, Arc<OriginNode>>>,
}

impl ClusterNode {
    pub fn new(res_name: String, resource_type: ResourceType) -> Self {
        ClusterNode {
            res_name,
            resource_type,
            stat: NodeStatistic::new(),
            origin_nodes: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_metric(&self) -> Arc<dyn ReadStat> {
        self.stat.default_metric()
    }

    pub fn max_avg(&self, event: MetricEvent) -> f64 {
        self.stat.max_avg(event)
    }

    pub fn max_concurrency(&self) -> u32 {
        self.stat.max_concurrency()
    }

    /// get_or_create_origin_node returns the `OriginNode` tracking `origin`'s
    /// traffic against this resource, creating it on first sight. Returns
    /// `None` once the resource has already seen `MAX_CONTEXT_NAME_SIZE`
    /// distinct origins: the caller is still admitted, it's just not broken
    /// out by origin any more.
    pub fn get_or_create_origin_node(&self, origin: &str) -> Option<Arc<OriginNode>> {
        if let Some(node) = self.origin_nodes.read().unwrap().get(origin) {
            return Some(node.clone());
        }
        let mut origin_nodes = self.origin_nodes.write().unwrap();
        if let Some(node) = origin_nodes.get(origin) {
            return Some(node.clone());
        }
        if origin_nodes.len() >= MAX_CONTEXT_NAME_SIZE {
            logging::warn!(
                "[ClusterNode] origin amount for resource {} exceeds the threshold {}, origin {} will not be tracked separately",
                self.res_name,
                MAX_CONTEXT_NAME_SIZE,
                origin
            );
            return None;
        }
        let node = Arc::new(OriginNode::new(
            self.res_name.clone(),
            self.resource_type,
            origin.to_owned(),
        ));
        origin_nodes.insert(origin.to_owned(), node.clone());
        Some(node)
    }
}

impl MetricItemRetriever for ClusterNode {
    fn metrics_on_condition(&self, predicate: &TimePredicate) -> Vec<MetricItem> {
        self.stat.metrics_on_condition(predicate)
    }
}

impl ReadStat for ClusterNode {
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

impl WriteStat for ClusterNode {
    fn add_count(&self, event: MetricEvent, count: u64) {
        self.stat.add_count(event, count);
    }

    fn update_concurrency(&self, concurrency: u32) {
        self.stat.update_concurrency(concurrency);
    }
}

impl ConcurrencyStat for ClusterNode {
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

impl StatNode for ClusterNode {
    fn generate_read_stat(&self, sample_count: u32, interval_ms: u32) -> Result<Arc<dyn ReadStat>> {
        self.stat.generate_read_stat(sample_count, interval_ms)
    }
}
