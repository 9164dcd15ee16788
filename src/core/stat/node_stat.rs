//! NodeStatistic bundles the leap-array bookkeeping shared by every node
//! kind in the statistic graph (`ClusterNode`, `DefaultNode`, `OriginNode`):
//! each owns one independently, so a request's counters land in its
//! `DefaultNode`, its resource's `ClusterNode` and (if applicable) its
//! `OriginNode` without any of the three needing to know how the others
//! store theirs.

use super::{BucketLeapArray, SlidingWindowMetric};
use crate::{
    base::{MetricEvent, MetricItem, ReadStat, TimePredicate, WriteStat},
    config, Result,
};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

#[derive(Debug)]
pub(crate) struct NodeStatistic {
    sample_count: u32,
    interval_ms: u32,
    concurrency: AtomicU32,
    arr: Arc<BucketLeapArray>,
    metric: Arc<SlidingWindowMetric>,
}

impl NodeStatistic {
    pub(crate) fn new() -> Self {
        let arr = Arc::new(
            BucketLeapArray::new(
                config::global_stat_sample_count_total(),
                config::global_stat_interval_ms_total(),
            )
            .unwrap(),
        );
        let sample_count = config::metric_stat_sample_count();
        let interval_ms = config::metric_stat_interval_ms();
        let metric =
            Arc::new(SlidingWindowMetric::new(sample_count, interval_ms, arr.clone()).unwrap());
        NodeStatistic {
            sample_count,
            interval_ms,
            concurrency: AtomicU32::new(0),
            arr,
            metric,
        }
    }

    pub(crate) fn default_metric(&self) -> Arc<dyn ReadStat> {
        self.metric.clone()
    }

    pub(crate) fn max_avg(&self, event: MetricEvent) -> f64 {
        self.metric.max_of_single_bucket(event) as f64 * self.sample_count as f64
            / self.interval_ms as f64
            * 1000f64
    }

    pub(crate) fn max_concurrency(&self) -> u32 {
        self.metric.max_concurrency()
    }

    pub(crate) fn metrics_on_condition(&self, predicate: &TimePredicate) -> Vec<MetricItem> {
        self.metric.second_metrics_on_condition(predicate)
    }

    pub(crate) fn qps(&self, event: MetricEvent) -> f64 {
        self.metric.qps(event)
    }

    pub(crate) fn qps_previous(&self, event: MetricEvent) -> f64 {
        self.metric.qps_previous(event)
    }

    pub(crate) fn sum(&self, event: MetricEvent) -> u64 {
        self.metric.sum(event)
    }

    pub(crate) fn min_rt(&self) -> f64 {
        self.metric.min_rt()
    }

    pub(crate) fn avg_rt(&self) -> f64 {
        self.metric.avg_rt()
    }

    pub(crate) fn add_count(&self, event: MetricEvent, count: u64) {
        self.arr.add_count(event, count);
    }

    pub(crate) fn update_concurrency(&self, concurrency: u32) {
        self.arr.update_concurrency(concurrency);
    }

    pub(crate) fn current_concurrency(&self) -> u32 {
        self.concurrency.load(Ordering::SeqCst)
    }

    pub(crate) fn increase_concurrency(&self) {
        self.arr
            .update_concurrency(self.concurrency.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn decrease_concurrency(&self) {
        self.concurrency.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn generate_read_stat(
        &self,
        sample_count: u32,
        interval_ms: u32,
    ) -> Result<Arc<dyn ReadStat>> {
        let stat = SlidingWindowMetric::new(sample_count, interval_ms, self.arr.clone())?;
        Ok(Arc::new(stat))
    }
}
