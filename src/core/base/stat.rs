//! Stat
//!
use super::MetricItem;
use crate::{Error, Result};
use enum_map::Enum;
use lazy_static::lazy_static;
use std::sync::Arc;

/// MetricEvent enumerates the countable events a bucket tracks. Kept as an
/// `enum_map::Enum` so a bucket can hold one atomic counter per event in a
/// fixed-size array instead of a hash map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum MetricEvent {
    /// Pass represents the traffic passed by the rule checks.
    Pass,
    /// Block represents the traffic blocked by the rule checks.
    Block,
    /// Complete represents the traffic finished (entry exited) during the
    /// bucket's time span, whether passed or not.
    Complete,
    /// Error represents the traffic that ended with an error during the
    /// bucket's time span.
    Error,
    /// Rt accumulates round-trip-time in milliseconds; divided by
    /// `Complete`'s count it gives the average round-trip-time.
    Rt,
    /// OccupiedPass represents the borrowed-from-the-future traffic granted
    /// by the warm-up/throttling shapers.
    OccupiedPass,
}

/// TimePredicate filters buckets/metric items by their window start time (in
/// milliseconds), used by `MetricItemRetriever` to restrict a query to a
/// specific time range.
pub type TimePredicate = dyn Fn(u64) -> bool;

/// ReadStat is implemented by anything that can answer statistic queries
/// over a resource's or node's sliding window.
pub trait ReadStat: Send + Sync + std::fmt::Debug {
    /// qps returns the rate (events per second) of `event` in the current
    /// (possibly partial) window.
    fn qps(&self, event: MetricEvent) -> f64;
    /// qps_previous returns the rate of `event` one bucket before the
    /// current one, used by the warm-up shaper to judge trend.
    fn qps_previous(&self, event: MetricEvent) -> f64;
    /// sum returns the raw event count over the whole window.
    fn sum(&self, event: MetricEvent) -> u64;
    /// min_rt returns the smallest per-bucket round-trip-time observed in
    /// the current window, in milliseconds.
    fn min_rt(&self) -> f64;
    /// avg_rt returns the average round-trip-time over the window, in
    /// milliseconds.
    fn avg_rt(&self) -> f64;
}

/// WriteStat is implemented by the mutable statistic storage backing a node
/// (the leap array); rule checks never call it directly, only the
/// statistic slot does, after a checking round completes.
pub trait WriteStat: Send + Sync + std::fmt::Debug {
    fn add_count(&self, event: MetricEvent, count: u64);
    fn update_concurrency(&self, concurrency: u32);
}

/// ConcurrencyStat tracks in-flight invocations for a resource or node,
/// independent of the windowed counters (concurrency is a gauge, not a
/// rate).
pub trait ConcurrencyStat: Send + Sync {
    fn current_concurrency(&self) -> u32;
    fn increase_concurrency(&self);
    fn decrease_concurrency(&self);
}

/// StatNode is the capability common to every node kind in the statistic
/// graph (`crate::stat::DefaultNode`, `ClusterNode`, `OriginNode`): it can
/// read, write and track concurrency, and it can mint an independent,
/// reusable read-only view over its own underlying leap array for a rule
/// that asks for a different sampling granularity than the node's default.
pub trait StatNode: ReadStat + WriteStat + ConcurrencyStat + super::MetricItemRetriever {
    /// generate_read_stat builds a `ReadStat` view sharing this node's
    /// underlying leap array, resampled to `sample_count`/`interval_ms`, as
    /// long as the new window evenly divides the shared array's buckets
    /// (see `check_validity_for_reuse_statistic`).
    fn generate_read_stat(&self, sample_count: u32, interval_ms: u32) -> Result<Arc<dyn ReadStat>>;
}

/// GLOBAL_STATISTIC_NON_REUSABLE_ERROR is returned by
/// `check_validity_for_reuse_statistic` when a rule's requested window
/// cannot be served by resampling the resource's shared leap array, meaning
/// an independent leap array must be allocated for it instead.
pub const GLOBAL_STATISTIC_NON_REUSABLE_ERROR: &str =
    "the rule's sample_count/interval_ms cannot reuse the resource's global statistic";

/// NopReadStat answers every read with a zero value, used as the statistic
/// backing a `StandaloneStat` for rules that don't need one (e.g. custom
/// control strategies that never consult metrics).
#[derive(Debug, Default)]
pub struct NopReadStat;

impl ReadStat for NopReadStat {
    fn qps(&self, _event: MetricEvent) -> f64 {
        0.0
    }
    fn qps_previous(&self, _event: MetricEvent) -> f64 {
        0.0
    }
    fn sum(&self, _event: MetricEvent) -> u64 {
        0
    }
    fn min_rt(&self) -> f64 {
        0.0
    }
    fn avg_rt(&self) -> f64 {
        0.0
    }
}

/// NopWriteStat discards every write, paired with `NopReadStat`.
#[derive(Debug, Default)]
pub struct NopWriteStat;

impl WriteStat for NopWriteStat {
    fn add_count(&self, _event: MetricEvent, _count: u64) {}
    fn update_concurrency(&self, _concurrency: u32) {}
}

lazy_static! {
    static ref NOP_READ_STAT: Arc<NopReadStat> = Arc::new(NopReadStat);
    static ref NOP_WRITE_STAT: Arc<NopWriteStat> = Arc::new(NopWriteStat);
}

#[inline]
pub fn nop_read_stat() -> Arc<NopReadStat> {
    NOP_READ_STAT.clone()
}

#[inline]
pub fn nop_write_stat() -> Arc<NopWriteStat> {
    NOP_WRITE_STAT.clone()
}

/// check_validity_for_reuse_statistic verifies that a `(sample_count,
/// interval_ms)` pair can be served by resampling an existing leap array of
/// `bucket_sample_count`/`bucket_interval_ms`: the new window must not be
/// finer than the shared array's own bucket length, and both must divide
/// evenly so that bucket boundaries line up.
pub fn check_validity_for_reuse_statistic(
    sample_count: u32,
    interval_ms: u32,
    bucket_sample_count: u32,
    bucket_interval_ms: u32,
) -> Result<()> {
    if sample_count == 0 || interval_ms == 0 || interval_ms % sample_count != 0 {
        return Err(Error::msg(
            "invalid sample_count/interval_ms: interval_ms must be divisible by sample_count",
        ));
    }
    let bucket_length_ms = interval_ms / sample_count;
    if bucket_sample_count == 0 || bucket_interval_ms == 0 {
        return Err(Error::msg(
            "invalid bucket_sample_count/bucket_interval_ms",
        ));
    }
    let bucket_bucket_length_ms = bucket_interval_ms / bucket_sample_count;
    if bucket_length_ms < bucket_bucket_length_ms {
        return Err(Error::msg(
            "the reused window cannot be finer-grained than the shared leap array",
        ));
    }
    if bucket_length_ms % bucket_bucket_length_ms != 0 || interval_ms > bucket_interval_ms {
        return Err(Error::msg(
            "the reused window must divide evenly into the shared leap array's buckets",
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) use mock::MockStatNode;


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reuse_exact() {
        assert!(check_validity_for_reuse_statistic(20, 10000, 20, 10000).is_ok());
    }

    #[test]
    fn reuse_coarser_window() {
        // 2 buckets of 5s each, reusing an array with 500ms buckets.
        assert!(check_validity_for_reuse_statistic(2, 10000, 20, 10000).is_ok());
    }

    #[test]
    fn reuse_finer_window_rejected() {
        assert!(check_validity_for_reuse_statistic(40, 10000, 20, 10000).is_err());
    }

    #[test]
    fn reuse_misaligned_rejected() {
        assert!(check_validity_for_reuse_statistic(3, 10000, 20, 10000).is_err());
    }
}
