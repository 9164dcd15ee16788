use crate::base::SentinelRule;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// MetricType names the system-wide signal a `Rule` gates admission on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    /// InboundQPS is the pass rate across every inbound resource.
    InboundQPS,
    /// Concurrency is the number of in-flight inbound invocations.
    Concurrency,
    /// AvgRT is the average round-trip-time across every inbound resource.
    AvgRT,
    /// Load is the 1-minute load average reported by the system collector.
    Load,
    /// CpuUsage is the current process's CPU usage ratio.
    CpuUsage,
}

/// AdaptiveStrategy controls how a `Load`/`CpuUsage` rule decides to admit a
/// request once its raw threshold has been crossed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdaptiveStrategy {
    /// NoAdaptive blocks unconditionally once the threshold is crossed.
    NoAdaptive,
    /// BBR additionally admits the request if the simplified BBR guard
    /// judges the process is not yet saturated (see `can_pass_check`).
    BBR,
}

impl Default for AdaptiveStrategy {
    fn default() -> Self {
        Self::NoAdaptive
    }
}

/// Rule describes a single system-level admission gate: once `metric_type`
/// exceeds `threshold`, inbound requests are blocked, subject to
/// `strategy`'s BBR exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub id: String,
    pub metric_type: MetricType,
    pub threshold: f64,
    pub strategy: AdaptiveStrategy,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            #[cfg(target_arch = "wasm32")]
            id: String::new(),
            #[cfg(not(target_arch = "wasm32"))]
            id: uuid::Uuid::new_v4().to_string(),
            metric_type: MetricType::InboundQPS,
            threshold: 0.0,
            strategy: AdaptiveStrategy::default(),
        }
    }
}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.metric_type.hash(state);
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.metric_type == other.metric_type
            && self.threshold == other.threshold
            && self.strategy == other.strategy
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SystemRule{{id={}, metric_type={:?}, threshold={}, strategy={:?}}}",
            self.id, self.metric_type, self.threshold, self.strategy
        )
    }
}

impl SentinelRule for Rule {
    fn resource_name(&self) -> String {
        format!("{:?}", self.metric_type)
    }

    fn is_valid(&self) -> Result<()> {
        if self.threshold < 0.0 {
            return Err(crate::Error::msg("negative threshold"));
        }
        Ok(())
    }
}
