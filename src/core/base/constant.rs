//! Constants shared across the base module.

/// DEFAULT_STATISTIC_MAX_RT is used as the initial value of a bucket's
/// minimum round-trip-time, so that the first real sample always lowers it.
pub const DEFAULT_STATISTIC_MAX_RT: u64 = 4900;

/// DEFAULT_MAX_RESOURCE_AMOUNT bounds how many distinct resource names the
/// global node map tracks, guarding against unbounded memory growth from a
/// caller that mints resource names dynamically (e.g. from request paths).
pub const DEFAULT_MAX_RESOURCE_AMOUNT: usize = 6000;

/// TOTAL_IN_BOUND_RESOURCE_NAME names the node that aggregates every inbound
/// resource, used by the system-load gate (`crate::system`) which reasons
/// about the process as a whole rather than a single resource.
pub const TOTAL_IN_BOUND_RESOURCE_NAME: &str = "__total_inbound_traffic__";

/// MAX_CONTEXT_NAME_SIZE bounds the number of distinct context names
/// (callers/origins) a single resource's `ClusterNode` will track.
pub const MAX_CONTEXT_NAME_SIZE: usize = 2000;

/// DEFAULT_CONTEXT_NAME is used for entries created without an explicit
/// origin/context name.
pub const DEFAULT_CONTEXT_NAME: &str = "sentinel_default_context";

/// SLOT_INIT is the initial capacity reserved for each slot-kind vector in a
/// `SlotChain`, sized to the number of built-in slots so registering the
/// default chain never reallocates.
pub const SLOT_INIT: usize = 8;
