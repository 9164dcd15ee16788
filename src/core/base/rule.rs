//! Rule
//!
use crate::Result;
use std::fmt;

/// SentinelRule is the capability all concrete rule kinds (flow, circuit
/// breaker, system) share: a human-readable resource name for grouping and
/// reporting, and a validity check run before a rule is admitted into a rule
/// manager's map.
pub trait SentinelRule: fmt::Debug + fmt::Display + Send + Sync {
    /// resource_name returns the resource (or, for system rules, the
    /// pseudo-resource) this rule governs.
    fn resource_name(&self) -> String;

    /// is_valid reports whether the rule's fields form a usable rule.
    /// Rule managers call this before inserting a rule and drop (with a
    /// warning) any rule that fails.
    fn is_valid(&self) -> Result<()> {
        Ok(())
    }
}
