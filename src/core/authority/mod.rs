//! `authority` gates requests by the identity of their caller.
//!
//! Each `Rule` names a resource and a list of callers (`limit_app`), applied
//! either as a whitelist (only listed callers pass) or a blacklist (listed
//! callers are rejected). The caller identity is read from the invocation
//! `Context`'s `origin` field, which upstream code is expected to populate
//! before the entry is checked.

pub mod rule;
pub mod rule_manager;
pub mod slot;

pub use rule::*;
pub use rule_manager::*;
pub use slot::*;
