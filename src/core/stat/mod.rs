/// The `stat` mod implements statistic slots and basic data structures,
/// such as the slding window and its underlying LeapArray
mod base;
mod cluster_builder_slot;
mod cluster_node;
mod default_node;
mod node_selector_slot;
mod node_stat;
mod node_storage;
mod origin_node;
mod stat_slot;

pub(crate) use base::*;
pub(crate) use cluster_builder_slot::*;
pub(crate) use cluster_node::*;
pub(crate) use default_node::*;
pub(crate) use node_selector_slot::*;
pub(crate) use node_stat::*;
pub use node_storage::*;
pub(crate) use origin_node::*;
pub(crate) use stat_slot::*;
