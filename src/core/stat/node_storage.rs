use super::{ClusterNode, DefaultNode};
use crate::{
    base::{ResourceType, DEFAULT_MAX_RESOURCE_AMOUNT, TOTAL_IN_BOUND_RESOURCE_NAME},
    logging,
};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type ClusterNodeMap = HashMap<String, Arc<ClusterNode>>;
type DefaultNodeMap = HashMap<(String, String), Arc<DefaultNode>>;

lazy_static! {
    pub static ref INBOUND_NODE: Arc<ClusterNode> = Arc::new(ClusterNode::new(
        TOTAL_IN_BOUND_RESOURCE_NAME.into(),
        ResourceType::Common
    ));
    static ref CLUSTER_NODE_MAP: RwLock<ClusterNodeMap> = RwLock::new(ClusterNodeMap::new());
    static ref DEFAULT_NODE_MAP: RwLock<DefaultNodeMap> = RwLock::new(DefaultNodeMap::new());
}

pub fn inbound_node() -> Arc<ClusterNode> {
    INBOUND_NODE.clone()
}

/// cluster_node_list returns the slice of all existing cluster nodes.
pub fn cluster_node_list() -> Vec<Arc<ClusterNode>> {
    let node_map = CLUSTER_NODE_MAP.read().unwrap();
    node_map.values().cloned().collect()
}

pub fn get_cluster_node(res_name: &str) -> Option<Arc<ClusterNode>> {
    let node_map = CLUSTER_NODE_MAP.read().unwrap();
    node_map.get(res_name).cloned()
}

/// get_or_create_cluster_node returns the resource's `ClusterNode`, creating
/// it on first sight. Once `DEFAULT_MAX_RESOURCE_AMOUNT` distinct resources
/// have been seen, new resources are still admitted (the request is not
/// blocked) but a fresh, untracked node is handed back instead of being
/// inserted into the map: their traffic is no longer statistically tracked.
pub fn get_or_create_cluster_node(
    res_name: &str,
    resource_type: &ResourceType,
) -> Arc<ClusterNode> {
    if let Some(node) = get_cluster_node(res_name) {
        return node;
    }
    let mut node_map = CLUSTER_NODE_MAP.write().unwrap();
    if let Some(node) = node_map.get(res_name) {
        return node.clone();
    }
    if node_map.len() >= DEFAULT_MAX_RESOURCE_AMOUNT {
        logging::warn!(
            "[get_or_create_cluster_node] Resource amount exceeds the threshold {}, resource {} will not be tracked",
            DEFAULT_MAX_RESOURCE_AMOUNT,
            res_name
        );
        return Arc::new(ClusterNode::new(res_name.to_owned(), *resource_type));
    }
    let node = Arc::new(ClusterNode::new(res_name.to_owned(), *resource_type));
    node_map.insert(res_name.to_owned(), node.clone());
    node
}

/// get_or_create_default_node returns the `DefaultNode` for (resource,
/// context), creating it and attaching the resource's `ClusterNode` on
/// first sight.
pub fn get_or_create_default_node(
    res_name: &str,
    context_name: &str,
    resource_type: &ResourceType,
) -> Arc<DefaultNode> {
    let key = (res_name.to_owned(), context_name.to_owned());
    if let Some(node) = DEFAULT_NODE_MAP.read().unwrap().get(&key) {
        return node.clone();
    }
    let mut node_map = DEFAULT_NODE_MAP.write().unwrap();
    if let Some(node) = node_map.get(&key) {
        return node.clone();
    }
    let node = Arc::new(DefaultNode::new(
        res_name.to_owned(),
        *resource_type,
        context_name.to_owned(),
    ));
    node.set_cluster_node(get_or_create_cluster_node(res_name, resource_type));
    node_map.insert(key, node.clone());
    node
}

pub fn reset_cluster_node_map() {
    CLUSTER_NODE_MAP.write().unwrap().clear();
    DEFAULT_NODE_MAP.write().unwrap().clear();
}
