//! Resource
//!
use serde::{Deserialize, Serialize};
use std::fmt;

/// ResourceType represents classification of the resources.
/// Resource of different types won't be aggregated into the same `crate::stat::ClusterNode`,
/// even if the resource names are the same.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Common = 0,
    Web = 1,
    Rpc = 2,
    ApiGateway = 3,
    DbSql = 4,
    Cache = 5,
    Mq = 6,
}

impl Default for ResourceType {
    fn default() -> Self {
        Self::Common
    }
}

impl From<ResourceType> for u8 {
    fn from(t: ResourceType) -> u8 {
        match t {
            ResourceType::Common => 0,
            ResourceType::Web => 1,
            ResourceType::Rpc => 2,
            ResourceType::ApiGateway => 3,
            ResourceType::DbSql => 4,
            ResourceType::Cache => 5,
            ResourceType::Mq => 6,
        }
    }
}

impl From<u8> for ResourceType {
    fn from(v: u8) -> ResourceType {
        match v {
            1 => ResourceType::Web,
            2 => ResourceType::Rpc,
            3 => ResourceType::ApiGateway,
            4 => ResourceType::DbSql,
            5 => ResourceType::Cache,
            6 => ResourceType::Mq,
            _ => ResourceType::Common,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// TrafficType describes the traffic type: inbound or outbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficType {
    /// Inbound represents incoming traffic, e.g. a request the current
    /// process is handling on behalf of a caller.
    Inbound,
    /// Outbound represents outgoing traffic, e.g. a request the current
    /// process is making to a downstream dependency.
    Outbound,
}

impl Default for TrafficType {
    fn default() -> Self {
        Self::Outbound
    }
}

impl fmt::Display for TrafficType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => write!(f, "Inbound"),
            Self::Outbound => write!(f, "Outbound"),
        }
    }
}

/// ResourceWrapper identifies a resource together with its type and traffic
/// direction. Two wrappers with the same name but a different `resource_type`
/// are tracked as distinct resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceWrapper {
    name: String,
    resource_type: ResourceType,
    traffic_type: TrafficType,
}

impl ResourceWrapper {
    pub fn new(name: String, resource_type: ResourceType, traffic_type: TrafficType) -> Self {
        ResourceWrapper {
            name,
            resource_type,
            traffic_type,
        }
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn traffic_type(&self) -> &TrafficType {
        &self.traffic_type
    }
}

impl fmt::Display for ResourceWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResourceWrapper{{name={}, type={}, traffic_type={}}}",
            self.name, self.resource_type, self.traffic_type
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resource_type_round_trip() {
        for t in [
            ResourceType::Common,
            ResourceType::Web,
            ResourceType::Rpc,
            ResourceType::ApiGateway,
            ResourceType::DbSql,
            ResourceType::Cache,
            ResourceType::Mq,
        ] {
            let byte: u8 = t.into();
            assert_eq!(t, ResourceType::from(byte));
        }
    }

    #[test]
    fn wrapper_accessors() {
        let rw = ResourceWrapper::new("abc".into(), ResourceType::Web, TrafficType::Inbound);
        assert_eq!(rw.name(), "abc");
        assert_eq!(*rw.resource_type(), ResourceType::Web);
        assert_eq!(*rw.traffic_type(), TrafficType::Inbound);
    }
}
