//! Service model.

use crate::de::{null_default, protocol_or_default};
use crate::selector::LabelSelector;
use crate::DEFAULT_PROTOCOL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A Service as captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Owning namespace.
    pub namespace: String,
    /// Service name.
    pub name: String,
    /// Exposure type.
    #[serde(default, rename = "type")]
    pub service_type: ServiceType,
    /// How externally routed traffic reaches backends.
    #[serde(default)]
    pub external_traffic_policy: ExternalTrafficPolicy,
    /// Backend pod labels. Empty when the service has no selector.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
    /// Exposed ports.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ServicePort>,
}

/// Service exposure type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Cluster-internal virtual IP.
    #[default]
    ClusterIP,
    /// Exposed on every node port.
    NodePort,
    /// Exposed through an external load balancer.
    LoadBalancer,
    /// DNS alias, no proxying.
    ExternalName,
}

/// `spec.externalTrafficPolicy` of a Service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalTrafficPolicy {
    /// Traffic may be forwarded to backends on other nodes.
    Cluster,
    /// Traffic stays on the receiving node; source IP preserved.
    Local,
    /// Field not set.
    #[default]
    Unset,
}

/// A port exposed by a Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    /// Optional port name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Service port number.
    pub port: i32,
    /// Protocol, `TCP` when unset.
    #[serde(default = "default_protocol", deserialize_with = "protocol_or_default")]
    pub protocol: String,
}

/// Identifies a service as `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ServiceRef {
    /// Namespace.
    pub namespace: String,
    /// Name.
    pub name: String,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

impl Service {
    /// Creates a ClusterIP service with no selector and no ports.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            service_type: ServiceType::default(),
            external_traffic_policy: ExternalTrafficPolicy::default(),
            selector: BTreeMap::new(),
            ports: Vec::new(),
        }
    }

    /// Sets the service type.
    #[must_use]
    pub const fn with_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = service_type;
        self
    }

    /// Sets the external traffic policy.
    #[must_use]
    pub const fn with_external_traffic_policy(mut self, policy: ExternalTrafficPolicy) -> Self {
        self.external_traffic_policy = policy;
        self
    }

    /// Adds a selector label.
    #[must_use]
    pub fn with_selector_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selector.insert(key.into(), value.into());
        self
    }

    /// Adds a port.
    #[must_use]
    pub fn with_port(mut self, port: i32, protocol: impl Into<String>) -> Self {
        self.ports.push(ServicePort {
            name: None,
            port,
            protocol: protocol.into(),
        });
        self
    }

    /// Returns the identifier of this service.
    #[must_use]
    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef::new(&self.namespace, &self.name)
    }

    /// Returns true if the service is reachable from outside the cluster
    /// through cluster-wide routing.
    #[must_use]
    pub fn routes_cluster_wide(&self) -> bool {
        self.service_type.is_externally_reachable()
            && self.external_traffic_policy != ExternalTrafficPolicy::Local
    }

    /// Returns true if the service selects its backends by label.
    #[must_use]
    pub fn has_selector(&self) -> bool {
        !self.selector.is_empty()
    }

    /// Returns the selector lifted into a [`LabelSelector`] with labels only.
    #[must_use]
    pub fn label_selector(&self) -> LabelSelector {
        LabelSelector {
            match_labels: self.selector.clone(),
            match_expressions: Vec::new(),
        }
    }

    /// Returns the `port/protocol` keys of every exposed port.
    #[must_use]
    pub fn port_keys(&self) -> Vec<String> {
        self.ports.iter().map(ServicePort::key).collect()
    }
}

impl ServicePort {
    /// Returns the `port/protocol` key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.port, self.protocol)
    }
}

impl ServiceType {
    /// Returns true for NodePort and LoadBalancer.
    #[must_use]
    pub const fn is_externally_reachable(self) -> bool {
        matches!(self, Self::NodePort | Self::LoadBalancer)
    }

    /// Parses the Kubernetes spelling; unknown or absent values are ClusterIP.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("NodePort") => Self::NodePort,
            Some("LoadBalancer") => Self::LoadBalancer,
            Some("ExternalName") => Self::ExternalName,
            _ => Self::ClusterIP,
        }
    }
}

impl ExternalTrafficPolicy {
    /// Parses the Kubernetes spelling.
    ///
    /// Kubernetes accepts the legacy `Local`/`Cluster` values in any case.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("local") => Self::Local,
            Some(v) if v.eq_ignore_ascii_case("cluster") => Self::Cluster,
            _ => Self::Unset,
        }
    }
}

impl ServiceRef {
    /// Creates a reference.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl From<ServiceRef> for String {
    fn from(value: ServiceRef) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ServiceRef {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        match value.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, name))
            }
            _ => Err(crate::Error::Validation(format!(
                "service reference '{value}' is not of the form namespace/name"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_balancer_without_local_policy_routes_cluster_wide() {
        let svc = Service::new("shop", "web").with_type(ServiceType::LoadBalancer);
        assert!(svc.routes_cluster_wide());

        let svc = svc.with_external_traffic_policy(ExternalTrafficPolicy::Cluster);
        assert!(svc.routes_cluster_wide());

        let svc = svc.with_external_traffic_policy(ExternalTrafficPolicy::Local);
        assert!(!svc.routes_cluster_wide());
    }

    #[test]
    fn cluster_ip_never_routes_cluster_wide() {
        let svc = Service::new("shop", "db")
            .with_external_traffic_policy(ExternalTrafficPolicy::Cluster);
        assert!(!svc.routes_cluster_wide());
        assert!(!Service::new("shop", "alias")
            .with_type(ServiceType::ExternalName)
            .routes_cluster_wide());
    }

    #[test]
    fn port_keys_use_port_and_protocol() {
        let svc = Service::new("shop", "web")
            .with_port(80, "TCP")
            .with_port(53, "UDP");
        assert_eq!(svc.port_keys(), vec!["80/TCP", "53/UDP"]);
    }

    #[test]
    fn service_ref_displays_and_parses() {
        let r = ServiceRef::new("shop", "web");
        assert_eq!(r.to_string(), "shop/web");
        assert_eq!(ServiceRef::try_from("shop/web".to_string()).unwrap(), r);
        assert!(ServiceRef::try_from("web".to_string()).is_err());
    }

    #[test]
    fn external_traffic_policy_parsing() {
        assert_eq!(ExternalTrafficPolicy::parse(Some("Local")), ExternalTrafficPolicy::Local);
        assert_eq!(ExternalTrafficPolicy::parse(Some("Cluster")), ExternalTrafficPolicy::Cluster);
        assert_eq!(ExternalTrafficPolicy::parse(None), ExternalTrafficPolicy::Unset);
        assert_eq!(ExternalTrafficPolicy::parse(Some("local")), ExternalTrafficPolicy::Local);
        assert_eq!(ExternalTrafficPolicy::parse(Some("CLUSTER")), ExternalTrafficPolicy::Cluster);
        assert_eq!(ServiceType::parse(Some("LoadBalancer")), ServiceType::LoadBalancer);
        assert_eq!(ServiceType::parse(None), ServiceType::ClusterIP);
    }
}
