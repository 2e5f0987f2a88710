//! NetworkPolicy model.
//!
//! Only the parts of `networking.k8s.io/v1` NetworkPolicy that influence
//! migration compatibility are kept. Absent list fields are empty vectors.

use crate::de::{null_default, protocol_or_default};
use crate::selector::LabelSelector;
use crate::DEFAULT_PROTOCOL;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A NetworkPolicy as captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPolicy {
    /// Owning namespace.
    pub namespace: String,
    /// Policy name.
    pub name: String,
    /// Pods the policy applies to.
    #[serde(default, deserialize_with = "null_default")]
    pub pod_selector: LabelSelector,
    /// Ingress rules in declaration order.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<IngressRule>,
    /// Egress rules in declaration order.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<EgressRule>,
}

/// An ingress permission. Empty `from` means all sources, empty `ports` all ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// Allowed sources.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<PolicyPeer>,
    /// Allowed destination ports.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PolicyPort>,
}

/// An egress permission. Empty `to` means all destinations, empty `ports` all ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressRule {
    /// Allowed destinations.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<PolicyPeer>,
    /// Allowed destination ports.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PolicyPort>,
}

/// A traffic peer: pods, namespaces, or an IP block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPeer {
    /// Selects pods (in the policy namespace unless `namespace_selector` is set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_selector: Option<LabelSelector>,
    /// Selects namespaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
    /// CIDR range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_block: Option<IpBlock>,
}

/// A CIDR with excluded sub-ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpBlock {
    /// Allowed range, e.g. `10.0.0.0/8`.
    pub cidr: String,
    /// Excluded ranges.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub except: Vec<String>,
}

/// A port entry in a policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPort {
    /// Port number or named container port. `None` matches every port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortRef>,
    /// Protocol, `TCP` when the source object left it out.
    #[serde(default = "default_protocol", deserialize_with = "protocol_or_default")]
    pub protocol: String,
    /// Inclusive end of a port range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_port: Option<i32>,
}

/// Numeric or named port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    /// Port number.
    Number(i32),
    /// Named port.
    Name(String),
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

impl NetworkPolicy {
    /// Creates a policy selecting every pod, with no rules.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            pod_selector: LabelSelector::default(),
            ingress: Vec::new(),
            egress: Vec::new(),
        }
    }

    /// Sets the pod selector.
    #[must_use]
    pub fn with_pod_selector(mut self, selector: LabelSelector) -> Self {
        self.pod_selector = selector;
        self
    }

    /// Appends an ingress rule.
    #[must_use]
    pub fn with_ingress(mut self, rule: IngressRule) -> Self {
        self.ingress.push(rule);
        self
    }

    /// Appends an egress rule.
    #[must_use]
    pub fn with_egress(mut self, rule: EgressRule) -> Self {
        self.egress.push(rule);
        self
    }

    /// Returns true if any ingress rule restricts traffic sources.
    #[must_use]
    pub fn has_source_restricted_ingress(&self) -> bool {
        self.ingress.iter().any(IngressRule::restricts_sources)
    }

    /// Returns `namespace/name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl IngressRule {
    /// A rule with no peers and no ports: allows everything.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Appends a source peer.
    #[must_use]
    pub fn with_peer(mut self, peer: PolicyPeer) -> Self {
        self.from.push(peer);
        self
    }

    /// Appends a port.
    #[must_use]
    pub fn with_port(mut self, port: PolicyPort) -> Self {
        self.ports.push(port);
        self
    }

    /// Returns true if the rule names specific sources.
    #[must_use]
    pub fn restricts_sources(&self) -> bool {
        !self.from.is_empty()
    }

    /// Returns true if the rule allows any source on any port.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.from.is_empty() && self.ports.is_empty()
    }

    /// Returns true if the rule allows any source, but only on listed ports.
    #[must_use]
    pub fn is_open_port_scoped(&self) -> bool {
        self.from.is_empty() && !self.ports.is_empty()
    }
}

impl EgressRule {
    /// Creates an empty egress rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a destination peer.
    #[must_use]
    pub fn with_peer(mut self, peer: PolicyPeer) -> Self {
        self.to.push(peer);
        self
    }

    /// Appends a port.
    #[must_use]
    pub fn with_port(mut self, port: PolicyPort) -> Self {
        self.ports.push(port);
        self
    }

    /// Returns true if any port entry declares a range end.
    #[must_use]
    pub fn uses_port_range(&self) -> bool {
        self.ports.iter().any(|p| p.end_port.is_some())
    }

    /// Returns true if any destination is an IP block.
    #[must_use]
    pub fn uses_ip_block(&self) -> bool {
        self.to.iter().any(|peer| peer.ip_block.is_some())
    }
}

impl PolicyPeer {
    /// A peer selecting pods by label.
    #[must_use]
    pub fn pods(selector: LabelSelector) -> Self {
        Self {
            pod_selector: Some(selector),
            ..Self::default()
        }
    }

    /// A peer selecting whole namespaces by label.
    #[must_use]
    pub fn namespaces(selector: LabelSelector) -> Self {
        Self {
            namespace_selector: Some(selector),
            ..Self::default()
        }
    }

    /// A CIDR peer with no exceptions.
    #[must_use]
    pub fn cidr(cidr: impl Into<String>) -> Self {
        Self {
            ip_block: Some(IpBlock {
                cidr: cidr.into(),
                except: Vec::new(),
            }),
            ..Self::default()
        }
    }
}

impl PolicyPort {
    /// A numeric port with the given protocol.
    #[must_use]
    pub fn new(port: i32, protocol: impl Into<String>) -> Self {
        Self {
            port: Some(PortRef::Number(port)),
            protocol: protocol.into(),
            end_port: None,
        }
    }

    /// A numeric TCP port.
    #[must_use]
    pub fn tcp(port: i32) -> Self {
        Self::new(port, DEFAULT_PROTOCOL)
    }

    /// Turns the entry into a range ending at `end_port`.
    #[must_use]
    pub const fn with_end_port(mut self, end_port: i32) -> Self {
        self.end_port = Some(end_port);
        self
    }

    /// Returns the `port/protocol` key used to compare against service ports.
    ///
    /// Entries without a port have no key.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        self.port
            .as_ref()
            .map(|port| format!("{port}/{}", self.protocol))
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ingress_rule_is_open() {
        let rule = IngressRule::allow_all();
        assert!(rule.is_open());
        assert!(!rule.is_open_port_scoped());
        assert!(!rule.restricts_sources());
    }

    #[test]
    fn port_scoped_rule_classification() {
        let rule = IngressRule::default().with_port(PolicyPort::tcp(80));
        assert!(rule.is_open_port_scoped());
        assert!(!rule.is_open());

        let restricted = rule.with_peer(PolicyPeer::pods(LabelSelector::new()));
        assert!(!restricted.is_open_port_scoped());
        assert!(restricted.restricts_sources());
    }

    #[test]
    fn policy_port_key_formats_port_and_protocol() {
        assert_eq!(PolicyPort::tcp(80).key().as_deref(), Some("80/TCP"));
        assert_eq!(PolicyPort::new(53, "UDP").key().as_deref(), Some("53/UDP"));

        let named = PolicyPort {
            port: Some(PortRef::Name("http".into())),
            protocol: "TCP".into(),
            end_port: None,
        };
        assert_eq!(named.key().as_deref(), Some("http/TCP"));

        let portless = PolicyPort {
            port: None,
            protocol: "TCP".into(),
            end_port: None,
        };
        assert_eq!(portless.key(), None);
    }

    #[test]
    fn egress_feature_detection() {
        let ranged = EgressRule::new().with_port(PolicyPort::tcp(443).with_end_port(500));
        assert!(ranged.uses_port_range());
        assert!(!ranged.uses_ip_block());

        let cidr = EgressRule::new().with_peer(PolicyPeer::cidr("10.0.0.0/8"));
        assert!(cidr.uses_ip_block());
        assert!(!cidr.uses_port_range());
    }

    #[test]
    fn policy_port_defaults_protocol_when_absent() {
        let port: PolicyPort = serde_json::from_str(r#"{"port":8080}"#).unwrap();
        assert_eq!(port.protocol, "TCP");
        assert_eq!(port.port, Some(PortRef::Number(8080)));

        let named: PolicyPort = serde_json::from_str(r#"{"port":"metrics","protocol":"UDP"}"#).unwrap();
        assert_eq!(named.port, Some(PortRef::Name("metrics".into())));

        let null_protocol: PolicyPort =
            serde_json::from_str(r#"{"port":80,"protocol":null,"endPort":null}"#).unwrap();
        assert_eq!(null_protocol, PolicyPort::tcp(80));
    }

    #[test]
    fn explicit_nulls_read_as_empty() {
        let rule: IngressRule = serde_json::from_str(r#"{"from":null,"ports":null}"#).unwrap();
        assert!(rule.is_open());

        let rule: EgressRule = serde_json::from_str(
            r#"{"to":[{"ipBlock":{"cidr":"10.0.0.0/8","except":null}}],"ports":null}"#,
        )
        .unwrap();
        assert!(rule.uses_ip_block());
        assert!(rule.ports.is_empty());
    }
}
