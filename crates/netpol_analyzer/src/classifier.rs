//! Service exposure classification.
//!
//! A NodePort or LoadBalancer service whose `externalTrafficPolicy` is not
//! `Local` can be reached through a node that does not host its backends.
//! Cilium then sees the forwarding node, not the client, as the source, so
//! any ingress policy on the backends may start dropping that traffic.
//! A service stays safe only when an ingress rule admitting every source
//! provably applies to its backend pods.

use crate::selector;
use netpol_model::{LabelSelector, NamespaceSnapshot, NetworkPolicy, Service, ServiceRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Which namespaces are worth evaluating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamespaceScope {
    /// Only namespaces with an ingress rule that names its sources.
    ///
    /// Namespaces protected solely by port-restricted, any-source rules are
    /// skipped.
    #[default]
    SourceRestricted,
    /// Every namespace with at least one ingress rule.
    AnyIngress,
}

impl NamespaceScope {
    /// Returns true if services of `namespace` should be classified.
    #[must_use]
    pub fn includes(self, namespace: &NamespaceSnapshot) -> bool {
        match self {
            Self::SourceRestricted => namespace.has_source_restricted_ingress(),
            Self::AnyIngress => namespace.has_any_ingress(),
        }
    }
}

/// Classification of one namespace's services.
///
/// `safe` and `no_selector` are subsets of `at_risk`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Namespace name.
    pub namespace: String,
    /// True if the namespace was not evaluated.
    pub skipped: bool,
    /// Externally reachable services with cluster-wide routing.
    pub at_risk: BTreeSet<ServiceRef>,
    /// At-risk services still covered by an any-source ingress rule.
    pub safe: BTreeSet<ServiceRef>,
    /// At-risk services without a selector.
    pub no_selector: BTreeSet<ServiceRef>,
}

impl Classification {
    fn skipped(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            skipped: true,
            ..Self::default()
        }
    }

    /// At-risk services that are neither safe nor awaiting manual review.
    #[must_use]
    pub fn unsafe_services(&self) -> BTreeSet<ServiceRef> {
        self.at_risk
            .iter()
            .filter(|s| !self.safe.contains(*s) && !self.no_selector.contains(*s))
            .cloned()
            .collect()
    }
}

/// How a service was shown to be covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection<'a> {
    /// A rule with no `from` and no `ports`.
    OpenIngress(&'a NetworkPolicy),
    /// A rule with no `from` whose ports include a service port.
    OpenPort(&'a NetworkPolicy),
}

impl<'a> Protection<'a> {
    /// The covering policy.
    #[must_use]
    pub const fn policy(&self) -> &'a NetworkPolicy {
        match self {
            Self::OpenIngress(p) | Self::OpenPort(p) => p,
        }
    }
}

/// Classifies the services of one namespace.
pub fn classify(namespace: &NamespaceSnapshot, scope: NamespaceScope) -> Classification {
    if !scope.includes(namespace) {
        debug!(namespace = %namespace.name, "Namespace has no qualifying ingress rules");
        return Classification::skipped(&namespace.name);
    }

    let mut result = Classification {
        namespace: namespace.name.clone(),
        ..Classification::default()
    };

    for service in namespace.services.iter().filter(|s| s.routes_cluster_wide()) {
        let service_ref = service.service_ref();
        result.at_risk.insert(service_ref.clone());

        if !service.has_selector() {
            debug!(service = %service_ref, "Service has no selector");
            result.no_selector.insert(service_ref);
            continue;
        }

        if let Some(protection) = find_protection(service, &namespace.policies) {
            debug!(
                service = %service_ref,
                policy = %protection.policy().name,
                "Service covered by any-source ingress rule"
            );
            result.safe.insert(service_ref);
        }
    }

    result
}

/// Finds a policy whose any-source ingress rule covers `service`.
///
/// Rules open on all ports are searched across every policy before
/// port-scoped rules are considered.
pub fn find_protection<'a>(service: &Service, policies: &'a [NetworkPolicy]) -> Option<Protection<'a>> {
    let backends = service.label_selector();

    let open = policies.iter().find(|policy| {
        policy.ingress.iter().any(netpol_model::IngressRule::is_open)
            && covers(&backends, &policy.pod_selector)
    });
    if let Some(policy) = open {
        return Some(Protection::OpenIngress(policy));
    }

    let service_ports = service.port_keys();
    policies
        .iter()
        .find(|policy| {
            policy.ingress.iter().any(|rule| {
                rule.is_open_port_scoped()
                    && covers(&backends, &policy.pod_selector)
                    && rule
                        .ports
                        .iter()
                        .filter_map(netpol_model::PolicyPort::key)
                        .any(|key| service_ports.contains(&key))
            })
        })
        .map(Protection::OpenPort)
}

fn covers(service: &LabelSelector, policy: &LabelSelector) -> bool {
    selector::matches(service, policy)
}
