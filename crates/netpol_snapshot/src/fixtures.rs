//! Ready-made snapshots for tests and demos.
//!
//! Each scenario namespace also carries a `restrict-sources` policy with a
//! `from` clause, so the analyzer does not short-circuit the namespace.

// Fixture objects always carry a name and namespace.
#![allow(clippy::missing_panics_doc)]

use netpol_model::{
    EgressRule, ExternalTrafficPolicy, IngressRule, LabelSelector, NetworkPolicy, PolicyPeer,
    PolicyPort, Service, ServiceType, Snapshot,
};

/// Namespace used by the single-scenario fixtures.
pub const SCENARIO_NAMESPACE: &str = "shop";

/// A policy admitting traffic to `app=db` only from `app=api` pods.
#[must_use]
pub fn restrict_sources_policy(namespace: &str) -> NetworkPolicy {
    NetworkPolicy::new(namespace, "restrict-sources")
        .with_pod_selector(LabelSelector::from_labels([("app", "db")]))
        .with_ingress(
            IngressRule::default().with_peer(PolicyPeer::pods(LabelSelector::from_labels([("app", "api")]))),
        )
}

/// A LoadBalancer service with cluster-wide routing selecting `app=web` on `80/TCP`.
#[must_use]
pub fn web_load_balancer(namespace: &str) -> Service {
    Service::new(namespace, "web")
        .with_type(ServiceType::LoadBalancer)
        .with_external_traffic_policy(ExternalTrafficPolicy::Cluster)
        .with_selector_label("app", "web")
        .with_port(80, "TCP")
}

/// Service behind an allow-all ingress policy: classified safe.
#[must_use]
pub fn open_policy_scenario() -> Snapshot {
    let ns = SCENARIO_NAMESPACE;
    build(
        vec![
            restrict_sources_policy(ns),
            NetworkPolicy::new(ns, "allow-web")
                .with_pod_selector(LabelSelector::from_labels([("app", "web")]))
                .with_ingress(IngressRule::allow_all()),
        ],
        vec![web_load_balancer(ns)],
    )
}

/// Service behind an any-source ingress policy limited to `policy_port/TCP`.
///
/// Safe when `policy_port` is 80, at risk otherwise.
#[must_use]
pub fn port_scoped_scenario(policy_port: i32) -> Snapshot {
    let ns = SCENARIO_NAMESPACE;
    build(
        vec![
            restrict_sources_policy(ns),
            NetworkPolicy::new(ns, "allow-web-port")
                .with_pod_selector(LabelSelector::from_labels([("app", "web")]))
                .with_ingress(IngressRule::default().with_port(PolicyPort::tcp(policy_port))),
        ],
        vec![web_load_balancer(ns)],
    )
}

/// A NodePort service without a selector: needs manual review.
#[must_use]
pub fn no_selector_scenario() -> Snapshot {
    let ns = SCENARIO_NAMESPACE;
    build(
        vec![restrict_sources_policy(ns)],
        vec![Service::new(ns, "external-db")
            .with_type(ServiceType::NodePort)
            .with_port(5432, "TCP")],
    )
}

/// Policies using an egress port range, an egress IP block, and neither.
#[must_use]
pub fn egress_features_scenario() -> Snapshot {
    let ns = SCENARIO_NAMESPACE;
    build(
        vec![
            NetworkPolicy::new(ns, "egress-range")
                .with_egress(EgressRule::new().with_port(PolicyPort::tcp(443).with_end_port(500))),
            NetworkPolicy::new(ns, "egress-cidr")
                .with_egress(EgressRule::new().with_peer(PolicyPeer::cidr("10.0.0.0/8"))),
            NetworkPolicy::new(ns, "egress-plain").with_egress(
                EgressRule::new()
                    .with_peer(PolicyPeer::pods(LabelSelector::from_labels([("app", "db")])))
                    .with_port(PolicyPort::tcp(5432)),
            ),
        ],
        Vec::new(),
    )
}

/// A small multi-namespace cluster mixing every finding kind.
#[must_use]
pub fn mixed_cluster() -> Snapshot {
    let mut snapshot = open_policy_scenario();
    snapshot.merge(rename(port_scoped_scenario(443), "payments"));
    snapshot.merge(rename(no_selector_scenario(), "legacy"));
    snapshot.merge(rename(egress_features_scenario(), "egress"));

    // Unprotected, but no policy narrows sources: skipped.
    snapshot.add_namespace("public");
    add(&mut snapshot, Vec::new(), vec![web_load_balancer("public")]);

    // Local traffic policy keeps the source IP: never at risk.
    add(
        &mut snapshot,
        vec![restrict_sources_policy("edge")],
        vec![web_load_balancer("edge").with_external_traffic_policy(ExternalTrafficPolicy::Local)],
    );

    snapshot.add_namespace("kube-public");
    snapshot
}

fn build(policies: Vec<NetworkPolicy>, services: Vec<Service>) -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.add_namespace(SCENARIO_NAMESPACE);
    add(&mut snapshot, policies, services);
    snapshot
}

fn add(snapshot: &mut Snapshot, policies: Vec<NetworkPolicy>, services: Vec<Service>) {
    for policy in policies {
        snapshot.add_policy(policy).expect("fixture policy is named");
    }
    for service in services {
        snapshot.add_service(service).expect("fixture service is named");
    }
}

fn rename(snapshot: Snapshot, namespace: &str) -> Snapshot {
    let mut renamed = Snapshot::new();
    renamed.add_namespace(namespace);
    for ns in snapshot.namespaces() {
        for policy in &ns.policies {
            let mut policy = policy.clone();
            policy.namespace = namespace.to_string();
            renamed.add_policy(policy).expect("fixture policy is named");
        }
        for service in &ns.services {
            let mut service = service.clone();
            service.namespace = namespace.to_string();
            renamed.add_service(service).expect("fixture service is named");
        }
    }
    renamed
}
