//! Structural scans for policy constructs that Cilium enforces differently.

use netpol_model::{EgressRule, NetworkPolicy};
use std::collections::BTreeMap;

/// Flagged policy names grouped by namespace. Namespaces without a flagged
/// policy have no entry.
pub type FlaggedPolicies = BTreeMap<String, Vec<String>>;

/// Finds policies with an egress port that declares `endPort`.
pub fn scan_end_port_policies<'a>(
    policies: impl IntoIterator<Item = &'a NetworkPolicy>,
) -> FlaggedPolicies {
    scan(policies, EgressRule::uses_port_range)
}

/// Finds policies with an egress peer that is an `ipBlock`.
pub fn scan_cidr_policies<'a>(
    policies: impl IntoIterator<Item = &'a NetworkPolicy>,
) -> FlaggedPolicies {
    scan(policies, EgressRule::uses_ip_block)
}

fn scan<'a>(
    policies: impl IntoIterator<Item = &'a NetworkPolicy>,
    flagged: impl Fn(&EgressRule) -> bool,
) -> FlaggedPolicies {
    let mut found = FlaggedPolicies::new();
    for policy in policies {
        if policy.egress.iter().any(&flagged) {
            found
                .entry(policy.namespace.clone())
                .or_default()
                .push(policy.name.clone());
        }
    }
    found
}
