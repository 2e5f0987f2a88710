//! Point-in-time view of a cluster's policies and services.

use crate::error::{Error, Result};
use crate::policy::NetworkPolicy;
use crate::service::Service;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every namespace with the policies and services it owns.
///
/// Built once by an ingestion layer and never mutated during analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    namespaces: BTreeMap<String, NamespaceSnapshot>,
}

/// The objects owned by a single namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSnapshot {
    /// Namespace name.
    #[serde(default)]
    pub name: String,
    /// Policies in the namespace.
    #[serde(default)]
    pub policies: Vec<NetworkPolicy>,
    /// Services in the namespace.
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a namespace, keeping it even if it ends up owning nothing.
    pub fn add_namespace(&mut self, name: impl Into<String>) -> &mut NamespaceSnapshot {
        let name = name.into();
        self.namespaces
            .entry(name.clone())
            .or_insert_with(|| NamespaceSnapshot::new(name))
    }

    /// Adds a policy to its namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy has no name or namespace.
    pub fn add_policy(&mut self, policy: NetworkPolicy) -> Result<()> {
        require("NetworkPolicy", "namespace", &policy.namespace)?;
        require("NetworkPolicy", "name", &policy.name)?;
        self.add_namespace(policy.namespace.clone()).policies.push(policy);
        Ok(())
    }

    /// Adds a service to its namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the service has no name or namespace.
    pub fn add_service(&mut self, service: Service) -> Result<()> {
        require("Service", "namespace", &service.namespace)?;
        require("Service", "name", &service.name)?;
        self.add_namespace(service.namespace.clone()).services.push(service);
        Ok(())
    }

    /// Looks up a namespace.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&NamespaceSnapshot> {
        self.namespaces.get(name)
    }

    /// Iterates namespaces in name order.
    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceSnapshot> {
        self.namespaces.values()
    }

    /// Iterates namespace names in order.
    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Iterates every policy across namespaces.
    pub fn policies(&self) -> impl Iterator<Item = &NetworkPolicy> {
        self.namespaces.values().flat_map(|ns| ns.policies.iter())
    }

    /// Number of namespaces.
    #[must_use]
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// Total number of policies.
    #[must_use]
    pub fn policy_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.policies.len()).sum()
    }

    /// Total number of services.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.services.len()).sum()
    }

    /// Returns true if no namespace was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Consumes the snapshot, yielding namespaces in name order.
    ///
    /// Each namespace is named after its map key.
    pub fn into_namespaces(self) -> impl Iterator<Item = NamespaceSnapshot> {
        self.namespaces.into_iter().map(|(name, mut ns)| {
            ns.name = name;
            ns
        })
    }

    /// Merges another snapshot into this one.
    pub fn merge(&mut self, other: Self) {
        for (name, ns) in other.namespaces {
            let target = self.add_namespace(name);
            target.policies.extend(ns.policies);
            target.services.extend(ns.services);
        }
    }
}

impl NamespaceSnapshot {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policies: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Returns true if any policy restricts ingress sources.
    #[must_use]
    pub fn has_source_restricted_ingress(&self) -> bool {
        self.policies
            .iter()
            .any(NetworkPolicy::has_source_restricted_ingress)
    }

    /// Returns true if any policy declares any ingress rule.
    #[must_use]
    pub fn has_any_ingress(&self) -> bool {
        self.policies.iter().any(|p| !p.ingress.is_empty())
    }
}

fn require(kind: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::MissingField(format!("{kind}.{field}")))
    } else {
        Ok(())
    }
}
