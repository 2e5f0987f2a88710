//! Conversion of Kubernetes API objects into the snapshot model.
//!
//! Objects arrive as JSON values, either straight from a `kubectl` dump or
//! serialized from `k8s-openapi` types after a live list call. They are read
//! through lenient raw shapes so that a single malformed object is skipped
//! with a warning instead of failing the whole snapshot.

use crate::error::{Error, Result};
use netpol_model::{
    EgressRule, ExternalTrafficPolicy, IngressRule, LabelSelector, NetworkPolicy, Service,
    ServicePort, ServiceType, Snapshot,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const KIND_NAMESPACE: &str = "Namespace";
const KIND_NETWORK_POLICY: &str = "NetworkPolicy";
const KIND_SERVICE: &str = "Service";

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNetworkPolicy {
    #[serde(default)]
    metadata: Option<RawMeta>,
    #[serde(default)]
    spec: Option<RawPolicySpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolicySpec {
    #[serde(default)]
    pod_selector: Option<LabelSelector>,
    #[serde(default)]
    ingress: Option<Vec<IngressRule>>,
    #[serde(default)]
    egress: Option<Vec<EgressRule>>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(default)]
    metadata: Option<RawMeta>,
    #[serde(default)]
    spec: Option<RawServiceSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServiceSpec {
    #[serde(default, rename = "type")]
    service_type: Option<String>,
    #[serde(default)]
    external_traffic_policy: Option<String>,
    #[serde(default)]
    selector: Option<BTreeMap<String, String>>,
    #[serde(default)]
    ports: Option<Vec<ServicePort>>,
}

#[derive(Debug, Deserialize)]
struct RawNamespace {
    #[serde(default)]
    metadata: Option<RawMeta>,
}

impl RawMeta {
    fn into_parts(self) -> (String, String) {
        (
            self.namespace.unwrap_or_default(),
            self.name.unwrap_or_default(),
        )
    }
}

impl RawNetworkPolicy {
    fn into_policy(self) -> NetworkPolicy {
        let (namespace, name) = self.metadata.unwrap_or_default().into_parts();
        let spec = self.spec.unwrap_or_default();
        NetworkPolicy {
            namespace,
            name,
            pod_selector: spec.pod_selector.unwrap_or_default(),
            ingress: spec.ingress.unwrap_or_default(),
            egress: spec.egress.unwrap_or_default(),
        }
    }
}

impl RawService {
    fn into_service(self) -> Service {
        let (namespace, name) = self.metadata.unwrap_or_default().into_parts();
        let spec = self.spec.unwrap_or_default();
        Service {
            namespace,
            name,
            service_type: ServiceType::parse(spec.service_type.as_deref()),
            external_traffic_policy: ExternalTrafficPolicy::parse(
                spec.external_traffic_policy.as_deref(),
            ),
            selector: spec.selector.unwrap_or_default(),
            ports: spec.ports.unwrap_or_default(),
        }
    }
}

/// Converts a NetworkPolicy object into the model.
///
/// # Errors
///
/// Returns an error if the object does not have the NetworkPolicy shape.
pub fn policy_from_value(value: Value) -> Result<NetworkPolicy> {
    Ok(serde_json::from_value::<RawNetworkPolicy>(value)?.into_policy())
}

/// Converts a Service object into the model.
///
/// # Errors
///
/// Returns an error if the object does not have the Service shape.
pub fn service_from_value(value: Value) -> Result<Service> {
    Ok(serde_json::from_value::<RawService>(value)?.into_service())
}

/// Counters describing what an ingestion pass accepted and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Namespace objects seen.
    pub namespaces: usize,
    /// Policies accepted.
    pub policies: usize,
    /// Services accepted.
    pub services: usize,
    /// Objects dropped because they were malformed.
    pub skipped: usize,
    /// Objects of kinds the analyzer does not read.
    pub ignored: usize,
}

/// Accumulates API objects into a [`Snapshot`].
#[derive(Debug, Default)]
pub struct Ingestor {
    snapshot: Snapshot,
    stats: IngestStats,
}

impl Ingestor {
    /// Creates an empty ingestor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests a whole document: a `List`, a typed list, a single object,
    /// a bare array of objects, or a previously saved [`Snapshot`].
    ///
    /// # Errors
    ///
    /// Returns an error if the document is none of the above.
    pub fn ingest_document(&mut self, document: Value) -> Result<()> {
        let (is_saved_snapshot, is_api_object) = match &document {
            Value::Object(map) => (
                map.contains_key("namespaces") && !map.contains_key("kind"),
                map.contains_key("kind") || map.contains_key("items"),
            ),
            _ => (false, false),
        };

        match document {
            Value::Array(items) => {
                self.ingest_items(items, None);
                Ok(())
            }
            Value::Object(_) if is_saved_snapshot => {
                let saved: Snapshot = serde_json::from_value(document)?;
                self.ingest_saved(saved);
                Ok(())
            }
            Value::Object(_) if is_api_object => {
                self.ingest_object(document, None);
                Ok(())
            }
            Value::Null => Ok(()),
            other => Err(Error::InvalidDocument(format!(
                "expected a Kubernetes object, list or saved snapshot, found {}",
                value_type(&other)
            ))),
        }
    }

    /// Ingests a single object. `kind_hint` is used when the object carries
    /// no `kind` of its own, as items of typed lists do.
    ///
    /// Malformed objects are skipped and counted, never returned as errors.
    pub fn ingest_object(&mut self, value: Value, kind_hint: Option<&str>) {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| kind_hint.map(str::to_owned))
            .or_else(|| value.get("items").map(|_| "List".to_owned()));

        let Some(kind) = kind else {
            warn!("Skipping object without kind");
            self.stats.skipped += 1;
            return;
        };

        match kind.as_str() {
            KIND_NETWORK_POLICY => match policy_from_value(value) {
                Ok(policy) => self.accept_policy(policy),
                Err(e) => self.skip(KIND_NETWORK_POLICY, &e),
            },
            KIND_SERVICE => match service_from_value(value) {
                Ok(service) => self.accept_service(service),
                Err(e) => self.skip(KIND_SERVICE, &e),
            },
            KIND_NAMESPACE => match serde_json::from_value::<RawNamespace>(value) {
                Ok(ns) => self.accept_namespace(ns),
                Err(e) => self.skip(KIND_NAMESPACE, &Error::from(e)),
            },
            list_kind if list_kind.ends_with("List") => {
                let item_kind = list_kind.strip_suffix("List").filter(|k| !k.is_empty());
                match value {
                    Value::Object(mut map) => match map.remove("items") {
                        Some(Value::Array(items)) => self.ingest_items(items, item_kind),
                        Some(Value::Null) | None => {}
                        Some(_) => {
                            warn!(kind = %list_kind, "Skipping list whose items are not an array");
                            self.stats.skipped += 1;
                        }
                    },
                    _ => self.stats.skipped += 1,
                }
            }
            other => {
                debug!(kind = %other, "Ignoring object of unrelated kind");
                self.stats.ignored += 1;
            }
        }
    }

    /// Returns the counters so far.
    #[must_use]
    pub const fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Finishes ingestion.
    #[must_use]
    pub fn finish(self) -> (Snapshot, IngestStats) {
        (self.snapshot, self.stats)
    }

    /// Feeds a saved snapshot back through the per-object checks. Entries are
    /// placed by their own namespace, not by the key they were saved under.
    fn ingest_saved(&mut self, saved: Snapshot) {
        for ns in saved.into_namespaces() {
            if !ns.name.trim().is_empty() {
                self.snapshot.add_namespace(ns.name.clone());
                self.stats.namespaces += 1;
            }
            for policy in ns.policies {
                if policy.namespace != ns.name {
                    warn!(
                        policy = %policy.qualified_name(),
                        listed_under = %ns.name,
                        "Saved policy filed under another namespace"
                    );
                }
                self.accept_policy(policy);
            }
            for service in ns.services {
                if service.namespace != ns.name {
                    warn!(
                        service = %service.service_ref(),
                        listed_under = %ns.name,
                        "Saved service filed under another namespace"
                    );
                }
                self.accept_service(service);
            }
        }
    }

    fn ingest_items(&mut self, items: Vec<Value>, kind_hint: Option<&str>) {
        for item in items {
            self.ingest_object(item, kind_hint);
        }
    }

    fn accept_policy(&mut self, policy: NetworkPolicy) {
        let name = policy.qualified_name();
        match self.snapshot.add_policy(policy) {
            Ok(()) => {
                debug!(policy = %name, "Ingested NetworkPolicy");
                self.stats.policies += 1;
            }
            Err(e) => self.skip(KIND_NETWORK_POLICY, &Error::from(e)),
        }
    }

    fn accept_service(&mut self, service: Service) {
        let service_ref = service.service_ref();
        match self.snapshot.add_service(service) {
            Ok(()) => {
                debug!(service = %service_ref, "Ingested Service");
                self.stats.services += 1;
            }
            Err(e) => self.skip(KIND_SERVICE, &Error::from(e)),
        }
    }

    fn accept_namespace(&mut self, raw: RawNamespace) {
        match raw.metadata.and_then(|m| m.name).filter(|n| !n.is_empty()) {
            Some(name) => {
                self.snapshot.add_namespace(name);
                self.stats.namespaces += 1;
            }
            None => self.skip(KIND_NAMESPACE, &Error::InvalidDocument("namespace has no name".into())),
        }
    }

    fn skip(&mut self, kind: &str, error: &Error) {
        warn!(kind = %kind, error = %error, "Skipping malformed object");
        self.stats.skipped += 1;
    }
}

const fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without kind",
    }
}
