//! One-shot snapshot of a live cluster.
//!
//! Lists namespaces, NetworkPolicies and Services across all namespaces
//! exactly once. Any API failure aborts the fetch: a partial view of the
//! cluster would make the analysis report misleading.

use crate::convert::Ingestor;
use crate::error::{Error, Result};
use k8s_openapi::api::core::v1::{Namespace, Service};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use kube::api::ListParams;
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config};
use netpol_model::Snapshot;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Where to read the cluster from.
#[derive(Debug, Clone, Default)]
pub struct ClusterSource {
    /// Kubeconfig context to use. `None` uses the current context, or the
    /// in-cluster service account when running inside a pod.
    pub context: Option<String>,
}

impl ClusterSource {
    /// Uses the named kubeconfig context.
    #[must_use]
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    async fn client(&self) -> Result<Client> {
        match &self.context {
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.clone()),
                    ..KubeConfigOptions::default()
                };
                let config = Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| Error::Connect(format!("failed to load context '{context}': {e}")))?;
                Client::try_from(config)
                    .map_err(|e| Error::Connect(format!("failed to create client: {e}")))
            }
            None => Client::try_default()
                .await
                .map_err(|e| Error::Connect(format!("failed to create client: {e}"))),
        }
    }
}

/// Fetches namespaces, policies and services from the cluster.
///
/// # Errors
///
/// Returns [`Error::Connect`] if no client can be built and [`Error::Fetch`]
/// if any list call fails.
pub async fn fetch_snapshot(source: &ClusterSource) -> Result<Snapshot> {
    let client = source.client().await?;
    info!(
        context = source.context.as_deref().unwrap_or("<current>"),
        "Reading NetworkPolicies and Services from cluster"
    );

    let mut ingestor = Ingestor::new();

    let namespaces = list_all::<Namespace>(&client, "namespaces").await?;
    ingest_all(&mut ingestor, "Namespace", &namespaces)?;

    let policies = list_all::<NetworkPolicy>(&client, "networkpolicies").await?;
    ingest_all(&mut ingestor, "NetworkPolicy", &policies)?;

    let services = list_all::<Service>(&client, "services").await?;
    ingest_all(&mut ingestor, "Service", &services)?;

    let (snapshot, stats) = ingestor.finish();
    info!(
        "Fetched {} policies and {} services across {} namespaces",
        stats.policies,
        stats.services,
        snapshot.namespace_count()
    );
    if stats.skipped > 0 {
        warn!("Skipped {} malformed objects", stats.skipped);
    }
    Ok(snapshot)
}

async fn list_all<K>(client: &Client, resource: &'static str) -> Result<Vec<K>>
where
    K: kube::Resource + Clone + serde::de::DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::all(client.clone());
    let list = api
        .list(&ListParams::default())
        .await
        .map_err(|source| Error::Fetch { resource, source })?;
    debug!(resource, count = list.items.len(), "Listed resources");
    Ok(list.items)
}

fn ingest_all<K: Serialize>(ingestor: &mut Ingestor, kind: &str, objects: &[K]) -> Result<()> {
    for object in objects {
        ingestor.ingest_object(serde_json::to_value(object)?, Some(kind));
    }
    Ok(())
}
