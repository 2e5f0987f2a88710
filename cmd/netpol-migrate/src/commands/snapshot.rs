//! Snapshot command implementation.

use anyhow::{Context, Result};
use netpol_snapshot::{fetch_snapshot, save_snapshot, ClusterSource};
use std::path::Path;
use tracing::info;

/// Runs the snapshot command.
pub async fn run(context: Option<String>, output: &Path) -> Result<()> {
    let source = context.map_or_else(ClusterSource::default, ClusterSource::with_context);
    let snapshot = fetch_snapshot(&source)
        .await
        .with_context(|| "Failed to read NetworkPolicies and Services from the cluster")?;

    save_snapshot(&snapshot, output)
        .with_context(|| format!("Failed to write snapshot: {}", output.display()))?;

    info!(
        "Saved {} namespaces, {} policies and {} services to {}",
        snapshot.namespace_count(),
        snapshot.policy_count(),
        snapshot.service_count(),
        output.display()
    );
    info!("Analyze it offline with: netpol-migrate check --snapshot {}", output.display());
    Ok(())
}
