//! Analysis driver.

use crate::classifier::{classify, NamespaceScope};
use crate::error::{Error, Result};
use crate::report::{NamespaceFindings, Report, ReportBuilder};
use crate::scanner::{scan_cidr_policies, scan_end_port_policies, FlaggedPolicies};
use netpol_model::{NamespaceSnapshot, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Analyzer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Which namespaces have their services classified.
    pub namespace_scope: NamespaceScope,
    /// Restricts analysis to these namespaces. `None` analyzes all.
    pub namespaces: Option<BTreeSet<String>>,
}

impl AnalyzerConfig {
    /// Sets the namespace scope.
    #[must_use]
    pub const fn with_namespace_scope(mut self, scope: NamespaceScope) -> Self {
        self.namespace_scope = scope;
        self
    }

    /// Restricts analysis to the given namespaces. An empty list keeps all.
    #[must_use]
    pub fn with_namespaces<S: Into<String>>(mut self, namespaces: impl IntoIterator<Item = S>) -> Self {
        let set: BTreeSet<String> = namespaces.into_iter().map(Into::into).collect();
        self.namespaces = (!set.is_empty()).then_some(set);
        self
    }
}

/// Produces migration reports from snapshots.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Creates an analyzer.
    #[must_use]
    pub const fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes every selected namespace in turn.
    pub fn analyze(&self, snapshot: &Snapshot) -> Report {
        let mut builder = ReportBuilder::new();
        for namespace in self.selected(snapshot) {
            builder.add(self.analyze_namespace(namespace));
        }
        finish(builder)
    }

    /// Analyzes namespaces in parallel on the blocking pool.
    ///
    /// Produces the same report as [`Analyzer::analyze`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Worker`] if a namespace task panics or is cancelled.
    pub async fn analyze_concurrent(&self, snapshot: Arc<Snapshot>) -> Result<Report> {
        let names: Vec<String> = self
            .selected(&snapshot)
            .map(|ns| ns.name.clone())
            .collect();

        let mut tasks = JoinSet::new();
        for name in names {
            let snapshot = Arc::clone(&snapshot);
            let analyzer = self.clone();
            tasks.spawn_blocking(move || {
                snapshot
                    .namespace(&name)
                    .map(|ns| analyzer.analyze_namespace(ns))
            });
        }

        let mut builder = ReportBuilder::new();
        while let Some(joined) = tasks.join_next().await {
            let findings = joined.map_err(|e| Error::Worker(e.to_string()))?;
            if let Some(findings) = findings {
                builder.add(findings);
            }
        }
        Ok(finish(builder))
    }

    /// Runs every check on one namespace.
    pub fn analyze_namespace(&self, namespace: &NamespaceSnapshot) -> NamespaceFindings {
        let take = |mut flagged: FlaggedPolicies| {
            flagged.remove(&namespace.name).unwrap_or_default()
        };
        let end_port_policies = take(scan_end_port_policies(&namespace.policies));
        let cidr_policies = take(scan_cidr_policies(&namespace.policies));

        let classification = classify(namespace, self.config.namespace_scope);
        if classification.skipped {
            info!(
                namespace = %namespace.name,
                "Skipping namespace as it has no ingress NetworkPolicy rules"
            );
        } else {
            debug!(
                namespace = %namespace.name,
                at_risk = classification.at_risk.len(),
                safe = classification.safe.len(),
                no_selector = classification.no_selector.len(),
                "Classified services"
            );
        }

        NamespaceFindings {
            namespace: namespace.name.clone(),
            end_port_policies,
            cidr_policies,
            classification,
        }
    }

    fn selected<'a>(&'a self, snapshot: &'a Snapshot) -> impl Iterator<Item = &'a NamespaceSnapshot> + 'a {
        if let Some(wanted) = &self.config.namespaces {
            for name in wanted {
                if snapshot.namespace(name).is_none() {
                    warn!(namespace = %name, "Requested namespace not found in snapshot");
                }
            }
        }
        snapshot.namespaces().filter(move |ns| match &self.config.namespaces {
            Some(wanted) => wanted.contains(&ns.name),
            None => true,
        })
    }
}

fn finish(builder: ReportBuilder) -> Report {
    let report = builder.finish();
    info!("Analysis complete: {}", report.summary);
    report
}
