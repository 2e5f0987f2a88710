//! Check command implementation.

use crate::OutputFormat;
use anyhow::{Context, Result};
use netpol_analyzer::{render_json, render_text, Analyzer, AnalyzerConfig, NamespaceScope, RenderOptions};
use netpol_model::Snapshot;
use netpol_snapshot::{fetch_snapshot, load_path, ClusterSource};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments of the check command.
pub struct CheckArgs {
    pub snapshot: Option<PathBuf>,
    pub context: Option<String>,
    pub namespaces: Vec<String>,
    pub format: OutputFormat,
    pub no_color: bool,
    pub include_port_only_namespaces: bool,
    pub sequential: bool,
}

impl CheckArgs {
    fn analyzer_config(&self) -> AnalyzerConfig {
        let scope = if self.include_port_only_namespaces {
            NamespaceScope::AnyIngress
        } else {
            NamespaceScope::SourceRestricted
        };
        AnalyzerConfig::default()
            .with_namespace_scope(scope)
            .with_namespaces(self.namespaces.iter().cloned())
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions::default().with_color(!self.no_color && std::io::stdout().is_terminal())
    }
}

/// Runs the check command.
///
/// The exit status only reflects failures to obtain the snapshot, not the
/// verdict.
pub async fn run(args: CheckArgs) -> Result<()> {
    let snapshot = load(&args).await?;
    if snapshot.is_empty() {
        warn!("Snapshot contains no namespaces");
    }
    info!(
        "Analyzing {} policies and {} services across {} namespaces",
        snapshot.policy_count(),
        snapshot.service_count(),
        snapshot.namespace_count()
    );

    let analyzer = Analyzer::new(args.analyzer_config());
    let report = if args.sequential {
        analyzer.analyze(&snapshot)
    } else {
        analyzer
            .analyze_concurrent(Arc::new(snapshot))
            .await
            .with_context(|| "Analysis failed")?
    };

    let output = match args.format {
        OutputFormat::Text => render_text(&report, args.render_options()),
        OutputFormat::Json => render_json(&report).with_context(|| "Failed to serialize report")?,
    };
    println!("{output}");
    Ok(())
}

async fn load(args: &CheckArgs) -> Result<Snapshot> {
    if let Some(path) = &args.snapshot {
        return load_path(path).with_context(|| format!("Failed to load snapshot: {}", path.display()));
    }

    let source = args
        .context
        .as_ref()
        .map_or_else(ClusterSource::default, ClusterSource::with_context);
    fetch_snapshot(&source)
        .await
        .with_context(|| "Failed to read NetworkPolicies and Services from the cluster")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CheckArgs {
        CheckArgs {
            snapshot: None,
            context: None,
            namespaces: Vec::new(),
            format: OutputFormat::Text,
            no_color: true,
            include_port_only_namespaces: false,
            sequential: false,
        }
    }

    #[test]
    fn default_config_keeps_source_restricted_scope() {
        let config = args().analyzer_config();
        assert_eq!(config.namespace_scope, NamespaceScope::SourceRestricted);
        assert_eq!(config.namespaces, None);
    }

    #[test]
    fn flags_map_into_config() {
        let mut args = args();
        args.include_port_only_namespaces = true;
        args.namespaces = vec!["shop".into()];
        let config = args.analyzer_config();
        assert_eq!(config.namespace_scope, NamespaceScope::AnyIngress);
        assert!(config.namespaces.unwrap().contains("shop"));
    }

    #[test]
    fn no_color_wins() {
        assert!(!args().render_options().color);
    }

    #[tokio::test]
    async fn missing_snapshot_file_is_an_error() {
        let mut args = args();
        args.snapshot = Some(PathBuf::from("/nonexistent/netpol-migrate/dump.json"));
        assert!(run(args).await.is_err());
    }
}
