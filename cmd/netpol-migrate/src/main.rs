//! netpol-migrate CLI - checks whether a cluster's NetworkPolicies survive a
//! move from Azure NPM to Cilium.
//!
//! Commands:
//! - `netpol-migrate check` - Analyze a live cluster or a saved snapshot
//! - `netpol-migrate snapshot` - Save the live cluster state for offline checks

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "netpol-migrate")]
#[command(about = "Find NetworkPolicy and Service configurations that behave differently under Cilium")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "NETPOL_MIGRATE_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze policies and services for migration issues
    Check {
        /// Read a saved snapshot or kubectl dump instead of the live cluster
        #[arg(short, long, env = "NETPOL_MIGRATE_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// Kubeconfig context to read from
        #[arg(long, env = "NETPOL_MIGRATE_CONTEXT", conflicts_with = "snapshot")]
        context: Option<String>,

        /// Only analyze these namespaces (repeatable)
        #[arg(short, long = "namespace", env = "NETPOL_MIGRATE_NAMESPACES", value_delimiter = ',')]
        namespaces: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, env = "NETPOL_MIGRATE_FORMAT")]
        format: OutputFormat,

        /// Disable colored status lines
        #[arg(long, env = "NETPOL_MIGRATE_NO_COLOR")]
        no_color: bool,

        /// Also evaluate namespaces whose ingress rules only restrict ports
        #[arg(long, env = "NETPOL_MIGRATE_INCLUDE_PORT_ONLY_NAMESPACES")]
        include_port_only_namespaces: bool,

        /// Analyze namespaces one at a time
        #[arg(long, env = "NETPOL_MIGRATE_SEQUENTIAL")]
        sequential: bool,
    },

    /// Save the live cluster's namespaces, policies and services
    Snapshot {
        /// Kubeconfig context to read from
        #[arg(long, env = "NETPOL_MIGRATE_CONTEXT")]
        context: Option<String>,

        /// Output path for the snapshot
        #[arg(short, long, default_value = "snapshot.json", env = "NETPOL_MIGRATE_OUTPUT")]
        output: PathBuf,
    },
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON report
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            snapshot,
            context,
            namespaces,
            format,
            no_color,
            include_port_only_namespaces,
            sequential,
        } => {
            commands::check::run(commands::check::CheckArgs {
                snapshot,
                context,
                namespaces,
                format,
                no_color,
                include_port_only_namespaces,
                sequential,
            })
            .await
        }
        Commands::Snapshot { context, output } => commands::snapshot::run(context, &output).await,
    }
}
