//! Migration compatibility analysis for netpol-migrate.
//!
//! The analyzer predicts where moving NetworkPolicy enforcement from Azure NPM
//! to Cilium changes traffic behavior. It never touches the cluster: it reads
//! one immutable [`netpol_model::Snapshot`] and produces a [`Report`].
//!
//! # Checks Performed
//!
//! - **Egress port ranges**: policies whose egress ports carry `endPort`
//! - **Egress CIDRs**: policies whose egress peers use `ipBlock`
//! - **Service exposure**: NodePort/LoadBalancer services with cluster-wide
//!   routing that no any-source ingress rule provably covers
//!
//! # Example
//!
//! ```rust,ignore
//! use netpol_analyzer::{Analyzer, AnalyzerConfig};
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default());
//! let report = analyzer.analyze(&snapshot);
//! println!("{}", netpol_analyzer::render_text(&report, RenderOptions::default()));
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod analyzer;
pub mod classifier;
pub mod error;
pub mod render;
pub mod report;
pub mod scanner;
pub mod selector;

pub use analyzer::{Analyzer, AnalyzerConfig};
pub use classifier::{classify, Classification, NamespaceScope};
pub use error::{Error, Result};
pub use render::{render_json, render_text, RenderOptions};
pub use report::{NamespaceFindings, NamespaceReport, Report, ReportBuilder, Summary, Verdict};
pub use scanner::{scan_cidr_policies, scan_end_port_policies};
pub use selector::matches;
