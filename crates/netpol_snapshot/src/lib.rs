//! Snapshot ingestion for netpol-migrate.
//!
//! This crate provides:
//! - Conversion of Kubernetes API objects into the typed [`netpol_model`] shapes
//! - Loading snapshots from `kubectl get -o json|yaml` dumps and saved snapshots
//! - A one-shot fetch of namespaces, policies and services from a live cluster
//! - Ready-made snapshots for tests and demos
//!
//! # Example
//!
//! ```rust,ignore
//! use netpol_snapshot::{ClusterSource, fetch_snapshot, load_path};
//!
//! let live = fetch_snapshot(&ClusterSource::default()).await?;
//! let offline = load_path("cluster-dump.yaml")?;
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cluster;
pub mod convert;
pub mod error;
pub mod fixtures;
pub mod loader;

pub use cluster::{fetch_snapshot, ClusterSource};
pub use convert::{IngestStats, Ingestor};
pub use error::{Error, Result};
pub use loader::{load_path, parse_str, save_snapshot, Format};
