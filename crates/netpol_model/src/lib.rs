//! Typed cluster snapshot model for netpol-migrate.
//!
//! This crate provides:
//! - Label selectors with their match expressions
//! - NetworkPolicy and Service shapes reduced to what the analyzer reads
//! - An immutable, namespace-keyed [`Snapshot`] of one point in time
//!
//! Optional Kubernetes fields are normalized once at ingestion: missing
//! `from`, `ports`, `egress`, `selector` or `matchExpressions` become empty
//! collections, so downstream code never re-checks presence.
//!
//! # Example
//!
//! ```rust
//! use netpol_model::{LabelSelector, NetworkPolicy, IngressRule, Snapshot};
//!
//! let policy = NetworkPolicy::new("shop", "allow-web")
//!     .with_pod_selector(LabelSelector::from_labels([("app", "web")]))
//!     .with_ingress(IngressRule::allow_all());
//!
//! let mut snapshot = Snapshot::new();
//! snapshot.add_policy(policy).unwrap();
//! assert_eq!(snapshot.policy_count(), 1);
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod de;
pub mod error;
pub mod policy;
pub mod selector;
pub mod service;
pub mod snapshot;

pub use error::{Error, Result};
pub use policy::{EgressRule, IngressRule, IpBlock, NetworkPolicy, PolicyPeer, PolicyPort, PortRef};
pub use selector::{LabelSelector, MatchExpression, Operator};
pub use service::{ExternalTrafficPolicy, Service, ServicePort, ServiceRef, ServiceType};
pub use snapshot::{NamespaceSnapshot, Snapshot};

/// Protocol assumed when a port entry does not name one.
pub const DEFAULT_PROTOCOL: &str = "TCP";
