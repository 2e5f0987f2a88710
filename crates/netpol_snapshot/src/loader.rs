//! Snapshot loading from files and directories.

use crate::convert::{IngestStats, Ingestor};
use crate::error::{Error, Result};
use netpol_model::Snapshot;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Input document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A single JSON document.
    Json,
    /// One or more YAML documents separated by `---`.
    Yaml,
    /// JSON if it parses, YAML otherwise.
    Auto,
}

impl Format {
    /// Picks a format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Auto,
        }
    }
}

/// Loads a snapshot from a file or from every manifest in a directory.
///
/// # Errors
///
/// Returns an error if the path does not exist or a file cannot be parsed.
pub fn load_path(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    if path.is_dir() {
        load_directory(path)
    } else if path.is_file() {
        load_file(path)
    } else {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("snapshot path not found: {}", path.display()),
        )))
    }
}

/// Loads a snapshot from a single file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_file(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    info!("Loading snapshot from {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let mut ingestor = Ingestor::new();
    ingest_str(&mut ingestor, &content, Format::from_path(path))?;
    Ok(finish(ingestor))
}

/// Loads and merges every `.json`, `.yaml` and `.yml` file of a directory.
///
/// Files are read in path order. Any file that cannot be read or parsed fails
/// the whole load.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed, or
/// [`Error::InvalidDocument`] naming the first file that cannot be loaded.
pub fn load_directory(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    info!("Loading snapshot from directory {}", path.display());

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && Format::from_path(p) != Format::Auto)
        .collect();
    files.sort();

    let mut ingestor = Ingestor::new();
    for file in files {
        debug!("Loading {}", file.display());
        std::fs::read_to_string(&file)
            .map_err(Error::from)
            .and_then(|content| ingest_str(&mut ingestor, &content, Format::from_path(&file)))
            .map_err(|e| Error::InvalidDocument(format!("{}: {e}", file.display())))?;
    }

    Ok(finish(ingestor))
}

/// Parses a snapshot from a string.
///
/// # Errors
///
/// Returns an error if the content is not valid in the given format or is not
/// a Kubernetes object, list or saved snapshot.
pub fn parse_str(content: &str, format: Format) -> Result<Snapshot> {
    let mut ingestor = Ingestor::new();
    ingest_str(&mut ingestor, content, format)?;
    Ok(ingestor.finish().0)
}

/// Writes a snapshot as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_snapshot(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn ingest_str(ingestor: &mut Ingestor, content: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => ingestor.ingest_document(serde_json::from_str(content)?),
        Format::Yaml => ingest_yaml(ingestor, content),
        Format::Auto => match serde_json::from_str::<Value>(content) {
            Ok(document) => ingestor.ingest_document(document),
            Err(_) => ingest_yaml(ingestor, content),
        },
    }
}

fn ingest_yaml(ingestor: &mut Ingestor, content: &str) -> Result<()> {
    for document in serde_yaml::Deserializer::from_str(content) {
        let yaml = serde_yaml::Value::deserialize(document)?;
        ingestor.ingest_document(serde_json::to_value(yaml)?)?;
    }
    Ok(())
}

fn finish(ingestor: Ingestor) -> Snapshot {
    let (snapshot, stats) = ingestor.finish();
    log_stats(&stats);
    snapshot
}

fn log_stats(stats: &IngestStats) {
    info!(
        "Loaded {} policies and {} services across {} namespaces",
        stats.policies, stats.services, stats.namespaces
    );
    if stats.skipped > 0 {
        warn!("Skipped {} malformed objects", stats.skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netpol_model::{ExternalTrafficPolicy, ServiceType};

    const YAML_LIST: &str = r"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: Service
    metadata:
      name: web
      namespace: shop
    spec:
      type: LoadBalancer
      externalTrafficPolicy: Local
      selector:
        app: web
      ports:
        - port: 80
          protocol: TCP
  - apiVersion: networking.k8s.io/v1
    kind: NetworkPolicy
    metadata:
      name: egress-range
      namespace: shop
    spec:
      podSelector: {}
      egress:
        - ports:
            - port: 443
              endPort: 500
";

    #[test]
    fn parses_yaml_list() {
        let snapshot = parse_str(YAML_LIST, Format::Yaml).unwrap();
        let shop = snapshot.namespace("shop").unwrap();
        assert_eq!(shop.services[0].service_type, ServiceType::LoadBalancer);
        assert_eq!(
            shop.services[0].external_traffic_policy,
            ExternalTrafficPolicy::Local
        );
        assert!(shop.policies[0].egress[0].uses_port_range());
    }

    #[test]
    fn parses_multi_document_yaml() {
        let content = r"
kind: Namespace
metadata:
  name: quiet
---
kind: Service
metadata:
  name: db
  namespace: data
spec:
  type: ClusterIP
";
        let snapshot = parse_str(content, Format::Yaml).unwrap();
        assert_eq!(snapshot.namespace_count(), 2);
        assert_eq!(snapshot.service_count(), 1);
    }

    #[test]
    fn auto_format_accepts_json_and_yaml() {
        let json = r#"{"kind":"Service","metadata":{"name":"a","namespace":"n"},"spec":{}}"#;
        assert_eq!(parse_str(json, Format::Auto).unwrap().service_count(), 1);
        assert_eq!(parse_str(YAML_LIST, Format::Auto).unwrap().service_count(), 1);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("dump.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("dump.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("dump.txt")), Format::Auto);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(parse_str("{not json", Format::Json), Err(Error::Json(_))));
    }

    #[test]
    fn saved_snapshot_reloads_from_disk() {
        let dir = std::env::temp_dir().join(format!("netpol-snapshot-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let snapshot = parse_str(YAML_LIST, Format::Yaml).unwrap();
        let path = dir.join("snapshot.json");
        save_snapshot(&snapshot, &path).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(load_path(&path).unwrap(), snapshot);
        assert_eq!(load_path(&dir).unwrap(), snapshot);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn broken_file_fails_directory_load() {
        let dir = std::env::temp_dir().join(format!("netpol-snapshot-broken-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("a-services.json"),
            r#"{"kind":"Service","metadata":{"name":"web","namespace":"shop"},"spec":{"type":"LoadBalancer"}}"#,
        )
        .unwrap();
        std::fs::write(dir.join("b-policies.json"), r#"{"kind":"List","items":[{"kind":"#).unwrap();

        let result = load_path(&dir);
        std::fs::remove_dir_all(&dir).unwrap();

        match result {
            Err(Error::InvalidDocument(message)) => assert!(message.contains("b-policies.json")),
            other => panic!("expected InvalidDocument, got {other:?}"),
        }
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(load_path("/definitely/not/here.json").is_err());
    }
}
