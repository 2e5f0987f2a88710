//! Report types and aggregation.

use crate::classifier::Classification;
use netpol_model::ServiceRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw findings for one namespace, before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceFindings {
    /// Namespace name.
    pub namespace: String,
    /// Policies using an egress `endPort`.
    pub end_port_policies: Vec<String>,
    /// Policies using an egress `ipBlock`.
    pub cidr_policies: Vec<String>,
    /// Service classification.
    pub classification: Classification,
}

/// Findings for one namespace.
///
/// All lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceReport {
    /// Namespace name.
    pub namespace: String,
    /// True if services were not evaluated.
    pub skipped: bool,
    /// Policies using an egress `endPort`.
    pub end_port_policies: Vec<String>,
    /// Policies using an egress `ipBlock`.
    pub cidr_policies: Vec<String>,
    /// Externally reachable services with cluster-wide routing.
    pub at_risk: Vec<ServiceRef>,
    /// At-risk services covered by an any-source ingress rule.
    pub safe: Vec<ServiceRef>,
    /// At-risk services without a selector.
    pub no_selector: Vec<ServiceRef>,
    /// At-risk services that need review.
    #[serde(rename = "unsafe")]
    pub unsafe_services: Vec<ServiceRef>,
}

impl NamespaceReport {
    fn from_findings(findings: NamespaceFindings) -> Self {
        let NamespaceFindings {
            namespace,
            mut end_port_policies,
            mut cidr_policies,
            classification,
        } = findings;
        end_port_policies.sort();
        cidr_policies.sort();

        // BTreeSet iteration is already ordered.
        let unsafe_services = classification.unsafe_services().into_iter().collect();
        Self {
            namespace,
            skipped: classification.skipped,
            end_port_policies,
            cidr_policies,
            at_risk: classification.at_risk.into_iter().collect(),
            safe: classification.safe.into_iter().collect(),
            no_selector: classification.no_selector.into_iter().collect(),
            unsafe_services,
        }
    }

    /// Returns true if anything in this namespace needs review.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        !(self.end_port_policies.is_empty()
            && self.cidr_policies.is_empty()
            && self.no_selector.is_empty()
            && self.unsafe_services.is_empty())
    }
}

/// Totals across all namespaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Namespaces analyzed.
    pub namespaces: usize,
    /// Namespaces whose services were not evaluated.
    pub skipped_namespaces: usize,
    /// Policies using an egress `endPort`.
    pub end_port_policies: usize,
    /// Policies using an egress `ipBlock`.
    pub cidr_policies: usize,
    /// At-risk services.
    pub at_risk_services: usize,
    /// Safe services.
    pub safe_services: usize,
    /// Services without a selector.
    pub no_selector_services: usize,
    /// Unsafe services.
    pub unsafe_services: usize,
}

impl Summary {
    fn record(&mut self, ns: &NamespaceReport) {
        self.namespaces += 1;
        self.skipped_namespaces += usize::from(ns.skipped);
        self.end_port_policies += ns.end_port_policies.len();
        self.cidr_policies += ns.cidr_policies.len();
        self.at_risk_services += ns.at_risk.len();
        self.safe_services += ns.safe.len();
        self.no_selector_services += ns.no_selector.len();
        self.unsafe_services += ns.unsafe_services.len();
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} namespaces ({} skipped), {} endPort policies, {} CIDR policies, \
             {} at-risk services ({} safe, {} without selector, {} unsafe)",
            self.namespaces,
            self.skipped_namespaces,
            self.end_port_policies,
            self.cidr_policies,
            self.at_risk_services,
            self.safe_services,
            self.no_selector_services,
            self.unsafe_services
        )
    }
}

/// Overall migration verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// No findings.
    #[default]
    SafeToMigrate,
    /// At least one finding needs review.
    ReviewRequired,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SafeToMigrate => write!(f, "Safe to migrate this cluster."),
            Self::ReviewRequired => write!(f, "Review above issues before migration."),
        }
    }
}

/// The outcome of analyzing a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Per-namespace findings, sorted by namespace.
    pub namespaces: Vec<NamespaceReport>,
    /// Totals.
    pub summary: Summary,
    /// Verdict.
    pub verdict: Verdict,
}

impl Report {
    /// Looks up a namespace's findings.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&NamespaceReport> {
        self.namespaces.iter().find(|ns| ns.namespace == name)
    }

    /// Returns true if the cluster can be migrated without review.
    #[must_use]
    pub const fn is_safe_to_migrate(&self) -> bool {
        matches!(self.verdict, Verdict::SafeToMigrate)
    }

    /// Services without a selector across all namespaces.
    pub fn no_selector_services(&self) -> impl Iterator<Item = &ServiceRef> {
        self.namespaces.iter().flat_map(|ns| ns.no_selector.iter())
    }

    /// Unsafe services across all namespaces.
    pub fn unsafe_services(&self) -> impl Iterator<Item = &ServiceRef> {
        self.namespaces.iter().flat_map(|ns| ns.unsafe_services.iter())
    }
}

/// Collects namespace findings in any order and produces a sorted [`Report`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    namespaces: BTreeMap<String, NamespaceReport>,
}

impl ReportBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one namespace. A later entry for the same namespace replaces the
    /// earlier one.
    pub fn add(&mut self, findings: NamespaceFindings) {
        let report = NamespaceReport::from_findings(findings);
        self.namespaces.insert(report.namespace.clone(), report);
    }

    /// Builds the report.
    #[must_use]
    pub fn finish(self) -> Report {
        let mut summary = Summary::default();
        let mut verdict = Verdict::SafeToMigrate;
        for ns in self.namespaces.values() {
            summary.record(ns);
            if ns.has_issues() {
                verdict = Verdict::ReviewRequired;
            }
        }
        Report {
            namespaces: self.namespaces.into_values().collect(),
            summary,
            verdict,
        }
    }
}

impl Extend<NamespaceFindings> for ReportBuilder {
    fn extend<I: IntoIterator<Item = NamespaceFindings>>(&mut self, iter: I) {
        for findings in iter {
            self.add(findings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn svc(ns: &str, name: &str) -> ServiceRef {
        ServiceRef::new(ns, name)
    }

    fn clean(ns: &str) -> NamespaceFindings {
        NamespaceFindings {
            namespace: ns.to_string(),
            classification: Classification {
                namespace: ns.to_string(),
                ..Classification::default()
            },
            ..NamespaceFindings::default()
        }
    }

    #[test]
    fn empty_report_is_safe() {
        let report = ReportBuilder::new().finish();
        assert!(report.is_safe_to_migrate());
        assert_eq!(report.summary, Summary::default());
    }

    #[test]
    fn safe_services_alone_keep_verdict_safe() {
        let mut findings = clean("shop");
        findings.classification.at_risk = BTreeSet::from([svc("shop", "web")]);
        findings.classification.safe = BTreeSet::from([svc("shop", "web")]);

        let mut builder = ReportBuilder::new();
        builder.add(findings);
        let report = builder.finish();

        assert!(report.is_safe_to_migrate());
        assert_eq!(report.summary.safe_services, 1);
        assert!(report.namespace("shop").unwrap().unsafe_services.is_empty());
    }

    #[test]
    fn each_finding_kind_requires_review() {
        let mut end_port = clean("a");
        end_port.end_port_policies.push("range".into());
        let mut cidr = clean("b");
        cidr.cidr_policies.push("cidr".into());
        let mut no_selector = clean("c");
        no_selector.classification.at_risk.insert(svc("c", "x"));
        no_selector.classification.no_selector.insert(svc("c", "x"));
        let mut exposed = clean("d");
        exposed.classification.at_risk.insert(svc("d", "y"));

        for findings in [end_port, cidr, no_selector, exposed] {
            let mut builder = ReportBuilder::new();
            builder.add(findings);
            assert_eq!(builder.finish().verdict, Verdict::ReviewRequired);
        }
    }

    #[test]
    fn unsafe_is_at_risk_minus_safe_and_no_selector() {
        let mut findings = clean("shop");
        findings.classification.at_risk =
            BTreeSet::from([svc("shop", "a"), svc("shop", "b"), svc("shop", "c")]);
        findings.classification.safe = BTreeSet::from([svc("shop", "a")]);
        findings.classification.no_selector = BTreeSet::from([svc("shop", "b")]);

        let mut builder = ReportBuilder::new();
        builder.add(findings);
        let report = builder.finish();

        assert_eq!(report.unsafe_services().collect::<Vec<_>>(), vec![&svc("shop", "c")]);
        assert_eq!(report.no_selector_services().count(), 1);
    }

    #[test]
    fn output_is_sorted_regardless_of_insertion_order() {
        let mut zeta = clean("zeta");
        zeta.cidr_policies = vec!["b".into(), "a".into()];
        let mut builder = ReportBuilder::new();
        builder.extend([zeta, clean("alpha"), clean("mid")]);
        let report = builder.finish();

        let names: Vec<_> = report.namespaces.iter().map(|ns| ns.namespace.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(report.namespace("zeta").unwrap().cidr_policies, vec!["a", "b"]);
    }

    #[test]
    fn skipped_namespaces_are_counted() {
        let mut skipped = clean("public");
        skipped.classification.skipped = true;
        let mut builder = ReportBuilder::new();
        builder.extend([skipped, clean("shop")]);
        let report = builder.finish();

        assert_eq!(report.summary.namespaces, 2);
        assert_eq!(report.summary.skipped_namespaces, 1);
        assert!(report.is_safe_to_migrate());
    }

    #[test]
    fn json_uses_unsafe_key_and_string_refs() {
        let mut findings = clean("shop");
        findings.classification.at_risk.insert(svc("shop", "web"));
        let mut builder = ReportBuilder::new();
        builder.add(findings);
        let report = builder.finish();

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["namespaces"][0]["unsafe"][0], "shop/web");
        assert_eq!(value["verdict"], "ReviewRequired");

        let back: Report = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn summary_display() {
        let summary = Summary {
            namespaces: 3,
            skipped_namespaces: 1,
            at_risk_services: 2,
            unsafe_services: 2,
            ..Summary::default()
        };
        let text = summary.to_string();
        assert!(text.starts_with("3 namespaces (1 skipped)"));
        assert!(text.ends_with("2 unsafe)"));
    }
}
