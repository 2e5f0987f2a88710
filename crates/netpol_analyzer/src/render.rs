//! Report rendering.

use crate::error::Result;
use crate::report::{NamespaceReport, Report, Verdict};
use netpol_model::ServiceRef;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const NO_SELECTOR_NOTICE: &str = "Found services without selectors which could be impacted by migration. \
Manual investigation is required to evaluate if ingress is allowed to the service's backend Pods. \
Please evaluate if these services would be impacted:";

const UNSAFE_NOTICE: &str = "Found services with selectors which could be impacted by migration. \
Manual investigation is required to evaluate if ingress is allowed to the service's backend Pods. \
Please evaluate if these services would be impacted:";

/// Text rendering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI colors on status lines.
    pub color: bool,
}

impl RenderOptions {
    /// Enables or disables colors.
    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Renders a report as human-readable text, without a trailing newline.
pub fn render_text(report: &Report, options: RenderOptions) -> String {
    let mut out = Vec::new();

    out.push("In Cilium, some kinds of NetworkPolicy behave differently. Reviewing NetworkPolicy configuration...".to_string());
    for ns in &report.namespaces {
        policy_check(&mut out, ns, &ns.end_port_policies, "with endPort field");
    }
    for ns in &report.namespaces {
        policy_check(&mut out, ns, &ns.cidr_policies, "with CIDRs");
    }

    out.push("In Cilium, NetworkPolicy behaves differently for some kinds of Service. Reviewing Service configuration...".to_string());
    for ns in &report.namespaces {
        if ns.skipped {
            out.push(format!(
                "Skipping namespace {} as it has no ingress NetworkPolicy rules.",
                ns.namespace
            ));
        } else {
            out.push(format!(
                "Checking NetworkPolicy targeting services with externalTrafficPolicy=Cluster in namespace {}...",
                ns.namespace
            ));
        }
    }

    let no_selector: Vec<_> = report.no_selector_services().collect();
    let unsafe_services: Vec<_> = report.unsafe_services().collect();
    if no_selector.is_empty() && unsafe_services.is_empty() {
        out.push(options.paint(GREEN, "✔ No issues with service ingress."));
    } else {
        service_block(&mut out, NO_SELECTOR_NOTICE, &no_selector);
        service_block(&mut out, UNSAFE_NOTICE, &unsafe_services);
    }

    out.push(match report.verdict {
        Verdict::SafeToMigrate => options.paint(GREEN, &format!("✔ {}", report.verdict)),
        Verdict::ReviewRequired => options.paint(RED, &format!("✘ {}", report.verdict)),
    });
    out.push(
        "Warning: Rerun this check if services or network policies are created, deleted, or edited."
            .to_string(),
    );

    out.join("\n")
}

/// Renders a report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn policy_check(out: &mut Vec<String>, ns: &NamespaceReport, flagged: &[String], what: &str) {
    if flagged.is_empty() {
        out.push(format!("✅ No NetworkPolicies {what} found in namespace {}.", ns.namespace));
        return;
    }
    out.push(format!("❌ Found NetworkPolicies {what} in namespace {}:", ns.namespace));
    out.extend(flagged.iter().map(|name| format!("{}/{name}", ns.namespace)));
}

fn service_block(out: &mut Vec<String>, notice: &str, services: &[&ServiceRef]) {
    if services.is_empty() {
        return;
    }
    out.push(String::new());
    out.push(notice.to_string());
    out.extend(services.iter().map(ToString::to_string));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use crate::report::{NamespaceFindings, ReportBuilder};

    fn sample_report() -> Report {
        let web = ServiceRef::new("payments", "web");
        let mut builder = ReportBuilder::new();
        builder.add(NamespaceFindings {
            namespace: "payments".into(),
            end_port_policies: vec!["range".into()],
            cidr_policies: Vec::new(),
            classification: Classification {
                namespace: "payments".into(),
                at_risk: [web].into(),
                ..Classification::default()
            },
        });
        builder.add(NamespaceFindings {
            namespace: "public".into(),
            classification: Classification {
                namespace: "public".into(),
                skipped: true,
                ..Classification::default()
            },
            ..NamespaceFindings::default()
        });
        builder.finish()
    }

    #[test]
    fn text_report() {
        let text = render_text(&sample_report(), RenderOptions::default());
        insta::assert_snapshot!(text, @r"
In Cilium, some kinds of NetworkPolicy behave differently. Reviewing NetworkPolicy configuration...
❌ Found NetworkPolicies with endPort field in namespace payments:
payments/range
✅ No NetworkPolicies with endPort field found in namespace public.
✅ No NetworkPolicies with CIDRs found in namespace payments.
✅ No NetworkPolicies with CIDRs found in namespace public.
In Cilium, NetworkPolicy behaves differently for some kinds of Service. Reviewing Service configuration...
Checking NetworkPolicy targeting services with externalTrafficPolicy=Cluster in namespace payments...
Skipping namespace public as it has no ingress NetworkPolicy rules.

Found services with selectors which could be impacted by migration. Manual investigation is required to evaluate if ingress is allowed to the service's backend Pods. Please evaluate if these services would be impacted:
payments/web
✘ Review above issues before migration.
Warning: Rerun this check if services or network policies are created, deleted, or edited.
");
    }

    #[test]
    fn safe_report_is_green_when_colored() {
        let report = ReportBuilder::new().finish();
        let text = render_text(&report, RenderOptions::default().with_color(true));
        assert!(text.contains("\x1b[32m✔ No issues with service ingress.\x1b[0m"));
        assert!(text.contains("\x1b[32m✔ Safe to migrate this cluster.\x1b[0m"));
    }

    #[test]
    fn review_verdict_is_red_when_colored() {
        let text = render_text(&sample_report(), RenderOptions { color: true });
        assert!(text.contains("\x1b[31m✘ Review above issues before migration.\x1b[0m"));
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let text = render_text(&sample_report(), RenderOptions::default());
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn no_selector_block_precedes_unsafe_block() {
        let mut builder = ReportBuilder::new();
        let mut classification = Classification {
            namespace: "legacy".into(),
            ..Classification::default()
        };
        classification.at_risk.insert(ServiceRef::new("legacy", "db"));
        classification.at_risk.insert(ServiceRef::new("legacy", "web"));
        classification.no_selector.insert(ServiceRef::new("legacy", "db"));
        builder.add(NamespaceFindings {
            namespace: "legacy".into(),
            classification,
            ..NamespaceFindings::default()
        });
        let text = render_text(&builder.finish(), RenderOptions::default());

        let no_selector = text.find("without selectors").unwrap();
        let unsafe_block = text.find("with selectors which").unwrap();
        assert!(no_selector < unsafe_block);
        assert!(text.contains("\nlegacy/db\n"));
        assert!(!text.contains("No issues with service ingress"));
    }

    #[test]
    fn json_report_parses_back() {
        let report = sample_report();
        let json = render_json(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
