//! Pod-selector coverage.
//!
//! Answers one question: is a policy selecting pods with `policy` guaranteed
//! to apply to every pod a service selecting with `service` routes to?
//! The relation is directional and must not be inverted.

use netpol_model::{LabelSelector, MatchExpression, Operator};

/// Returns true if a policy using `policy` is guaranteed to cover the
/// backends of a service using `service`.
///
/// Holds when either the label path or the expression path succeeds.
/// Service selectors that carry no expressions satisfy the expression path
/// trivially.
pub fn matches(service: &LabelSelector, policy: &LabelSelector) -> bool {
    policy_labels_within_service(service, policy) || expressions_satisfied(service, policy)
}

/// Label path: every `key=value` the policy requires is also required by the
/// service.
pub fn policy_labels_within_service(service: &LabelSelector, policy: &LabelSelector) -> bool {
    policy
        .match_labels
        .iter()
        .all(|(key, value)| service.match_labels.get(key) == Some(value))
}

/// Expression path: each service expression has a same-key policy expression
/// that does not contradict it.
pub fn expressions_satisfied(service: &LabelSelector, policy: &LabelSelector) -> bool {
    service.match_expressions.iter().all(|requirement| {
        policy
            .match_expressions
            .iter()
            .find(|candidate| candidate.key == requirement.key)
            .is_some_and(|candidate| requirement_holds(requirement, candidate))
    })
}

fn requirement_holds(service: &MatchExpression, policy: &MatchExpression) -> bool {
    let shared = |value: &String| policy.values.contains(value);
    match service.operator {
        Operator::In => service.values.iter().any(shared),
        Operator::NotIn => !service.values.iter().any(shared),
        // No value constraint to compare.
        Operator::Exists | Operator::DoesNotExist | Operator::Unknown(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> LabelSelector {
        LabelSelector::from_labels(pairs.iter().copied())
    }

    #[test]
    fn identical_labels_match() {
        let s = labels(&[("app", "web")]);
        assert!(policy_labels_within_service(&s, &s));
        assert!(matches(&s, &s));
    }

    #[test]
    fn empty_policy_selector_covers_everything() {
        assert!(policy_labels_within_service(&labels(&[("app", "web")]), &LabelSelector::new()));
    }

    #[test]
    fn label_subset_is_directional() {
        let service = labels(&[("app", "web")]);
        let policy = labels(&[("app", "web"), ("tier", "frontend")]);

        assert!(!policy_labels_within_service(&service, &policy));
        assert!(policy_labels_within_service(&policy, &service));
    }

    #[test]
    fn matches_is_not_symmetric() {
        let service = labels(&[("app", "web")]).with_expression(MatchExpression::is_in("tier", ["frontend"]));
        let policy = labels(&[("app", "web"), ("tier", "frontend")]);

        assert!(!matches(&service, &policy));
        assert!(matches(&policy, &service));
    }

    #[test]
    fn label_mismatch_falls_back_to_expression_path() {
        // No service expressions: the expression path holds trivially.
        let service = labels(&[("app", "web")]);
        let policy = labels(&[("app", "api")]);
        assert!(!policy_labels_within_service(&service, &policy));
        assert!(expressions_satisfied(&service, &policy));
        assert!(matches(&service, &policy));
    }

    #[test]
    fn missing_policy_expression_fails() {
        let service = labels(&[("app", "web")]).with_expression(MatchExpression::exists("tier"));
        let policy = labels(&[("app", "api")]);
        assert!(!matches(&service, &policy));
    }

    #[test]
    fn in_requires_a_shared_value() {
        let service = LabelSelector::new().with_expression(MatchExpression::is_in("env", ["prod", "stage"]));
        let overlapping = labels(&[("x", "y")]).with_expression(MatchExpression::is_in("env", ["stage"]));
        let disjoint = labels(&[("x", "y")]).with_expression(MatchExpression::is_in("env", ["dev"]));

        assert!(expressions_satisfied(&service, &overlapping));
        assert!(!expressions_satisfied(&service, &disjoint));
    }

    #[test]
    fn not_in_rejects_any_shared_value() {
        let service = LabelSelector::new().with_expression(MatchExpression::not_in("env", ["dev"]));
        let clashing = labels(&[("x", "y")]).with_expression(MatchExpression::not_in("env", ["dev", "test"]));
        let distinct = labels(&[("x", "y")]).with_expression(MatchExpression::not_in("env", ["test"]));

        assert!(!expressions_satisfied(&service, &clashing));
        assert!(expressions_satisfied(&service, &distinct));
    }

    #[test]
    fn other_operators_only_need_the_key() {
        for op in [Operator::Exists, Operator::DoesNotExist, Operator::from("Gt")] {
            let service = LabelSelector::new().with_expression(MatchExpression::new("tier", op, ["1"]));
            let policy = labels(&[("x", "y")]).with_expression(MatchExpression::is_in("tier", ["2"]));
            assert!(expressions_satisfied(&service, &policy));
        }
    }

    #[test]
    fn first_same_key_policy_expression_is_used() {
        let service = LabelSelector::new().with_expression(MatchExpression::is_in("env", ["prod"]));
        let policy = labels(&[("x", "y")])
            .with_expression(MatchExpression::is_in("env", ["dev"]))
            .with_expression(MatchExpression::is_in("env", ["prod"]));
        assert!(!expressions_satisfied(&service, &policy));
    }

    #[test]
    fn comparisons_are_exact() {
        let service = labels(&[("app", "Web")]);
        let policy = labels(&[("app", "web")]);
        assert!(!policy_labels_within_service(&service, &policy));
    }
}
