//! Label selectors.

use crate::de::null_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A Kubernetes label selector: required labels plus set-based expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Required `key=value` pairs.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    /// Set-based requirements, in declaration order.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<MatchExpression>,
}

/// A single set-based selector requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchExpression {
    /// Label key the requirement applies to.
    pub key: String,
    /// Set operator.
    pub operator: Operator,
    /// Operand values. Empty for `Exists` / `DoesNotExist`.
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Selector requirement operator.
///
/// Operators outside the Kubernetes set are kept verbatim in [`Operator::Unknown`]
/// rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// Label value must be one of the values.
    In,
    /// Label value must not be any of the values.
    NotIn,
    /// Label key must be present.
    Exists,
    /// Label key must be absent.
    DoesNotExist,
    /// Unrecognized operator.
    Unknown(String),
}

impl LabelSelector {
    /// Creates an empty selector (selects every pod in the namespace).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a selector from `matchLabels` pairs only.
    #[must_use]
    pub fn from_labels<K, V>(labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            match_expressions: Vec::new(),
        }
    }

    /// Adds a required label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.match_labels.insert(key.into(), value.into());
        self
    }

    /// Adds a match expression.
    #[must_use]
    pub fn with_expression(mut self, expression: MatchExpression) -> Self {
        self.match_expressions.push(expression);
        self
    }

    /// Returns true if the selector has no constraints at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }
}

impl MatchExpression {
    /// Creates a new expression.
    #[must_use]
    pub fn new<V: Into<String>>(
        key: impl Into<String>,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Shorthand for an `In` expression.
    #[must_use]
    pub fn is_in<V: Into<String>>(key: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(key, Operator::In, values)
    }

    /// Shorthand for a `NotIn` expression.
    #[must_use]
    pub fn not_in<V: Into<String>>(key: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(key, Operator::NotIn, values)
    }

    /// Shorthand for an `Exists` expression.
    #[must_use]
    pub fn exists(key: impl Into<String>) -> Self {
        Self::new(key, Operator::Exists, Vec::<String>::new())
    }
}

impl Operator {
    /// Returns the Kubernetes spelling of the operator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
            Self::Unknown(op) => op,
        }
    }

    /// Returns true for operators outside the Kubernetes set.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for Operator {
    fn from(value: &str) -> Self {
        match value {
            "In" => Self::In,
            "NotIn" => Self::NotIn,
            "Exists" => Self::Exists,
            "DoesNotExist" => Self::DoesNotExist,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Unknown(op) => op,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
