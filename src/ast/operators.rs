use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved boolean operator.
///
/// Groups that do not spell out an operator inherit the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    And,
    #[default]
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => write!(f, "AND"),
            Operator::Or => write!(f, "OR"),
        }
    }
}

/// Operator as written on a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOperator {
    /// Children were juxtaposed; the enclosing default applies.
    #[default]
    Default,
    And,
    Or,
}

impl GroupOperator {
    /// Resolves against the operator in effect around the group.
    pub fn resolve(self, default: Operator) -> Operator {
        match self {
            GroupOperator::Default => default,
            GroupOperator::And => Operator::And,
            GroupOperator::Or => Operator::Or,
        }
    }
}

/// One-character clause prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `+`: the clause is mandatory even inside a disjunction.
    Required,
    /// `-`: the clause is inverted.
    Prohibited,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Required => write!(f, "+"),
            Prefix::Prohibited => write!(f, "-"),
        }
    }
}
