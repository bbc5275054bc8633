//! Engine-agnostic boolean filter tree.
//!
//! Leaves are atomic constraints; `And`, `Or` and `Not` own their children,
//! so every leaf has exactly one parent. Serialization derives exist for
//! inspection and logging only; mapping to a search engine's wire format is
//! left to the caller.

use crate::ast::Operator;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Sentinel for a query with no constraints. Treat as a no-op.
    MatchAll,

    /// Exact match on a non-analyzed field
    Term { field: String, value: String },

    /// Free-text match on an analyzed field
    ///
    /// `default_operator` decides whether every token of a multi-word query
    /// must match (`And`) or any of them (`Or`).
    QueryString {
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        default_field: Option<String>,
        default_operator: Operator,
    },

    Range(RangeFilter),

    Exists { field: String },

    Missing { field: String },

    /// Points within `distance` (e.g. `75mi`) of a coordinate
    GeoDistance {
        field: String,
        latitude: f64,
        longitude: f64,
        distance: String,
    },

    And(Vec<Filter>),

    Or(Vec<Filter>),

    Not(Box<Filter>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RangeFilter {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
}

impl RangeFilter {
    pub fn is_unbounded(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

impl Filter {
    pub fn term(field: &str, value: &str) -> Self {
        Filter::Term {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn exists(field: &str) -> Self {
        Filter::Exists {
            field: field.to_string(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Filter::Missing {
            field: field.to_string(),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Filter::MatchAll)
    }

    /// Field a leaf constrains. Composite filters have none.
    pub fn field(&self) -> Option<&str> {
        match self {
            Filter::Term { field, .. }
            | Filter::Exists { field }
            | Filter::Missing { field }
            | Filter::GeoDistance { field, .. } => Some(field),
            Filter::QueryString { default_field, .. } => default_field.as_deref(),
            Filter::Range(range) => Some(&range.field),
            Filter::MatchAll | Filter::And(_) | Filter::Or(_) | Filter::Not(_) => None,
        }
    }

    /// Logical inversion. Inverting an inversion yields the original filter.
    pub fn negate(self) -> Filter {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), right) => {
                left.push(right);
                Filter::And(left)
            }
            (left, Filter::And(mut right)) => {
                right.insert(0, left);
                Filter::And(right)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), right) => {
                left.push(right);
                Filter::Or(left)
            }
            (left, Filter::Or(mut right)) => {
                right.insert(0, left);
                Filter::Or(right)
            }
            (left, right) => Filter::Or(vec![left, right]),
        }
    }

    pub fn combine(self, other: Filter, op: Operator) -> Filter {
        match op {
            Operator::And => self.and(other),
            Operator::Or => self.or(other),
        }
    }
}
