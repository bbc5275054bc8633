//! JSON rendering of compiled filters and aggregations.
//!
//! The JSON shape mirrors the Rust types (externally tagged, snake_case) and
//! is meant for logging, snapshots and debugging. It is not any search
//! engine's wire format.
//!
//! # Features
//!
//! - **Compact output** via [`to_json()`] - single line, for logs
//! - **Pretty output** via [`to_json_pretty()`] - 2-space indentation
//! - **Deterministic** - aggregation options are kept in a sorted map
//!
//! # Examples
//!
//! ```
//! use lucene_compiler::Filter;
//! use lucene_compiler::output::to_json;
//!
//! let filter = Filter::term("status", "active");
//! assert_eq!(
//!     to_json(&filter).unwrap(),
//!     r#"{"term":{"field":"status","value":"active"}}"#
//! );
//! assert_eq!(to_json(&Filter::MatchAll).unwrap(), r#""match_all""#);
//! ```

use serde::Serialize;

/// Serialize to compact JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Serialize to indented JSON.
///
/// # Examples
///
/// ```
/// use lucene_compiler::{compile_aggregations, CompilerConfig};
/// use lucene_compiler::output::to_json_pretty;
///
/// let aggs = compile_aggregations("max:price", &CompilerConfig::default()).unwrap();
/// let json = to_json_pretty(&aggs).unwrap();
/// assert!(json.contains("\"name\": \"max_price\""));
/// ```
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
