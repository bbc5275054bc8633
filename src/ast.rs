//! # Query Syntax Tree
//!
//! This module defines the syntax tree for Lucene-style boolean queries and
//! aggregation requests. The parser produces it; the filter and aggregation
//! compilers consume it without mutating it.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[node]** - Tree nodes (group, term, range, exists, missing)
//! - **[operators]** - Boolean operators and clause prefixes
//!
//! ## Quick Start
//!
//! ```text
//! status:active AND -tags:(beta OR internal)
//! ```
//!
//! parses to a root group holding an `AND` group with a term and a
//! prohibited, field-scoped `OR` group.
//!
//! ## Core Concepts
//!
//! ### Precedence
//!
//! Juxtaposed clauses bind loosest and combine with the configured default
//! operator; `OR` binds tighter, `AND` tightest:
//!
//! ```text
//! a b OR c AND d   =>   a <default> (b OR (c AND d))
//! ```
//!
//! ### Field Scoping
//!
//! A field written in front of a parenthesized group scopes every clause in
//! it, so `parent:(child:value)` addresses `parent.child`.
//!
//! ### Prefixes
//!
//! - `+clause` - mandatory even inside an `OR` group
//! - `-clause` / `NOT clause` - inverted
//!
//! ## Examples
//!
//! ### Ranges
//!
//! ```text
//! date:[2015-01-01 TO *]
//! price:{10 TO 20]
//! count:>=5
//! ```
//!
//! ### Presence
//!
//! ```text
//! _exists_:email AND _missing_:deleted_at
//! ```
//!
//! ### Aggregation Requests
//!
//! ```text
//! min:field4 terms:(field1 @include:x @min:1) date:(created @missing:"0001-01-01T00:00:00")
//! ```
pub mod node;
pub mod operators;
pub mod tokens;

pub use node::{ExistsNode, GroupNode, MissingNode, Node, TermNode, TermRangeNode};
pub use operators::{GroupOperator, Operator, Prefix};
pub use tokens::Token;
