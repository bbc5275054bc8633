//! Syntax tree to filter tree compilation.
//!
//! A depth-first walk over the node tree. Two scope stacks mirror the
//! parenthesized structure of the query: the operator in effect and the
//! field prefixes introduced by `field:(...)` groups. Each group compiles its
//! children into a fresh accumulator and is then composed into its parent
//! like any leaf.

use crate::{
    ast::{GroupNode, Node, Operator, Prefix, TermNode, TermRangeNode},
    config::CompilerConfig,
    error::CompileError,
    expansion::ExpansionContext,
    filter::{Filter, RangeFilter},
};
use tracing::{debug, trace};

/// Compile a syntax tree into a filter.
///
/// A tree with no contributing leaves compiles to [`Filter::MatchAll`].
///
/// # Examples
///
/// ```
/// use lucene_compiler::{compile, parse, CompilerConfig, Filter, Node};
///
/// let config = CompilerConfig::default();
/// let root = Node::Group(parse("status:active AND -status:deleted").unwrap());
///
/// assert_eq!(
///     compile(&root, &config).unwrap(),
///     Filter::And(vec![
///         Filter::term("status", "active"),
///         Filter::term("status", "deleted").negate(),
///     ])
/// );
/// ```
pub fn compile(root: &Node, config: &CompilerConfig) -> Result<Filter, CompileError> {
    FilterCompiler::new(config).compile(root)
}

/// Lexical scopes of one compile call.
#[derive(Debug, Clone)]
struct ScopeStack {
    operators: Vec<Operator>,
    root_field: Option<String>,
    fields: Vec<String>,
}

impl ScopeStack {
    fn new(default_operator: Operator, default_field: Option<&str>) -> Self {
        ScopeStack {
            operators: vec![default_operator],
            root_field: default_field.map(str::to_string),
            fields: Vec::new(),
        }
    }

    fn operator(&self) -> Operator {
        // The base entry pushed in `new` is never popped.
        self.operators.last().copied().unwrap_or_default()
    }

    fn push(&mut self, operator: Operator, field: Option<&str>) {
        self.operators.push(operator);
        if let Some(field) = field {
            self.fields.push(field.to_string());
        }
    }

    fn pop(&mut self, had_field: bool) {
        self.operators.pop();
        if had_field {
            self.fields.pop();
        }
    }

    /// Nearest enclosing field prefix, else the configured default field.
    fn default_field(&self) -> Option<&str> {
        self.fields.last().or(self.root_field.as_ref()).map(String::as_str)
    }

    /// Fully-qualified name for a leaf: every group prefix joined with `.`,
    /// then the leaf's own field.
    fn qualify(&self, own: Option<&str>) -> Option<String> {
        if self.fields.is_empty() {
            return own.or(self.root_field.as_deref()).map(str::to_string);
        }

        let mut qualified = self.fields.join(".");
        if let Some(own) = own {
            qualified.push('.');
            qualified.push_str(own);
        }
        Some(qualified)
    }
}

pub struct FilterCompiler<'a> {
    config: &'a CompilerConfig,
    scopes: ScopeStack,
    depth: usize,
    leaves: usize,
    suppressed: usize,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        FilterCompiler {
            config,
            scopes: ScopeStack::new(config.default_operator(), config.default_field()),
            depth: 0,
            leaves: 0,
            suppressed: 0,
        }
    }

    pub fn compile(mut self, root: &Node) -> Result<Filter, CompileError> {
        let mut filter = None;
        self.visit(root, &mut filter)?;

        debug!(
            leaves = self.leaves,
            suppressed = self.suppressed,
            match_all = filter.is_none(),
            "compiled filter"
        );
        Ok(filter.unwrap_or(Filter::MatchAll))
    }

    fn visit(&mut self, node: &Node, target: &mut Option<Filter>) -> Result<(), CompileError> {
        match node {
            Node::Group(group) => self.visit_group(group, target),
            leaf => {
                if let Some(filter) = self.build_leaf(leaf)? {
                    self.add_filter(target, filter, leaf.negated(), leaf.prefix());
                }
                Ok(())
            }
        }
    }

    fn visit_group(
        &mut self,
        group: &GroupNode,
        target: &mut Option<Filter>,
    ) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > self.config.max_depth() {
            return Err(CompileError::TooDeeplyNested {
                limit: self.config.max_depth(),
            });
        }

        let operator = group.operator.resolve(self.config.default_operator());
        self.scopes.push(operator, group.field.as_deref());

        let mut inner = None;
        let result = group
            .children
            .iter()
            .try_for_each(|child| self.visit(child, &mut inner));

        self.scopes.pop(group.field.is_some());
        self.depth -= 1;
        result?;

        // An empty group contributes nothing, whatever its operator.
        if let Some(filter) = inner {
            self.add_filter(target, filter, group.negated, group.prefix);
        }
        Ok(())
    }

    /// Builds, then expands, the filter for one leaf. `None` when the leaf is
    /// suppressed.
    fn build_leaf(&mut self, node: &Node) -> Result<Option<Filter>, CompileError> {
        let qualified = self.scopes.qualify(node.field());
        let analyzed = qualified
            .as_deref()
            .is_some_and(|field| self.config.is_field_analyzed(field));

        // Ranges and presence checks only apply to exact-match fields.
        let filter = match (node, qualified.as_deref()) {
            (Node::Term(term), field) => Some(self.term_filter(term, field, analyzed)),
            (Node::TermRange(range), Some(field)) if !analyzed => range_filter(range, field),
            (Node::Exists(_), Some(field)) if !analyzed => Some(Filter::exists(field)),
            (Node::Missing(_), Some(field)) if !analyzed => Some(Filter::missing(field)),
            _ => None,
        };

        let Some(filter) = filter else {
            self.suppressed += 1;
            trace!(node = %node, field = ?qualified, analyzed, "suppressed leaf");
            return Ok(None);
        };

        trace!(node = %node, field = ?qualified, analyzed, "compiled leaf");

        let ctx = ExpansionContext {
            default_field: self.scopes.default_field().map(str::to_string),
            filter,
        };
        let ctx = self.config.macros.expand(node, ctx)?;

        self.leaves += 1;
        Ok(Some(ctx.filter))
    }

    fn term_filter(&self, term: &TermNode, field: Option<&str>, analyzed: bool) -> Filter {
        match field {
            Some(field) if !analyzed => Filter::term(field, &term.term),
            _ => {
                let query = if term.quoted {
                    format!("\"{}\"", term.term.replace('"', "\\\""))
                } else {
                    term.term.clone()
                };
                Filter::QueryString {
                    query,
                    default_field: field.map(str::to_string),
                    default_operator: self.scopes.operator(),
                }
            }
        }
    }

    /// Composes `incoming` into `target` under the current operator.
    fn add_filter(
        &self,
        target: &mut Option<Filter>,
        incoming: Filter,
        negated: bool,
        prefix: Option<Prefix>,
    ) {
        let incoming = if negated || prefix == Some(Prefix::Prohibited) {
            incoming.negate()
        } else {
            incoming
        };

        let mut operator = self.scopes.operator();
        if operator == Operator::Or && prefix == Some(Prefix::Required) {
            operator = Operator::And;
        }

        *target = Some(match target.take() {
            None => incoming,
            Some(existing) => existing.combine(incoming, operator),
        });
    }
}

/// Bounds default to inclusive; a range with no usable bound is omitted.
fn range_filter(node: &TermRangeNode, field: &str) -> Option<Filter> {
    let bound = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    };

    let mut range = RangeFilter {
        field: field.to_string(),
        ..Default::default()
    };

    if let Some(min) = bound(&node.min) {
        if node.min_inclusive == Some(false) {
            range.gt = Some(min);
        } else {
            range.gte = Some(min);
        }
    }

    if let Some(max) = bound(&node.max) {
        if node.max_inclusive == Some(false) {
            range.lt = Some(max);
        } else {
            range.lte = Some(max);
        }
    }

    (!range.is_unbounded()).then_some(Filter::Range(range))
}
