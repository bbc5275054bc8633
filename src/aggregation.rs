//! Aggregation request compilation.
//!
//! Requests are written in the same syntax as queries, as a space-separated
//! list of `kind:field` or `kind:(field @option:value ...)` clauses:
//!
//! ```text
//! terms:(-status @missing:none) min:(price @default:0) geogrid:location
//! ```
//!
//! Output order follows input order. Each aggregation is named
//! `{kind}_{field}` using the field as written.

use crate::{
    ast::{GroupNode, GroupOperator, Node, Prefix, TermNode},
    config::CompilerConfig,
    error::{CompileError, Error},
    fields::FieldType,
    lexer::Lexer,
    parser::Parser,
    value::Value,
};
use serde::Serialize;
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::debug;

/// Legacy sort shorthand (`terms:-field`) also excludes this bucket key.
const SORTED_TERMS_EXCLUDE: &str = "1";
const DEFAULT_DATE_INTERVAL: &str = "1d";
const DEFAULT_DATE_FORMAT: &str = "date_optional_time";
/// Coarsest geo grid level
const DEFAULT_GEO_PRECISION: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Min,
    Max,
    Avg,
    Sum,
    Cardinality,
    Percentiles,
    Missing,
    Terms,
    Date,
    #[serde(rename = "geogrid")]
    GeoGrid,
}

impl AggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
            AggregationKind::Avg => "avg",
            AggregationKind::Sum => "sum",
            AggregationKind::Cardinality => "cardinality",
            AggregationKind::Percentiles => "percentiles",
            AggregationKind::Missing => "missing",
            AggregationKind::Terms => "terms",
            AggregationKind::Date => "date",
            AggregationKind::GeoGrid => "geogrid",
        }
    }

    /// Options accepted in `@option:value` form.
    fn options(&self) -> &'static [&'static str] {
        match self {
            AggregationKind::Min
            | AggregationKind::Max
            | AggregationKind::Avg
            | AggregationKind::Sum
            | AggregationKind::Cardinality => &["default"],
            AggregationKind::Percentiles => &["percents"],
            AggregationKind::Missing => &[],
            AggregationKind::Terms => &["include", "exclude", "missing", "min"],
            AggregationKind::Date => &["missing", "interval"],
            AggregationKind::GeoGrid => &["precision"],
        }
    }
}

impl FromStr for AggregationKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "min" => AggregationKind::Min,
            "max" => AggregationKind::Max,
            "avg" => AggregationKind::Avg,
            "sum" => AggregationKind::Sum,
            "cardinality" => AggregationKind::Cardinality,
            "percentiles" => AggregationKind::Percentiles,
            "missing" => AggregationKind::Missing,
            "terms" => AggregationKind::Terms,
            "date" => AggregationKind::Date,
            "geogrid" => AggregationKind::GeoGrid,
            other => {
                return Err(CompileError::UnsupportedAggregation {
                    kind: other.to_string(),
                });
            }
        })
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an aggregation reads its values from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Field(String),

    /// The field's value, or `default` for documents without one
    Fallback { field: String, default: Value },

    Script(String),
}

impl ValueSource {
    /// Script form of the source, if it needs one.
    ///
    /// ```
    /// use lucene_compiler::{Value, ValueSource};
    ///
    /// let source = ValueSource::Fallback { field: "price".into(), default: Value::Integer(0) };
    /// assert_eq!(
    ///     source.script().as_deref(),
    ///     Some("doc['price'].empty ? 0 : doc['price'].value")
    /// );
    /// assert_eq!(ValueSource::Field("price".into()).script(), None);
    /// ```
    pub fn script(&self) -> Option<String> {
        match self {
            ValueSource::Field(_) => None,
            ValueSource::Fallback { field, default } => Some(format!(
                "doc['{field}'].empty ? {} : doc['{field}'].value",
                default.to_script_literal()
            )),
            ValueSource::Script(script) => Some(script.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub name: String,
    pub kind: AggregationKind,
    pub source: ValueSource,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Aggregation>,
}

impl Aggregation {
    fn new(name: String, kind: AggregationKind, source: ValueSource) -> Self {
        Aggregation {
            name,
            kind,
            source,
            options: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// One `kind:...` clause, flattened.
struct Clause<'n> {
    text: String,
    kind: AggregationKind,
    field: &'n TermNode,
    options: Vec<(&'n str, String)>,
}

/// Term text with its clause prefix restored, so `@exclude:-F` keeps the `-`.
fn written_value(term: &TermNode) -> String {
    match term.prefix {
        Some(prefix) => format!("{prefix}{}", term.term),
        None => term.term.clone(),
    }
}

/// Parse and compile an aggregation request.
pub fn compile_aggregations(
    request: &str,
    config: &CompilerConfig,
) -> Result<Vec<Aggregation>, Error> {
    let root = Parser::new(Lexer::new(request))?
        .with_max_depth(config.max_depth())
        .parse()
        .inspect_err(|e| debug!(error = %e, "rejected aggregation request"))?;

    Ok(AggregationCompiler::new(config).compile(&root)?)
}

pub struct AggregationCompiler<'a> {
    config: &'a CompilerConfig,
}

impl<'a> AggregationCompiler<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        AggregationCompiler { config }
    }

    /// Compiles every clause of a parsed request. Any failure rejects the
    /// whole request.
    pub fn compile(&self, root: &GroupNode) -> Result<Vec<Aggregation>, CompileError> {
        let result = self.compile_clauses(root);
        match &result {
            Ok(aggregations) => debug!(count = aggregations.len(), "compiled aggregations"),
            Err(e) => debug!(error = %e, "rejected aggregation request"),
        }
        result
    }

    fn compile_clauses(&self, root: &GroupNode) -> Result<Vec<Aggregation>, CompileError> {
        if root.operator != GroupOperator::Default {
            return Err(invalid(
                &root.to_string(),
                "aggregations are separated by spaces, not boolean operators",
            ));
        }

        root.children
            .iter()
            .map(|node| self.clause(node).and_then(|clause| self.build(clause)))
            .collect()
    }

    fn clause<'n>(&self, node: &'n Node) -> Result<Clause<'n>, CompileError> {
        let text = node.to_string();

        let Some(kind) = node.field() else {
            return Err(invalid(&text, "expected kind:field"));
        };
        let kind: AggregationKind = kind.parse()?;

        match node {
            Node::Term(term) => Ok(Clause {
                text,
                kind,
                field: term,
                options: vec![],
            }),
            Node::Group(group) => {
                let mut field = None;
                let mut options = vec![];

                for child in &group.children {
                    match child {
                        Node::Term(term) => match term.field.as_deref() {
                            Some(name) if name.starts_with('@') => {
                                options.push((&name[1..], written_value(term)));
                            }
                            None if field.is_none() => field = Some(term),
                            None => return Err(invalid(&text, "more than one field")),
                            Some(_) => return Err(invalid(&text, "options must start with '@'")),
                        },
                        _ => return Err(invalid(&text, "expected field and @options")),
                    }
                }

                let field = field.ok_or_else(|| invalid(&text, "missing field"))?;
                Ok(Clause {
                    text,
                    kind,
                    field,
                    options,
                })
            }
            _ => Err(invalid(&text, "expected kind:field")),
        }
    }

    fn build(&self, clause: Clause<'_>) -> Result<Aggregation, CompileError> {
        let Clause {
            text,
            kind,
            field,
            options,
        } = clause;

        let known = kind.options();
        if let Some((name, _)) = options.iter().find(|(name, _)| !known.iter().any(|k| k == name)) {
            return Err(invalid(&text, &format!("unknown option '@{name}' for {kind}")));
        }

        if field.prefix.is_some() && kind != AggregationKind::Terms {
            return Err(invalid(&text, "ordering prefix is only supported by terms"));
        }

        let name = format!("{kind}_{}", field.term);
        let field_name = field.term.as_str();

        let aggregation = match kind {
            AggregationKind::Min
            | AggregationKind::Max
            | AggregationKind::Avg
            | AggregationKind::Sum
            | AggregationKind::Cardinality => {
                let source = match option(&options, "default") {
                    Some(default) => ValueSource::Fallback {
                        field: field_name.to_string(),
                        default: Value::parse_literal(default),
                    },
                    None => ValueSource::Field(field_name.to_string()),
                };
                Aggregation::new(name, kind, source)
            }
            AggregationKind::Percentiles => {
                let mut agg =
                    Aggregation::new(name, kind, ValueSource::Field(field_name.to_string()));
                if let Some(percents) = option(&options, "percents") {
                    agg.options.insert("percents".into(), Value::from(percents));
                }
                agg
            }
            AggregationKind::Missing => Aggregation::new(
                name,
                kind,
                ValueSource::Field(self.exact_field(field_name)),
            ),
            AggregationKind::Terms => self.terms(&text, name, field, &options)?,
            AggregationKind::Date => {
                let mut agg =
                    Aggregation::new(name, kind, ValueSource::Field(field_name.to_string()));
                let interval = option(&options, "interval").unwrap_or(DEFAULT_DATE_INTERVAL);
                agg.options.insert("interval".into(), Value::from(interval));
                agg.options.insert("format".into(), Value::from(DEFAULT_DATE_FORMAT));
                if let Some(missing) = option(&options, "missing") {
                    agg.options.insert("missing".into(), Value::from(missing));
                }
                agg
            }
            AggregationKind::GeoGrid => self.geogrid(&text, name, field_name, &options)?,
        };

        Ok(aggregation)
    }

    fn terms(
        &self,
        text: &str,
        name: String,
        field: &TermNode,
        options: &[(&str, String)],
    ) -> Result<Aggregation, CompileError> {
        let exact = self.exact_field(&field.term);
        let mut agg = Aggregation::new(
            name,
            AggregationKind::Terms,
            ValueSource::Field(exact.clone()),
        );

        for key in ["include", "exclude", "missing"] {
            if let Some(value) = option(options, key) {
                agg.options.insert(key.into(), Value::from(value));
            }
        }

        if let Some(min) = option(options, "min") {
            let count = Value::parse_literal(min)
                .as_int()
                .ok_or_else(|| invalid(text, &format!("@min expects an integer, found '{min}'")))?;
            agg.options.insert("min_doc_count".into(), Value::Integer(count));
        }

        if let Some(prefix) = field.prefix {
            let order = match prefix {
                Prefix::Prohibited => "desc",
                Prefix::Required => "asc",
            };
            agg.options.insert("order".into(), Value::from(order));
            agg.options.insert("order_by".into(), Value::from(exact));
            agg.options
                .entry("exclude".into())
                .or_insert_with(|| Value::from(SORTED_TERMS_EXCLUDE));
        }

        Ok(agg)
    }

    fn geogrid(
        &self,
        text: &str,
        name: String,
        field: &str,
        options: &[(&str, String)],
    ) -> Result<Aggregation, CompileError> {
        if self.config.fields.field_type(field) != Some(FieldType::GeoPoint) {
            return Err(invalid(text, &format!("field '{field}' is not a geo point")));
        }

        let precision = match option(options, "precision") {
            Some(p) => Value::parse_literal(p)
                .as_int()
                .filter(|p| (1..=12).contains(p))
                .ok_or_else(|| invalid(text, &format!("@precision expects 1 to 12, found '{p}'")))?,
            None => DEFAULT_GEO_PRECISION,
        };

        let mut agg = Aggregation::new(
            name,
            AggregationKind::GeoGrid,
            ValueSource::Field(field.to_string()),
        );
        agg.options.insert("precision".into(), Value::Integer(precision));
        agg.children = vec![
            Aggregation::new(
                "avg_lat".to_string(),
                AggregationKind::Avg,
                ValueSource::Script(format!("doc['{field}'].lat")),
            ),
            Aggregation::new(
                "avg_lon".to_string(),
                AggregationKind::Avg,
                ValueSource::Script(format!("doc['{field}'].lon")),
            ),
        ];
        Ok(agg)
    }

    /// Analyzed fields aggregate on their exact-match sibling when one exists.
    fn exact_field(&self, field: &str) -> String {
        if self.config.is_field_analyzed(field)
            && let Some(exact) = self.config.fields.exact_field(field)
        {
            return exact;
        }
        field.to_string()
    }
}

/// Last occurrence wins.
fn option<'o>(options: &'o [(&str, String)], key: &str) -> Option<&'o str> {
    options
        .iter()
        .rev()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value.as_str())
}

fn invalid(clause: &str, reason: &str) -> CompileError {
    CompileError::InvalidAggregation {
        clause: clause.to_string(),
        reason: reason.to_string(),
    }
}
