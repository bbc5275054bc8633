pub mod aggregation;
pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expansion;
pub mod fields;
pub mod filter;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod value;

pub use aggregation::{
    compile_aggregations, Aggregation, AggregationCompiler, AggregationKind, ValueSource,
};
pub use ast::{
    ExistsNode, GroupNode, GroupOperator, MissingNode, Node, Operator, Prefix, TermNode,
    TermRangeNode, Token,
};
pub use compiler::{compile, FilterCompiler};
pub use config::{CompilerConfig, CompilerConfigBuilder, CompilerSettings, DEFAULT_MAX_DEPTH};
pub use error::{CompileError, Error, ExpansionError, LexError, ParseError, Result};
pub use expansion::{ExpansionContext, FilterMacro, GeoDistanceMacro, MacroRegistry};
pub use fields::{FieldMap, FieldMetadata, FieldType, NoAnalyzedFields};
pub use filter::{Filter, RangeFilter};
pub use lexer::{Lexer, Position};
pub use output::{to_json, to_json_pretty};
pub use parser::{parse, Parser};
pub use value::Value;

/// Parses and compiles queries and aggregation requests against one
/// configuration.
///
/// Cheap to share: every call only borrows the configuration, so a single
/// instance can serve concurrent requests.
///
/// # Examples
///
/// ```
/// use lucene_compiler::{CompilerConfig, FieldMap, Filter, Operator, QueryCompiler};
///
/// let config = CompilerConfig::builder()
///     .field_metadata(FieldMap::new().analyzed("title"))
///     .build();
/// let compiler = QueryCompiler::new(config);
///
/// let filter = compiler.compile_filter("title:rust AND year:2024").unwrap();
/// assert_eq!(
///     filter,
///     Filter::And(vec![
///         Filter::QueryString {
///             query: "rust".to_string(),
///             default_field: Some("title".to_string()),
///             default_operator: Operator::And,
///         },
///         Filter::term("year", "2024"),
///     ])
/// );
///
/// assert!(compiler.compile_filter("").unwrap().is_match_all());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: CompilerConfig,
}

impl QueryCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        QueryCompiler { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Parse and compile query text into a filter.
    pub fn compile_filter(&self, query: &str) -> Result<Filter> {
        let root = Parser::new(Lexer::new(query))?
            .with_max_depth(self.config.max_depth())
            .parse()?;
        self.compile_node(&Node::Group(root))
    }

    /// Compile an already parsed tree.
    pub fn compile_node(&self, root: &Node) -> Result<Filter> {
        Ok(compile(root, &self.config)?)
    }

    pub fn compile_aggregations(&self, request: &str) -> Result<Vec<Aggregation>> {
        compile_aggregations(request, &self.config)
    }
}
