//! Compiler configuration.
//!
//! [`CompilerSettings`] holds the plain, serializable knobs and can be
//! deserialized from any serde source. [`CompilerConfig`] adds the schema
//! provider and macro registry; build it once at startup and share it.

use crate::{
    ast::Operator,
    expansion::{FilterMacro, MacroRegistry},
    fields::{FieldMetadata, NoAnalyzedFields},
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Default limit on group nesting, counting the root group.
///
/// Parser and compiler count alike: every group level is one, parenthesized
/// or formed by `AND`/`OR`, so `(x a AND b)` is three deep.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Field applied to clauses that name none
    pub default_field: Option<String>,
    /// Operator for juxtaposed clauses
    pub default_operator: Operator,
    pub max_depth: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings {
            default_field: None,
            default_operator: Operator::Or,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Clone)]
pub struct CompilerConfig {
    pub settings: CompilerSettings,
    pub fields: Arc<dyn FieldMetadata>,
    pub macros: MacroRegistry,
}

impl CompilerConfig {
    pub fn builder() -> CompilerConfigBuilder {
        CompilerConfigBuilder::default()
    }

    pub fn default_operator(&self) -> Operator {
        self.settings.default_operator
    }

    pub fn default_field(&self) -> Option<&str> {
        self.settings.default_field.as_deref()
    }

    pub fn max_depth(&self) -> usize {
        self.settings.max_depth
    }

    pub fn is_field_analyzed(&self, field: &str) -> bool {
        self.fields.is_field_analyzed(field)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig::builder().build()
    }
}

impl fmt::Debug for CompilerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerConfig")
            .field("settings", &self.settings)
            .field("macros", &self.macros)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct CompilerConfigBuilder {
    settings: CompilerSettings,
    fields: Option<Arc<dyn FieldMetadata>>,
    macros: MacroRegistry,
}

impl CompilerConfigBuilder {
    pub fn settings(mut self, settings: CompilerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn default_field(mut self, field: &str) -> Self {
        self.settings.default_field = Some(field.to_string());
        self
    }

    pub fn default_operator(mut self, operator: Operator) -> Self {
        self.settings.default_operator = operator;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.settings.max_depth = max_depth;
        self
    }

    pub fn field_metadata(mut self, fields: impl FieldMetadata + 'static) -> Self {
        self.fields = Some(Arc::new(fields));
        self
    }

    /// Shares a provider that macros also hold on to.
    pub fn shared_field_metadata(mut self, fields: Arc<dyn FieldMetadata>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Appends a macro; macros run in the order they are added.
    pub fn with_macro(mut self, filter_macro: impl FilterMacro + 'static) -> Self {
        self.macros.register(filter_macro);
        self
    }

    pub fn build(self) -> CompilerConfig {
        CompilerConfig {
            settings: self.settings,
            fields: self.fields.unwrap_or_else(|| Arc::new(NoAnalyzedFields)),
            macros: self.macros,
        }
    }
}
