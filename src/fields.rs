//! Index schema lookups the compilers depend on.
//!
//! The compilers only ever ask questions by fully-qualified field name
//! (`parent.child`). Remote schemas must be fetched and cached before
//! compiling; lookups are expected to be cheap and infallible.

use std::collections::HashMap;

/// Data type of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Keyword,
    Integer,
    Long,
    Double,
    Date,
    Boolean,
    GeoPoint,
    Object,
}

pub trait FieldMetadata: Send + Sync {
    /// Whether the field is tokenized as free text rather than matched exactly.
    fn is_field_analyzed(&self, field: &str) -> bool;

    fn field_type(&self, _field: &str) -> Option<FieldType> {
        None
    }

    /// Exact-match sibling of an analyzed field (e.g. `name.keyword`).
    fn exact_field(&self, _field: &str) -> Option<String> {
        None
    }
}

impl<F> FieldMetadata for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_field_analyzed(&self, field: &str) -> bool {
        self(field)
    }
}

/// Provider for schemas with no analyzed fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalyzedFields;

impl FieldMetadata for NoAnalyzedFields {
    fn is_field_analyzed(&self, _field: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct FieldInfo {
    field_type: FieldType,
    exact_field: Option<String>,
}

/// In-memory field mapping.
///
/// # Examples
///
/// ```
/// use lucene_compiler::{FieldMap, FieldMetadata, FieldType};
///
/// let fields = FieldMap::new()
///     .analyzed("message")
///     .with_keyword_subfield("message")
///     .field("location", FieldType::GeoPoint);
///
/// assert!(fields.is_field_analyzed("message"));
/// assert_eq!(fields.exact_field("message").as_deref(), Some("message.keyword"));
/// assert_eq!(fields.field_type("location"), Some(FieldType::GeoPoint));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: HashMap<String, FieldInfo>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields
            .entry(name.to_string())
            .and_modify(|info| info.field_type = field_type)
            .or_insert(FieldInfo {
                field_type,
                exact_field: None,
            });
        self
    }

    /// Shorthand for a `Text` field.
    pub fn analyzed(self, name: &str) -> Self {
        self.field(name, FieldType::Text)
    }

    /// Registers `name.keyword` as the exact-match sibling of `name`.
    pub fn with_keyword_subfield(mut self, name: &str) -> Self {
        let keyword = format!("{}.keyword", name);
        if let Some(info) = self.fields.get_mut(name) {
            info.exact_field = Some(keyword.clone());
        } else {
            self.fields.insert(
                name.to_string(),
                FieldInfo {
                    field_type: FieldType::Text,
                    exact_field: Some(keyword.clone()),
                },
            );
        }
        self.field(&keyword, FieldType::Keyword)
    }
}

impl FieldMetadata for FieldMap {
    fn is_field_analyzed(&self, field: &str) -> bool {
        self.field_type(field) == Some(FieldType::Text)
    }

    fn field_type(&self, field: &str) -> Option<FieldType> {
        self.fields.get(field).map(|info| info.field_type)
    }

    fn exact_field(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(|info| info.exact_field.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_providers() {
        let provider = |field: &str| field.starts_with("text_");
        assert!(provider.is_field_analyzed("text_body"));
        assert!(!provider.is_field_analyzed("id"));
        assert_eq!(provider.field_type("id"), None);
    }

    #[test]
    fn unknown_fields_are_exact_match() {
        let fields = FieldMap::new().analyzed("body");
        assert!(!fields.is_field_analyzed("status"));
        assert!(!fields.is_field_analyzed("body.keyword"));
    }

    #[test]
    fn keyword_subfield_implies_text_parent() {
        let fields = FieldMap::new().with_keyword_subfield("title");
        assert!(fields.is_field_analyzed("title"));
        assert_eq!(fields.field_type("title.keyword"), Some(FieldType::Keyword));
    }
}
