//! Leaf rewriting hooks.
//!
//! Every leaf filter the compiler builds is wrapped in an
//! [`ExpansionContext`] and folded through the registered macros in
//! registration order. Each macro may replace the context's filter; the
//! compiler keeps whatever the last macro left behind.

use crate::{
    ast::Node,
    error::ExpansionError,
    fields::{FieldMetadata, FieldType},
    filter::Filter,
};
use regex::Regex;
use std::{
    fmt,
    sync::{Arc, LazyLock},
};
use tracing::trace;

/// Mutable state handed to each macro for one leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionContext {
    /// Field in effect for the leaf's scope
    pub default_field: Option<String>,
    /// Current filter for the leaf; replaceable
    pub filter: Filter,
}

/// A hook that may rewrite a leaf filter.
///
/// Implementations must not assume they run first or last, nor that the
/// context still holds the filter kind the compiler originally built.
pub trait FilterMacro: Send + Sync {
    fn expand(&self, node: &Node, ctx: &mut ExpansionContext) -> Result<(), ExpansionError>;
}

impl<F> FilterMacro for F
where
    F: Fn(&Node, &mut ExpansionContext) -> Result<(), ExpansionError> + Send + Sync,
{
    fn expand(&self, node: &Node, ctx: &mut ExpansionContext) -> Result<(), ExpansionError> {
        self(node, ctx)
    }
}

/// Ordered list of macros, shared read-only between compiles.
#[derive(Clone, Default)]
pub struct MacroRegistry {
    macros: Vec<Arc<dyn FilterMacro>>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, filter_macro: impl FilterMacro + 'static) {
        self.macros.push(Arc::new(filter_macro));
    }

    pub fn with(mut self, filter_macro: impl FilterMacro + 'static) -> Self {
        self.register(filter_macro);
        self
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Runs every macro in order, stopping at the first failure.
    pub fn expand(
        &self,
        node: &Node,
        ctx: ExpansionContext,
    ) -> Result<ExpansionContext, ExpansionError> {
        self.macros.iter().try_fold(ctx, |mut ctx, filter_macro| {
            filter_macro.expand(node, &mut ctx)?;
            Ok(ctx)
        })
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("macros", &self.macros.len())
            .finish()
    }
}

const DEFAULT_GEO_DISTANCE: &str = "10mi";

static COORDINATES: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*(?:~\s*(\d+(?:\.\d+)?)\s*(mi|km|m)?)?\s*$",
    )
});

type LocationResolver = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Rewrites exact-match terms on geo-point fields into distance filters.
///
/// Accepts `lat,lon` or `lat,lon~distance` (`mi`, `km` or `m`; bare numbers
/// are miles). With a resolver configured, any other value is looked up as
/// a location name, optionally followed by `~distance`.
pub struct GeoDistanceMacro {
    fields: Arc<dyn FieldMetadata>,
    default_distance: String,
    resolver: Option<Arc<LocationResolver>>,
}

impl GeoDistanceMacro {
    pub fn new(fields: Arc<dyn FieldMetadata>) -> Self {
        GeoDistanceMacro {
            fields,
            default_distance: DEFAULT_GEO_DISTANCE.to_string(),
            resolver: None,
        }
    }

    pub fn with_default_distance(mut self, distance: &str) -> Self {
        self.default_distance = distance.to_string();
        self
    }

    /// Maps free-form locations (e.g. a postal code) to `lat,lon`.
    pub fn with_resolver(
        mut self,
        resolver: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    fn parse_point(&self, text: &str) -> Result<Option<(f64, f64, Option<String>)>, ExpansionError> {
        let pattern = COORDINATES
            .as_ref()
            .map_err(|e| ExpansionError::new(format!("invalid coordinate pattern: {e}")))?;

        let Some(caps) = pattern.captures(text) else {
            return Ok(None);
        };

        let coordinate = |i: usize| -> Result<f64, ExpansionError> {
            caps[i]
                .parse::<f64>()
                .map_err(|e| ExpansionError::new(format!("invalid coordinate '{}': {e}", &caps[i])))
        };
        let latitude = coordinate(1)?;
        let longitude = coordinate(2)?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ExpansionError::new(format!(
                "coordinate out of range: {latitude},{longitude}"
            )));
        }

        let distance = caps
            .get(3)
            .map(|d| format!("{}{}", d.as_str(), caps.get(4).map_or("mi", |u| u.as_str())));

        Ok(Some((latitude, longitude, distance)))
    }

    fn resolve(&self, value: &str) -> Result<(f64, f64, Option<String>), ExpansionError> {
        if let Some(point) = self.parse_point(value)? {
            return Ok(point);
        }

        let Some(resolver) = &self.resolver else {
            return Err(ExpansionError::new(format!(
                "invalid geo coordinate '{value}'"
            )));
        };

        let (location, distance) = match value.rsplit_once('~') {
            Some((location, distance)) => (location.trim(), Some(distance.trim().to_string())),
            None => (value.trim(), None),
        };

        let resolved = resolver(location)
            .ok_or_else(|| ExpansionError::new(format!("unable to resolve location '{location}'")))?;

        match self.parse_point(&resolved)? {
            Some((latitude, longitude, resolved_distance)) => {
                Ok((latitude, longitude, distance.or(resolved_distance)))
            }
            None => Err(ExpansionError::new(format!(
                "location '{location}' resolved to invalid coordinate '{resolved}'"
            ))),
        }
    }
}

impl FilterMacro for GeoDistanceMacro {
    fn expand(&self, _node: &Node, ctx: &mut ExpansionContext) -> Result<(), ExpansionError> {
        let (field, value) = match &ctx.filter {
            Filter::Term { field, value } => (field.clone(), value.clone()),
            _ => return Ok(()),
        };

        if self.fields.field_type(&field) != Some(FieldType::GeoPoint) {
            return Ok(());
        }

        let (latitude, longitude, distance) = self.resolve(&value)?;
        trace!(field = %field, latitude, longitude, "rewrote term into geo distance filter");

        ctx.filter = Filter::GeoDistance {
            field,
            latitude,
            longitude,
            distance: distance.unwrap_or_else(|| self.default_distance.clone()),
        };
        Ok(())
    }
}
