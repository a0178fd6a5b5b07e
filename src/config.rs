//! Configuration document types describing dashboard components.
//!
//! The types in this module mirror the structure of the YAML documents
//! consumed by the CLI. Required fields are kept optional at this layer so
//! the compiler stages can report which field is missing and which entity
//! owns it instead of surfacing a generic decoding error. Values whose shape
//! decides their meaning (output selections, extending filter operands) are
//! kept as raw [`serde_yaml::Value`]s and interpreted by the stage that owns
//! them.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Root configuration document. Every section is optional; an absent or
/// null section yields an empty table.
///
/// # Examples
///
/// ```
/// use nrdash::DocumentConfig;
///
/// let yaml = r#"
/// filters:
///   prod:
///     event: Transaction
///     nrql: "env = 'prod'"
/// dashboards:
///   overview:
///     title: Overview
/// "#;
/// let config: DocumentConfig = serde_yaml::from_str(yaml,).expect("valid configuration",);
/// assert_eq!(config.filters.len(), 1);
/// assert!(config.queries.is_empty());
/// ```
#[derive(Debug, Deserialize, Clone, Default, PartialEq,)]
#[serde(deny_unknown_fields)]
pub struct DocumentConfig
{
    /// Named row filters, keyed by filter name.
    #[serde(default, alias = "conditions", deserialize_with = "nullable")]
    pub filters:           IndexMap<String, FilterConfig,>,
    /// Named output selections; values are strings, lists or mappings.
    #[serde(
        default,
        rename = "output-selections",
        alias = "output_selections",
        deserialize_with = "nullable"
    )]
    pub output_selections: IndexMap<String, Value,>,
    /// Named display modifiers.
    #[serde(default, deserialize_with = "nullable")]
    pub displays:          IndexMap<String, DisplayConfig,>,
    /// Named queries, either inline NRQL or componentized.
    #[serde(default, deserialize_with = "nullable")]
    pub queries:           IndexMap<String, QueryConfig,>,
    /// Named, reusable widget definitions.
    #[serde(default, deserialize_with = "nullable")]
    pub widgets:           IndexMap<String, WidgetConfig,>,
    /// Dashboards to submit, in declaration order.
    #[serde(default, deserialize_with = "nullable")]
    pub dashboards:        IndexMap<String, DashboardConfig,>,
}

/// Raw filter entry.
///
/// A base filter supplies `event` and optionally `nrql`. An extending filter
/// supplies exactly one of `and`/`or`, whose operands are either inline NRQL
/// strings or `{filter: <name>}` references.
#[derive(Debug, Deserialize, Clone, Default, PartialEq,)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig
{
    /// Event type the filter selects rows from.
    #[serde(default)]
    pub event: Option<String,>,
    /// Boolean NRQL expression; blank means every row matches.
    #[serde(default)]
    pub nrql:  Option<String,>,
    /// Operands combined with `AND`.
    #[serde(default)]
    pub and:   Option<Vec<Value,>,>,
    /// Operands combined with `OR`.
    #[serde(default)]
    pub or:    Option<Vec<Value,>,>,
}

impl FilterConfig
{
    /// Returns `true` when the entry extends other filters.
    pub fn is_extending(&self,) -> bool
    {
        self.and.is_some() || self.or.is_some()
    }
}

/// Raw display entry.
#[derive(Debug, Deserialize, Clone, Default, PartialEq,)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig
{
    /// Trailing NRQL such as `TIMESERIES` or `FACET appName`.
    #[serde(default)]
    pub nrql:          Option<String,>,
    /// Visualization name, validated against [`crate::Visualization`].
    #[serde(default)]
    pub visualization: Option<String,>,
}

/// Raw query entry.
///
/// The presence of `nrql` selects the inline authoring mode; otherwise the
/// query is assembled from named components.
#[derive(Debug, Deserialize, Clone, Default, PartialEq,)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig
{
    /// Widget title shown on the dashboard.
    #[serde(default)]
    pub title:         Option<String,>,
    /// Optional notes displayed with the widget.
    #[serde(default)]
    pub notes:         Option<String,>,
    /// Raw NRQL for inline queries.
    #[serde(default)]
    pub nrql:          Option<String,>,
    /// Visualization name for inline queries.
    #[serde(default)]
    pub visualization: Option<String,>,
    /// Event type for componentized queries.
    #[serde(default)]
    pub event:         Option<String,>,
    /// Name of the filter applied as the `WHERE` clause.
    #[serde(default, alias = "condition")]
    pub filter:        Option<String,>,
    /// Name of the output selection.
    #[serde(default)]
    pub output:        Option<String,>,
    /// Name of the display.
    #[serde(default)]
    pub display:       Option<String,>,
}

/// Reference to a query from a widget: either a name from the `queries`
/// section or a query defined in place.
#[derive(Debug, Deserialize, Clone, PartialEq,)]
#[serde(untagged)]
pub enum QueryReference
{
    /// Name of a query declared in the `queries` section.
    Named(String,),
    /// Query defined in place.
    Inline(QueryConfig,),
}

/// Raw reusable widget definition.
#[derive(Debug, Deserialize, Clone, Default, PartialEq,)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig
{
    /// Query rendered by the widget.
    #[serde(default)]
    pub query: Option<QueryReference,>,
    /// Title override; defaults to the query title.
    #[serde(default)]
    pub title: Option<String,>,
    /// Notes override; defaults to the query notes.
    #[serde(default)]
    pub notes: Option<String,>,
}

/// Raw dashboard entry.
#[derive(Debug, Deserialize, Clone, Default, PartialEq,)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig
{
    /// Dashboard title, also the reconciliation key.
    #[serde(default)]
    pub title:   Option<String,>,
    /// Widget placements in display order.
    #[serde(default, deserialize_with = "nullable")]
    pub widgets: Vec<PlacementConfig,>,
}

/// Raw widget placement on a dashboard grid.
#[derive(Debug, Deserialize, Clone, Default, PartialEq,)]
#[serde(deny_unknown_fields)]
pub struct PlacementConfig
{
    /// Query to render, by name or inline.
    #[serde(default)]
    pub query:  Option<QueryReference,>,
    /// Name of a reusable widget definition.
    #[serde(default)]
    pub widget: Option<String,>,
    /// Grid row.
    #[serde(default)]
    pub row:    Option<u32,>,
    /// Grid column.
    #[serde(default)]
    pub column: Option<u32,>,
    /// Width in grid cells.
    #[serde(default)]
    pub width:  Option<u32,>,
    /// Height in grid cells.
    #[serde(default)]
    pub height: Option<u32,>,
}

/// Treats an explicit YAML null the same as an absent value.
fn nullable<'de, D, T,>(deserializer: D,) -> Result<T, D::Error,>
where
    D: Deserializer<'de,>,
    T: Deserialize<'de,> + Default,
{
    Ok(Option::<T,>::deserialize(deserializer,)?.unwrap_or_default(),)
}
