//! Resolved component records produced by the compiler stages.
//!
//! Every record is built once while a document is compiled and is never
//! mutated afterwards. Records that reference other components embed clones
//! of the resolved values, so a compiled query or dashboard is
//! self-contained.

use indexmap::IndexMap;

use crate::visualization::Visualization;

/// Filters keyed by name.
pub type FilterTable = IndexMap<String, Filter,>;
/// Output selections keyed by name.
pub type OutputTable = IndexMap<String, OutputSelection,>;
/// Displays keyed by name.
pub type DisplayTable = IndexMap<String, Display,>;
/// Queries keyed by name.
pub type QueryTable = IndexMap<String, Query,>;
/// Reusable widget definitions keyed by name.
pub type WidgetTable = IndexMap<String, WidgetDefinition,>;
/// Dashboards keyed by name, in declaration order.
pub type DashboardTable = IndexMap<String, Dashboard,>;

/// Named boolean row selection tied to one event type.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Filter
{
    /// Unique filter name.
    pub name:  String,
    /// Event type the filter applies to.
    pub event: String,
    /// Boolean NRQL expression. `None` matches every row of `event`.
    pub nrql:  Option<String,>,
}

impl Filter
{
    /// Creates a filter, treating a blank expression as "match all".
    ///
    /// # Examples
    ///
    /// ```
    /// use nrdash::Filter;
    ///
    /// let filter = Filter::new("all", "Transaction", Some("  ".to_owned(),),);
    /// assert!(filter.matches_all());
    /// ```
    pub fn new(name: impl Into<String,>, event: impl Into<String,>, nrql: Option<String,>,) -> Self
    {
        Self {
            name:  name.into(),
            event: event.into(),
            nrql:  non_blank(nrql,),
        }
    }

    /// Returns `true` when the filter places no restriction on rows.
    pub fn matches_all(&self,) -> bool
    {
        self.nrql.is_none()
    }
}

/// Named `SELECT` clause.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct OutputSelection
{
    /// Unique output selection name.
    pub name: String,
    /// Complete clause including the `SELECT` keyword.
    pub nrql: String,
}

/// Named presentation modifier.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Display
{
    /// Unique display name.
    pub name:          String,
    /// Trailing NRQL appended after the `WHERE` clause.
    pub nrql:          Option<String,>,
    /// Visualization used by widgets rendering this display.
    pub visualization: Visualization,
}

impl Display
{
    /// Creates a display, treating a blank fragment as absent.
    pub fn new(name: impl Into<String,>, nrql: Option<String,>, visualization: Visualization,) -> Self
    {
        Self {
            name: name.into(),
            nrql: non_blank(nrql,),
            visualization,
        }
    }
}

/// Query assembled from named components.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ComponentizedQuery
{
    /// Event type selected by the `FROM` clause.
    pub event:     String,
    /// Filter rendered as the `WHERE` clause.
    pub condition: Option<Filter,>,
    /// Output selection rendered first.
    pub output:    OutputSelection,
    /// Display rendered last.
    pub display:   Display,
}

impl ComponentizedQuery
{
    /// Renders the query as
    /// `<output> FROM <event>[ WHERE <condition>][ <display>]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nrdash::{ComponentizedQuery, Display, Filter, OutputSelection, Visualization};
    ///
    /// let query = ComponentizedQuery {
    ///     event:     "Transaction".to_owned(),
    ///     condition: Some(Filter::new("ok", "Transaction", Some("status = 200".to_owned(),),),),
    ///     output:    OutputSelection {
    ///         name: "count".to_owned(), nrql: "SELECT COUNT(*)".to_owned(),
    ///     },
    ///     display:   Display::new("series", Some("TIMESERIES".to_owned(),), Visualization::LineChart,),
    /// };
    /// assert_eq!(query.to_query_text(), "SELECT COUNT(*) FROM Transaction WHERE status = 200 TIMESERIES");
    /// ```
    pub fn to_query_text(&self,) -> String
    {
        let mut text = format!("{} FROM {}", self.output.nrql, self.event);

        if let Some(condition,) = self.condition.as_ref().and_then(|filter| filter.nrql.as_deref(),) {
            text.push_str(" WHERE ",);
            text.push_str(condition,);
        }

        if let Some(display,) = self.display.nrql.as_deref() {
            text.push(' ',);
            text.push_str(display,);
        }

        text
    }
}

/// Authoring mode of a query.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum QuerySource
{
    /// Raw NRQL supplied by the author.
    Inline
    {
        /// Query text used verbatim.
        nrql:          String,
        /// Visualization chosen by the author.
        visualization: Visualization,
    },
    /// Query assembled from named components.
    Componentized(ComponentizedQuery,),
}

/// Named, titled query ready to be placed on a dashboard.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Query
{
    /// Unique query name.
    pub name:   String,
    /// Widget title.
    pub title:  String,
    /// Optional widget notes.
    pub notes:  Option<String,>,
    /// How the query text is produced.
    pub source: QuerySource,
}

impl Query
{
    /// Returns the final NRQL text for this query.
    pub fn to_query_text(&self,) -> String
    {
        match &self.source {
            QuerySource::Inline {
                nrql, ..
            } => nrql.clone(),
            QuerySource::Componentized(query,) => query.to_query_text(),
        }
    }

    /// Returns the visualization used to render this query.
    pub fn visualization(&self,) -> Visualization
    {
        match &self.source {
            QuerySource::Inline {
                visualization, ..
            } => *visualization,
            QuerySource::Componentized(query,) => query.display.visualization,
        }
    }
}

/// Reusable widget content without a grid position.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct WidgetDefinition
{
    /// Unique widget name.
    pub name:          String,
    /// Widget title.
    pub title:         String,
    /// Final NRQL text.
    pub query:         String,
    /// Visualization used to render the widget.
    pub visualization: Visualization,
    /// Optional widget notes.
    pub notes:         Option<String,>,
}

/// Position and size of a widget on the dashboard grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct Layout
{
    /// Grid row.
    pub row:    u32,
    /// Grid column.
    pub column: u32,
    /// Width in grid cells.
    pub width:  u32,
    /// Height in grid cells.
    pub height: u32,
}

/// Fully resolved widget placed on a dashboard.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Widget
{
    /// Widget title.
    pub title:         String,
    /// Final NRQL text.
    pub query:         String,
    /// Visualization used to render the widget.
    pub visualization: Visualization,
    /// Grid placement.
    pub layout:        Layout,
    /// Optional widget notes.
    pub notes:         Option<String,>,
}

/// Dashboard ready for submission.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Dashboard
{
    /// Name of the dashboard in the configuration document.
    pub name:    String,
    /// Title used on New Relic and as the reconciliation key.
    pub title:   String,
    /// Widgets in declaration order.
    pub widgets: Vec<Widget,>,
}

fn non_blank(value: Option<String,>,) -> Option<String,>
{
    value.map(|text| text.trim().to_owned(),).filter(|text| !text.is_empty(),)
}
