//! End-to-end compilation of a configuration document.
//!
//! Stages run in dependency order: filters, output selections, displays,
//! queries, widgets and finally dashboards. Each stage receives the tables
//! produced before it and nothing else, so a document is compiled the same
//! way every time it is parsed.

use std::{fs, path::Path};

use tracing::debug;

use crate::{
    config::DocumentConfig,
    dashboard::{parse_dashboards, parse_widgets},
    error::{self, Error},
    filters::parse_filters,
    model::{DashboardTable, DisplayTable, FilterTable, OutputTable, QueryTable, WidgetTable},
    output::parse_output_selections,
    query::{QueryComponents, parse_displays, parse_queries},
};

/// Every table resolved from one configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default,)]
pub struct CompiledDocument
{
    /// Resolved filters, base filters first.
    pub filters:           FilterTable,
    /// Rendered output selections.
    pub output_selections: OutputTable,
    /// Parsed displays.
    pub displays:          DisplayTable,
    /// Compiled queries.
    pub queries:           QueryTable,
    /// Reusable widget definitions.
    pub widgets:           WidgetTable,
    /// Dashboards in declaration order.
    pub dashboards:        DashboardTable,
}

/// Loads and compiles the configuration document at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and propagates every
/// error from [`parse_document`].
pub fn load_document(path: &Path,) -> Result<CompiledDocument, Error,>
{
    debug!("Reading configuration from {}", path.display());
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_document(&contents,)
}

/// Parses and compiles a configuration document held in memory.
///
/// An empty document compiles to empty tables.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the YAML cannot be decoded and the
/// configuration errors of each stage otherwise.
///
/// # Examples
///
/// ```
/// use nrdash::parse_document;
///
/// let document = parse_document(
///     r#"
/// filters:
///   errors:
///     event: Transaction
///     nrql: error IS true
/// output-selections:
///   count: COUNT(*)
/// displays:
///   trend:
///     nrql: TIMESERIES
///     visualization: line_chart
/// queries:
///   error-trend:
///     title: Errors
///     filter: errors
///     output: count
///     display: trend
/// dashboards:
///   overview:
///     title: Overview
///     widgets:
///       - query: error-trend
///         row: 1
///         column: 1
///         width: 3
///         height: 3
/// "#,
/// )?;
/// let widget = &document.dashboards["overview"].widgets[0];
/// assert_eq!(widget.query, "SELECT COUNT(*) FROM Transaction WHERE error IS true TIMESERIES");
/// # Ok::<(), nrdash::Error>(())
/// ```
pub fn parse_document(contents: &str,) -> Result<CompiledDocument, Error,>
{
    if contents.trim().is_empty() {
        return Ok(CompiledDocument::default(),);
    }

    let config: Option<DocumentConfig,> = serde_yaml::from_str(contents,)?;
    compile_document(&config.unwrap_or_default(),)
}

/// Compiles an already decoded configuration document.
///
/// # Errors
///
/// See [`parse_document`].
pub fn compile_document(config: &DocumentConfig,) -> Result<CompiledDocument, Error,>
{
    let filters = parse_filters(&config.filters,)?;
    let output_selections = parse_output_selections(&config.output_selections, &filters,)?;
    let displays = parse_displays(&config.displays,)?;

    let components = QueryComponents {
        filters:  &filters,
        outputs:  &output_selections,
        displays: &displays,
    };
    let queries = parse_queries(&config.queries, components,)?;
    let widgets = parse_widgets(&config.widgets, &queries, components,)?;
    let dashboards = parse_dashboards(&config.dashboards, &queries, &widgets, components,)?;

    debug!(
        "Compiled {} filters, {} output selections, {} displays, {} queries, {} widgets and {} \
         dashboards",
        filters.len(),
        output_selections.len(),
        displays.len(),
        queries.len(),
        widgets.len(),
        dashboards.len()
    );

    Ok(CompiledDocument {
        filters,
        output_selections,
        displays,
        queries,
        widgets,
        dashboards,
    },)
}
