//! Display parsing and query compilation.
//!
//! A query is either written inline as raw NRQL with a visualization, or
//! assembled from a named filter, output selection and display. Both modes
//! produce a [`Query`] whose text is rendered on demand.

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    config::{DisplayConfig, QueryConfig},
    error::Error,
    model::{
        ComponentizedQuery, Display, DisplayTable, FilterTable, OutputTable, Query, QuerySource,
        QueryTable,
    },
    visualization::Visualization,
};

/// Resolved tables a componentized query may reference.
#[derive(Debug, Clone, Copy,)]
pub struct QueryComponents<'a,>
{
    /// Resolved filters.
    pub filters:  &'a FilterTable,
    /// Rendered output selections.
    pub outputs:  &'a OutputTable,
    /// Parsed displays.
    pub displays: &'a DisplayTable,
}

/// Parses every display declared in the document.
///
/// # Errors
///
/// Returns [`Error::InvalidVisualization`] when a display has no
/// visualization or names an unknown one.
pub fn parse_displays(configs: &IndexMap<String, DisplayConfig,>,) -> Result<DisplayTable, Error,>
{
    let mut displays = DisplayTable::with_capacity(configs.len(),);

    for (name, config,) in configs {
        let visualization = config
            .visualization
            .as_deref()
            .ok_or_else(|| {
                Error::invalid_visualization(format!(
                    "field visualization is required for display {name}"
                ),)
            },)?
            .parse::<Visualization,>()?;

        displays.insert(name.clone(), Display::new(name.clone(), config.nrql.clone(), visualization,),);
    }

    Ok(displays,)
}

/// Compiles every query declared in the document.
///
/// # Errors
///
/// Returns [`Error::InvalidQuery`] when a required field is missing or a
/// named component does not exist, and [`Error::InvalidVisualization`] when
/// an inline query names an unknown visualization.
pub fn parse_queries(
    configs: &IndexMap<String, QueryConfig,>,
    components: QueryComponents<'_,>,
) -> Result<QueryTable, Error,>
{
    let mut queries = QueryTable::with_capacity(configs.len(),);

    for (name, config,) in configs {
        let query = compile_query(name, config, components,)?;
        debug!("Query {} compiles to {}", name, query.to_query_text());
        queries.insert(name.clone(), query,);
    }

    Ok(queries,)
}

/// Compiles a single query definition.
///
/// The presence of `nrql` selects the inline mode; any other shape is
/// treated as componentized.
///
/// # Errors
///
/// See [`parse_queries`].
pub fn compile_query(
    name: &str,
    config: &QueryConfig,
    components: QueryComponents<'_,>,
) -> Result<Query, Error,>
{
    if config.nrql.is_some() {
        compile_inline_query(name, config,)
    } else {
        compile_componentized_query(name, config, components,)
    }
}

fn compile_inline_query(name: &str, config: &QueryConfig,) -> Result<Query, Error,>
{
    let title = required(config.title.as_ref(), "title", name,)?;
    let nrql = required(config.nrql.as_ref(), "nrql", name,)?;
    let visualization = required(config.visualization.as_ref(), "visualization", name,)?;

    let mixed = [
        ("event", &config.event,),
        ("filter", &config.filter,),
        ("output", &config.output,),
        ("display", &config.display,),
    ];
    if let Some((field, _,),) = mixed.iter().find(|(_, value,)| value.is_some(),) {
        return Err(Error::invalid_query(format!(
            "field {field} cannot be combined with inline nrql in query {name}"
        ),),);
    }

    Ok(Query {
        name:   name.to_owned(),
        title:  title.to_owned(),
        notes:  config.notes.clone(),
        source: QuerySource::Inline {
            nrql:          nrql.trim().to_owned(),
            visualization: visualization.parse()?,
        },
    },)
}

fn compile_componentized_query(
    name: &str,
    config: &QueryConfig,
    components: QueryComponents<'_,>,
) -> Result<Query, Error,>
{
    let title = required(config.title.as_ref(), "title", name,)?;
    if config.event.is_none() && config.filter.is_none() {
        return Err(Error::invalid_query(format!(
            "field event or filter is required for query {name}"
        ),),);
    }
    let output_name = required(config.output.as_ref(), "output", name,)?;
    let display_name = required(config.display.as_ref(), "display", name,)?;

    if config.visualization.is_some() {
        return Err(Error::invalid_query(format!(
            "field visualization is only valid for inline queries; set it on the display used by \
             query {name}"
        ),),);
    }

    let condition = config
        .filter
        .as_deref()
        .map(|filter| lookup(components.filters, "filter", filter, name,),)
        .transpose()?
        .cloned();
    let output = lookup(components.outputs, "output", output_name, name,)?.clone();
    let display = lookup(components.displays, "display", display_name, name,)?.clone();

    let event = match (config.event.as_deref().map(str::trim,), condition.as_ref(),) {
        (Some(event,), Some(filter,),) if event != filter.event => {
            return Err(Error::invalid_query(format!(
                "event {event} of query {name} conflicts with event {} of filter {}",
                filter.event, filter.name
            ),),);
        }
        (Some(event,), _,) => event.to_owned(),
        (None, Some(filter,),) => filter.event.clone(),
        (None, None,) => {
            return Err(Error::invalid_query(format!(
                "field event or filter is required for query {name}"
            ),),);
        }
    };

    Ok(Query {
        name:   name.to_owned(),
        title:  title.to_owned(),
        notes:  config.notes.clone(),
        source: QuerySource::Componentized(ComponentizedQuery {
            event,
            condition,
            output,
            display,
        },),
    },)
}

fn required<'a,>(value: Option<&'a String,>, field: &str, query: &str,) -> Result<&'a str, Error,>
{
    value
        .map(String::as_str,)
        .ok_or_else(|| Error::invalid_query(format!("field {field} is required for query {query}"),),)
}

fn lookup<'t, T,>(
    table: &'t IndexMap<String, T,>,
    field: &str,
    value: &str,
    query: &str,
) -> Result<&'t T, Error,>
{
    table.get(value,).ok_or_else(|| {
        Error::invalid_query(format!("invalid {field}, {value}, specified for query {query}"),)
    },)
}
