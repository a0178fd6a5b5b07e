//! Assembly of reusable widgets and dashboard grids.
//!
//! Widgets are materialized from compiled queries: their titles, notes,
//! NRQL text and visualization are copied out so a dashboard no longer
//! depends on the tables it was built from. Placements keep their
//! declaration order.

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    config::{DashboardConfig, PlacementConfig, QueryReference, WidgetConfig},
    error::Error,
    model::{
        Dashboard, DashboardTable, Layout, Query, QueryTable, Widget, WidgetDefinition, WidgetTable,
    },
    query::{QueryComponents, compile_query},
};

/// Parses the reusable widget definitions declared in the document.
///
/// # Errors
///
/// Returns [`Error::InvalidWidget`] when a definition has no query or names
/// an unknown query, and propagates query compilation errors for inline
/// queries.
pub fn parse_widgets(
    configs: &IndexMap<String, WidgetConfig,>,
    queries: &QueryTable,
    components: QueryComponents<'_,>,
) -> Result<WidgetTable, Error,>
{
    let mut widgets = WidgetTable::with_capacity(configs.len(),);

    for (name, config,) in configs {
        let reference = config.query.as_ref().ok_or_else(|| {
            Error::invalid_widget(format!("field query is required for widget {name}"),)
        },)?;

        let query = match reference {
            QueryReference::Named(query_name,) => queries.get(query_name,).cloned().ok_or_else(|| {
                Error::invalid_widget(format!(
                    "invalid query name, {query_name}, specified for widget {name}"
                ),)
            },)?,
            QueryReference::Inline(query_config,) => {
                compile_query(&format!("{name}-inline-query"), query_config, components,)?
            }
        };

        widgets.insert(name.clone(), WidgetDefinition {
            name:          name.clone(),
            title:         config.title.clone().unwrap_or_else(|| query.title.clone(),),
            query:         query.to_query_text(),
            visualization: query.visualization(),
            notes:         config.notes.clone().or_else(|| query.notes.clone(),),
        },);
    }

    Ok(widgets,)
}

/// Assembles every dashboard declared in the document.
///
/// # Errors
///
/// Returns [`Error::InvalidDashboard`] when a dashboard has no title and
/// [`Error::InvalidWidget`] when a placement is missing a field or names an
/// unknown query or widget.
pub fn parse_dashboards(
    configs: &IndexMap<String, DashboardConfig,>,
    queries: &QueryTable,
    widgets: &WidgetTable,
    components: QueryComponents<'_,>,
) -> Result<DashboardTable, Error,>
{
    let mut dashboards = DashboardTable::with_capacity(configs.len(),);

    for (name, config,) in configs {
        let title = config.title.clone().ok_or_else(|| {
            Error::invalid_dashboard(format!("field title is required for dashboard {name}"),)
        },)?;

        let placed = config
            .widgets
            .iter()
            .enumerate()
            .map(|(index, placement,)| {
                place_widget(name, index, placement, queries, widgets, components,)
            },)
            .collect::<Result<Vec<_,>, _,>>()?;

        debug!("Dashboard {} assembled with {} widgets", name, placed.len());
        dashboards.insert(name.clone(), Dashboard {
            name: name.clone(),
            title,
            widgets: placed,
        },);
    }

    Ok(dashboards,)
}

fn place_widget(
    dashboard: &str,
    index: usize,
    placement: &PlacementConfig,
    queries: &QueryTable,
    widgets: &WidgetTable,
    components: QueryComponents<'_,>,
) -> Result<Widget, Error,>
{
    if placement.query.is_none() && placement.widget.is_none() {
        return Err(missing_field("query", dashboard,),);
    }
    if placement.query.is_some() && placement.widget.is_some() {
        return Err(Error::invalid_widget(format!(
            "widget on dashboard {dashboard} cannot specify both query and widget"
        ),),);
    }

    let layout = Layout {
        row:    placement.row.ok_or_else(|| missing_field("row", dashboard,),)?,
        column: placement.column.ok_or_else(|| missing_field("column", dashboard,),)?,
        width:  placement.width.ok_or_else(|| missing_field("width", dashboard,),)?,
        height: placement.height.ok_or_else(|| missing_field("height", dashboard,),)?,
    };

    if let Some(widget_name,) = placement.widget.as_deref() {
        let definition = widgets.get(widget_name,).ok_or_else(|| {
            Error::invalid_widget(format!(
                "invalid widget name, {widget_name}, specified on dashboard {dashboard}"
            ),)
        },)?;

        return Ok(Widget {
            title: definition.title.clone(),
            query: definition.query.clone(),
            visualization: definition.visualization,
            layout,
            notes: definition.notes.clone(),
        },);
    }

    let query = match placement.query.as_ref() {
        Some(QueryReference::Named(query_name,),) => queries.get(query_name,).cloned().ok_or_else(|| {
            Error::invalid_widget(format!(
                "invalid query name, {query_name}, specified for widget on dashboard {dashboard}"
            ),)
        },)?,
        Some(QueryReference::Inline(query_config,),) => compile_query(
            &format!("{dashboard}-inline-query-{}", index + 1),
            query_config,
            components,
        )?,
        None => return Err(missing_field("query", dashboard,),),
    };

    Ok(widget_from_query(&query, layout,),)
}

fn widget_from_query(query: &Query, layout: Layout,) -> Widget
{
    Widget {
        title: query.title.clone(),
        query: query.to_query_text(),
        visualization: query.visualization(),
        layout,
        notes: query.notes.clone(),
    }
}

fn missing_field(field: &str, dashboard: &str,) -> Error
{
    Error::invalid_widget(format!("field {field} is required for widget on dashboard {dashboard}"),)
}
