//! Compiler for YAML dashboard definitions targeting New Relic.
//!
//! A configuration document declares named, reusable components (filters,
//! output selections, displays, queries and widgets) that reference one
//! another by name. [`parse_document`] resolves them in dependency order and
//! renders every widget into a flat NRQL query. The resulting dashboards are
//! pushed to the New Relic v2 API by [`reconcile_dashboards`], which creates
//! or updates each dashboard keyed on its exact title.

mod client;
mod config;
mod dashboard;
mod document;
mod error;
mod filters;
mod model;
mod output;
mod query;
mod reconcile;
mod visualization;

pub use client::{
    ApiRequest, ApiResponse, ClientConfig, DEFAULT_BASE_URL, DashboardPayload, HttpTransport,
    NewRelicClient, Transport, build_payload,
};
pub use config::{
    DashboardConfig, DisplayConfig, DocumentConfig, FilterConfig, PlacementConfig, QueryConfig,
    QueryReference, WidgetConfig,
};
pub use dashboard::{parse_dashboards, parse_widgets};
pub use document::{CompiledDocument, compile_document, load_document, parse_document};
pub use error::{Error, io_error};
pub use filters::{FilterOperator, parse_filters};
pub use model::{
    ComponentizedQuery, Dashboard, DashboardTable, Display, DisplayTable, Filter, FilterTable,
    Layout, OutputSelection, OutputTable, Query, QuerySource, QueryTable, Widget,
    WidgetDefinition, WidgetTable,
};
pub use output::parse_output_selections;
pub use query::{QueryComponents, compile_query, parse_displays, parse_queries};
pub use reconcile::{DashboardSync, SyncOutcome, reconcile_dashboard, reconcile_dashboards};
pub use visualization::Visualization;
