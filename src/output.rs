//! Rendering of named output selections into `SELECT` clauses.
//!
//! An output selection is written as raw NRQL, as a structured component,
//! or as a list mixing both. Structured components wrap an aggregation in
//! `FILTER(...)` or `PERCENTAGE(...)` and may name a filter instead of
//! spelling out the condition.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::{
    error::Error,
    model::{FilterTable, OutputSelection, OutputTable},
};

/// Body of a `filter:` or `percentage:` component.
#[derive(Debug, Deserialize,)]
#[serde(deny_unknown_fields)]
struct GroupedComponent
{
    #[serde(default)]
    function:  Option<String,>,
    #[serde(default)]
    condition: Option<String,>,
    #[serde(default)]
    label:     Option<String,>,
}

/// Parses every output selection declared in the document.
///
/// # Errors
///
/// Returns [`Error::InvalidOutput`] when a value is not a string, list or
/// mapping, or when a structured component is malformed.
///
/// # Examples
///
/// ```
/// use nrdash::{DocumentConfig, parse_filters, parse_output_selections};
///
/// let config: DocumentConfig = serde_yaml::from_str(
///     r#"
/// output-selections:
///   mixed:
///     - LATEST(x)
///     - filter:
///         function: COUNT(*)
///         condition: status != 'ok'
/// "#,
/// )
/// .expect("valid document",);
/// let filters = parse_filters(&config.filters,)?;
/// let outputs = parse_output_selections(&config.output_selections, &filters,)?;
/// assert_eq!(outputs["mixed"].nrql, "SELECT LATEST(x), FILTER(COUNT(*), WHERE status != 'ok')");
/// # Ok::<(), nrdash::Error>(())
/// ```
pub fn parse_output_selections(
    configs: &IndexMap<String, Value,>,
    filters: &FilterTable,
) -> Result<OutputTable, Error,>
{
    let mut outputs = OutputTable::with_capacity(configs.len(),);

    for (name, config,) in configs {
        let nrql = render_output_selection(name, config, filters,)?;
        debug!("Output selection {} renders as {}", name, nrql);
        outputs.insert(name.clone(), OutputSelection {
            name: name.clone(),
            nrql,
        },);
    }

    Ok(outputs,)
}

fn render_output_selection(name: &str, config: &Value, filters: &FilterTable,) -> Result<String, Error,>
{
    match config {
        Value::String(raw,) => Ok(format!("SELECT {raw}"),),
        Value::Sequence(components,) => {
            if components.is_empty() {
                return Err(Error::invalid_output(format!("output selection {name} is an empty list"),),);
            }

            let rendered = components
                .iter()
                .map(|component| render_component(name, component, filters,),)
                .collect::<Result<Vec<_,>, _,>>()?;
            Ok(format!("SELECT {}", rendered.join(", ")),)
        }
        Value::Mapping(_,) => Ok(format!("SELECT {}", render_component(name, config, filters)?),),
        other => Err(Error::invalid_output(format!(
            "output selection {name} must be a string, list or mapping, got {}",
            describe(other,)
        ),),),
    }
}

fn render_component(name: &str, component: &Value, filters: &FilterTable,) -> Result<String, Error,>
{
    match component {
        Value::String(raw,) => Ok(raw.clone(),),
        Value::Mapping(mapping,) => {
            if let Some(body,) = mapping.get("filter",) {
                return render_grouped(name, "FILTER", body, filters,);
            }
            if let Some(body,) = mapping.get("percentage",) {
                return render_grouped(name, "PERCENTAGE", body, filters,);
            }
            Err(Error::invalid_output(format!(
                "component of output selection {name} must contain a filter or percentage key"
            ),),)
        }
        other => Err(Error::invalid_output(format!(
            "component of output selection {name} must be a string or mapping, got {}",
            describe(other,)
        ),),),
    }
}

/// Renders `KEYWORD(function, WHERE condition)` followed by an optional
/// backtick-quoted label.
fn render_grouped(
    name: &str,
    keyword: &str,
    body: &Value,
    filters: &FilterTable,
) -> Result<String, Error,>
{
    let component: GroupedComponent = serde_yaml::from_value(body.clone(),).map_err(|source| {
        Error::invalid_output(format!("invalid {keyword} component in output selection {name}: {source}"),)
    },)?;

    let function = component.function.ok_or_else(|| {
        Error::invalid_output(format!(
            "field function is required for {keyword} component in output selection {name}"
        ),)
    },)?;
    let condition = component.condition.ok_or_else(|| {
        Error::invalid_output(format!(
            "field condition is required for {keyword} component in output selection {name}"
        ),)
    },)?;

    let condition = match filters.get(&condition,) {
        Some(filter,) => filter.nrql.clone().ok_or_else(|| {
            Error::invalid_output(format!(
                "filter {condition} matches every row and cannot be used as a condition in output \
                 selection {name}"
            ),)
        },)?,
        None => condition,
    };

    let label = component
        .label
        .as_deref()
        .map(str::trim,)
        .filter(|label| !label.is_empty(),)
        .map(|label| format!(" AS `{label}`"),)
        .unwrap_or_default();

    Ok(format!("{keyword}({function}, WHERE {condition}){label}"),)
}

fn describe(value: &Value,) -> &'static str
{
    match value {
        Value::Null => "null",
        Value::Bool(_,) => "a boolean",
        Value::Number(_,) => "a number",
        Value::String(_,) => "a string",
        Value::Sequence(_,) => "a list",
        Value::Mapping(_,) => "a mapping",
        Value::Tagged(_,) => "a tagged value",
    }
}
