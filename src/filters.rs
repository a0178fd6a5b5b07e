//! Resolution of named filters, including filters that extend other filters.
//!
//! Base filters are concrete as soon as they are read. Extending filters
//! combine previously defined filters and inline NRQL fragments with `AND`
//! or `OR`, and may themselves be extended. They are resolved by a
//! fixed-point loop: every pass resolves, as one batch, each pending filter
//! whose references are all resolved already. A pass that makes no progress
//! means the remaining filters reference something missing or form a cycle.

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::debug;

use crate::{
    config::FilterConfig,
    error::Error,
    model::{Filter, FilterTable},
};

/// Boolean operator joining the operands of an extending filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum FilterOperator
{
    And,
    Or,
}

impl FilterOperator
{
    /// NRQL keyword for the operator.
    pub const fn keyword(self,) -> &'static str
    {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Filter awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq,)]
struct ExtendingFilter
{
    name:     String,
    operator: FilterOperator,
    extended: Vec<String,>,
    inline:   Vec<String,>,
}

impl ExtendingFilter
{
    fn is_resolvable(&self, resolved: &FilterTable,) -> bool
    {
        self.extended.iter().all(|name| resolved.contains_key(name,),)
    }

    /// Builds the concrete filter. Each referenced filter's text is wrapped
    /// as one unit, so chained extensions nest instead of re-expanding.
    fn resolve(&self, resolved: &FilterTable,) -> Result<Filter, Error,>
    {
        let mut event = None;
        let mut terms = Vec::with_capacity(self.extended.len() + self.inline.len(),);

        for name in &self.extended {
            let base = resolved.get(name,).ok_or_else(|| {
                Error::invalid_extending_filter(format!(
                    "filter {} references unresolved filter {name}",
                    self.name
                ),)
            },)?;
            event.get_or_insert_with(|| base.event.clone(),);
            if let Some(nrql,) = base.nrql.as_deref() {
                terms.push(format!("({nrql})"),);
            }
        }

        terms.extend(self.inline.iter().map(|nrql| format!("({nrql})"),),);

        let event = event.ok_or_else(|| {
            Error::invalid_extending_filter(format!(
                "filter {} does not extend any other filters",
                self.name
            ),)
        },)?;
        let separator = format!(" {} ", self.operator.keyword());
        let nrql = (!terms.is_empty()).then(|| terms.join(&separator,),);

        Ok(Filter::new(self.name.clone(), event, nrql,),)
    }
}

/// Parses and resolves every filter declared in the document.
///
/// # Errors
///
/// Returns [`Error::InvalidFilter`] when a base filter has no event and
/// [`Error::InvalidExtendingFilter`] when an extending filter is malformed,
/// references no filters, or cannot be resolved.
///
/// # Examples
///
/// ```
/// use nrdash::{DocumentConfig, parse_filters};
///
/// let config: DocumentConfig = serde_yaml::from_str(
///     r#"
/// filters:
///   prod:
///     event: Transaction
///     nrql: "env = 'prod'"
///   prod-errors:
///     and:
///       - filter: prod
///       - "error IS true"
/// "#,
/// )
/// .expect("valid document",);
/// let filters = parse_filters(&config.filters,)?;
/// assert_eq!(filters["prod-errors"].nrql.as_deref(), Some("(env = 'prod') AND (error IS true)"));
/// assert_eq!(filters["prod-errors"].event, "Transaction");
/// # Ok::<(), nrdash::Error>(())
/// ```
pub fn parse_filters(configs: &IndexMap<String, FilterConfig,>,) -> Result<FilterTable, Error,>
{
    let mut resolved = FilterTable::with_capacity(configs.len(),);
    let mut pending = Vec::new();

    for (name, config,) in configs {
        if config.is_extending() {
            pending.push(parse_extending_filter(name, config,)?,);
        } else {
            resolved.insert(name.clone(), parse_base_filter(name, config,)?,);
        }
    }

    debug!("Parsed {} base filters and {} extending filters", resolved.len(), pending.len());
    resolve_extending_filters(resolved, pending,)
}

fn parse_base_filter(name: &str, config: &FilterConfig,) -> Result<Filter, Error,>
{
    let event = config
        .event
        .as_deref()
        .map(str::trim,)
        .filter(|event| !event.is_empty(),)
        .ok_or_else(|| Error::invalid_filter(format!("field event is required for filter {name}"),),)?;

    Ok(Filter::new(name, event, config.nrql.clone(),),)
}

fn parse_extending_filter(name: &str, config: &FilterConfig,) -> Result<ExtendingFilter, Error,>
{
    if config.event.is_some() || config.nrql.is_some() {
        return Err(Error::invalid_extending_filter(format!(
            "filter {name} cannot define event or nrql while extending other filters"
        ),),);
    }

    let (operator, operands,) = match (config.and.as_ref(), config.or.as_ref(),) {
        (Some(operands,), None,) => (FilterOperator::And, operands,),
        (None, Some(operands,),) => (FilterOperator::Or, operands,),
        _ => {
            return Err(Error::invalid_extending_filter(format!(
                "filter {name} must use exactly one of the and/or operators"
            ),),);
        }
    };

    let mut extended = Vec::new();
    let mut inline = Vec::new();
    for operand in operands {
        match operand {
            Value::String(nrql,) if !nrql.trim().is_empty() => inline.push(nrql.trim().to_owned(),),
            Value::Mapping(mapping,) if mapping.len() == 1 => {
                let reference = mapping
                    .iter()
                    .find_map(|(key, value,)| match (key.as_str(), value.as_str(),) {
                        (Some("filter" | "condition",), Some(target,),) => Some(target.to_owned(),),
                        _ => None,
                    },)
                    .ok_or_else(|| invalid_operand(name, operand,),)?;
                extended.push(reference,);
            }
            _ => return Err(invalid_operand(name, operand,),),
        }
    }

    if extended.is_empty() {
        return Err(Error::invalid_extending_filter(format!(
            "filter {name} does not extend any other filters"
        ),),);
    }

    Ok(ExtendingFilter {
        name: name.to_owned(),
        operator,
        extended,
        inline,
    },)
}

fn invalid_operand(name: &str, operand: &Value,) -> Error
{
    let rendered = serde_yaml::to_string(operand,)
        .map(|text| text.trim().to_owned(),)
        .unwrap_or_else(|_| format!("{operand:?}"),);
    Error::invalid_extending_filter(format!("invalid operand for filter {name}: {rendered}"),)
}

/// Resolves pending filters in batches until none remain.
///
/// # Errors
///
/// Returns [`Error::InvalidExtendingFilter`] naming every filter left when a
/// pass resolves nothing.
fn resolve_extending_filters(
    mut resolved: FilterTable,
    mut pending: Vec<ExtendingFilter,>,
) -> Result<FilterTable, Error,>
{
    let mut pass = 0usize;

    while !pending.is_empty() {
        pass += 1;
        let (ready, blocked,): (Vec<_,>, Vec<_,>,) =
            pending.into_iter().partition(|filter| filter.is_resolvable(&resolved,),);

        if ready.is_empty() {
            let names: Vec<_,> = blocked.iter().map(|filter| filter.name.as_str(),).collect();
            return Err(Error::invalid_extending_filter(format!(
                "filters reference missing or cyclic filters and cannot be resolved: {}",
                names.join(", ")
            ),),);
        }

        let batch = ready
            .iter()
            .map(|filter| filter.resolve(&resolved,),)
            .collect::<Result<Vec<_,>, _,>>()?;

        debug!("Resolved {} extending filters in pass {}", batch.len(), pass);
        for filter in batch {
            resolved.insert(filter.name.clone(), filter,);
        }

        pending = blocked;
    }

    Ok(resolved,)
}

#[cfg(test)]
mod tests
{
    use super::{FilterOperator, parse_filters};
    use crate::{DocumentConfig, Error, model::FilterTable};

    fn filters(yaml: &str,) -> Result<FilterTable, Error,>
    {
        let config: DocumentConfig =
            serde_yaml::from_str(yaml,).expect("expected document to deserialize",);
        parse_filters(&config.filters,)
    }

    fn assert_extending_error(yaml: &str,) -> String
    {
        match filters(yaml,) {
            Err(Error::InvalidExtendingFilter {
                message,
            },) => message,
            other => panic!("expected extending filter error, got {other:?}"),
        }
    }

    const CHAINED: &str = r"
        filters:
          base:
            event: Transaction
            nrql: appName = 'MyApp'
          first:
            and:
              - filter: base
              - server = 'prod1'
          second:
            and:
              - filter: first
              - environment != 'test'
          third:
            or:
              - filter: second
              - environment = 'qa'
          multiple:
            and:
              - filter: base
              - server = 'test1'
              - status = 'error' OR status = 'failed'
              - environment = 'test'
    ";

    #[test]
    fn resolves_chained_extensions_as_nested_units()
    {
        let resolved = filters(CHAINED,).expect("expected resolution",);

        assert_eq!(resolved["base"].nrql.as_deref(), Some("appName = 'MyApp'"));
        assert_eq!(resolved["first"].nrql.as_deref(), Some("(appName = 'MyApp') AND (server = 'prod1')"));
        assert_eq!(
            resolved["second"].nrql.as_deref(),
            Some("((appName = 'MyApp') AND (server = 'prod1')) AND (environment != 'test')")
        );
        assert_eq!(
            resolved["third"].nrql.as_deref(),
            Some(
                "(((appName = 'MyApp') AND (server = 'prod1')) AND (environment != 'test')) OR \
                 (environment = 'qa')"
            )
        );
        assert_eq!(
            resolved["multiple"].nrql.as_deref(),
            Some(
                "(appName = 'MyApp') AND (server = 'test1') AND (status = 'error' OR status = \
                 'failed') AND (environment = 'test')"
            )
        );
    }

    #[test]
    fn extending_filters_inherit_event()
    {
        let resolved = filters(CHAINED,).expect("expected resolution",);
        assert!(resolved.values().all(|filter| filter.event == "Transaction"));
    }

    #[test]
    fn forward_references_resolve_in_later_passes()
    {
        let yaml = r"
            filters:
              outer:
                and:
                  - filter: inner
                  - b = 2
              inner:
                and:
                  - filter: base
                  - a = 1
              base:
                event: PageView
                nrql: x = 0
        ";

        let resolved = filters(yaml,).expect("expected resolution",);
        assert_eq!(resolved["outer"].nrql.as_deref(), Some("((x = 0) AND (a = 1)) AND (b = 2)"));
        assert_eq!(resolved["outer"].event, "PageView");
    }

    #[test]
    fn combines_only_referenced_filters()
    {
        let yaml = r"
            filters:
              env:
                event: Transaction
                nrql: env = 'Prod'
              server:
                event: Transaction
                nrql: server = 'Prod1'
              either:
                or:
                  - filter: env
                  - condition: server
        ";

        let resolved = filters(yaml,).expect("expected resolution",);
        assert_eq!(resolved["either"].nrql.as_deref(), Some("(env = 'Prod') OR (server = 'Prod1')"));
    }

    #[test]
    fn event_comes_from_first_reference()
    {
        let yaml = r"
            filters:
              page:
                event: PageView
                nrql: a = 1
              txn:
                event: Transaction
                nrql: b = 2
              mixed:
                and:
                  - filter: txn
                  - filter: page
        ";

        let resolved = filters(yaml,).expect("expected resolution",);
        assert_eq!(resolved["mixed"].event, "Transaction");
    }

    #[test]
    fn match_all_references_contribute_no_term()
    {
        let yaml = r"
            filters:
              everything:
                event: Transaction
              narrowed:
                and:
                  - filter: everything
                  - duration > 1
              still-everything:
                or:
                  - filter: everything
        ";

        let resolved = filters(yaml,).expect("expected resolution",);
        assert_eq!(resolved["narrowed"].nrql.as_deref(), Some("(duration > 1)"));
        assert!(resolved["still-everything"].matches_all());
    }

    #[test]
    fn base_filters_require_event()
    {
        let yaml = r"
            filters:
              broken:
                nrql: a = 1
        ";

        assert!(matches!(filters(yaml), Err(Error::InvalidFilter { .. })));
    }

    #[test]
    fn rejects_missing_reference()
    {
        let yaml = r"
            filters:
              base:
                event: Transaction
                nrql: a = 1
              dangling:
                and:
                  - filter: nowhere
                  - b = 2
        ";

        let message = assert_extending_error(yaml,);
        assert!(message.contains("dangling"));
    }

    #[test]
    fn rejects_cycles_naming_every_unresolved_filter()
    {
        let yaml = r"
            filters:
              left:
                and:
                  - filter: right
              right:
                or:
                  - filter: left
        ";

        let message = assert_extending_error(yaml,);
        assert!(message.ends_with("left, right"), "unexpected message: {message}");
    }

    #[test]
    fn rejects_self_reference()
    {
        let yaml = r"
            filters:
              selfish:
                and:
                  - filter: selfish
                  - a = 1
        ";

        let message = assert_extending_error(yaml,);
        assert!(message.contains("selfish"));
    }

    #[test]
    fn rejects_extension_without_references()
    {
        let yaml = r"
            filters:
              base:
                event: Transaction
              lonely:
                and:
                  - a = 1
                  - b = 2
        ";

        let message = assert_extending_error(yaml,);
        assert_eq!(message, "filter lonely does not extend any other filters");
    }

    #[test]
    fn rejects_invalid_operands()
    {
        let yaml = r"
            filters:
              base:
                event: Transaction
              odd:
                and:
                  - filter: base
                  - 42
        ";

        let message = assert_extending_error(yaml,);
        assert!(message.contains("invalid operand for filter odd"));
    }

    #[test]
    fn rejects_unknown_operand_keys()
    {
        let yaml = r"
            filters:
              base:
                event: Transaction
              odd:
                or:
                  - query: base
        ";

        assert_extending_error(yaml,);
    }

    #[test]
    fn rejects_both_operators()
    {
        let yaml = r"
            filters:
              base:
                event: Transaction
              confused:
                and:
                  - filter: base
                or:
                  - filter: base
        ";

        let message = assert_extending_error(yaml,);
        assert!(message.contains("exactly one of the and/or operators"));
    }

    #[test]
    fn rejects_event_on_extending_filter()
    {
        let yaml = r"
            filters:
              base:
                event: Transaction
              override:
                event: PageView
                and:
                  - filter: base
        ";

        assert_extending_error(yaml,);
    }

    #[test]
    fn empty_section_yields_empty_table()
    {
        let resolved = filters("dashboards: {}",).expect("expected resolution",);
        assert!(resolved.is_empty());
    }

    #[test]
    fn operator_keywords()
    {
        assert_eq!(FilterOperator::And.keyword(), "AND");
        assert_eq!(FilterOperator::Or.keyword(), "OR");
    }
}
