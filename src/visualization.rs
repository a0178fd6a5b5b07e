// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Closed set of widget visualizations accepted by the New Relic dashboards
//! API.
//!
//! Names are matched case-insensitively so `Line_Chart` and `line_chart`
//! select the same variant. Any other value is rejected with
//! [`Error::InvalidVisualization`](crate::Error::InvalidVisualization).

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::error::Error;

/// Visualization type used to render a widget.
///
/// # Examples
///
/// ```
/// use nrdash::Visualization;
///
/// let kind: Visualization = "line_chart".parse().expect("known visualization",);
/// assert_eq!(kind, Visualization::LineChart);
/// assert_eq!(kind.as_str(), "line_chart");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,)]
#[serde(rename_all = "snake_case")]
pub enum Visualization
{
    Billboard,
    Gauge,
    BillboardComparison,
    FacetBarChart,
    FacetedLineChart,
    FacetPieChart,
    FacetTable,
    FacetedAreaChart,
    Heatmap,
    AttributeSheet,
    SingleEvent,
    Histogram,
    Funnel,
    RawJson,
    EventFeed,
    EventTable,
    UniquesList,
    LineChart,
    ComparisonLineChart,
    Markdown,
    MetricLineChart,
    List,
}

impl Visualization
{
    /// Every supported visualization in API declaration order.
    pub const ALL: [Visualization; 22] = [
        Self::Billboard,
        Self::Gauge,
        Self::BillboardComparison,
        Self::FacetBarChart,
        Self::FacetedLineChart,
        Self::FacetPieChart,
        Self::FacetTable,
        Self::FacetedAreaChart,
        Self::Heatmap,
        Self::AttributeSheet,
        Self::SingleEvent,
        Self::Histogram,
        Self::Funnel,
        Self::RawJson,
        Self::EventFeed,
        Self::EventTable,
        Self::UniquesList,
        Self::LineChart,
        Self::ComparisonLineChart,
        Self::Markdown,
        Self::MetricLineChart,
        Self::List,
    ];

    /// Returns the name the API expects for this visualization.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Billboard => "billboard",
            Self::Gauge => "gauge",
            Self::BillboardComparison => "billboard_comparison",
            Self::FacetBarChart => "facet_bar_chart",
            Self::FacetedLineChart => "faceted_line_chart",
            Self::FacetPieChart => "facet_pie_chart",
            Self::FacetTable => "facet_table",
            Self::FacetedAreaChart => "faceted_area_chart",
            Self::Heatmap => "heatmap",
            Self::AttributeSheet => "attribute_sheet",
            Self::SingleEvent => "single_event",
            Self::Histogram => "histogram",
            Self::Funnel => "funnel",
            Self::RawJson => "raw_json",
            Self::EventFeed => "event_feed",
            Self::EventTable => "event_table",
            Self::UniquesList => "uniques_list",
            Self::LineChart => "line_chart",
            Self::ComparisonLineChart => "comparison_line_chart",
            Self::Markdown => "markdown",
            Self::MetricLineChart => "metric_line_chart",
            Self::List => "list",
        }
    }
}

impl FromStr for Visualization
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(trimmed,),)
            .ok_or_else(|| Error::invalid_visualization(format!("unknown visualization '{value}'"),),)
    }
}

impl fmt::Display for Visualization
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

#[cfg(test)]
mod tests
{
    use super::Visualization;
    use crate::Error;

    #[test]
    fn every_variant_parses_from_its_name()
    {
        for kind in Visualization::ALL {
            let parsed: Visualization = kind.as_str().parse().expect("expected known name",);
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn parsing_ignores_ascii_case()
    {
        let parsed: Visualization = "Facet_Table".parse().expect("expected known name",);
        assert_eq!(parsed, Visualization::FacetTable);
    }

    #[test]
    fn unknown_names_are_rejected()
    {
        let error = "pie".parse::<Visualization,>().expect_err("expected rejection",);
        match error {
            Error::InvalidVisualization {
                message,
            } => assert!(message.contains("'pie'")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn serializes_to_api_name()
    {
        let json = serde_json::to_string(&Visualization::BillboardComparison,)
            .expect("serialization failed",);
        assert_eq!(json, "\"billboard_comparison\"");
    }

    #[test]
    fn display_matches_api_name()
    {
        assert_eq!(Visualization::RawJson.to_string(), "raw_json");
    }
}
