// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fmt::Write;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nrdash::{build_payload, parse_document};

const SMALL_DOCUMENT: &str = r"
filters:
  prod:
    event: Transaction
    nrql: env = 'prod'
  prod-errors:
    and:
      - filter: prod
      - error IS true
output-selections:
  count: COUNT(*)
  error-rate:
    percentage:
      function: COUNT(*)
      condition: prod-errors
      label: Error Rate
displays:
  trend:
    nrql: TIMESERIES
    visualization: line_chart
queries:
  errors:
    title: Errors
    filter: prod-errors
    output: count
    display: trend
dashboards:
  main:
    title: Main
    widgets:
      - query: errors
        row: 1
        column: 1
        width: 2
        height: 2
";

fn benchmark_parse_document(c: &mut Criterion,)
{
    c.bench_function("parse_document_small", |b| {
        b.iter(|| parse_document(black_box(SMALL_DOCUMENT,),).expect("parse failed",),)
    },);
}

/// Chain of extending filters declared in reverse order, so the resolver
/// needs one pass per link.
fn chained_filters(depth: usize,) -> String
{
    let mut yaml = String::from("filters:\n",);
    for i in (1..depth).rev() {
        let _ = write!(yaml, "  f{i}:\n    and:\n      - filter: f{}\n      - c{i} = 1\n", i - 1);
    }
    yaml.push_str("  f0:\n    event: Transaction\n    nrql: c0 = 1\n",);
    yaml
}

fn benchmark_filter_resolution(c: &mut Criterion,)
{
    let yaml = chained_filters(50,);

    c.bench_function("resolve_50_chained_filters", |b| {
        b.iter(|| {
            let document = parse_document(black_box(&yaml,),).expect("parse failed",);
            black_box(document.filters.len(),)
        },)
    },);
}

fn large_document(dashboards: usize,) -> String
{
    let mut yaml = String::from(SMALL_DOCUMENT,);
    for d in 0..dashboards {
        let _ = write!(yaml, "  board{d}:\n    title: Board {d}\n    widgets:\n");
        for w in 0..10 {
            let _ = write!(
                yaml,
                "      - query: errors\n        row: {}\n        column: {}\n        width: 1\n        height: 1\n",
                w / 3 + 1,
                w % 3 + 1
            );
        }
    }
    yaml
}

fn benchmark_large_document(c: &mut Criterion,)
{
    let yaml = large_document(100,);

    c.bench_function("parse_100_dashboards", |b| {
        b.iter(|| parse_document(black_box(&yaml,),).expect("parse failed",),)
    },);
}

fn benchmark_payload_encoding(c: &mut Criterion,)
{
    let document = parse_document(&large_document(10,),).expect("parse failed",);

    c.bench_function("encode_10_dashboard_payloads", |b| {
        b.iter(|| {
            for dashboard in document.dashboards.values() {
                black_box(build_payload(dashboard, 1,).expect("encode failed",),);
            }
        },)
    },);
}

criterion_group!(
    benches,
    benchmark_parse_document,
    benchmark_filter_resolution,
    benchmark_large_document,
    benchmark_payload_encoding
);
criterion_main!(benches);
