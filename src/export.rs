//! Rule table and graph export

use crate::annotate::AnnotatedRule;
use crate::graph::RuleGraph;
use anyhow::Context;
use polars::prelude::*;
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Exported rule columns, in order
pub const RULE_COLUMNS: [&str; 12] = [
    "antecedents",
    "consequents",
    "support",
    "confidence",
    "lift",
    "leverage",
    "conviction",
    "zhangs_metric",
    "combination_count",
    "Mat_combination",
    "Mat_combination_id",
    "different_items",
];

#[derive(Debug, Serialize)]
struct RuleRow<'a> {
    antecedents: &'a str,
    consequents: &'a str,
    support: f64,
    confidence: f64,
    lift: f64,
    leverage: f64,
    #[serde(serialize_with = "serialize_metric")]
    conviction: f64,
    zhangs_metric: f64,
    combination_count: usize,
    #[serde(rename = "Mat_combination")]
    mat_combination: &'a str,
    #[serde(rename = "Mat_combination_id")]
    mat_combination_id: &'a str,
    different_items: usize,
}

impl<'a> From<&'a AnnotatedRule> for RuleRow<'a> {
    fn from(rule: &'a AnnotatedRule) -> Self {
        let metrics = &rule.rule.metrics;
        Self {
            antecedents: &rule.antecedents,
            consequents: &rule.consequents,
            support: metrics.support,
            confidence: metrics.confidence,
            lift: metrics.lift,
            leverage: metrics.leverage,
            conviction: metrics.conviction,
            zhangs_metric: metrics.zhangs_metric,
            combination_count: rule.combination_count,
            mat_combination: &rule.mat_combination,
            mat_combination_id: &rule.mat_combination_id,
            different_items: rule.different_items,
        }
    }
}

/// JSON has no infinity, so infinite metrics are written as "inf" / "-inf"
fn serialize_metric<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_none()
    } else if *value > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

#[derive(Debug, Serialize)]
struct GraphExport<'a> {
    nodes: Vec<NodeRow<'a>>,
    edges: Vec<EdgeRow<'a>>,
}

#[derive(Debug, Serialize)]
struct NodeRow<'a> {
    label: &'a str,
    combination_count: usize,
    size: f64,
}

#[derive(Debug, Serialize)]
struct EdgeRow<'a> {
    source: &'a str,
    target: &'a str,
    confidence: f64,
    combination_count: usize,
}

/// Build the export table, one row per rule in generation order
pub fn rules_to_frame(rules: &[AnnotatedRule]) -> crate::Result<DataFrame> {
    let text = |f: fn(&AnnotatedRule) -> &str| rules.iter().map(f).collect::<Vec<&str>>();
    let metric = |f: fn(&AnnotatedRule) -> f64| rules.iter().map(f).collect::<Vec<f64>>();
    let count = |f: fn(&AnnotatedRule) -> usize| {
        rules.iter().map(|rule| f(rule) as u64).collect::<Vec<u64>>()
    };

    let df = DataFrame::new(vec![
        Series::new(RULE_COLUMNS[0], text(|r| r.antecedents.as_str())),
        Series::new(RULE_COLUMNS[1], text(|r| r.consequents.as_str())),
        Series::new(RULE_COLUMNS[2], metric(|r| r.rule.metrics.support)),
        Series::new(RULE_COLUMNS[3], metric(|r| r.rule.metrics.confidence)),
        Series::new(RULE_COLUMNS[4], metric(|r| r.rule.metrics.lift)),
        Series::new(RULE_COLUMNS[5], metric(|r| r.rule.metrics.leverage)),
        Series::new(RULE_COLUMNS[6], metric(|r| r.rule.metrics.conviction)),
        Series::new(RULE_COLUMNS[7], metric(|r| r.rule.metrics.zhangs_metric)),
        Series::new(RULE_COLUMNS[8], count(|r| r.combination_count)),
        Series::new(RULE_COLUMNS[9], text(|r| r.mat_combination.as_str())),
        Series::new(RULE_COLUMNS[10], text(|r| r.mat_combination_id.as_str())),
        Series::new(RULE_COLUMNS[11], count(|r| r.different_items)),
    ])?;
    Ok(df)
}

/// Write the rule table; `.json` paths get a JSON array, anything else CSV
pub fn export_rules(rules: &[AnnotatedRule], output_path: &str) -> crate::Result<()> {
    let is_json = Path::new(output_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        write_rules_json(rules, output_path)?;
    } else {
        write_rules_csv(rules, output_path)?;
    }

    info!(path = output_path, rules = rules.len(), "exported association rules");
    Ok(())
}

/// Write the rule table as CSV with a header row
pub fn write_rules_csv(rules: &[AnnotatedRule], output_path: &str) -> crate::Result<()> {
    let mut df = rules_to_frame(rules)?;
    let mut file = File::create(output_path)
        .with_context(|| format!("failed to create rules file {output_path}"))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("failed to write rules to {output_path}"))?;
    Ok(())
}

/// Write the rule table as a JSON array of objects
pub fn write_rules_json(rules: &[AnnotatedRule], output_path: &str) -> crate::Result<()> {
    let rows: Vec<RuleRow<'_>> = rules.iter().map(RuleRow::from).collect();
    let file = File::create(output_path)
        .with_context(|| format!("failed to create rules file {output_path}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &rows)
        .with_context(|| format!("failed to write rules to {output_path}"))?;
    Ok(())
}

/// Write the graph (nodes with size hints, weighted edges) as JSON
pub fn write_graph_json(graph: &RuleGraph, output_path: &str) -> crate::Result<()> {
    let export = GraphExport {
        nodes: graph
            .labels()
            .map(|label| NodeRow {
                label,
                combination_count: graph.aggregate(label).unwrap_or(0),
                size: graph.node_size(label).unwrap_or(0.0),
            })
            .collect(),
        edges: graph
            .edges()
            .map(|(source, target, edge)| EdgeRow {
                source,
                target,
                confidence: edge.confidence,
                combination_count: edge.combination_count,
            })
            .collect(),
    };

    let file = File::create(output_path)
        .with_context(|| format!("failed to create graph file {output_path}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &export)
        .with_context(|| format!("failed to write graph to {output_path}"))?;

    info!(path = output_path, "exported rule graph");
    Ok(())
}

/// Print the first `limit` rules to the console
pub fn print_rule_table(rules: &[AnnotatedRule], limit: usize) {
    println!("\n=== Association Rules ===");
    if rules.is_empty() {
        println!("No rules passed the thresholds.");
        return;
    }

    println!(
        "{:<28} | {:<28} | {:>7} | {:>7} | {:>6} | {:>8} | {:>10} | {:>6} | {:>5} | {:<20} | {:>8} | {:>5}",
        "antecedents",
        "consequents",
        "support",
        "conf",
        "lift",
        "leverage",
        "conviction",
        "zhang",
        "count",
        "Mat_combination",
        "id",
        "items"
    );
    for rule in rules.iter().take(limit) {
        let m = &rule.rule.metrics;
        println!(
            "{:<28} | {:<28} | {:>7.4} | {:>7.4} | {:>6.3} | {:>8.4} | {:>10.3} | {:>6.3} | {:>5} | {:<20} | {:>8} | {:>5}",
            truncate(&rule.antecedents, 28),
            truncate(&rule.consequents, 28),
            m.support,
            m.confidence,
            m.lift,
            m.leverage,
            m.conviction,
            m.zhangs_metric,
            rule.combination_count,
            truncate(&rule.mat_combination, 20),
            rule.mat_combination_id,
            rule.different_items
        );
    }
    if rules.len() > limit {
        println!("... {} more rules", rules.len() - limit);
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
