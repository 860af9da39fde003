//! Directed rule graph with normalized node size hints

use crate::annotate::AnnotatedRule;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Attributes carried by an antecedent -> consequent edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleEdge {
    pub confidence: f64,
    pub combination_count: usize,
}

/// Graph of rendered antecedent and consequent labels
#[derive(Debug, Clone, Default)]
pub struct RuleGraph {
    graph: DiGraph<String, RuleEdge>,
    node_by_label: HashMap<String, NodeIndex>,
    aggregates: BTreeMap<String, usize>,
    sizes: BTreeMap<String, f64>,
}

impl RuleGraph {
    /// Underlying petgraph graph
    pub fn graph(&self) -> &DiGraph<String, RuleEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node labels in insertion order
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph
            .node_indices()
            .map(move |index| self.graph[index].as_str())
    }

    /// Edges as (source label, target label, attributes)
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, RuleEdge)> + '_ {
        self.graph.edge_references().map(move |edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                *edge.weight(),
            )
        })
    }

    /// Attributes of the edge between two labels
    pub fn edge(&self, source: &str, target: &str) -> Option<RuleEdge> {
        let source = *self.node_by_label.get(source)?;
        let target = *self.node_by_label.get(target)?;
        let edge = self.graph.find_edge(source, target)?;
        Some(self.graph[edge])
    }

    /// Summed combination count of every rule touching a label
    pub fn aggregate(&self, label: &str) -> Option<usize> {
        self.aggregates.get(label).copied()
    }

    /// Normalized display size of a label
    pub fn node_size(&self, label: &str) -> Option<f64> {
        self.sizes.get(label).copied()
    }

    /// All display sizes keyed by label
    pub fn sizes(&self) -> &BTreeMap<String, f64> {
        &self.sizes
    }

    fn node(&mut self, label: &str) -> NodeIndex {
        if let Some(&index) = self.node_by_label.get(label) {
            return index;
        }
        let index = self.graph.add_node(label.to_string());
        self.node_by_label.insert(label.to_string(), index);
        index
    }
}

/// Build the rule graph
///
/// # Arguments
/// * `rules` - Annotated rules in generation order
/// * `min_size` - Size given to the smallest node aggregate
/// * `max_size` - Size given to the largest node aggregate
///
/// # Returns
/// * One edge per (antecedent, consequent) label pair; a later rule with the
///   same pair overwrites the earlier edge's attributes
pub fn build_rule_graph(rules: &[AnnotatedRule], min_size: f64, max_size: f64) -> RuleGraph {
    let mut graph = RuleGraph::default();

    for rule in rules {
        let source = graph.node(&rule.antecedents);
        let target = graph.node(&rule.consequents);
        graph.graph.update_edge(
            source,
            target,
            RuleEdge {
                confidence: rule.rule.metrics.confidence,
                combination_count: rule.combination_count,
            },
        );
    }

    graph.aggregates = aggregate_node_counts(rules);
    graph.sizes = normalize_sizes(&graph.aggregates, min_size, max_size);

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built rule graph"
    );
    graph
}

/// Sum combination counts per label over every rule where it is the
/// antecedent or the consequent
pub fn aggregate_node_counts(rules: &[AnnotatedRule]) -> BTreeMap<String, usize> {
    let mut aggregates = BTreeMap::new();
    for rule in rules {
        *aggregates.entry(rule.antecedents.clone()).or_insert(0) += rule.combination_count;
        *aggregates.entry(rule.consequents.clone()).or_insert(0) += rule.combination_count;
    }
    aggregates
}

/// Linearly map aggregates onto [min_size, max_size].
///
/// When every aggregate is equal, each label gets the midpoint.
pub fn normalize_sizes(
    aggregates: &BTreeMap<String, usize>,
    min_size: f64,
    max_size: f64,
) -> BTreeMap<String, f64> {
    let (Some(&lowest), Some(&highest)) = (aggregates.values().min(), aggregates.values().max())
    else {
        return BTreeMap::new();
    };

    aggregates
        .iter()
        .map(|(label, &count)| {
            let size = if highest == lowest {
                (min_size + max_size) / 2.0
            } else {
                let t = (count - lowest) as f64 / (highest - lowest) as f64;
                min_size + t * (max_size - min_size)
            };
            (label.clone(), size)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, RuleMetrics};

    fn annotated(antecedents: &str, consequents: &str, confidence: f64, count: usize) -> AnnotatedRule {
        AnnotatedRule {
            rule: Rule {
                antecedent: vec![0],
                consequent: vec![1],
                antecedent_support: 0.5,
                consequent_support: 0.5,
                metrics: RuleMetrics {
                    support: 0.25,
                    confidence,
                    lift: 1.0,
                    leverage: 0.0,
                    conviction: 1.0,
                    zhangs_metric: 0.0,
                },
            },
            antecedents: antecedents.to_string(),
            consequents: consequents.to_string(),
            combination_count: count,
            mat_combination: String::new(),
            mat_combination_id: "65086549".to_string(),
            different_items: 2,
        }
    }

    #[test]
    fn test_edge_overwrite_last_wins() {
        let rules = vec![annotated("A", "B", 0.4, 3), annotated("A", "B", 0.9, 5)];
        let graph = build_rule_graph(&rules, 300.0, 3000.0);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(
            graph.edge("A", "B"),
            Some(RuleEdge {
                confidence: 0.9,
                combination_count: 5
            })
        );
        assert_eq!(graph.edge("B", "A"), None);
        // aggregates still see both rules
        assert_eq!(graph.aggregate("A"), Some(8));
    }

    #[test]
    fn test_equal_aggregates_get_midpoint() {
        let aggregates: BTreeMap<String, usize> =
            [("X".to_string(), 10), ("Y".to_string(), 10)].into_iter().collect();
        let sizes = normalize_sizes(&aggregates, 300.0, 3000.0);
        assert_eq!(sizes["X"], 1650.0);
        assert_eq!(sizes["Y"], 1650.0);

        let single: BTreeMap<String, usize> = [("X".to_string(), 4)].into_iter().collect();
        assert_eq!(normalize_sizes(&single, 300.0, 3000.0)["X"], 1650.0);
    }

    #[test]
    fn test_linear_normalization() {
        let aggregates: BTreeMap<String, usize> = [
            ("X".to_string(), 10),
            ("Y".to_string(), 20),
            ("Z".to_string(), 15),
        ]
        .into_iter()
        .collect();
        let sizes = normalize_sizes(&aggregates, 300.0, 3000.0);
        assert_eq!(sizes["X"], 300.0);
        assert_eq!(sizes["Y"], 3000.0);
        assert_eq!(sizes["Z"], 1650.0);
    }

    #[test]
    fn test_node_sizes_from_rules() {
        let rules = vec![
            annotated("A", "B", 0.5, 4),
            annotated("B", "A", 0.5, 4),
            annotated("A", "C", 0.2, 1),
        ];
        let graph = build_rule_graph(&rules, 300.0, 3000.0);
        assert_eq!(graph.aggregate("A"), Some(9));
        assert_eq!(graph.aggregate("B"), Some(8));
        assert_eq!(graph.aggregate("C"), Some(1));
        assert_eq!(graph.node_size("A"), Some(3000.0));
        assert_eq!(graph.node_size("C"), Some(300.0));
        assert_eq!(graph.labels().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(graph.edges().count(), 3);
    }

    #[test]
    fn test_empty_rules_empty_graph() {
        let graph = build_rule_graph(&[], 300.0, 3000.0);
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.sizes().is_empty());
    }
}
