//! End-to-end mining run: transactions to annotated rules and rule graph

use crate::annotate::{annotate_rules, AnnotatedRule};
use crate::apriori::{mine_frequent_itemsets, FrequentItemsets};
use crate::config::AnalysisConfig;
use crate::data::{build_transactions, load_and_process_data, BasketData, RawRecord};
use crate::encoder::{encode_transactions, TransactionMatrix};
use crate::graph::{build_rule_graph, RuleGraph};
use crate::rules::generate_rules;
use tracing::info;

/// Everything a run produces, stage by stage
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub data: BasketData,
    pub matrix: TransactionMatrix,
    pub frequent: FrequentItemsets,
    pub rules: Vec<AnnotatedRule>,
    pub graph: RuleGraph,
}

/// Mine rules from already grouped transactions
pub fn analyze(data: BasketData, config: &AnalysisConfig) -> crate::Result<AnalysisReport> {
    config.validate()?;
    mine(data, config)
}

/// Run every stage on a config that has already been validated
fn mine(data: BasketData, config: &AnalysisConfig) -> crate::Result<AnalysisReport> {
    let matrix = encode_transactions(&data.transactions);
    info!(
        transactions = matrix.n_transactions(),
        items = matrix.n_items(),
        "encoded transactions"
    );

    let frequent = mine_frequent_itemsets(&matrix, config.min_support, config.max_len);
    info!(
        itemsets = frequent.len(),
        min_support = config.min_support,
        "mined frequent itemsets"
    );

    let rules = generate_rules(&frequent, config.min_confidence);
    let rules = annotate_rules(&rules, &matrix, &data.references);
    info!(
        rules = rules.len(),
        min_confidence = config.min_confidence,
        "generated association rules"
    );

    let graph = build_rule_graph(&rules, config.min_size, config.max_size);

    Ok(AnalysisReport {
        data,
        matrix,
        frequent,
        rules,
        graph,
    })
}

/// Group raw records, then mine them
///
/// The config is checked before any record is consumed.
pub fn analyze_records<I>(records: I, config: &AnalysisConfig) -> crate::Result<AnalysisReport>
where
    I: IntoIterator<Item = RawRecord>,
{
    config.validate()?;
    mine(build_transactions(records)?, config)
}

/// Load a CSV file, then mine it
///
/// The config is checked before the file is opened.
pub fn analyze_file(file_path: &str, config: &AnalysisConfig) -> crate::Result<AnalysisReport> {
    config.validate()?;
    mine(load_and_process_data(file_path)?, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("1", "A", "100"),
            RawRecord::new("1", "B", "200"),
            RawRecord::new("2", "A", "100"),
            RawRecord::new("2", "B", "200"),
            RawRecord::new("3", "A", "100"),
            RawRecord::new("3", "C", "300"),
        ]
    }

    #[test]
    fn test_analyze_records() {
        let config = AnalysisConfig {
            min_support: 0.3,
            ..AnalysisConfig::default()
        };
        let report = analyze_records(records(), &config).unwrap();

        assert_eq!(report.data.transactions.len(), 3);
        assert_eq!(report.frequent.len(), 5);
        assert_eq!(report.rules.len(), 4);
        assert_eq!(report.graph.node_count(), 3);

        let b_to_a = report
            .rules
            .iter()
            .find(|r| r.antecedents == "B" && r.consequents == "A")
            .unwrap();
        assert_eq!(b_to_a.rule.metrics.confidence, 1.0);
        assert!(b_to_a.rule.metrics.conviction.is_infinite());
        assert_eq!(b_to_a.mat_combination, "100-200");
        assert_eq!(b_to_a.mat_combination_id, "27367103");
    }

    #[test]
    fn test_invalid_config_aborts() {
        let config = AnalysisConfig {
            min_support: 0.0,
            ..AnalysisConfig::default()
        };
        let err = analyze_records(records(), &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_config_checked_before_reading() {
        let config = AnalysisConfig {
            min_size: 10.0,
            max_size: 5.0,
            ..AnalysisConfig::default()
        };
        let err = analyze_file("/nonexistent/basketforge/transactions.csv", &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_idempotent() {
        let config = AnalysisConfig::default();
        let first = analyze_records(records(), &config).unwrap();
        let second = analyze_records(records(), &config).unwrap();
        assert_eq!(first.rules, second.rules);
    }
}
