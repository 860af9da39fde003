//! Integration tests for BasketForge

use basketforge::{
    analyze_file, export_rules, load_and_process_data, render_rule_graph, AnalysisConfig,
    ValidationError,
};
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

/// Create a test CSV file with sample receipts
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Receipt,Article,OrderNo").unwrap();

    // Receipt 1 - breakfast basket
    writeln!(file, "1,Milk,4711").unwrap();
    writeln!(file, "1,Bread,4712").unwrap();
    writeln!(file, "1,Butter,4713").unwrap();

    // Receipt 2 - breakfast basket without butter
    writeln!(file, "2,Milk,4711").unwrap();
    writeln!(file, "2,Bread,4712").unwrap();

    // Receipt 3 - milk and a blank row
    writeln!(file, "3,Milk,4711").unwrap();
    writeln!(file, "3,,4799").unwrap();

    // Receipt 4 - bread and butter, padded item name
    writeln!(file, "4,\" Bread \",4712").unwrap();
    writeln!(file, "4,Butter,4713").unwrap();

    // Receipt 5 - only blank items, dropped entirely
    writeln!(file, "5,,4799").unwrap();

    file
}

fn config(min_support: f64, min_confidence: f64) -> AnalysisConfig {
    AnalysisConfig {
        min_support,
        min_confidence,
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_end_to_end_pipeline() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();

    let report = analyze_file(file_path, &config(0.25, 0.5)).unwrap();

    // Verify data loading
    assert_eq!(report.data.transactions.len(), 4);
    assert_eq!(report.matrix.items(), &["Bread", "Butter", "Milk"]);

    // Bread 3/4, Butter 2/4, Milk 3/4, Bread+Butter 2/4, Bread+Milk 2/4,
    // Butter+Milk 1/4, all three 1/4
    assert_eq!(report.frequent.len(), 7);

    for rule in &report.rules {
        assert!(rule.rule.metrics.confidence >= 0.5);
        assert_eq!(rule.mat_combination_id.len(), 8);
    }

    let butter_to_bread = report
        .rules
        .iter()
        .find(|r| r.antecedents == "Butter" && r.consequents == "Bread")
        .unwrap();
    assert_eq!(butter_to_bread.rule.metrics.confidence, 1.0);
    assert!(butter_to_bread.rule.metrics.conviction.is_infinite());
    assert_eq!(butter_to_bread.combination_count, 2);
    assert_eq!(butter_to_bread.mat_combination, "4712-4713");

    let triple = report
        .rules
        .iter()
        .find(|r| r.antecedents == "Butter, Milk" && r.consequents == "Bread")
        .unwrap();
    assert_eq!(triple.different_items, 3);
    assert_eq!(triple.mat_combination, "4711-4712-4713");
}

#[test]
fn test_pipeline_is_idempotent() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();

    let first = analyze_file(file_path, &AnalysisConfig::default()).unwrap();
    let second = analyze_file(file_path, &AnalysisConfig::default()).unwrap();

    assert_eq!(first.rules, second.rules);
    let ids = |report: &basketforge::AnalysisReport| {
        report
            .rules
            .iter()
            .map(|r| r.mat_combination_id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn test_no_rules_flow_through_outputs() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,item,code").unwrap();
    writeln!(file, "1,Tea,1").unwrap();
    writeln!(file, "2,Coffee,2").unwrap();
    let file_path = file.path().to_str().unwrap();

    let report = analyze_file(file_path, &config(0.6, 0.15)).unwrap();
    assert!(report.frequent.is_empty());
    assert!(report.rules.is_empty());
    assert!(report.graph.is_empty());

    let temp_dir = tempdir().unwrap();
    let rules_path = temp_dir.path().join("rules.csv");
    export_rules(&report.rules, rules_path.to_str().unwrap()).unwrap();
    let text = std::fs::read_to_string(&rules_path).unwrap();
    assert_eq!(text.lines().count(), 1);

    let graph_path = temp_dir.path().join("graph.png");
    render_rule_graph(&report.graph, graph_path.to_str().unwrap()).unwrap();
    assert!(Path::new(&graph_path).exists());
}

#[test]
fn test_error_handling_invalid_input() {
    // Too few columns
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,item").unwrap();
    writeln!(file, "1,Tea").unwrap();
    let err = load_and_process_data(file.path().to_str().unwrap()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ValidationError>(),
        Some(ValidationError::TooFewColumns { found: 2 })
    ));

    // Every item blank
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,item,code").unwrap();
    writeln!(file, "1,,1").unwrap();
    let err = load_and_process_data(file.path().to_str().unwrap()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::NoTransactions)
    );
}

#[test]
fn test_exports_and_rendering() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();
    let report = analyze_file(file_path, &config(0.25, 0.5)).unwrap();

    let temp_dir = tempdir().unwrap();

    let csv_path = temp_dir.path().join("rules.csv");
    export_rules(&report.rules, csv_path.to_str().unwrap()).unwrap();
    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert!(text.starts_with("antecedents,consequents,support,confidence,lift,leverage,conviction,zhangs_metric,combination_count,Mat_combination,Mat_combination_id,different_items"));
    assert_eq!(text.lines().count(), report.rules.len() + 1);

    let json_path = temp_dir.path().join("rules.json");
    export_rules(&report.rules, json_path.to_str().unwrap()).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), report.rules.len());

    let graph_path = temp_dir.path().join("graph.png");
    render_rule_graph(&report.graph, graph_path.to_str().unwrap()).unwrap();
    assert!(Path::new(&graph_path).exists());
}
