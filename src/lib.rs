//! BasketForge: A Rust CLI application for market-basket analysis
//!
//! This library mines frequent itemsets with Apriori from transaction data,
//! derives scored association rules, annotates them with reference-code
//! combinations and builds a weighted rule graph for display.

pub mod annotate;
pub mod apriori;
pub mod cli;
pub mod config;
pub mod data;
pub mod encoder;
pub mod error;
pub mod export;
pub mod graph;
pub mod pipeline;
pub mod rules;
pub mod viz;

// Re-export public items for easier access
pub use annotate::{annotate_rules, mat_combination_id, AnnotatedRule};
pub use apriori::{mine_frequent_itemsets, FrequentItemset, FrequentItemsets};
pub use cli::Args;
pub use config::AnalysisConfig;
pub use data::{
    build_transactions, load_and_process_data, BasketData, ItemReferenceMap, RawRecord,
    Transaction, TransactionSet,
};
pub use encoder::{encode_transactions, TransactionMatrix};
pub use error::ValidationError;
pub use export::{export_rules, write_graph_json};
pub use graph::{build_rule_graph, normalize_sizes, RuleEdge, RuleGraph};
pub use pipeline::{analyze, analyze_file, analyze_records, AnalysisReport};
pub use rules::{generate_rules, Rule, RuleMetrics};
pub use viz::render_rule_graph;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
