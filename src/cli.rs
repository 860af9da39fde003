//! Command-line interface definitions and argument parsing

use crate::config::AnalysisConfig;
use clap::Parser;

/// Market-basket analysis CLI: frequent itemsets, association rules and a rule graph
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file (transaction id, item, reference code)
    #[arg(short, long, default_value = "transactions.csv")]
    pub input: String,

    /// Output path for the rule table (.csv or .json)
    #[arg(short, long, default_value = "association_rules.csv")]
    pub output: String,

    /// Output path for the rule graph image (.png or .svg)
    #[arg(short, long, default_value = "rule_graph.png")]
    pub graph: String,

    /// Also write the rule graph as JSON to this path
    #[arg(long)]
    pub graph_json: Option<String>,

    /// TOML file with analysis settings; flags below override it
    #[arg(short, long)]
    pub config: Option<String>,

    /// Minimum support for frequent itemsets
    #[arg(long)]
    pub min_support: Option<f64>,

    /// Minimum confidence for association rules
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Largest itemset size to mine
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Smallest node size in the rule graph
    #[arg(long)]
    pub min_size: Option<f64>,

    /// Largest node size in the rule graph
    #[arg(long)]
    pub max_size: Option<f64>,

    /// Skip rendering the rule graph image
    #[arg(long)]
    pub no_plot: bool,

    /// Number of rules to print to the console
    #[arg(long, default_value = "20")]
    pub top: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve the analysis settings: defaults, then the config file, then flags
    pub fn analysis_config(&self) -> crate::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(min_support) = self.min_support {
            config.min_support = min_support;
        }
        if let Some(min_confidence) = self.min_confidence {
            config.min_confidence = min_confidence;
        }
        if let Some(max_len) = self.max_len {
            config.max_len = Some(max_len);
        }
        if let Some(min_size) = self.min_size {
            config.min_size = min_size;
        }
        if let Some(max_size) = self.max_size {
            config.max_size = max_size;
        }

        config.validate()?;
        Ok(config)
    }
}
