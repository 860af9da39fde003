//! BasketForge: market-basket analysis CLI
//!
//! This is the main entrypoint that orchestrates data loading, itemset mining,
//! rule export and graph rendering.

use anyhow::Result;
use basketforge::{analyze, export, load_and_process_data, viz, Args};
use clap::Parser;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        println!("BasketForge - Market-Basket Analysis using Apriori");
        println!("==================================================\n");
    }

    run_pipeline(&args)
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "basketforge=debug"
    } else {
        "basketforge=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the full mining pipeline
fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Association Rule Mining Pipeline ===\n");

    let start_time = Instant::now();
    let config = args.analysis_config()?;

    // Step 1: Load and group transactions
    if args.verbose {
        println!("Step 1: Loading transactions");
        println!("  Input file: {}", args.input);
    }

    let data_start = Instant::now();
    let data = load_and_process_data(&args.input)?;
    let data_time = data_start.elapsed();

    println!("✓ Data loaded: {} transactions", data.transactions.len());
    if args.verbose {
        println!("  Dropped records: {}", data.dropped_records);
        println!("  Items with reference code: {}", data.references.len());
        println!("  Processing time: {:.2}s", data_time.as_secs_f64());
    }

    // Step 2: Mine itemsets and rules
    if args.verbose {
        println!("\nStep 2: Mining frequent itemsets and rules");
        println!("  Minimum support: {}", config.min_support);
        println!("  Minimum confidence: {}", config.min_confidence);
        if let Some(max_len) = config.max_len {
            println!("  Maximum itemset size: {}", max_len);
        }
    }

    let mining_start = Instant::now();
    let report = analyze(data, &config)?;
    let mining_time = mining_start.elapsed();

    println!(
        "✓ Mined {} frequent itemsets over {} distinct items",
        report.frequent.len(),
        report.matrix.n_items()
    );
    for (size, count) in report.frequent.count_by_size() {
        println!("  Size {}: {} itemsets", size, count);
    }
    println!("✓ {} association rules passed the thresholds", report.rules.len());
    if args.verbose {
        println!("  Mining time: {:.2}s", mining_time.as_secs_f64());
    }

    // Step 3: Export rules
    export::export_rules(&report.rules, &args.output)?;
    println!("\n✓ Rules exported to: {}", args.output);
    export::print_rule_table(&report.rules, args.top);

    // Step 4: Graph outputs
    println!("\n=== Rule Graph ===");
    println!(
        "Nodes: {}, edges: {}",
        report.graph.node_count(),
        report.graph.edge_count()
    );

    if let Some(graph_json) = &args.graph_json {
        export::write_graph_json(&report.graph, graph_json)?;
        println!("✓ Graph data saved to: {}", graph_json);
    }

    if !args.no_plot {
        let viz_start = Instant::now();
        viz::render_rule_graph(&report.graph, &args.graph)?;
        println!("✓ Graph image saved to: {}", args.graph);
        if args.verbose {
            println!(
                "  Visualization time: {:.2}s",
                viz_start.elapsed().as_secs_f64()
            );
        }
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}
