//! usagegen: headless runner for the synthetic usage dataset generator.
//!
//! Usage:
//!   usagegen generate --data-dir data --seed 42 --out out/
//!   usagegen generate --data-dir data --seed 42 --accounts 5000 --db warehouse.db
//!   usagegen validate --data-dir data

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{collections::BTreeMap, path::PathBuf};
use usagegen_core::{
    analytics::{dataset_summary, segment_users, vintage_curves, DatasetSummary},
    export::write_csv,
    generator::generate,
    store::WarehouseStore,
    GeneratorConfig,
};

#[derive(Parser)]
#[command(name = "usagegen")]
#[command(version, about = "Synthetic telecom usage and churn dataset generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the dataset and write it out
    Generate {
        /// Directory holding generator.json and its companion files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Master seed; the same seed and config give identical tables
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Override the configured number of accounts
        #[arg(long)]
        accounts: Option<usize>,

        /// Write the three CSV files into this directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Load the tables into this SQLite database
        #[arg(long)]
        db: Option<String>,

        /// Smallest signup cohort reported in the vintage table
        #[arg(long, default_value_t = 10)]
        vintage_min_cohort: usize,

        /// Print the run summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Load and validate the configuration without generating
    Validate {
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(serde::Serialize)]
struct RunReport {
    seed:     u64,
    run_id:   Option<String>,
    summary:  DatasetSummary,
    segments: BTreeMap<&'static str, usize>,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Validate { data_dir } => {
            let config = GeneratorConfig::load(&data_dir)?;
            config.validate()?;
            println!(
                "config OK: {} accounts, {} months ({} .. {}), {} size categories",
                config.num_accounts,
                config.window.len_months(),
                config.window.start,
                config.window.end,
                config.size_categories.len()
            );
            Ok(())
        }
        Commands::Generate { data_dir, seed, accounts, out, db, vintage_min_cohort, json } => {
            let mut config = GeneratorConfig::load(&data_dir)?;
            if let Some(n) = accounts {
                config.num_accounts = n;
            }

            if !json {
                println!("usagegen");
                println!("  seed:      {seed}");
                println!("  accounts:  {}", config.num_accounts);
                println!("  window:    {} .. {}", config.window.start, config.window.end);
                println!("  data_dir:  {data_dir}");
                println!();
            }

            let dataset = generate(&config, seed)?;

            if let Some(dir) = &out {
                let files = write_csv(dir, &dataset)?;
                if !json {
                    println!("CSV written:");
                    println!("  {}", files.attributes.display());
                    println!("  {}", files.usage.display());
                    println!("  {}", files.churn.display());
                }
            }

            let run_id = match &db {
                Some(path) => {
                    let mut store = WarehouseStore::open(path)?;
                    store.migrate()?;
                    let run_id = store.insert_run(
                        seed,
                        env!("CARGO_PKG_VERSION"),
                        &serde_json::to_string(&config)?,
                    )?;
                    store.load_dataset(&run_id, &dataset)?;
                    Some(run_id)
                }
                None => None,
            };

            let mut segments = BTreeMap::new();
            for user in segment_users(&dataset) {
                *segments.entry(user.segment.as_str()).or_insert(0) += 1;
            }
            let report = RunReport {
                seed,
                run_id,
                summary: dataset_summary(&dataset),
                segments,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let s = &report.summary;
            println!("=== Run complete ===");
            if let Some(id) = &report.run_id {
                println!("  run_id:              {id}");
            }
            println!("  accounts:            {}", s.accounts);
            println!("  churned:             {} ({:.1}%)", s.churned_accounts, s.churn_rate * 100.0);
            println!("  usage rows:          {}", s.usage_rows);
            println!("  attribute rows:      {}", s.attribute_rows);
            println!("  avg months/account:  {:.1}", s.avg_usage_months);
            println!("  package changes:     {} accounts", s.accounts_with_package_change);
            for (segment, count) in &report.segments {
                println!("  {segment:<7} users:       {count}");
            }

            let curves = vintage_curves(&dataset, &config.window, vintage_min_cohort);
            let mut by_vintage: BTreeMap<_, Vec<_>> = BTreeMap::new();
            for point in &curves {
                by_vintage.entry(point.vintage).or_default().push(point);
            }
            if !by_vintage.is_empty() {
                println!();
                println!("Vintage cumulative churn (cohort ≥ {vintage_min_cohort}):");
                for (vintage, points) in by_vintage {
                    let at = |tenure: u32| {
                        points
                            .iter()
                            .find(|p| p.tenure == tenure)
                            .map(|p| format!("{:>5.1}%", p.cumulative_churn_rate * 100.0))
                            .unwrap_or_else(|| "     -".to_string())
                    };
                    println!(
                        "  {vintage}  n={:<4} m6 {}  m12 {}  m24 {}",
                        points[0].cohort_size,
                        at(6),
                        at(12),
                        at(24)
                    );
                }
            }
            Ok(())
        }
    }
}
