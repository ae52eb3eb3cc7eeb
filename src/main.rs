//! WellSync CLI
//!
//! Runs the unification and insight pipeline directly against the demo
//! snapshot, without the API server:
//! - Seed the snapshot
//! - Print the unified series and source status
//! - Compute insights, anomalies and correlations

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wellsync::analytics::{correlate, detect, AnomalyConfig, SAME_DAY_PAIRS};
use wellsync::config::{generate_default_config, Config};
use wellsync::logging::init_tracing;
use wellsync::services::{ServiceRegistry, UnifiedSnapshot};
use wellsync::unify::{Metric, UnifiedRecord};

#[derive(Parser)]
#[command(name = "wellsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Unify wellness data from several providers and surface insights")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Demo snapshot path, overriding the config
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate the demo snapshot
    Seed {
        /// Days of history to generate
        #[arg(short, long)]
        days: Option<usize>,
        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the unified daily series
    Unify {
        #[arg(short, long, default_value = "30")]
        range_days: usize,
    },

    /// Show per-source sync status and coverage
    Status {
        #[arg(short, long, default_value = "30")]
        range_days: usize,
    },

    /// Show insight cards
    Insights {
        #[arg(short, long, default_value = "30")]
        range_days: usize,
    },

    /// Detect persistent anomalies in one metric
    Anomalies {
        /// Metric column, e.g. resting_hr
        metric: Metric,
        #[arg(short, long, default_value = "60")]
        range_days: usize,
        /// Rolling window (default: from config)
        #[arg(long)]
        window: Option<usize>,
        /// |z| threshold (default: from config)
        #[arg(long)]
        z_threshold: Option<f64>,
        /// Minimum run length (default: from config)
        #[arg(long)]
        min_persist: Option<usize>,
    },

    /// Correlate metric pairs, optionally against a lagged y
    Correlate {
        /// Leading metric (default: the dashboard pairs)
        #[arg(short)]
        x: Option<Metric>,
        /// Following metric
        #[arg(short)]
        y: Option<Metric>,
        /// Days y is shifted forward
        #[arg(short, long, default_value = "0")]
        lag: i64,
        #[arg(short, long, default_value = "60")]
        range_days: usize,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(data) = &cli.data {
        config.data.path = data.clone();
    }

    init_tracing(&config.logging);

    let registry = ServiceRegistry::new(config.data.clone());

    match cli.command {
        Commands::Seed { days, seed } => {
            let days = days.unwrap_or(config.data.demo_days);
            let registry = ServiceRegistry::new(wellsync::config::DataConfig {
                seed: seed.unwrap_or(config.data.seed),
                ..config.data.clone()
            });
            let path = registry.seed(days)?;
            println!("Wrote {} days of demo data to {}", days, path.display());
        }

        Commands::Unify { range_days } => {
            let snapshot = load(&registry, range_days)?;
            match cli.format {
                OutputFormat::Json => print_json(&snapshot.records)?,
                OutputFormat::Csv => print_records_csv(&snapshot.records)?,
                OutputFormat::Table => print_records_table(&snapshot.records),
            }
        }

        Commands::Status { range_days } => {
            let snapshot = load(&registry, range_days)?;
            let status = &snapshot.status;
            match cli.format {
                OutputFormat::Table | OutputFormat::Csv => {
                    println!("{:<16} {:<10} {:<6} Last sync", "Source", "Connected", "Days");
                    println!("{}", "-".repeat(60));
                    for (name, s) in &status.sources {
                        println!(
                            "{:<16} {:<10} {:<6} {}",
                            name,
                            s.connected,
                            s.days,
                            s.last_sync_iso
                                .map(|t| t.to_rfc3339())
                                .unwrap_or_else(|| "-".to_string())
                        );
                    }
                    println!();
                    println!("{:<20} {:>8} {:>8} {:>7}", "Coverage", "Covered", "Total", "Pct");
                    println!("{}", "-".repeat(46));
                    for (group, c) in &status.coverage {
                        println!(
                            "{:<20} {:>8} {:>8} {:>6.1}%",
                            group, c.covered_days, c.total_days, c.pct
                        );
                    }
                }
                OutputFormat::Json => print_json(status)?,
            }
        }

        Commands::Insights { range_days } => {
            let snapshot = load(&registry, range_days)?;
            let composer = wellsync::analytics::InsightComposer::new(config.analytics.anomaly());
            let cards = composer.compose(&snapshot.records);

            match cli.format {
                OutputFormat::Json => print_json(&cards)?,
                _ if cards.is_empty() => println!("No insights for the last {} days", range_days),
                _ => {
                    for card in &cards {
                        println!("{}", card.title);
                        println!("  {}", card.summary);
                        println!("  {}", card.responsible_note);
                        println!();
                    }
                }
            }
        }

        Commands::Anomalies {
            metric,
            range_days,
            window,
            z_threshold,
            min_persist,
        } => {
            let defaults = config.analytics.anomaly();
            let anomaly = AnomalyConfig {
                window: window.unwrap_or(defaults.window),
                z_threshold: z_threshold.unwrap_or(defaults.z_threshold),
                min_persist: min_persist.unwrap_or(defaults.min_persist),
            };
            let snapshot = load(&registry, range_days)?;
            let runs = detect(&snapshot.records, metric, &anomaly);

            match cli.format {
                OutputFormat::Json => print_json(&runs)?,
                OutputFormat::Csv => {
                    let mut writer = csv::Writer::from_writer(std::io::stdout());
                    for run in &runs {
                        writer.serialize(run)?;
                    }
                    writer.flush()?;
                }
                OutputFormat::Table if runs.is_empty() => {
                    println!("No persistent anomalies in {}", metric.label())
                }
                OutputFormat::Table => {
                    println!(
                        "{:<12} {:<12} {:>5} {:>7} {:>10} {:>9}",
                        "Start", "End", "Days", "|z|max", "Mean", "Std"
                    );
                    println!("{}", "-".repeat(60));
                    for run in &runs {
                        println!(
                            "{:<12} {:<12} {:>5} {:>7.2} {:>10.2} {:>9.2}",
                            run.start_date,
                            run.end_date,
                            run.days,
                            run.z_max,
                            run.baseline_mean,
                            run.baseline_std
                        );
                    }
                }
            }
        }

        Commands::Correlate {
            x,
            y,
            lag,
            range_days,
        } => {
            let pairs: Vec<(Metric, Metric)> = match (x, y) {
                (Some(x), Some(y)) => vec![(x, y)],
                (None, None) => SAME_DAY_PAIRS.to_vec(),
                _ => anyhow::bail!("pass both -x and -y, or neither"),
            };

            let snapshot = load(&registry, range_days)?;
            let results = correlate(&snapshot.records, &pairs, lag);

            match cli.format {
                OutputFormat::Json => print_json(&results)?,
                _ if results.is_empty() => {
                    println!("Not enough overlapping days to correlate")
                }
                _ => {
                    println!(
                        "{:<16} {:<20} {:>4} {:>8} {:>8} {:>4}  Strength",
                        "X", "Y", "Lag", "Pearson", "Spearman", "N"
                    );
                    println!("{}", "-".repeat(76));
                    for r in &results {
                        println!(
                            "{:<16} {:<20} {:>4} {:>8.3} {:>8.3} {:>4}  {} {}",
                            r.x.column(),
                            r.y_key(),
                            r.lag_days,
                            r.pearson,
                            r.spearman,
                            r.n,
                            r.strength,
                            r.direction
                        );
                    }
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn load(registry: &ServiceRegistry, range_days: usize) -> anyhow::Result<UnifiedSnapshot> {
    registry
        .load_unified(range_days)
        .with_context(|| format!("loading snapshot {}", registry.data_path().display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cell(record: &UnifiedRecord, metric: Metric) -> String {
    match record.value(metric) {
        Some(v) if metric.kind() == wellsync::unify::MetricKind::Integer => format!("{}", v as i64),
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

fn print_records_table(records: &[UnifiedRecord]) {
    if records.is_empty() {
        println!("No data for the selected range");
        return;
    }

    print!("{:<12}", "Date");
    for metric in Metric::ALL {
        print!(" | {:>8}", short_name(metric));
    }
    println!();
    println!("{}", "-".repeat(12 + Metric::ALL.len() * 11));

    for record in records {
        print!("{:<12}", record.date);
        for metric in Metric::ALL {
            print!(" | {:>8}", cell(record, metric));
        }
        println!();
    }
}

fn short_name(metric: Metric) -> &'static str {
    match metric {
        Metric::SleepHours => "sleep",
        Metric::Steps => "steps",
        Metric::ActiveMinutes => "active",
        Metric::Calories => "kcal",
        Metric::SugarG => "sugar",
        Metric::ProteinG => "protein",
        Metric::CarbsG => "carbs",
        Metric::FatG => "fat",
        Metric::RestingHr => "rhr",
    }
}

fn print_records_csv(records: &[UnifiedRecord]) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());

    let mut header = vec!["date".to_string(), "user_id".to_string()];
    header.extend(Metric::ALL.iter().map(|m| m.column().to_string()));
    header.push("sources_used".to_string());
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.date.to_string(), record.user_id.clone()];
        row.extend(
            Metric::ALL
                .iter()
                .map(|&m| record.value(m).map(|v| v.to_string()).unwrap_or_default()),
        );
        row.push(record.sources_used.join(";"));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
