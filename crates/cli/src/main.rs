//! trendsat CLI - temporal trends and period aggregates of satellite time series

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use trendsat_algorithms::aggregate::{aggregate_unit, reduce_by, AggregateParams, GroupKey, Reducer};
use trendsat_algorithms::trend::{fit_with, TrendParams};
use trendsat_core::io::{read_observations, write_records, ReadOptions};
use trendsat_core::series::qa::{extract_bits, QaMask};
use trendsat_core::series::group_by_unit;
use trendsat_core::{Observation, PeriodKind, UnitSeries};
use trendsat_parallel::{run_per_unit, set_num_threads, BatchReport, FailurePolicy, ProcessingMode};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "trendsat")]
#[command(author, version, about = "Temporal trends and period aggregates of satellite time series", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads (0 = all cores, 1 = sequential)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Skip units with invalid data instead of aborting
    #[arg(long, global = true)]
    skip_invalid: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Input observations (CSV: unit_id,timestamp,interval_end,value,valid,qa)
    input: PathBuf,
    /// QA mask "start-end:codes", e.g. "0-1:0,1"; rows failing it are invalid
    #[arg(long)]
    qa_mask: Option<String>,
    /// Fill missing interval_end from N-day composite buckets
    #[arg(long)]
    dn: Option<u32>,
    /// interval_end is the first day of the next composite (e.g. Earth
    /// Engine exports); step it back one day
    #[arg(long)]
    exclusive_end: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about an observation file
    Info {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Linear trend against year per unit
    Trend {
        #[command(flatten)]
        input: InputArgs,
        /// Output CSV
        output: PathBuf,
        /// Bisquare-robust regression instead of OLS
        #[arg(short, long)]
        robust: bool,
        /// Report units with |tval| at or above this value
        #[arg(long, default_value = "1.96")]
        critical: f64,
    },
    /// Overlap-weighted aggregation into months or years
    Aggregate {
        #[command(flatten)]
        input: InputArgs,
        /// Output CSV
        output: PathBuf,
        /// Period: month, year
        #[arg(short, long, default_value = "month")]
        period: String,
        /// First year (defaults to the first year in the data)
        #[arg(long, requires = "end")]
        start: Option<i32>,
        /// Last year (defaults to the last year in the data)
        #[arg(long, requires = "start")]
        end: Option<i32>,
        /// Multiplier applied to every value
        #[arg(long, default_value = "1.0")]
        scale_factor: f64,
    },
    /// Reduce values grouped by a calendar key
    Reduce {
        #[command(flatten)]
        input: InputArgs,
        /// Output CSV
        output: PathBuf,
        /// Key: year, month, dn[N], doy-dn[N], season, season-pheno, growing
        #[arg(short, long, default_value = "year")]
        by: String,
        /// Reducer: mean, sum, min, max, median, delta
        #[arg(short, long, default_value = "mean")]
        reducer: String,
    },
    /// Decode bits start..=end of a QA value
    QaBits {
        /// QA value
        value: u32,
        /// First bit
        start: u32,
        /// Last bit (defaults to start)
        end: Option<u32>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_input(args: &InputArgs) -> Result<Vec<Observation>> {
    let qa_mask = args
        .qa_mask
        .as_deref()
        .map(str::parse::<QaMask>)
        .transpose()
        .context("Invalid --qa-mask")?;
    let options = ReadOptions {
        qa_mask,
        dn: args.dn,
        exclusive_end: args.exclusive_end,
    };

    let pb = spinner("Reading observations...");
    let (observations, summary) = read_observations(&args.input, &options)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    pb.finish_and_clear();

    debug!(
        rows = summary.rows,
        missing = summary.missing_values,
        qa_rejected = summary.qa_rejected,
        "read {}",
        args.input.display()
    );
    Ok(observations)
}

fn write_output<T: Serialize>(records: &[T], path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_records(records, path).with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn failure_policy(skip_invalid: bool) -> FailurePolicy {
    if skip_invalid {
        FailurePolicy::Skip
    } else {
        FailurePolicy::Abort
    }
}

fn report_skipped<T>(report: &BatchReport<T>) {
    if !report.failed.is_empty() {
        eprintln!("Skipped {} unit(s) with invalid data:", report.failed.len());
        for (unit, err) in &report.failed {
            eprintln!("  {}: {}", unit, err);
        }
    }
}

fn done(name: &str, path: &Path, count: usize, elapsed: std::time::Duration) {
    println!("{} ({} records) saved to: {}", name, count, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let mode = ProcessingMode::from_threads(cli.threads);
    if cli.threads > 1 && !set_num_threads(cli.threads) {
        debug!("global thread pool already initialized");
    }
    let policy = failure_policy(cli.skip_invalid);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let observations = read_input(&input)?;
            let units: Vec<UnitSeries> = group_by_unit(observations);
            let total: usize = units.iter().map(UnitSeries::len).sum();
            let valid: usize = units.iter().map(UnitSeries::valid_count).sum();

            println!("File: {}", input.input.display());
            println!("Units: {}", units.len());
            println!("Observations: {}", total);
            if total > 0 {
                println!(
                    "  Valid: {} ({:.1}%)",
                    valid,
                    100.0 * valid as f64 / total as f64
                );
            }
            let start = units.iter().filter_map(|u| u.date_range()).map(|r| r.0).min();
            let end = units.iter().filter_map(|u| u.date_range()).map(|r| r.1).max();
            if let (Some(start), Some(end)) = (start, end) {
                println!("Date range: {} - {}", start, end);
            }
            if let Some(largest) = units.iter().max_by_key(|u| u.len()) {
                println!("Longest series: {} ({} observations)", largest.unit_id, largest.len());
            }
        }

        // ── Trend ────────────────────────────────────────────────────
        Commands::Trend {
            input,
            output,
            robust,
            critical,
        } => {
            let units = group_by_unit(read_input(&input)?);
            let params = TrendParams {
                robust,
                ..Default::default()
            };
            info!("Fitting {} trend for {} units", if robust { "robust" } else { "OLS" }, units.len());

            let start = Instant::now();
            let report = run_per_unit(mode, &units, policy, |unit| fit_with(&unit.observations, &params))
                .context("Failed to fit trends")?;
            let elapsed = start.elapsed();
            report_skipped(&report);

            let results = report.into_outputs();
            let significant = results.iter().filter(|r| r.is_significant(critical)).count();
            let undefined = results.iter().filter(|r| r.tval.is_none()).count();
            write_output(&results, &output)?;
            done("Trend", &output, results.len(), elapsed);
            println!("  |tval| >= {}: {} unit(s), undefined: {}", critical, significant, undefined);
        }

        // ── Aggregate ────────────────────────────────────────────────
        Commands::Aggregate {
            input,
            output,
            period,
            start,
            end,
            scale_factor,
        } => {
            let kind: PeriodKind = period.parse().context("Invalid --period")?;
            let params = AggregateParams {
                kind,
                year_range: start.zip(end),
                scale_factor,
            };
            params.validate().context("Invalid aggregation parameters")?;
            let units = group_by_unit(read_input(&input)?);
            info!("Aggregating {} units into {:?} periods", units.len(), kind);

            let t0 = Instant::now();
            let report = run_per_unit(mode, &units, policy, |unit| aggregate_unit(unit, &params))
                .context("Failed to aggregate")?;
            let elapsed = t0.elapsed();
            report_skipped(&report);

            let records: Vec<_> = report.into_outputs().into_iter().flatten().collect();
            write_output(&records, &output)?;
            done("Aggregates", &output, records.len(), elapsed);
        }

        // ── Reduce ───────────────────────────────────────────────────
        Commands::Reduce {
            input,
            output,
            by,
            reducer,
        } => {
            let key: GroupKey = by.parse().context("Invalid --by")?;
            let reducer: Reducer = reducer.parse().context("Invalid --reducer")?;
            let units = group_by_unit(read_input(&input)?);

            let start = Instant::now();
            let report = run_per_unit(mode, &units, policy, |unit| {
                reduce_by(&unit.observations, key, reducer)
            })
            .context("Failed to reduce")?;
            let elapsed = start.elapsed();
            report_skipped(&report);

            let values: Vec<_> = report.into_outputs().into_iter().flatten().collect();
            write_output(&values, &output)?;
            done("Groups", &output, values.len(), elapsed);
        }

        // ── QA bits ──────────────────────────────────────────────────
        Commands::QaBits { value, start, end } => {
            let end = end.unwrap_or(start);
            let code = extract_bits(value, start, end).context("Invalid bit range")?;
            println!("{}", code);
        }
    }

    Ok(())
}
