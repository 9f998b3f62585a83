//! Factor backtest CLI tool.
//!
//! Runs a factor through the equal-weight baselines, the unsmoothed factor
//! and every configured smoothing window, then prints the variants ranked by
//! Sharpe ratio, for raw weighting and (with groups) group-neutral weighting.
//!
//! Usage: `cargo run --features cli --bin analyze -- --prices P.csv --factor F.csv [--groups G.csv]`
//!
//! Configuration is layered: built-in defaults, then `--config FILE.toml`, then
//! `FACTORSIM_*` environment variables (`FACTORSIM_LEVERAGE=1.5`,
//! `FACTORSIM_STATS__DDOF=0`, `FACTORSIM_ROLLS=2,5,10`), then flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use factorsim::{
    math::daily_returns,
    model::{AnalysisConfig, BatchReport, FactorAnalysis, analyze_factor},
    traits::{AlignmentPolicy, EmptyDatePolicy, PriceSource},
    utils::{
        CsvPriceSource, labeled_panels_to_long, read_groups_csv, read_panel_csv, write_csv,
        write_panel_csv,
    },
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "FACTORSIM";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Wide price CSV: `date` plus one close-price column per ticker.
    #[arg(long, short)]
    prices: PathBuf,
    /// Factor CSV, long (`date,symbol,<value>`) or wide (`date` plus tickers).
    #[arg(long, short)]
    factor: PathBuf,
    /// Optional `symbol,group` CSV; enables the group-neutral run.
    #[arg(long, short)]
    groups: Option<PathBuf>,
    /// Factor name used in reports (defaults to the factor file stem).
    #[arg(long)]
    name: Option<String>,
    /// TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Comma-separated smoothing windows.
    #[arg(long, value_delimiter = ',')]
    rolls: Option<Vec<usize>>,
    /// Target sum of weights per date.
    #[arg(long)]
    leverage: Option<f64>,
    /// Cost per unit of turnover (e.g. 0.0005 for 5 bps).
    #[arg(long)]
    trade_cost: Option<f64>,
    /// Drop tickers without a group instead of failing.
    #[arg(long)]
    drop_unaligned: bool,
    /// Fail on dates without eligible exposure instead of holding flat.
    #[arg(long)]
    strict_dates: bool,
    /// Evaluate variants one at a time.
    #[arg(long)]
    sequential: bool,
    /// Directory for cumulative, daily and group-weight CSVs.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let factor = read_panel_csv(&cli.factor, None)
        .with_context(|| format!("Failed to read factor from {}", cli.factor.display()))?;
    let prices = CsvPriceSource::new(&cli.prices)
        .prices(factor.columns())
        .with_context(|| format!("Failed to load prices from {}", cli.prices.display()))?;
    let returns = daily_returns(&prices)?;
    let groups = cli
        .groups
        .as_deref()
        .map(|path| {
            read_groups_csv(path)
                .with_context(|| format!("Failed to read groups from {}", path.display()))
        })
        .transpose()?;

    let name = cli.name.clone().unwrap_or_else(|| {
        cli.factor.file_stem().and_then(|s| s.to_str()).unwrap_or("factor").to_string()
    });
    info!(
        factor = %name,
        dates = factor.n_dates(),
        tickers = factor.n_columns(),
        groups = groups.as_ref().map_or(0, |g| g.groups().len()),
        "loaded inputs"
    );

    let analysis = analyze_factor(&name, &factor, &returns, groups.as_ref(), &settings)?;
    print_analysis(&analysis);

    if let Some(dir) = &cli.output {
        write_outputs(&analysis, dir)?;
    }

    Ok(())
}

/// Defaults, then the TOML file, then environment, then flags.
fn load_settings(cli: &Cli) -> Result<AnalysisConfig> {
    let mut builder = config::Config::builder()
        .add_source(config::Config::try_from(&AnalysisConfig::default())?);
    if let Some(path) = &cli.config {
        builder = builder.add_source(config::File::from(path.as_path()));
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("rolls")
            .with_list_parse_key("baseline_leverages")
            .try_parsing(true),
    );

    let mut settings: AnalysisConfig = builder
        .build()
        .and_then(config::Config::try_deserialize)
        .context("Failed to load configuration")?;

    if let Some(rolls) = &cli.rolls {
        settings.rolls.clone_from(rolls);
    }
    if let Some(leverage) = cli.leverage {
        settings.leverage = leverage;
    }
    if cli.trade_cost.is_some() {
        settings.trade_cost = cli.trade_cost;
    }
    if cli.drop_unaligned {
        settings.policy.alignment = AlignmentPolicy::DropUnaligned;
    }
    if cli.strict_dates {
        settings.policy.empty_dates = EmptyDatePolicy::Fail;
    }
    if cli.sequential {
        settings.parallel = false;
    }
    Ok(settings)
}

fn print_analysis(analysis: &FactorAnalysis) {
    println!("\n=== {} ===", analysis.factor_name);
    print_report("raw", &analysis.raw);
    if let Some(neutral) = &analysis.neutral {
        print_report("group-neutral", neutral);
    }
}

fn print_report(kind: &str, report: &BatchReport) {
    println!("\n--- {kind} weighting (ranked by Sharpe vs equal weight) ---");
    print!("{}", report.performance);

    for failure in &report.batch.failures {
        println!("  failed  {failure}");
    }
    for (label, rec) in &report.batch.reconciliations {
        if !rec.is_complete() {
            println!("  {label}: dropped {} ungrouped tickers", rec.unaligned.len());
        }
    }
    for (label, dates) in &report.batch.skipped_dates {
        println!("  {label}: held flat on {} dates", dates.len());
    }
}

fn write_outputs(analysis: &FactorAnalysis, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    write_report("raw", &analysis.raw, dir)?;
    if let Some(neutral) = &analysis.neutral {
        write_report("neutral", neutral, dir)?;
    }
    info!(dir = %dir.display(), "wrote outputs");
    Ok(())
}

fn write_report(kind: &str, report: &BatchReport, dir: &Path) -> Result<()> {
    let batch = &report.batch;
    write_panel_csv(&batch.cumulative, dir.join(format!("{kind}_cumulative.csv")))?;
    write_panel_csv(&batch.daily, dir.join(format!("{kind}_daily.csv")))?;

    if !batch.group_weights.is_empty() {
        let mut df = labeled_panels_to_long(&batch.group_weights, "variant", "group", "weight")?;
        write_csv(&mut df, dir.join(format!("{kind}_group_weights.csv")))?;
    }
    Ok(())
}
