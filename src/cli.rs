//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::retrying_adapter::RetryingDataPort;
use crate::domain::config_validation::{
    load_retry_policy, load_universe, period_token, validate_dashboard_config,
    DEFAULT_CHANGE_PERIOD, DEFAULT_DRAWDOWN_PERIOD,
};
use crate::domain::dashboard::{Dashboard, DashboardRequest};
use crate::domain::error::TickerboardError;
use crate::domain::retry::{Clock, LinearJitterBackoff, SystemClock, ThreadSleeper};
use crate::domain::universe::Universe;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tickerboard", about = "Market indicator dashboard engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the dashboard payload for the whole universe
    Dashboard {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        drawdown_period: Option<String>,
        #[arg(long)]
        change_period: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build the record for a single symbol
    Symbol {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        drawdown_period: Option<String>,
        #[arg(long)]
        change_period: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub type CsvDataPort = RetryingDataPort<CsvAdapter, LinearJitterBackoff, ThreadSleeper>;

pub fn run(cli: Cli) -> ExitCode {
    run_with_clock(cli, &SystemClock)
}

pub fn run_with_clock(cli: Cli, clock: &dyn Clock) -> ExitCode {
    match cli.command {
        Command::Dashboard {
            config,
            drawdown_period,
            change_period,
            output,
        } => run_dashboard(
            &config,
            drawdown_period.as_deref(),
            change_period.as_deref(),
            output.as_deref(),
            clock,
        ),
        Command::Symbol {
            config,
            symbol,
            drawdown_period,
            change_period,
            output,
        } => run_symbol(
            &config,
            &symbol,
            drawdown_period.as_deref(),
            change_period.as_deref(),
            output.as_deref(),
            clock,
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TickerboardError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        tracing::error!("{err}");
        ExitCode::from(&err)
    })
}

fn fail(err: TickerboardError) -> ExitCode {
    tracing::error!("{err}");
    ExitCode::from(&err)
}

/// Loads and validates the config, then builds the universe and data source.
fn prepare(config_path: &Path) -> Result<(FileConfigAdapter, Universe, CsvDataPort), ExitCode> {
    tracing::info!(config = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    validate_dashboard_config(&adapter).map_err(fail)?;
    let universe = load_universe(&adapter).map_err(fail)?;
    let data = build_data_port(&adapter).map_err(fail)?;
    Ok((adapter, universe, data))
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<CsvDataPort, TickerboardError> {
    let csv_dir = config
        .get_string("data", "csv_dir")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TickerboardError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        })?;
    let policy = load_retry_policy(config)?;
    Ok(RetryingDataPort::new(
        CsvAdapter::new(PathBuf::from(csv_dir)),
        policy,
        ThreadSleeper,
    ))
}

/// Flag value, else the configured default, else the built-in default.
pub fn resolve_period(
    flag: Option<&str>,
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
) -> String {
    match flag.map(str::trim).filter(|s| !s.is_empty()) {
        Some(token) => token.to_string(),
        None => period_token(config, key, default),
    }
}

fn build_request(
    config: &dyn ConfigPort,
    drawdown_period: Option<&str>,
    change_period: Option<&str>,
    clock: &dyn Clock,
) -> DashboardRequest {
    DashboardRequest::new(
        &resolve_period(drawdown_period, config, "drawdown_period", DEFAULT_DRAWDOWN_PERIOD),
        &resolve_period(change_period, config, "change_period", DEFAULT_CHANGE_PERIOD),
        clock.now(),
    )
}

fn run_dashboard(
    config_path: &Path,
    drawdown_period: Option<&str>,
    change_period: Option<&str>,
    output: Option<&Path>,
    clock: &dyn Clock,
) -> ExitCode {
    let (adapter, universe, data) = match prepare(config_path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };
    let request = build_request(&adapter, drawdown_period, change_period, clock);
    run_dashboard_pipeline(&data, universe, &request, output)
}

/// Builds the payload over `data` and writes it. Separated from config loading
/// so it can run over any [`DataPort`].
pub fn run_dashboard_pipeline(
    data: &dyn DataPort,
    universe: Universe,
    request: &DashboardRequest,
    output: Option<&Path>,
) -> ExitCode {
    tracing::info!(
        symbols = universe.count(),
        benchmark = %universe.benchmark,
        drawdown_period = %request.drawdown_period,
        change_period = %request.change_period,
        "building dashboard"
    );
    let payload = Dashboard::new(universe, data).build(request);
    match write_json(&payload, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn run_symbol(
    config_path: &Path,
    symbol: &str,
    drawdown_period: Option<&str>,
    change_period: Option<&str>,
    output: Option<&Path>,
    clock: &dyn Clock,
) -> ExitCode {
    let (adapter, universe, data) = match prepare(config_path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };
    let request = build_request(&adapter, drawdown_period, change_period, clock);
    run_symbol_pipeline(&data, universe, symbol, &request, output)
}

pub fn run_symbol_pipeline(
    data: &dyn DataPort,
    universe: Universe,
    symbol: &str,
    request: &DashboardRequest,
    output: Option<&Path>,
) -> ExitCode {
    tracing::info!(%symbol, "building symbol record");
    let record = Dashboard::new(universe, data).symbol_report(symbol, request);
    match write_json(&record, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_dashboard_config(&adapter) {
        return fail(e);
    }
    match load_universe(&adapter) {
        Ok(universe) => {
            tracing::info!(
                market = universe.market.len(),
                assets = universe.assets.len(),
                benchmark = %universe.benchmark,
                "config is valid"
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Pretty JSON to `output`, or to stdout.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), TickerboardError> {
    let mut body = serde_json::to_vec_pretty(value).map_err(std::io::Error::from)?;
    body.push(b'\n');
    match output {
        Some(path) => {
            fs::write(path, &body)?;
            tracing::info!(path = %path.display(), bytes = body.len(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&body)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
