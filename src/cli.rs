//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::indicators::StandardIndicators;
use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::resilient_data_adapter::ResilientDataAdapter;
use crate::domain::backtest::{run_backtest, SimulationResult};
use crate::domain::bar_table::BarTable;
use crate::domain::comparison::{compare_strategies, ComparisonReport};
use crate::domain::config_validation::validate_settings;
use crate::domain::cost::Side;
use crate::domain::error::SignalbenchError;
use crate::domain::live::{LiveTrader, StopSignal, SystemClock};
use crate::domain::settings::Settings;
use crate::domain::strategy::{all_strategies, build_strategy};
use crate::logging;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "signalbench", about = "Rule-based trading strategy evaluation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest every built-in strategy and rank them by Sharpe ratio
    Compare {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides `[data] symbols`
        #[arg(long)]
        symbol: Option<String>,
        /// Directory for `{SYMBOL}_comparison.csv` reports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Backtest one strategy and report its trades and costs
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        strategy: String,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Price one order (or a roundtrip with --exit) under the configured cost model
    Costs {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        quantity: f64,
        #[arg(long, default_value = "buy")]
        side: Side,
        /// Exit price; prints the roundtrip cost instead
        #[arg(long)]
        exit: Option<f64>,
    },
    /// Trade the configured strategy against a paper account until Enter is pressed
    Live {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides `[live] strategy`
        #[arg(short, long)]
        strategy: Option<String>,
        /// Overrides `[live] duration_hours`
        #[arg(long)]
        duration_hours: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Compare {
            config,
            symbol,
            output_dir,
        } => run_compare(config.as_deref(), symbol.as_deref(), output_dir.as_deref()),
        Command::Backtest {
            config,
            strategy,
            symbol,
        } => run_single_backtest(config.as_deref(), &strategy, symbol.as_deref()),
        Command::Costs {
            config,
            price,
            quantity,
            side,
            exit,
        } => run_costs(config.as_deref(), price, quantity, side, exit),
        Command::Live {
            config,
            strategy,
            duration_hours,
        } => run_live(config.as_deref(), strategy.as_deref(), duration_hours),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &SignalbenchError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Read and validate settings; an absent path means all defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SignalbenchError> {
    let config = match path {
        Some(p) => FileConfigAdapter::from_file(p)?,
        None => FileConfigAdapter::empty(),
    };
    let settings = Settings::from_config(&config)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn setup(path: Option<&Path>) -> Result<Settings, ExitCode> {
    let settings = load_settings(path).map_err(|e| fail(&e))?;
    logging::init(&settings.logging).map_err(|e| fail(&e))?;
    Ok(settings)
}

/// CSV files under `data_dir`, cached and retried, with the configured fallback.
pub fn data_source(settings: &Settings) -> ResilientDataAdapter {
    let data = &settings.data;
    ResilientDataAdapter::new(Box::new(CsvAdapter::new(data.data_dir.clone())), &data.data_dir)
        .with_cache_ttl_days(data.cache_ttl_days)
        .with_max_attempts(data.max_attempts)
        .with_synthetic_fallback(data.synthetic_fallback)
}

/// Same files as [`data_source`] but uncached and never synthetic: every
/// poll reads the latest bars, and a failed fetch skips the symbol.
pub fn live_data_source(settings: &Settings) -> ResilientDataAdapter {
    let data = &settings.data;
    ResilientDataAdapter::new(Box::new(CsvAdapter::new(data.data_dir.clone())), &data.data_dir)
        .without_cache()
        .with_max_attempts(data.max_attempts)
        .with_synthetic_fallback(false)
}

pub fn load_table(
    data: &dyn DataPort,
    symbol: &str,
    settings: &Settings,
) -> Result<BarTable, SignalbenchError> {
    let (start, end) = settings
        .data
        .date_range(chrono::Local::now().date_naive());
    let bars = data.fetch(symbol, start, end, &settings.data.interval)?;
    if bars.is_empty() {
        return Err(SignalbenchError::NoData {
            symbol: symbol.to_string(),
        });
    }
    BarTable::new(bars)
}

fn symbols(settings: &Settings, symbol_override: Option<&str>) -> Vec<String> {
    match symbol_override {
        Some(s) => vec![s.to_uppercase()],
        None => settings.data.symbols.clone(),
    }
}

pub fn print_comparison(symbol: &str, report: &ComparisonReport) {
    println!("\n=== {symbol}: strategy comparison ===");
    println!(
        "{:<4} {:<20} {:>10} {:>8} {:>10} {:>9} {:>7}",
        "Rank", "Strategy", "Return", "Sharpe", "Drawdown", "Win rate", "Trades"
    );
    for r in &report.ranked {
        let s = &r.summary;
        println!(
            "{:<4} {:<20} {:>9.2}% {:>8.2} {:>9.2}% {:>8.1}% {:>7}",
            r.rank,
            r.strategy_name,
            s.total_return * 100.0,
            s.sharpe_ratio,
            s.max_drawdown * 100.0,
            s.win_rate * 100.0,
            s.total_trades
        );
    }
    for f in &report.failures {
        println!("  failed: {} ({})", f.strategy_name, f.reason);
    }
    if let Some(best) = report.best() {
        println!("Best: {} (Sharpe {:.2})", best.strategy_name, best.summary.sharpe_ratio);
    }
}

fn run_compare(
    config_path: Option<&Path>,
    symbol_override: Option<&str>,
    output_dir: Option<&Path>,
) -> ExitCode {
    let settings = match setup(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let data = data_source(&settings);
    let indicators = StandardIndicators::for_strategies(&settings.strategies);
    let strategies = all_strategies(&settings.strategies);
    let mut last_error = None;
    let mut compared = 0;

    for symbol in symbols(&settings, symbol_override) {
        let table = match load_table(&data, &symbol, &settings) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(symbol = %symbol, error = %e, "skipping symbol");
                eprintln!("warning: skipping {symbol} ({e})");
                last_error = Some(e);
                continue;
            }
        };

        let report = compare_strategies(&table, &strategies, &indicators, &settings.backtest);
        print_comparison(&symbol, &report);
        compared += 1;

        if let Some(dir) = output_dir {
            let path = dir.join(format!("{symbol}_comparison.csv"));
            if let Err(e) = CsvReportAdapter.write_comparison(&report, &path) {
                return fail(&e);
            }
            eprintln!("Report written to: {}", path.display());
        }
    }

    match (compared, last_error) {
        (0, Some(e)) => fail(&e),
        _ => ExitCode::SUCCESS,
    }
}

fn print_backtest(symbol: &str, result: &SimulationResult, settings: &Settings) {
    let s = result.summary();
    println!("\n=== {symbol}: {} ===", result.strategy_name);
    println!("Bars:             {}", result.equity.len());
    println!("Final Equity:     {:.2}", result.final_equity());
    println!("Total Return:     {:.2}%", s.total_return * 100.0);
    println!("Sharpe Ratio:     {:.2}", s.sharpe_ratio);
    println!("Max Drawdown:     {:.2}%", s.max_drawdown * 100.0);
    println!("Win Rate:         {:.1}%", s.win_rate * 100.0);
    println!("Active Bars:      {}", s.total_trades);

    let costs = match result.cost_report(&settings.costs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("warning: cost report unavailable ({e})");
            return;
        }
    };
    if costs.is_empty() {
        println!("No trades.");
        return;
    }

    println!("\nTrades:");
    for c in &costs {
        let t = &c.trade;
        println!(
            "  {} -> {}{}  {:.2} -> {:.2}  {:>+7.2}%  qty {:.0}  cost {:.2}",
            t.entry_time.date(),
            t.exit_time.date(),
            if t.open_at_end { " (open)" } else { "" },
            t.entry_price,
            t.exit_price,
            t.return_pct(),
            c.quantity,
            c.roundtrip_cost
        );
    }
    let total: f64 = costs.iter().map(|c| c.roundtrip_cost).sum();
    println!(
        "Total roundtrip costs: {:.2} ({:.2}% of initial capital)",
        total,
        total / result.initial_capital * 100.0
    );
}

fn run_single_backtest(
    config_path: Option<&Path>,
    strategy_name: &str,
    symbol_override: Option<&str>,
) -> ExitCode {
    let settings = match setup(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let strategy = match build_strategy(strategy_name, &settings.strategies) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let data = data_source(&settings);
    let indicators = StandardIndicators::for_strategies(&settings.strategies);

    for symbol in symbols(&settings, symbol_override) {
        let result = load_table(&data, &symbol, &settings).and_then(|table| {
            run_backtest(&table, strategy.as_ref(), &indicators, &settings.backtest)
        });
        match result {
            Ok(r) => print_backtest(&symbol, &r, &settings),
            Err(e) => return fail(&e),
        }
    }
    ExitCode::SUCCESS
}

fn run_costs(
    config_path: Option<&Path>,
    price: f64,
    quantity: f64,
    side: Side,
    exit: Option<f64>,
) -> ExitCode {
    let settings = match setup(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let model = &settings.costs;

    if let Some(exit_price) = exit {
        return match model.roundtrip_cost(price, exit_price, quantity) {
            Ok(total) => {
                println!("Roundtrip cost: {total:.4}");
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e),
        };
    }

    match model.entry_cost(price, quantity, side) {
        Ok(b) => {
            println!("Gross value:     {:.4}", b.gross_value);
            println!("Commission:      {:.4}", b.commission);
            println!("Spread:          {:.4}", b.spread_cost);
            println!("Slippage:        {:.4}", b.slippage_cost);
            println!("Total cost:      {:.4}", b.total_cost);
            println!("Effective price: {:.4}", b.effective_price);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_live(
    config_path: Option<&Path>,
    strategy_override: Option<&str>,
    duration_hours: Option<f64>,
) -> ExitCode {
    let settings = match setup(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let strategy_name = strategy_override.unwrap_or(settings.live.strategy.as_str());
    let strategy = match build_strategy(strategy_name, &settings.strategies) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let mut live_config = settings.live.trader.clone();
    if let Some(hours) = duration_hours {
        live_config.max_duration =
            (hours > 0.0 && hours.is_finite()).then(|| Duration::from_secs_f64(hours * 3600.0));
    }

    let data = live_data_source(&settings);
    let indicators = StandardIndicators::for_strategies(&settings.strategies);
    let broker = PaperBroker::new(settings.live.paper_cash);
    let clock = SystemClock;
    let stop = StopSignal::new();

    let handle = stop.clone();
    std::thread::spawn(move || {
        let _ = std::io::stdin().lock().lines().next();
        handle.stop();
    });

    eprintln!(
        "Live paper trading {} on {} (press Enter to stop)",
        strategy.name(),
        live_config.symbols.join(", ")
    );

    let mut trader = LiveTrader::new(
        strategy.as_ref(),
        &data,
        &indicators,
        &broker,
        &clock,
        live_config,
    );
    let summary = trader.run(&stop);

    println!("\n=== Live session ===");
    println!("Cycles:           {}", summary.cycles);
    println!("Orders submitted: {}", summary.orders_submitted);
    println!("Orders failed:    {}", summary.orders_failed);
    match summary.final_account {
        Some(a) => {
            println!("Cash:             {:.2}", a.cash);
            println!("Equity:           {:.2}", a.equity);
            ExitCode::SUCCESS
        }
        None => ExitCode::from(6),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let settings = match load_settings(Some(config_path)) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("  symbols:   {}", settings.data.symbols.join(", "));
    eprintln!("  interval:  {}", settings.data.interval);
    eprintln!("  capital:   {:.2}", settings.backtest.initial_capital);
    eprintln!("  live:      {}", settings.live.strategy);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
