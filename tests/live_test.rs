mod common;

use common::*;
use signalbench::adapters::csv_adapter::write_bars;
use signalbench::adapters::indicators::StandardIndicators;
use signalbench::adapters::paper_broker::PaperBroker;
use signalbench::cli::live_data_source;
use signalbench::domain::bar_table::BarTable;
use signalbench::domain::cost::Side;
use signalbench::domain::error::SignalbenchError;
use signalbench::domain::live::{LiveConfig, LiveState, LiveTrader, StopSignal, TradingWindow};
use signalbench::domain::settings::Settings;
use signalbench::domain::signal::Signal;
use signalbench::domain::strategy::{Momentum, MomentumParams, Strategy};
use signalbench::ports::broker_port::BrokerPort;
use signalbench::ports::data_port::DataPort;
use std::time::Duration;
use tempfile::TempDir;

const CLOSES: [f64; 5] = [96.0, 97.0, 98.0, 99.0, 100.0];
const RSI_CROSSING_UP: [f64; 5] = [40.0, 42.0, 45.0, 48.0, 55.0];
const RSI_CROSSING_DOWN: [f64; 5] = [60.0, 58.0, 56.0, 52.0, 45.0];

fn data() -> MockDataPort {
    MockDataPort::new().with_bars("AAPL", make_bars("AAPL", date(2024, 6, 1), &CLOSES))
}

/// Monday midday, one minute per clock reading.
fn weekday_clock() -> SteppingClock {
    SteppingClock::new(at(2024, 6, 10, 12, 0), chrono::Duration::minutes(1))
}

fn config(symbols: &[&str], max_minutes: u64) -> LiveConfig {
    LiveConfig {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        interval: Duration::ZERO,
        max_duration: Some(Duration::from_secs(max_minutes * 60)),
        ..LiveConfig::default()
    }
}

#[test]
fn buy_signal_sizes_from_cash_fraction() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = MockBroker::new(10_000.0);
    let clock = weekday_clock();

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["AAPL"], 1),
    );
    let summary = trader.run(&StopSignal::new());

    // floor(10_000 * 0.2 / 100)
    assert_eq!(broker.orders(), vec![("AAPL".to_string(), 20, Side::Buy)]);
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.orders_submitted, 1);
    assert_eq!(summary.orders_failed, 0);
    assert!(summary.final_account.is_some());
    assert_eq!(trader.state(), LiveState::Stopped);
}

#[test]
fn sell_signal_closes_whole_position() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_DOWN);
    let data = data();
    let broker = MockBroker::new(0.0).with_position("AAPL", 7);
    let clock = weekday_clock();

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["AAPL"], 1),
    );
    trader.run(&StopSignal::new());

    assert_eq!(broker.orders(), vec![("AAPL".to_string(), 7, Side::Sell)]);
}

#[test]
fn holding_position_is_not_added_to() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = MockBroker::new(10_000.0);
    let clock = weekday_clock();

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["AAPL"], 5),
    );
    let summary = trader.run(&StopSignal::new());

    assert_eq!(summary.cycles, 3);
    assert_eq!(broker.orders().len(), 1);
}

#[test]
fn failing_symbol_does_not_stop_the_cycle() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data().with_error("BAD", "connection reset");
    let broker = MockBroker::new(10_000.0);
    let clock = weekday_clock();

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["BAD", "EMPTY", "AAPL"], 1),
    );
    let summary = trader.run(&StopSignal::new());

    assert_eq!(broker.orders(), vec![("AAPL".to_string(), 20, Side::Buy)]);
    assert_eq!(summary.orders_submitted, 1);
}

#[test]
fn rejected_order_is_counted_and_loop_continues() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = MockBroker::new(10_000.0).rejecting("AAPL");
    let clock = weekday_clock();

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["AAPL"], 1),
    );
    let summary = trader.run(&StopSignal::new());

    assert_eq!(summary.orders_submitted, 0);
    assert_eq!(summary.orders_failed, 1);
    assert!(summary.final_account.is_some());
}

#[test]
fn closed_window_skips_trading() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = MockBroker::new(10_000.0);
    // Saturday
    let clock = SteppingClock::new(at(2024, 6, 8, 12, 0), chrono::Duration::minutes(1));

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["AAPL"], 1),
    );
    let summary = trader.run(&StopSignal::new());

    assert_eq!(summary.cycles, 1);
    assert!(broker.orders().is_empty());
    // Only the final summary read.
    assert_eq!(broker.state.lock().unwrap().account_calls, 1);
}

#[test]
fn intraday_window_respected() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = MockBroker::new(10_000.0);
    let clock = SteppingClock::new(at(2024, 6, 10, 8, 0), chrono::Duration::minutes(1));
    let mut cfg = config(&["AAPL"], 1);
    cfg.window = TradingWindow {
        open: chrono::NaiveTime::from_hms_opt(9, 30, 0),
        close: chrono::NaiveTime::from_hms_opt(16, 0, 0),
    };

    let mut trader = LiveTrader::new(&strategy, &data, &indicators, &broker, &clock, cfg);
    trader.run(&StopSignal::new());

    assert!(broker.orders().is_empty());
}

#[test]
fn stopped_before_start_still_reports_account() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = MockBroker::new(1_234.0);
    let clock = weekday_clock();
    let stop = StopSignal::new();
    stop.stop();

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        LiveConfig::default(),
    );
    let summary = trader.run(&stop);

    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.final_account.unwrap().cash, 1_234.0);
}

#[test]
fn stop_interrupts_sleep() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = MockBroker::new(10_000.0);
    let clock = weekday_clock();
    let stop = StopSignal::new();

    let handle = stop.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        handle.stop();
    });

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        LiveConfig {
            symbols: vec!["AAPL".into()],
            interval: Duration::from_secs(3600),
            ..LiveConfig::default()
        },
    );
    let started = std::time::Instant::now();
    let summary = trader.run(&stop);
    stopper.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(summary.cycles, 1);
}

#[test]
fn paper_broker_end_to_end() {
    let strategy = Momentum::new(MomentumParams::default());
    let indicators = PresetIndicators::new().with_column("rsi_14", &RSI_CROSSING_UP);
    let data = data();
    let broker = PaperBroker::new(10_000.0);
    let clock = weekday_clock();

    let mut trader = LiveTrader::new(
        &strategy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["AAPL"], 1),
    );
    let summary = trader.run(&StopSignal::new());

    let position = broker.get_position("AAPL").unwrap().unwrap();
    assert_eq!(position.quantity, 20);
    let account = summary.final_account.unwrap();
    assert_eq!(account.cash, 8_000.0);
    assert_eq!(account.equity, 10_000.0);
}

/// Buys on every bar.
struct AlwaysBuy;

impl Strategy for AlwaysBuy {
    fn name(&self) -> &str {
        "Always Buy"
    }

    fn generate_signals(&self, table: &BarTable) -> Result<Vec<Signal>, SignalbenchError> {
        Ok(vec![Signal::Buy; table.len()])
    }
}

fn settings_in(dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.data.data_dir = dir.path().to_path_buf();
    settings
}

#[test]
fn live_source_never_trades_on_generated_bars() {
    let dir = TempDir::new().unwrap();
    let settings = settings_in(&dir);
    assert!(settings.data.synthetic_fallback);

    let data = live_data_source(&settings);
    let indicators = StandardIndicators::new();
    let broker = PaperBroker::new(100_000.0);
    let clock = weekday_clock();

    let mut trader = LiveTrader::new(
        &AlwaysBuy,
        &data,
        &indicators,
        &broker,
        &clock,
        config(&["AAPL"], 1),
    );
    let summary = trader.run(&StopSignal::new());

    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.orders_submitted, 0);
    assert_eq!(summary.orders_failed, 0);
    assert_eq!(summary.final_account.unwrap().cash, 100_000.0);
    assert!(broker.get_position("AAPL").unwrap().is_none());
}

#[test]
fn live_source_sees_bars_appended_between_polls() {
    let dir = TempDir::new().unwrap();
    let settings = settings_in(&dir);
    let data = live_data_source(&settings);
    let path = dir.path().join("AAPL_1d.csv");
    let (start, end) = (date(2024, 5, 1), date(2024, 6, 30));

    write_bars(&path, &make_bars("AAPL", date(2024, 6, 1), &[100.0, 101.0, 102.0])).unwrap();
    let first = data.fetch("AAPL", start, end, "1d").unwrap();

    write_bars(
        &path,
        &make_bars("AAPL", date(2024, 6, 1), &[100.0, 101.0, 102.0, 105.0]),
    )
    .unwrap();
    let second = data.fetch("AAPL", start, end, "1d").unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 4);
    assert_eq!(second.last().unwrap().close, 105.0);
    assert!(!dir.path().join("cache").exists());
}
