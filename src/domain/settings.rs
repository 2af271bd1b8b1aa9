//! Typed settings, read once from a [`ConfigPort`] at startup and passed by
//! reference afterwards.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use super::backtest::BacktestConfig;
use super::cost::CostModel;
use super::error::SignalbenchError;
use super::live::{LiveConfig, TradingWindow};
use super::strategy::{MeanReversionParams, MomentumParams, StrategyParams, TrendFollowingParams};
use crate::ports::config_port::ConfigPort;

/// Span used when `[data] start_date` is not set.
const DEFAULT_HISTORY_DAYS: i64 = 730;

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub data_dir: PathBuf,
    pub cache_ttl_days: i64,
    pub interval: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub symbols: Vec<String>,
    pub synthetic_fallback: bool,
    pub max_attempts: u32,
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            data_dir: PathBuf::from("./data"),
            cache_ttl_days: 1,
            interval: "1d".into(),
            start_date: None,
            end_date: None,
            symbols: vec!["AAPL".into()],
            synthetic_fallback: true,
            max_attempts: 3,
        }
    }
}

impl DataSettings {
    /// Resolve the configured range; `end` defaults to `today` and `start` to
    /// two years before `end`.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or(today);
        let start = self
            .start_date
            .unwrap_or(end - chrono::Duration::days(DEFAULT_HISTORY_DAYS));
        (start, end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveSettings {
    pub strategy: String,
    pub paper_cash: f64,
    pub trader: LiveConfig,
}

impl Default for LiveSettings {
    fn default() -> Self {
        LiveSettings {
            strategy: "momentum".into(),
            paper_cash: 100_000.0,
            trader: LiveConfig {
                symbols: vec!["AAPL".into()],
                ..LiveConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".into(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub data: DataSettings,
    pub backtest: BacktestConfig,
    pub costs: CostModel,
    pub strategies: StrategyParams,
    pub live: LiveSettings,
    pub logging: LogSettings,
}

impl Settings {
    /// Missing keys take their defaults; present but malformed keys are errors.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SignalbenchError> {
        let defaults = Settings::default();

        let data = DataSettings {
            data_dir: config
                .get_string("data", "data_dir")
                .map(PathBuf::from)
                .unwrap_or(defaults.data.data_dir),
            cache_ttl_days: config.get_int("data", "cache_ttl_days", defaults.data.cache_ttl_days),
            interval: config
                .get_string("data", "interval")
                .unwrap_or(defaults.data.interval),
            start_date: optional_date(config, "data", "start_date")?,
            end_date: optional_date(config, "data", "end_date")?,
            symbols: list_or(config, "data", "symbols", defaults.data.symbols),
            synthetic_fallback: config.get_bool(
                "data",
                "synthetic_fallback",
                defaults.data.synthetic_fallback,
            ),
            max_attempts: non_negative(
                config,
                "data",
                "max_attempts",
                i64::from(defaults.data.max_attempts),
            )? as u32,
        };

        let backtest = BacktestConfig {
            initial_capital: config.get_double(
                "backtest",
                "initial_capital",
                defaults.backtest.initial_capital,
            ),
        };

        let costs = CostModel {
            commission_pct: config.get_double("costs", "commission_pct", defaults.costs.commission_pct),
            commission_min: config.get_double("costs", "commission_min", defaults.costs.commission_min),
            spread_pct: config.get_double("costs", "spread_pct", defaults.costs.spread_pct),
            slippage_pct: config.get_double("costs", "slippage_pct", defaults.costs.slippage_pct),
            market_impact: config.get_double("costs", "market_impact", defaults.costs.market_impact),
        };

        let mr = &defaults.strategies.mean_reversion;
        let mo = &defaults.strategies.momentum;
        let tf = &defaults.strategies.trend_following;
        let strategies = StrategyParams {
            mean_reversion: MeanReversionParams {
                rsi_period: period(config, "mean_reversion", "rsi_period", mr.rsi_period)?,
                oversold: config.get_double("mean_reversion", "oversold", mr.oversold),
                overbought: config.get_double("mean_reversion", "overbought", mr.overbought),
            },
            momentum: MomentumParams {
                rsi_period: period(config, "momentum", "rsi_period", mo.rsi_period)?,
                threshold: config.get_double("momentum", "threshold", mo.threshold),
            },
            trend_following: TrendFollowingParams {
                fast_period: period(config, "trend_following", "fast_period", tf.fast_period)?,
                slow_period: period(config, "trend_following", "slow_period", tf.slow_period)?,
            },
        };

        let lt = &defaults.live.trader;
        let duration_hours = config.get_double("live", "duration_hours", 0.0);
        let live = LiveSettings {
            strategy: config
                .get_string("live", "strategy")
                .unwrap_or(defaults.live.strategy),
            paper_cash: config.get_double("live", "paper_cash", defaults.live.paper_cash),
            trader: LiveConfig {
                symbols: list_or(config, "live", "symbols", data.symbols.clone()),
                interval: Duration::from_secs(
                    non_negative(config, "live", "interval_secs", lt.interval.as_secs() as i64)?
                        as u64,
                ),
                cash_fraction: config.get_double("live", "cash_fraction", lt.cash_fraction),
                lookback_days: config.get_int("live", "lookback_days", lt.lookback_days),
                bar_interval: data.interval.clone(),
                max_duration: (duration_hours > 0.0 && duration_hours.is_finite())
                    .then(|| Duration::from_secs_f64(duration_hours * 3600.0)),
                window: TradingWindow {
                    open: optional_time(config, "live", "window_open")?,
                    close: optional_time(config, "live", "window_close")?,
                },
            },
        };

        let logging = LogSettings {
            level: config
                .get_string("logging", "level")
                .unwrap_or(defaults.logging.level),
            file: config.get_string("logging", "file").map(PathBuf::from),
        };

        Ok(Settings {
            data,
            backtest,
            costs,
            strategies,
            live,
            logging,
        })
    }
}

fn list_or(config: &dyn ConfigPort, section: &str, key: &str, default: Vec<String>) -> Vec<String> {
    let values = config.get_list(section, key);
    if values.is_empty() {
        default
    } else {
        values
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalbenchError {
    SignalbenchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SignalbenchError> {
    let value = config.get_int(section, key, default);
    if value < 0 {
        return Err(invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(value)
}

fn period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SignalbenchError> {
    let value = config.get_int(section, key, default as i64);
    if value < 1 {
        return Err(invalid(section, key, format!("{key} must be at least 1")));
    }
    Ok(value as usize)
}

fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, SignalbenchError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD"))),
    }
}

fn optional_time(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveTime>, SignalbenchError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Some)
            .map_err(|_| invalid(section, key, format!("invalid {key} format, expected HH:MM"))),
    }
}
