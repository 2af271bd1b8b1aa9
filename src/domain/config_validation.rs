//! Configuration validation.
//!
//! Checks value ranges on typed [`Settings`] before any run starts, so a bad
//! config fails once up front rather than inside a strategy or the live loop.

use crate::domain::error::SignalbenchError;
use crate::domain::settings::Settings;
use crate::domain::strategy::build_strategy;

pub fn validate_settings(settings: &Settings) -> Result<(), SignalbenchError> {
    validate_data(settings)?;
    validate_backtest(settings)?;
    validate_costs(settings)?;
    validate_strategies(settings)?;
    validate_live(settings)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> SignalbenchError {
    SignalbenchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_data(settings: &Settings) -> Result<(), SignalbenchError> {
    let data = &settings.data;
    if data.symbols.is_empty() {
        return Err(SignalbenchError::ConfigMissing {
            section: "data".to_string(),
            key: "symbols".to_string(),
        });
    }
    if data.cache_ttl_days < 0 {
        return Err(invalid(
            "data",
            "cache_ttl_days",
            "cache_ttl_days must be non-negative",
        ));
    }
    if data.max_attempts == 0 {
        return Err(invalid("data", "max_attempts", "max_attempts must be at least 1"));
    }
    if data.interval.trim().is_empty() {
        return Err(invalid("data", "interval", "interval must not be empty"));
    }
    if let (Some(start), Some(end)) = (data.start_date, data.end_date) {
        if start >= end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn validate_backtest(settings: &Settings) -> Result<(), SignalbenchError> {
    let capital = settings.backtest.initial_capital;
    if !(capital > 0.0) || !capital.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_costs(settings: &Settings) -> Result<(), SignalbenchError> {
    let c = &settings.costs;
    for (key, value) in [
        ("commission_pct", c.commission_pct),
        ("commission_min", c.commission_min),
        ("spread_pct", c.spread_pct),
        ("slippage_pct", c.slippage_pct),
        ("market_impact", c.market_impact),
    ] {
        if !(value >= 0.0) || !value.is_finite() {
            return Err(SignalbenchError::ConfigInvalid {
                section: "costs".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be non-negative"),
            });
        }
    }
    Ok(())
}

fn validate_strategies(settings: &Settings) -> Result<(), SignalbenchError> {
    let mr = &settings.strategies.mean_reversion;
    if !(0.0..=100.0).contains(&mr.oversold) || !(0.0..=100.0).contains(&mr.overbought) {
        return Err(invalid(
            "mean_reversion",
            "oversold",
            "RSI thresholds must be between 0 and 100",
        ));
    }
    if mr.oversold >= mr.overbought {
        return Err(invalid(
            "mean_reversion",
            "oversold",
            "oversold must be below overbought",
        ));
    }

    let mo = &settings.strategies.momentum;
    if !(0.0..=100.0).contains(&mo.threshold) {
        return Err(invalid(
            "momentum",
            "threshold",
            "threshold must be between 0 and 100",
        ));
    }

    let tf = &settings.strategies.trend_following;
    if tf.fast_period >= tf.slow_period {
        return Err(invalid(
            "trend_following",
            "fast_period",
            "fast_period must be shorter than slow_period",
        ));
    }
    Ok(())
}

fn validate_live(settings: &Settings) -> Result<(), SignalbenchError> {
    let live = &settings.live;
    build_strategy(&live.strategy, &settings.strategies)?;

    let t = &live.trader;
    if !(t.cash_fraction > 0.0 && t.cash_fraction <= 1.0) {
        return Err(invalid(
            "live",
            "cash_fraction",
            "cash_fraction must be between 0 and 1",
        ));
    }
    if t.lookback_days < 1 {
        return Err(invalid("live", "lookback_days", "lookback_days must be at least 1"));
    }
    if !(live.paper_cash > 0.0) {
        return Err(invalid("live", "paper_cash", "paper_cash must be positive"));
    }
    if let (Some(open), Some(close)) = (t.window.open, t.window.close) {
        if open >= close {
            return Err(invalid(
                "live",
                "window_open",
                "window_open must be before window_close",
            ));
        }
    }
    Ok(())
}
