//! Indicator arithmetic over plain price slices.
//!
//! Every function returns one value per input row; `None` marks warm-up rows
//! that lack enough history.

use crate::domain::ohlcv::OhlcvBar;

/// Simple moving average. Warm-up: first `period - 1` rows.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        out.push((i + 1 >= period).then(|| sum / period as f64));
    }
    out
}

/// Exponential moving average, k = 2/(n+1), seeded with the SMA of the first
/// `period` values. Warm-up: first `period - 1` rows.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = vec![None; period - 1];
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out.push(Some(current));
    for v in &values[period..] {
        current = v * k + current * (1.0 - k);
        out.push(Some(current));
    }
    out
}

/// EMA over a series whose undefined rows are all leading.
fn ema_of_defined(series: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let first = series.iter().position(Option::is_some).unwrap_or(series.len());
    let tail: Vec<f64> = series[first..].iter().map(|v| v.unwrap_or(0.0)).collect();
    let mut out = vec![None; first];
    out.extend(ema(&tail, period));
    out
}

/// Wilder RSI. Warm-up: first `period` rows (one price change per row).
/// A window with no losses reads 100.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);
    let value = |avg_gain: f64, avg_loss: f64| {
        if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        }
    };

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;
    out[period] = Some(value(avg_gain, avg_loss));

    for i in period..changes.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(changes[i])) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(changes[i])) / period as f64;
        out[i + 1] = Some(value(avg_gain, avg_loss));
    }
    out
}

pub struct Macd {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD line = EMA(fast) − EMA(slow); signal = EMA(signal) of the line.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = ema_of_defined(&line, signal_period);
    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();
    Macd {
        line,
        signal,
        histogram,
    }
}

pub struct Bands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    /// `(upper − lower) / middle`.
    pub width: Vec<Option<f64>>,
}

/// Bollinger bands around the SMA using population standard deviation.
pub fn bollinger(closes: &[f64], period: usize, mult: f64) -> Bands {
    let middle = sma(closes, period);
    let mut upper = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());
    let mut width = Vec::with_capacity(closes.len());

    for (i, m) in middle.iter().enumerate() {
        let Some(m) = *m else {
            upper.push(None);
            lower.push(None);
            width.push(None);
            continue;
        };
        let window = &closes[i + 1 - period..=i];
        let variance = window.iter().map(|c| (c - m).powi(2)).sum::<f64>() / period as f64;
        let band = mult * variance.sqrt();
        upper.push(Some(m + band));
        lower.push(Some(m - band));
        width.push((m != 0.0).then(|| 2.0 * band / m));
    }

    Bands {
        upper,
        middle,
        lower,
        width,
    }
}

/// Wilder ATR; the first true range is `high − low`. Warm-up: first
/// `period - 1` rows.
pub fn atr(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }

    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match i {
            0 => bar.high - bar.low,
            _ => bar.true_range(bars[i - 1].close),
        })
        .collect();

    let mut current = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);
    for i in period..bars.len() {
        current = (current * (period - 1) as f64 + tr[i]) / period as f64;
        out[i] = Some(current);
    }
    out
}
