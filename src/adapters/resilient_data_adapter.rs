//! Caching, retrying data provider with an optional synthetic fallback.
//!
//! Lookup order for a `(symbol, start, end, interval)` request:
//! 1. a cache file under `{data_dir}/cache/` younger than the TTL;
//! 2. the wrapped source, up to `max_attempts` tries with linear backoff;
//! 3. generated bars, when the synthetic fallback is enabled.
//!
//! Only bars from the wrapped source are cached. Polling callers that need
//! every new bar turn the cache off with [`ResilientDataAdapter::without_cache`].

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;

use super::csv_adapter::{read_bars, write_bars};
use super::synthetic::SyntheticDataAdapter;
use crate::domain::error::SignalbenchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;

const SECONDS_PER_DAY: u64 = 86_400;

pub struct ResilientDataAdapter {
    source: Box<dyn DataPort>,
    cache_dir: PathBuf,
    cache_ttl: Duration,
    cache_enabled: bool,
    max_attempts: u32,
    backoff: Duration,
    fallback: Option<SyntheticDataAdapter>,
}

impl ResilientDataAdapter {
    pub fn new(source: Box<dyn DataPort>, data_dir: &Path) -> Self {
        Self {
            source,
            cache_dir: data_dir.join("cache"),
            cache_ttl: Duration::from_secs(SECONDS_PER_DAY),
            cache_enabled: true,
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            fallback: Some(SyntheticDataAdapter::new()),
        }
    }

    pub fn with_cache_ttl_days(mut self, days: i64) -> Self {
        self.cache_ttl = Duration::from_secs(days.max(0) as u64 * SECONDS_PER_DAY);
        self
    }

    /// Neither read nor write cache files.
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Base delay; attempt `k` waits `k × backoff` before the next try.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_synthetic_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled.then(SyntheticDataAdapter::new);
        self
    }

    pub fn cache_path(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> PathBuf {
        self.cache_dir.join(format!(
            "{}_{}_{}_{}.csv",
            symbol.to_uppercase(),
            start,
            end,
            interval
        ))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age < self.cache_ttl)
    }

    fn read_cache(&self, path: &Path, symbol: &str) -> Option<Vec<OhlcvBar>> {
        if !self.cache_enabled || !self.is_fresh(path) {
            return None;
        }
        match read_bars(path, symbol) {
            Ok(bars) if !bars.is_empty() => {
                tracing::debug!(symbol, bars = bars.len(), "loaded from cache");
                Some(bars)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "ignoring unreadable cache file");
                None
            }
        }
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError> {
        let mut last_error = SignalbenchError::NoData {
            symbol: symbol.to_string(),
        };

        for attempt in 1..=self.max_attempts {
            match self.source.fetch(symbol, start, end, interval) {
                Ok(bars) if !bars.is_empty() => {
                    tracing::info!(symbol, bars = bars.len(), attempt, "downloaded bars");
                    return Ok(bars);
                }
                Ok(_) => {
                    tracing::warn!(symbol, attempt, "source returned no bars");
                    last_error = SignalbenchError::NoData {
                        symbol: symbol.to_string(),
                    };
                }
                Err(e) => {
                    tracing::warn!(symbol, attempt, error = %e, "fetch attempt failed");
                    let retry = e.is_transient();
                    last_error = e;
                    if !retry {
                        break;
                    }
                }
            }

            if attempt < self.max_attempts {
                thread::sleep(self.backoff * attempt);
            }
        }

        Err(last_error)
    }
}

impl DataPort for ResilientDataAdapter {
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError> {
        tracing::info!(symbol, %start, %end, interval, "fetching bars");

        let cache_path = self.cache_path(symbol, start, end, interval);
        if let Some(bars) = self.read_cache(&cache_path, symbol) {
            return Ok(bars);
        }

        match self.fetch_with_retry(symbol, start, end, interval) {
            Ok(bars) => {
                if self.cache_enabled {
                    if let Err(e) = write_bars(&cache_path, &bars) {
                        tracing::warn!(symbol, error = %e, "could not write cache");
                    }
                }
                Ok(bars)
            }
            Err(e) => match &self.fallback {
                Some(synthetic) => {
                    tracing::warn!(symbol, error = %e, "using synthetic data");
                    Ok(synthetic.generate(symbol, start, end))
                }
                None => Err(SignalbenchError::DataFetch {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                }),
            },
        }
    }
}
