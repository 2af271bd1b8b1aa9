//! CSV report adapter implementing ReportPort.
//!
//! One row per strategy: ranked strategies first, in rank order, then failed
//! strategies with empty metric columns and the failure reason.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::domain::comparison::ComparisonReport;
use crate::domain::error::SignalbenchError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    rank: Option<usize>,
    strategy: &'a str,
    status: &'static str,
    total_return_pct: Option<f64>,
    sharpe_ratio: Option<f64>,
    max_drawdown_pct: Option<f64>,
    win_rate_pct: Option<f64>,
    total_trades: Option<usize>,
    final_equity: Option<f64>,
    error: &'a str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_comparison(
        &self,
        report: &ComparisonReport,
        output_path: &Path,
    ) -> Result<(), SignalbenchError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(output_path).map_err(io::Error::from)?;

        for ranked in &report.ranked {
            let s = &ranked.summary;
            wtr.serialize(ReportRow {
                rank: Some(ranked.rank),
                strategy: &ranked.strategy_name,
                status: "ok",
                total_return_pct: Some(s.total_return * 100.0),
                sharpe_ratio: Some(s.sharpe_ratio),
                max_drawdown_pct: Some(s.max_drawdown * 100.0),
                win_rate_pct: Some(s.win_rate * 100.0),
                total_trades: Some(s.total_trades),
                final_equity: Some(ranked.simulation.final_equity()),
                error: "",
            })
            .map_err(io::Error::from)?;
        }

        for failure in &report.failures {
            wtr.serialize(ReportRow {
                rank: None,
                strategy: &failure.strategy_name,
                status: "failed",
                total_return_pct: None,
                sharpe_ratio: None,
                max_drawdown_pct: None,
                win_rate_pct: None,
                total_trades: None,
                final_equity: None,
                error: &failure.reason,
            })
            .map_err(io::Error::from)?;
        }

        wtr.flush()?;
        tracing::info!(path = %output_path.display(), "wrote comparison report");
        Ok(())
    }
}
