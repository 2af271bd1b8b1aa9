//! Report generation port trait.

use crate::domain::comparison::ComparisonReport;
use crate::domain::error::SignalbenchError;
use std::path::Path;

/// Port for writing comparison results.
pub trait ReportPort {
    fn write_comparison(
        &self,
        report: &ComparisonReport,
        output_path: &Path,
    ) -> Result<(), SignalbenchError>;
}
