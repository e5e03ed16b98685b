//! JSON report files.

use crate::error::Result;
use crate::types::AnalysisReport;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes [`AnalysisReport`]s as `<stem>_report.json` into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the report for `input` would be written to.
    pub fn report_path(&self, input: &Path) -> PathBuf {
        self.output_dir
            .join(format!("{}_report.json", report_stem(input)))
    }

    /// Write `report` next to the other reports, creating the directory.
    pub fn write(&self, report: &AnalysisReport, input: &Path) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.report_path(input);
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

/// File stem of the input, or "analysis" when it has none.
pub fn report_stem(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("analysis")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_path() {
        let writer = ReportWriter::new("out");
        assert_eq!(
            writer.report_path(Path::new("data/autos.csv")),
            PathBuf::from("out/autos_report.json")
        );
    }

    #[test]
    fn test_report_stem_fallback() {
        assert_eq!(report_stem(Path::new("")), "analysis");
        assert_eq!(report_stem(Path::new("/tmp/listings.tsv")), "listings");
    }
}
