//! Persist the aggregate migration report next to the migrated project.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::MigrationError;
use crate::migrations::report::MigrationReport;
use crate::version::CURRENT_VERSION;

pub const DEFAULT_REPORT_FILE_NAME: &str = "migration_report.md";

/// Destination of the report of a successful migration.
pub trait ReportSink: Send + Sync {
    /// Write `report` for `project`; returns the written file.
    fn write(
        &self,
        project: &Path,
        source_version: &str,
        report: &MigrationReport,
    ) -> Result<PathBuf, MigrationError>;
}

/// Writes the report as a markdown file at the project root.
#[derive(Debug, Clone)]
pub struct MarkdownReportWriter {
    file_name: String,
}

impl MarkdownReportWriter {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn render(
        &self,
        source_version: &str,
        report: &MigrationReport,
        generated_at: DateTime<Local>,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Project migration report\n");
        let _ = writeln!(
            out,
            "Project migrated from `{}` to `{}` on {}.\n",
            source_version,
            CURRENT_VERSION,
            generated_at.format("%Y-%m-%d %H:%M:%S")
        );

        if report.is_empty() {
            let _ = writeln!(out, "Nothing has been changed in the project during the migration.");
            return out;
        }

        section(&mut out, "Updated", report.updates());
        section(&mut out, "Removed", report.removals());
        out
    }
}

impl Default for MarkdownReportWriter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_FILE_NAME)
    }
}

fn section(out: &mut String, title: &str, entries: &[String]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {}\n", title);
    for entry in entries {
        let _ = writeln!(out, "- {}", entry);
    }
    out.push('\n');
}

impl ReportSink for MarkdownReportWriter {
    fn write(
        &self,
        project: &Path,
        source_version: &str,
        report: &MigrationReport,
    ) -> Result<PathBuf, MigrationError> {
        let path = project.join(&self.file_name);
        fs::write(&path, self.render(source_version, report, Local::now()))?;
        tracing::info!("Migration report written to {}", path.display());
        Ok(path)
    }
}
