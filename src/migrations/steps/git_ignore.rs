//! Keep the project `.gitignore` in line with the current layout.

use std::fs;
use std::path::Path;

use crate::error::MigrationError;
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::{VersionRange, CURRENT_VERSION};

const TITLE: &str = "Update .gitignore";

pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Entries every Bonita project ignores.
pub const GITIGNORE_ENTRIES: &[&str] = &[
    "target/",
    ".settings/",
    ".classpath",
    ".metadata/",
    "node_modules/",
    "*.log",
    ".DS_Store",
];

pub struct GitIgnoreMigrationStep;

impl GitIgnoreMigrationStep {
    fn missing_entries(project: &Path) -> Result<Vec<&'static str>, MigrationError> {
        let path = project.join(GITIGNORE_FILE_NAME);
        let content = if path.is_file() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        let present: Vec<&str> = content.lines().map(str::trim).collect();
        Ok(GITIGNORE_ENTRIES
            .iter()
            .copied()
            .filter(|entry| !present.contains(entry))
            .collect())
    }
}

impl MigrationStep for GitIgnoreMigrationStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let mut report = MigrationReport::empty_report();
        let missing = Self::missing_entries(project)?;
        if missing.is_empty() {
            return Ok(report);
        }

        let path = project.join(GITIGNORE_FILE_NAME);
        let mut content = if path.is_file() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        for entry in &missing {
            content.push_str(entry);
            content.push('\n');
        }
        fs::write(&path, content)
            .map_err(|e| MigrationError::step_failed_with("Failed to update .gitignore file.", e))?;

        tracing::info!("Added {} entries to {}", missing.len(), GITIGNORE_FILE_NAME);
        report.updated(format!(
            "`.gitignore` file has been updated with the following entries: {}",
            missing
                .iter()
                .map(|e| format!("`{e}`"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before(CURRENT_VERSION).contains(source_version)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        Ok(!Self::missing_entries(project)?.is_empty())
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "Build outputs and IDE metadata are added to the project .gitignore file.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;

    #[test]
    fn test_appends_only_missing_entries() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(GITIGNORE_FILE_NAME), "target/\nmy-secret.txt").unwrap();

        let step = GitIgnoreMigrationStep;
        assert!(step.applies_to_project(root.path()).unwrap());
        let report = step.run(root.path(), &TracingProgress::new()).unwrap();
        assert_eq!(report.updates().len(), 1);

        let content = fs::read_to_string(root.path().join(GITIGNORE_FILE_NAME)).unwrap();
        assert!(content.starts_with("target/\nmy-secret.txt\n"));
        assert_eq!(content.matches("target/").count(), 1);
        for entry in GITIGNORE_ENTRIES {
            assert!(content.lines().any(|l| l == *entry), "{entry}");
        }
        assert!(!step.applies_to_project(root.path()).unwrap());
    }

    #[test]
    fn test_creates_missing_file() {
        let root = tempfile::tempdir().unwrap();
        GitIgnoreMigrationStep
            .run(root.path(), &TracingProgress::new())
            .unwrap();
        assert!(root.path().join(GITIGNORE_FILE_NAME).is_file());
    }

    #[test]
    fn test_version_gate() {
        let step = GitIgnoreMigrationStep;
        assert!(step.applies_to_version("10.1.0").unwrap());
        assert!(!step.applies_to_version(CURRENT_VERSION).unwrap());
    }
}
