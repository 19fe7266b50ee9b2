//! Drop stale IDE settings so they get regenerated from the build descriptor.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::MigrationError;
use crate::maven::APP_MODULE;
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version;

const TITLE: &str = "Delete project settings";

pub struct DeleteProjectSettingsMigrationStep;

fn settings_files(project: &Path) -> [PathBuf; 2] {
    let settings = project.join(APP_MODULE).join(".settings");
    [
        settings.join("org.eclipse.jdt.groovy.core.prefs"),
        settings.join("org.eclipse.jdt.core.prefs"),
    ]
}

impl MigrationStep for DeleteProjectSettingsMigrationStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        for file in settings_files(project) {
            match fs::remove_file(&file) {
                Ok(()) => tracing::debug!("Deleted {}", file.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                // Housekeeping only: the settings are regenerated anyway.
                Err(e) => tracing::warn!("Failed to delete {}: {}", file.display(), e),
            }
        }
        Ok(MigrationReport::empty_report())
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        version::ProductVersion::parse(source_version)?;
        Ok(!version::same_minor_version(source_version) && version::can_be_migrated(source_version))
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        Ok(settings_files(project).iter().any(|f| f.exists()))
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "Project settings are recreated from the pom.xml file of the app module.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;

    #[test]
    fn test_deletes_prefs() {
        let root = tempfile::tempdir().unwrap();
        let settings = root.path().join("app/.settings");
        fs::create_dir_all(&settings).unwrap();
        fs::write(settings.join("org.eclipse.jdt.core.prefs"), "x").unwrap();
        fs::write(settings.join("org.eclipse.core.resources.prefs"), "keep").unwrap();

        let step = DeleteProjectSettingsMigrationStep;
        assert!(step.applies_to_project(root.path()).unwrap());
        let report = step.run(root.path(), &TracingProgress::new()).unwrap();
        assert!(report.is_empty());
        assert!(!settings.join("org.eclipse.jdt.core.prefs").exists());
        assert!(settings.join("org.eclipse.core.resources.prefs").exists());
        assert!(!step.applies_to_project(root.path()).unwrap());
    }

    #[test]
    fn test_version_gate() {
        let step = DeleteProjectSettingsMigrationStep;
        assert!(step.applies_to_version("7.12.0").unwrap());
        assert!(!step.applies_to_version("10.2.0").unwrap());
        assert!(!step.applies_to_version("7.9.0").unwrap());
        assert!(step.applies_to_version("oops").is_err());
    }
}
