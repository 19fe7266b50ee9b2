//! Stamp the current product version into the project descriptor.

use std::path::Path;

use crate::error::MigrationError;
use crate::maven::ProjectDescription;
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::{VersionRange, CURRENT_VERSION};

const TITLE: &str = "Update project description";

pub struct UpdateProjectDescriptionMigrationStep;

impl MigrationStep for UpdateProjectDescriptionMigrationStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let mut description = ProjectDescription::load(project)?;
        let previous = description.comment().unwrap_or_default().to_string();
        description.set_comment(CURRENT_VERSION);
        description.save(project)?;
        tracing::info!("Project version updated from {} to {}", previous, CURRENT_VERSION);

        let mut report = MigrationReport::empty_report();
        report.updated(format!(
            "Project version updated from `{previous}` to `{CURRENT_VERSION}`."
        ));
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before(CURRENT_VERSION).contains(source_version)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        let description = ProjectDescription::load(project)?;
        Ok(description.comment() != Some(CURRENT_VERSION))
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "The project descriptor is updated with the current Bonita version.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;

    #[test]
    fn test_updates_comment() {
        let root = tempfile::tempdir().unwrap();
        ProjectDescription::new("p", "7.12.0").save(root.path()).unwrap();

        let step = UpdateProjectDescriptionMigrationStep;
        assert!(step.applies_to_project(root.path()).unwrap());
        let report = step.run(root.path(), &TracingProgress::new()).unwrap();
        assert_eq!(
            report.updates(),
            ["Project version updated from `7.12.0` to `10.2.0`."]
        );
        let description = ProjectDescription::load(root.path()).unwrap();
        assert_eq!(description.comment(), Some(CURRENT_VERSION));
        assert_eq!(description.name(), Some("p"));
        assert!(!step.applies_to_project(root.path()).unwrap());
    }

    #[test]
    fn test_missing_descriptor_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(UpdateProjectDescriptionMigrationStep
            .applies_to_project(root.path())
            .is_err());
    }
}
