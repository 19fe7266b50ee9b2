//! Bump the Bonita Reporting Application to its first compatible version.

use std::path::Path;

use crate::error::MigrationError;
use crate::maven::{self, PomModel, APP_MODULE};
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::VersionRange;

const TITLE: &str = "Update Bonita Reporting Application";

pub const GROUP_ID: &str = "com.bonitasoft.web.application";
pub const ARTIFACT_ID: &str = "bonita-reporting-application";
pub const VERSION: &str = "1.3.0";
pub const COMPATIBLE_VERSION: &str = "2.0.0";

pub struct ReportingAppUpdateMigrationStep;

fn has_outdated_reporting_app(model: &PomModel) -> bool {
    model
        .find_dependency(GROUP_ID, ARTIFACT_ID)
        .is_some_and(|d| d.version.as_deref() == Some(VERSION))
}

impl MigrationStep for ReportingAppUpdateMigrationStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let mut report = MigrationReport::empty_report();
        let path = maven::module_pom(project, APP_MODULE);
        if !path.is_file() {
            return Ok(report);
        }
        let mut model = PomModel::load(&path)?;
        if has_outdated_reporting_app(&model) {
            model.set_dependency_version(GROUP_ID, ARTIFACT_ID, COMPATIBLE_VERSION);
            model.save(&path)?;
            tracing::info!(
                "Bonita Reporting Application version updated to '{}'",
                COMPATIBLE_VERSION
            );
            report.updated(
                "Bonita Reporting Application version updated to `2.0.0`. This is the minimal compatible version with Bonita 2024.3 and above.",
            );
        }
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before("10.2.0").contains(source_version)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        let path = maven::module_pom(project, APP_MODULE);
        if !path.is_file() {
            return Ok(false);
        }
        Ok(has_outdated_reporting_app(&PomModel::load(&path)?))
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "Bonita Reporting Application 1.3.0 is not compatible with this version and is updated to 2.0.0.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;
    use std::fs;

    fn project(version: &str) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join(APP_MODULE)).unwrap();
        fs::write(
            maven::module_pom(root.path(), APP_MODULE),
            format!(
                "<project><dependencies><dependency><groupId>{GROUP_ID}</groupId><artifactId>{ARTIFACT_ID}</artifactId><version>{version}</version><type>zip</type></dependency></dependencies></project>"
            ),
        )
        .unwrap();
        root
    }

    #[test]
    fn test_updates_reporting_app() {
        let root = project(VERSION);
        let step = ReportingAppUpdateMigrationStep;
        assert!(step.applies_to_project(root.path()).unwrap());

        let report = step.run(root.path(), &TracingProgress::new()).unwrap();
        assert_eq!(report.updates().len(), 1);

        let model = PomModel::load(&maven::module_pom(root.path(), APP_MODULE)).unwrap();
        let dep = model.find_dependency(GROUP_ID, ARTIFACT_ID).unwrap();
        assert_eq!(dep.version.as_deref(), Some(COMPATIBLE_VERSION));
        assert_eq!(dep.kind.as_deref(), Some("zip"));
        assert!(!step.applies_to_project(root.path()).unwrap());
    }

    #[test]
    fn test_other_versions_are_left_alone() {
        let root = project("1.2.0");
        let step = ReportingAppUpdateMigrationStep;
        assert!(!step.applies_to_project(root.path()).unwrap());
        assert!(step
            .run(root.path(), &TracingProgress::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_version_gate() {
        let step = ReportingAppUpdateMigrationStep;
        assert!(step.applies_to_version("10.1.0").unwrap());
        assert!(!step.applies_to_version("10.2.0").unwrap());
    }
}
