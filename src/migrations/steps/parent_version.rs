//! Align the `bonita-project` parent of the root model with the runtime.

use std::path::Path;

use crate::error::MigrationError;
use crate::maven::{PomModel, POM_FILE_NAME};
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::{VersionRange, BONITA_RUNTIME_VERSION, CURRENT_VERSION};

const TITLE: &str = "Update Bonita project parent version";

pub const BONITA_PROJECT_GROUP_ID: &str = "org.bonitasoft";
pub const BONITA_PROJECT_ARTIFACT_ID: &str = "bonita-project";

pub struct BonitaProjectParentVersionStep;

fn outdated_parent(model: &PomModel) -> Option<String> {
    model
        .parent()
        .filter(|p| p.group_id == BONITA_PROJECT_GROUP_ID && p.artifact_id == BONITA_PROJECT_ARTIFACT_ID)
        .filter(|p| p.version != BONITA_RUNTIME_VERSION)
        .map(|p| p.version)
}

impl MigrationStep for BonitaProjectParentVersionStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let mut report = MigrationReport::empty_report();
        let path = project.join(POM_FILE_NAME);
        if !path.is_file() {
            return Ok(report);
        }
        let mut model = PomModel::load(&path)?;
        if let Some(previous) = outdated_parent(&model) {
            model.set_parent_version(BONITA_RUNTIME_VERSION);
            model.save(&path)?;
            tracing::info!(
                "Bonita project parent version updated from {} to {}",
                previous,
                BONITA_RUNTIME_VERSION
            );
            report.updated(format!(
                "Bonita project parent version updated from `{previous}` to `{BONITA_RUNTIME_VERSION}`."
            ));
        }
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before(CURRENT_VERSION).contains(source_version)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        let path = project.join(POM_FILE_NAME);
        if !path.is_file() {
            return Ok(false);
        }
        Ok(outdated_parent(&PomModel::load(&path)?).is_some())
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "The project parent is updated to the version matching the current Bonita runtime.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;
    use std::fs;

    #[test]
    fn test_bumps_parent_version() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(POM_FILE_NAME),
            "<project><parent><groupId>org.bonitasoft</groupId><artifactId>bonita-project</artifactId><version>9.0.0</version></parent><artifactId>p</artifactId></project>",
        )
        .unwrap();

        let step = BonitaProjectParentVersionStep;
        assert!(step.applies_to_project(root.path()).unwrap());
        let report = step.run(root.path(), &TracingProgress::new()).unwrap();
        assert_eq!(report.updates().len(), 1);

        let model = PomModel::load(&root.path().join(POM_FILE_NAME)).unwrap();
        assert_eq!(model.parent().unwrap().version, BONITA_RUNTIME_VERSION);
        assert!(!step.applies_to_project(root.path()).unwrap());
    }

    #[test]
    fn test_other_parent_is_left_alone() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(POM_FILE_NAME),
            "<project><parent><groupId>com.acme</groupId><artifactId>corporate</artifactId><version>1</version></parent></project>",
        )
        .unwrap();
        assert!(!BonitaProjectParentVersionStep
            .applies_to_project(root.path())
            .unwrap());
    }
}
