use std::path::Path;

use crate::error::MigrationError;
use crate::maven::{self, PomModel, BDM_MODULE};
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::VersionRange;

const TITLE: &str = "Remove flatten plugin";

pub const FLATTEN_MAVEN_PLUGIN: &str = "flatten-maven-plugin";

/// Drops `flatten-maven-plugin` from the bdm parent module; the executions
/// are inherited from the Bonita project parent since 9.0.
pub struct RemoveFlattenPluginExecutionStep;

impl MigrationStep for RemoveFlattenPluginExecutionStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let mut report = MigrationReport::empty_report();
        let path = maven::module_pom(project, BDM_MODULE);
        if !path.is_file() {
            return Ok(report);
        }
        let mut model = PomModel::load(&path)?;
        if model.remove_plugin(FLATTEN_MAVEN_PLUGIN) {
            model.save(&path)?;
            tracing::info!("Removed {} from the bdm parent module", FLATTEN_MAVEN_PLUGIN);
            report.removed(
                "The `flatten-maven-plugin` executions have been removed from the Bdm parent module. They are now inherited from the Bonita project parent.",
            );
        }
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::between("8.0.0", "9.0.0").contains(source_version)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        let path = maven::module_pom(project, BDM_MODULE);
        if !path.is_file() {
            return Ok(false);
        }
        Ok(PomModel::load(&path)?.has_plugin(FLATTEN_MAVEN_PLUGIN))
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "The flatten-maven-plugin configuration of the bdm module is now inherited from the Bonita project parent.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;
    use std::fs;

    #[test]
    fn test_removes_plugin() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join(BDM_MODULE)).unwrap();
        fs::write(
            maven::module_pom(root.path(), BDM_MODULE),
            "<project><build><plugins><plugin><groupId>org.codehaus.mojo</groupId><artifactId>flatten-maven-plugin</artifactId></plugin></plugins></build></project>",
        )
        .unwrap();

        let step = RemoveFlattenPluginExecutionStep;
        assert!(step.applies_to_version("8.0.0").unwrap());
        assert!(step.applies_to_project(root.path()).unwrap());
        let report = step.run(root.path(), &TracingProgress::new()).unwrap();
        assert_eq!(report.removals().len(), 1);
        assert!(!step.applies_to_project(root.path()).unwrap());
    }

    #[test]
    fn test_missing_bdm_module_does_not_apply() {
        let root = tempfile::tempdir().unwrap();
        assert!(!RemoveFlattenPluginExecutionStep
            .applies_to_project(root.path())
            .unwrap());
        assert!(!RemoveFlattenPluginExecutionStep
            .applies_to_version("7.13.0")
            .unwrap());
    }
}
