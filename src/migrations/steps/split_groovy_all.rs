//! Replace the monolithic `groovy-all` dependency by Groovy modules.

use std::path::Path;

use crate::error::MigrationError;
use crate::maven::{self, Dependency, PomModel};
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::VersionRange;

const TITLE: &str = "Split groovy-all dependency";

pub const CODEHAUS_GROOVY_GROUP_ID: &str = "org.codehaus.groovy";
pub const GROOVY_ALL_ARTIFACT_ID: &str = "groovy-all";
pub const GROOVY_VERSION: &str = "3.0.19";

/// Provided Groovy modules replacing `groovy-all`.
pub const GROOVY_MODULES: &[&str] = &[
    "groovy",
    "groovy-dateutil",
    "groovy-datetime",
    "groovy-json",
    "groovy-jsr223",
    "groovy-nio",
    "groovy-sql",
    "groovy-templates",
    "groovy-xml",
];

pub struct SplitGroovyAllIntoModulesStep;

impl MigrationStep for SplitGroovyAllIntoModulesStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let mut report = MigrationReport::empty_report();
        let Some(path) = maven::app_model_path(project) else {
            return Ok(report);
        };
        let mut model = PomModel::load(&path)?;

        if model.remove_dependency(CODEHAUS_GROOVY_GROUP_ID, GROOVY_ALL_ARTIFACT_ID) {
            for module in GROOVY_MODULES {
                if !model.has_dependency(CODEHAUS_GROOVY_GROUP_ID, module) {
                    model.add_dependency(
                        &Dependency::new(CODEHAUS_GROOVY_GROUP_ID, *module)
                            .version(GROOVY_VERSION)
                            .scope("provided"),
                    );
                }
            }
            model.save(&path)?;
            tracing::info!("groovy-all dependency replaced with Groovy module dependencies");
            report.updated(format!(
                "`{CODEHAUS_GROOVY_GROUP_ID}:{GROOVY_ALL_ARTIFACT_ID}` dependency has been replaced by the Groovy modules it bundled ({}).",
                GROOVY_MODULES.join(", ")
            ));
        }
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before("10.0.0").contains(source_version)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        match maven::app_model_path(project) {
            Some(path) => Ok(PomModel::load(&path)?
                .has_dependency(CODEHAUS_GROOVY_GROUP_ID, GROOVY_ALL_ARTIFACT_ID)),
            None => Ok(false),
        }
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "The groovy-all artifact no longer exists in Groovy 3. It is replaced by the individual Groovy modules provided by the Bonita runtime.",
        )
    }
}
