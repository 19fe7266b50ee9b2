//! Switch a community project to enterprise artifacts.
//!
//! Runs after the primary list so it only ever sees the current layout.

use std::path::Path;

use crate::config::Edition;
use crate::error::MigrationError;
use crate::maven::{self, xml::Element, Dependency, PomModel, APP_MODULE};
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};

const TITLE: &str = "Community to Enterprise";

const BONITA_COMMON_GROUP_ID: &str = "org.bonitasoft.runtime";
const BONITA_COMMON_ARTIFACT_ID: &str = "bonita-common";
const BONITA_COMMON_SP_GROUP_ID: &str = "com.bonitasoft.runtime";
const BONITA_COMMON_SP_ARTIFACT_ID: &str = "bonita-common-sp";

const ADMIN_APP_GROUP_ID: &str = "org.bonitasoft.web.application";
const ADMIN_APP_ARTIFACT_ID: &str = "bonita-admin-application";
const ADMIN_APP_EE_GROUP_ID: &str = "com.bonitasoft.web.application";
const ADMIN_APP_EE_ARTIFACT_ID: &str = "bonita-admin-application-sp";

const DOCKER_PROFILE_ID: &str = "docker";
const DOCKER_BASE_IMAGE_REPOSITORY_PROPERTY: &str = "docker.baseImageRepository";
const ENTERPRISE_DOCKER_IMAGE_REPOSITORY: &str = "bonitasoft.jfrog.io/docker/bonita-subscription";

const BUNDLE_PROFILE_ID: &str = "bundle";
const MAVEN_DEPENDENCY_PLUGIN: &str = "maven-dependency-plugin";
const MAVEN_ASSEMBLY_PLUGIN: &str = "maven-assembly-plugin";

pub struct CommunityToEnterpriseMigrationStep {
    edition: Edition,
}

impl CommunityToEnterpriseMigrationStep {
    pub fn new(edition: Edition) -> Self {
        Self { edition }
    }

    /// Apply the enterprise changes to an app model.
    pub fn migrate(&self, model: &mut PomModel) -> MigrationReport {
        let mut report = MigrationReport::empty_report();

        if let Some(common) = model.find_dependency(BONITA_COMMON_GROUP_ID, BONITA_COMMON_ARTIFACT_ID) {
            let mut replacement = Dependency::new(BONITA_COMMON_SP_GROUP_ID, BONITA_COMMON_SP_ARTIFACT_ID);
            replacement.version = common.version;
            model.replace_dependency(BONITA_COMMON_GROUP_ID, BONITA_COMMON_ARTIFACT_ID, &replacement);
            report.updated("`bonita-common` dependency has been replaced by `bonita-common-sp`.");
        }

        if let Some(admin) = model.find_dependency(ADMIN_APP_GROUP_ID, ADMIN_APP_ARTIFACT_ID) {
            let mut replacement = Dependency::new(ADMIN_APP_EE_GROUP_ID, ADMIN_APP_EE_ARTIFACT_ID);
            replacement.version = admin.version;
            model.replace_dependency(ADMIN_APP_GROUP_ID, ADMIN_APP_ARTIFACT_ID, &replacement);
            report.updated("Bonita Admin Application has been upgraded to Enterprise edition.");
        }

        if let Some(docker) = model.profile_mut(DOCKER_PROFILE_ID) {
            docker
                .ensure_child("properties")
                .set_child_text(DOCKER_BASE_IMAGE_REPOSITORY_PROPERTY, ENTERPRISE_DOCKER_IMAGE_REPOSITORY);
        }

        if let Some(bundle) = model.profile_mut(BUNDLE_PROFILE_ID) {
            rename_execution(bundle, MAVEN_DEPENDENCY_PLUGIN, "prepare-bundle", "prepare-bundle-enterprise");
            rename_execution(bundle, MAVEN_ASSEMBLY_PLUGIN, "bundle-archive", "bundle-archive-enterprise");
        }

        report
    }
}

fn rename_execution(profile: &mut Element, artifact_id: &str, from: &str, to: &str) {
    let Some(plugins) = profile.path_mut(&["build", "plugins"]) else {
        return;
    };
    for plugin in plugins
        .children_named_mut("plugin")
        .filter(|p| p.child_text("artifactId") == Some(artifact_id))
    {
        if let Some(executions) = plugin.child_mut("executions") {
            if let Some(execution) = executions
                .children_named_mut("execution")
                .find(|e| e.child_text("id") == Some(from))
            {
                execution.set_child_text("id", to);
                return;
            }
        }
    }
}

impl MigrationStep for CommunityToEnterpriseMigrationStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let path = maven::module_pom(project, APP_MODULE);
        let mut model = PomModel::load(&path)?;
        let report = self.migrate(&mut model);
        model.save(&path)?;
        Ok(report)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        if self.edition != Edition::Enterprise {
            return Ok(false);
        }
        let path = maven::module_pom(project, APP_MODULE);
        if !path.is_file() {
            return Ok(false);
        }
        Ok(PomModel::load(&path)?.has_dependency(BONITA_COMMON_GROUP_ID, BONITA_COMMON_ARTIFACT_ID))
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "Community artifacts of the project are replaced by their Enterprise counterparts.",
        )
    }
}
