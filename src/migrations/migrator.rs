//! Entry point of a project migration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::MigrationError;
use crate::maven::{ProjectDescription, DESCRIPTOR_FILE_NAME};
use crate::migrations::command::{
    CommandContext, CommandService, ParameterizedCommand, MIGRATE_PROJECT_COMMAND_ID,
    PROJECT_PATH_PARAMETER,
};
use crate::migrations::pipeline::{MigrationPlan, Pipeline};
use crate::migrations::report::MigrationReport;
use crate::migrations::traits::ProgressMonitor;

/// Migrates one project directory in place.
///
/// Callers that need the live project to stay intact on failure go through
/// [`crate::relocation::ProjectRelocation`], which points the migrator at a
/// temporary copy.
pub struct BonitaProjectMigrator {
    project: PathBuf,
    commands: Arc<CommandService>,
}

impl BonitaProjectMigrator {
    pub fn new(project: impl Into<PathBuf>, commands: Arc<CommandService>) -> Self {
        Self {
            project: project.into(),
            commands,
        }
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    pub fn read_bonita_version(&self) -> Result<String, MigrationError> {
        Self::read_bonita_version_from(&self.project)
    }

    /// Source version held in the comment of the project descriptor.
    pub fn read_bonita_version_from(project: &Path) -> Result<String, MigrationError> {
        let description = ProjectDescription::load(project)?;
        description
            .comment()
            .map(str::to_string)
            .ok_or_else(|| {
                MigrationError::InvalidDescriptor(project.join(DESCRIPTOR_FILE_NAME).display().to_string())
            })
    }

    pub fn plan(&self, pipeline: &Pipeline) -> Result<MigrationPlan, MigrationError> {
        pipeline.plan(&self.read_bonita_version()?)
    }

    /// Run the migrate-project command on the project.
    ///
    /// User cancellation is returned as [`MigrationError::Cancelled`].
    pub async fn run(
        &self,
        monitor: Arc<dyn ProgressMonitor>,
    ) -> Result<MigrationReport, MigrationError> {
        let source_version = self.read_bonita_version()?;
        monitor.begin_task(&format!(
            "Migrating project '{}' from {}",
            self.project.display(),
            source_version
        ));

        let command = ParameterizedCommand::new(MIGRATE_PROJECT_COMMAND_ID)
            .with_parameter(PROJECT_PATH_PARAMETER, self.project.to_string_lossy());
        let result = self
            .commands
            .execute(&command, &CommandContext::with_monitor(Arc::clone(&monitor)))
            .await;
        monitor.done();

        match &result {
            Ok(report) => tracing::info!(
                "Project migrated: {} update(s), {} removal(s)",
                report.updates().len(),
                report.removals().len()
            ),
            Err(e) if e.is_cancelled() => tracing::warn!("Project migration cancelled"),
            Err(e) => tracing::error!("Project migration failed: {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maven::xml::XmlDocument;
    use crate::migrations::command::MigrateProjectHandler;
    use crate::migrations::traits::TracingProgress;
    use crate::version::CURRENT_VERSION;
    use crate::wizard::ExecuteAllPresenter;
    use std::fs;

    fn commands() -> Arc<CommandService> {
        Arc::new(CommandService::new().register(
            MIGRATE_PROJECT_COMMAND_ID,
            MigrateProjectHandler::new(Arc::new(Pipeline::new()), Arc::new(ExecuteAllPresenter)),
        ))
    }

    #[test]
    fn test_missing_descriptor() {
        let root = tempfile::tempdir().unwrap();
        let err = BonitaProjectMigrator::read_bonita_version_from(root.path()).unwrap_err();
        assert!(matches!(err, MigrationError::NoDescriptor(_)));
    }

    #[test]
    fn test_blank_version_is_invalid() {
        let root = tempfile::tempdir().unwrap();
        let mut description = ProjectDescription::new("demo", "x");
        description.set_comment("   ");
        description.save(root.path()).unwrap();
        let err = BonitaProjectMigrator::read_bonita_version_from(root.path()).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidDescriptor(_)));
    }

    #[test]
    fn test_corrupt_descriptor() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(DESCRIPTOR_FILE_NAME), "<projectDescription>").unwrap();
        let err = BonitaProjectMigrator::read_bonita_version_from(root.path()).unwrap_err();
        assert!(matches!(err, MigrationError::CantReadDescriptor { .. }));
    }

    #[test]
    fn test_plan_uses_descriptor_version() {
        let root = tempfile::tempdir().unwrap();
        ProjectDescription::new("demo", "7.12.0").save(root.path()).unwrap();
        let migrator = BonitaProjectMigrator::new(root.path(), commands());
        let plan = migrator
            .plan(&Pipeline::bonita(crate::config::Edition::Community))
            .unwrap();
        assert_eq!(plan.source_version, "7.12.0");
        assert!(plan.primary_count() > 0);
    }

    #[tokio::test]
    async fn test_run_through_command() {
        let root = tempfile::tempdir().unwrap();
        ProjectDescription::new("demo", CURRENT_VERSION).save(root.path()).unwrap();
        let migrator = BonitaProjectMigrator::new(root.path(), commands());
        let report = migrator.run(Arc::new(TracingProgress::new())).await.unwrap();
        assert!(report.is_empty());
        assert!(XmlDocument::read(&root.path().join(DESCRIPTOR_FILE_NAME)).is_ok());
    }

    #[tokio::test]
    async fn test_run_without_handler() {
        let root = tempfile::tempdir().unwrap();
        ProjectDescription::new("demo", "9.0.0").save(root.path()).unwrap();
        let migrator = BonitaProjectMigrator::new(root.path(), Arc::new(CommandService::new()));
        let err = migrator
            .run(Arc::new(TracingProgress::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::CommandNotFound(_)));
    }
}
