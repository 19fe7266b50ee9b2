//! Named command boundary between the migrator and its host.
//!
//! The migrator never opens the wizard itself: it executes the
//! [`MIGRATE_PROJECT_COMMAND_ID`] command with the project path as parameter
//! and the progress monitor in the context. Hosts register the handler that
//! fits them in a [`CommandService`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MigrationError;
use crate::migrations::migrator::BonitaProjectMigrator;
use crate::migrations::pipeline::Pipeline;
use crate::migrations::report::MigrationReport;
use crate::migrations::traits::{ProgressMonitor, TracingProgress};
use crate::wizard::{DialogResult, ProjectMigrationWizard, WizardPresenter};

pub const MIGRATE_PROJECT_COMMAND_ID: &str =
    "org.bonitasoft.studio.common.repository.migrateProjectCommand";
pub const PROJECT_PATH_PARAMETER: &str =
    "org.bonitasoft.studio.common.repository.migrateProjectCommand.path";

/// A command id with its string parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterizedCommand {
    pub id: String,
    pub parameters: HashMap<String, String>,
}

impl ParameterizedCommand {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parameters: HashMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Result<&str, MigrationError> {
        self.parameters
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| MigrationError::MissingParameter(name.to_string()))
    }
}

/// Context handed to a command handler: the caller's progress monitor.
#[derive(Clone, Default)]
pub struct CommandContext {
    pub monitor: Option<Arc<dyn ProgressMonitor>>,
}

impl CommandContext {
    pub fn with_monitor(monitor: Arc<dyn ProgressMonitor>) -> Self {
        Self {
            monitor: Some(monitor),
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        command: &ParameterizedCommand,
        context: &CommandContext,
    ) -> Result<MigrationReport, MigrationError>;
}

/// Command id to handler table.
#[derive(Clone, Default)]
pub struct CommandService {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, id: &str, handler: impl CommandHandler + 'static) -> Self {
        self.handlers.insert(id.to_string(), Arc::new(handler));
        self
    }

    pub fn is_defined(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub async fn execute(
        &self,
        command: &ParameterizedCommand,
        context: &CommandContext,
    ) -> Result<MigrationReport, MigrationError> {
        let handler = self
            .handlers
            .get(&command.id)
            .ok_or_else(|| MigrationError::CommandNotFound(command.id.clone()))?;
        handler.execute(command, context).await
    }
}

// =============================================================================
// Migrate project handler
// =============================================================================

/// Plans the migration of the project named by the path parameter, runs it
/// through a wizard and returns the aggregate report.
pub struct MigrateProjectHandler {
    pipeline: Arc<Pipeline>,
    presenter: Arc<dyn WizardPresenter>,
}

impl MigrateProjectHandler {
    pub fn new(pipeline: Arc<Pipeline>, presenter: Arc<dyn WizardPresenter>) -> Self {
        Self { pipeline, presenter }
    }
}

#[async_trait]
impl CommandHandler for MigrateProjectHandler {
    async fn execute(
        &self,
        command: &ParameterizedCommand,
        context: &CommandContext,
    ) -> Result<MigrationReport, MigrationError> {
        let project = PathBuf::from(command.parameter(PROJECT_PATH_PARAMETER)?);
        let monitor: Arc<dyn ProgressMonitor> = match &context.monitor {
            Some(monitor) => Arc::clone(monitor),
            None => Arc::new(TracingProgress::new()),
        };

        let source_version = BonitaProjectMigrator::read_bonita_version_from(&project)?;
        let plan = self.pipeline.plan(&source_version)?;
        tracing::info!(
            "Migrating '{}' from {}: {} step(s) planned",
            project.display(),
            source_version,
            plan.len()
        );

        let wizard = ProjectMigrationWizard::new(&project, &plan, monitor);
        match self.presenter.present(&wizard).await {
            DialogResult::Ok => Ok(wizard.report()),
            DialogResult::Cancel if wizard.is_cancelled() => Err(MigrationError::Cancelled),
            DialogResult::Cancel => match wizard.failure() {
                Some(message) => Err(MigrationError::step_failed(message)),
                None => Err(MigrationError::Cancelled),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maven::ProjectDescription;
    use crate::migrations::traits::{CancellationFlag, NoopStep};
    use crate::wizard::ExecuteAllPresenter;

    struct Fixed;

    #[async_trait]
    impl CommandHandler for Fixed {
        async fn execute(
            &self,
            command: &ParameterizedCommand,
            _context: &CommandContext,
        ) -> Result<MigrationReport, MigrationError> {
            let mut report = MigrationReport::empty_report();
            report.updated(command.parameter("name")?);
            Ok(report)
        }
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_id() {
        let service = CommandService::new().register("fixed", Fixed);
        let command = ParameterizedCommand::new("fixed").with_parameter("name", "hello");
        let report = service.execute(&command, &CommandContext::default()).await.unwrap();
        assert_eq!(report.updates(), ["hello"]);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let err = CommandService::new()
            .execute(&ParameterizedCommand::new("nope"), &CommandContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::CommandNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let service = CommandService::new().register("fixed", Fixed);
        let err = service
            .execute(&ParameterizedCommand::new("fixed"), &CommandContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn test_migrate_handler_with_nothing_to_do() {
        let root = tempfile::tempdir().unwrap();
        ProjectDescription::new("demo", crate::version::CURRENT_VERSION)
            .save(root.path())
            .unwrap();
        let handler = MigrateProjectHandler::new(
            Arc::new(Pipeline::new()),
            Arc::new(ExecuteAllPresenter),
        );
        let command = ParameterizedCommand::new(MIGRATE_PROJECT_COMMAND_ID)
            .with_parameter(PROJECT_PATH_PARAMETER, root.path().to_string_lossy());
        let report = handler
            .execute(&command, &CommandContext::default())
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_context_monitor_cancels_the_migration() {
        let root = tempfile::tempdir().unwrap();
        ProjectDescription::new("demo", "9.0.0").save(root.path()).unwrap();
        let handler = MigrateProjectHandler::new(
            Arc::new(Pipeline::new().register(Arc::new(NoopStep))),
            Arc::new(ExecuteAllPresenter),
        );
        let flag = CancellationFlag::new();
        flag.cancel();
        let context = CommandContext::with_monitor(Arc::new(TracingProgress::with_cancellation(flag)));
        let command = ParameterizedCommand::new(MIGRATE_PROJECT_COMMAND_ID)
            .with_parameter(PROJECT_PATH_PARAMETER, root.path().to_string_lossy());

        let err = handler.execute(&command, &context).await.unwrap_err();
        assert!(err.is_cancelled(), "{err:?}");
    }
}
