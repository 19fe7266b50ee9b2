//! Application context wiring configuration to the migration services.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::designer;
use crate::listener::ProjectMigrationListener;
use crate::migrations::command::{CommandService, MigrateProjectHandler, MIGRATE_PROJECT_COMMAND_ID};
use crate::migrations::migrator::BonitaProjectMigrator;
use crate::migrations::pipeline::Pipeline;
use crate::relocation::{LocalWorkspace, ProjectRelocation, Workspace};
use crate::report_writer::MarkdownReportWriter;
use crate::wizard::{ExecuteAllPresenter, WizardPresenter};

/// Root application context.
///
/// Holds the shared services; cloning is cheap.
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Planned steps, registry contributions included.
    pub pipeline: Arc<Pipeline>,
    /// Command boundary with the migrate-project handler registered.
    pub commands: Arc<CommandService>,
    pub workspace: Arc<dyn Workspace>,
}

impl Context {
    /// Context whose wizard runs every step without interaction.
    pub fn new(config: Config) -> Self {
        Self::with_presenter(config, Arc::new(ExecuteAllPresenter))
    }

    pub fn with_presenter(config: Config, presenter: Arc<dyn WizardPresenter>) -> Self {
        // Registry contributions must exist before the pipeline resolves them.
        designer::register(&config.designer);

        let pipeline = Arc::new(Pipeline::bonita(config.studio.edition));
        let commands = Arc::new(CommandService::new().register(
            MIGRATE_PROJECT_COMMAND_ID,
            MigrateProjectHandler::new(Arc::clone(&pipeline), presenter),
        ));

        Self {
            config: Arc::new(config),
            pipeline,
            commands,
            workspace: Arc::new(LocalWorkspace::new()),
        }
    }

    pub fn migrator(&self, project: &Path) -> BonitaProjectMigrator {
        BonitaProjectMigrator::new(project, Arc::clone(&self.commands))
    }

    pub fn relocation(&self) -> ProjectRelocation {
        let relocation = ProjectRelocation::new(Arc::clone(&self.workspace), Arc::clone(&self.commands))
            .with_temp_prefix(self.config.relocation.temp_prefix.as_str());
        if self.config.report.enabled {
            relocation.with_report_sink(Arc::new(MarkdownReportWriter::new(
                self.config.report.file_name.as_str(),
            )))
        } else {
            relocation
        }
    }

    pub fn listener(&self) -> ProjectMigrationListener {
        ProjectMigrationListener::new(Arc::new(self.relocation()))
    }
}
