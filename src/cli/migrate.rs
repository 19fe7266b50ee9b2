//! Migrate command handler.

use std::path::Path;
use std::sync::Arc;

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::listener::ListenerOutcome;
use crate::migrations::traits::TracingProgress;

use super::App;

impl App {
    /// Run the relocation protocol on the project, stepping through every
    /// applicable step.
    pub async fn run_migrate(&self, path: &Path) -> Result<()> {
        let config = Config::load()?;
        let ctx = Context::new(config);

        let listener = ctx.listener();
        match listener
            .on_descriptor_changed(path, Arc::new(TracingProgress::new()))
            .await
        {
            ListenerOutcome::Migrated(report) => {
                println!("Project migrated.");
                for entry in report.updates() {
                    println!("  updated: {}", entry);
                }
                for entry in report.removals() {
                    println!("  removed: {}", entry);
                }
                Ok(())
            }
            ListenerOutcome::UpToDate => {
                println!("Project is up to date, nothing to migrate.");
                Ok(())
            }
            ListenerOutcome::Ignored => {
                println!("{} is not a Bonita project.", path.display());
                Ok(())
            }
            ListenerOutcome::Incompatible { version, current } => Err(color_eyre::eyre::eyre!(
                "Project version {} cannot be migrated to {}",
                version,
                current
            )),
            ListenerOutcome::AlreadyRunning => {
                Err(color_eyre::eyre::eyre!("A migration is already in progress"))
            }
            ListenerOutcome::Cancelled => Err(color_eyre::eyre::eyre!(
                "Project migration has been cancelled, the project is unchanged"
            )),
            ListenerOutcome::Failed(message) => Err(color_eyre::eyre::eyre!(
                "Project migration failed, the project is unchanged: {}",
                message
            )),
        }
    }
}
