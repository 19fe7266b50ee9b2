//! Migrate a project on a disposable copy, then promote the copy.
//!
//! The live project is closed, copied to a temporary directory, and the
//! pipeline runs on the copy only. The copy replaces the live tree only after
//! the whole pipeline succeeded. Whatever happens, the temporary directory is
//! removed and the live project is reopened.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::MigrationError;
use crate::fsutil;
use crate::migrations::command::CommandService;
use crate::migrations::migrator::BonitaProjectMigrator;
use crate::migrations::report::MigrationReport;
use crate::migrations::traits::ProgressMonitor;
use crate::report_writer::ReportSink;

// =============================================================================
// Workspace
// =============================================================================

/// Registration of projects in the host.
pub trait Workspace: Send + Sync {
    /// Release every handle on the project.
    fn close(&self, project: &Path);

    fn open(&self, project: &Path);

    fn is_open(&self, project: &Path) -> bool;

    /// Replace the contents of `live` by those of `migrated`.
    ///
    /// On failure `live` must be left as it was.
    fn replace(&self, live: &Path, migrated: &Path) -> Result<(), MigrationError>;
}

/// Workspace backed by the local file system.
#[derive(Debug, Default)]
pub struct LocalWorkspace {
    open: Mutex<HashSet<PathBuf>>,
}

impl LocalWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn backup_path(live: &Path) -> PathBuf {
        let name = live
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        live.with_file_name(format!(".{}.migration-backup", name))
    }
}

impl Workspace for LocalWorkspace {
    fn close(&self, project: &Path) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project);
        tracing::debug!("Closed project {}", project.display());
    }

    fn open(&self, project: &Path) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project.to_path_buf());
        tracing::debug!("Opened project {}", project.display());
    }

    fn is_open(&self, project: &Path) -> bool {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(project)
    }

    fn replace(&self, live: &Path, migrated: &Path) -> Result<(), MigrationError> {
        let backup = Self::backup_path(live);
        fsutil::delete_dir(&backup).map_err(MigrationError::Backup)?;
        fs::rename(live, &backup).map_err(MigrationError::Backup)?;

        if let Err(e) = fsutil::copy_dir(migrated, live) {
            tracing::error!("Promotion of migrated project failed, restoring backup: {}", e);
            let restored = fsutil::delete_dir(live).and_then(|_| fs::rename(&backup, live));
            if let Err(restore) = restored {
                tracing::error!(
                    "Failed to restore {} from {}: {}",
                    live.display(),
                    backup.display(),
                    restore
                );
            }
            return Err(MigrationError::CopyToWorkspace(e));
        }

        if let Err(e) = fsutil::delete_dir(&backup) {
            tracing::warn!("Failed to delete backup {}: {}", backup.display(), e);
        }
        Ok(())
    }
}

// =============================================================================
// Relocation
// =============================================================================

pub struct ProjectRelocation {
    workspace: Arc<dyn Workspace>,
    commands: Arc<CommandService>,
    sink: Option<Arc<dyn ReportSink>>,
    temp_prefix: String,
}

impl ProjectRelocation {
    pub fn new(workspace: Arc<dyn Workspace>, commands: Arc<CommandService>) -> Self {
        Self {
            workspace,
            commands,
            sink: None,
            temp_prefix: "migration-tmp".to_string(),
        }
    }

    pub fn with_report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    /// Migrate `project`, leaving it either fully migrated or untouched, and open.
    pub async fn migrate(
        &self,
        project: &Path,
        monitor: Arc<dyn ProgressMonitor>,
    ) -> Result<MigrationReport, MigrationError> {
        let source_version = BonitaProjectMigrator::read_bonita_version_from(project)?;

        self.workspace.close(project);
        let result = self.migrate_closed(project, &source_version, monitor).await;
        self.workspace.open(project);
        result
    }

    async fn migrate_closed(
        &self,
        project: &Path,
        source_version: &str,
        monitor: Arc<dyn ProgressMonitor>,
    ) -> Result<MigrationReport, MigrationError> {
        let tmp = tempfile::Builder::new()
            .prefix(&self.temp_prefix)
            .tempdir()
            .map_err(MigrationError::Backup)?;
        let name = project.file_name().map_or_else(|| "project".into(), |n| n.to_os_string());
        let copy = tmp.path().join(name);

        let result = self.migrate_copy(project, &copy, source_version, monitor).await;

        let tmp_path = tmp.path().to_path_buf();
        if let Err(e) = tmp.close() {
            tracing::warn!("Failed to delete temporary directory {}: {}", tmp_path.display(), e);
        }
        result
    }

    async fn migrate_copy(
        &self,
        project: &Path,
        copy: &Path,
        source_version: &str,
        monitor: Arc<dyn ProgressMonitor>,
    ) -> Result<MigrationReport, MigrationError> {
        tracing::info!("Copying {} to {}", project.display(), copy.display());
        let (source, target) = (project.to_path_buf(), copy.to_path_buf());
        blocking(move || fsutil::copy_dir(&source, &target))
            .await
            .map_err(MigrationError::Backup)?;

        let report = BonitaProjectMigrator::new(copy, Arc::clone(&self.commands))
            .run(monitor)
            .await?;

        tracing::info!("Replacing {} with its migrated copy", project.display());
        let workspace = Arc::clone(&self.workspace);
        let (live, migrated) = (project.to_path_buf(), copy.to_path_buf());
        tokio::task::spawn_blocking(move || workspace.replace(&live, &migrated))
            .await
            .map_err(|e| MigrationError::CopyToWorkspace(io::Error::other(e)))??;

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.write(project, source_version, &report) {
                tracing::warn!("Failed to write migration report: {}", e);
            }
        }
        Ok(report)
    }
}

async fn blocking<F>(f: F) -> io::Result<()>
where
    F: FnOnce() -> io::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}
