//! Reacts to project descriptor changes by checking the Bonita version of the
//! project and migrating it when needed.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::MigrationError;
use crate::maven;
use crate::migrations::migrator::BonitaProjectMigrator;
use crate::migrations::report::MigrationReport;
use crate::migrations::traits::ProgressMonitor;
use crate::relocation::ProjectRelocation;
use crate::version::{self, CURRENT_VERSION};

/// Verdict on the version found in a project descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    UpToDate,
    /// Same minor as the current version without being migratable; treated
    /// as up to date.
    SameMinor(String),
    MustMigrate(String),
    Incompatible(String),
    NotBonita,
}

/// What happened after a descriptor change.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerOutcome {
    Ignored,
    UpToDate,
    Migrated(MigrationReport),
    Incompatible { version: String, current: String },
    AlreadyRunning,
    Failed(String),
    Cancelled,
}

pub struct ProjectMigrationListener {
    relocation: Arc<ProjectRelocation>,
    in_progress: AtomicBool,
}

impl ProjectMigrationListener {
    pub fn new(relocation: Arc<ProjectRelocation>) -> Self {
        Self {
            relocation,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_migration_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    pub fn check_version(project: &Path) -> Result<VersionCheck, MigrationError> {
        if !maven::is_bonita_project(project) {
            return Ok(VersionCheck::NotBonita);
        }
        let version = match BonitaProjectMigrator::read_bonita_version_from(project) {
            Ok(version) => version,
            Err(MigrationError::InvalidDescriptor(_)) => return Ok(VersionCheck::NotBonita),
            Err(e) => return Err(e),
        };

        Ok(if version == CURRENT_VERSION {
            VersionCheck::UpToDate
        } else if version::can_be_migrated(&version) {
            VersionCheck::MustMigrate(version)
        } else if version::same_minor_version(&version) {
            VersionCheck::SameMinor(version)
        } else {
            VersionCheck::Incompatible(version)
        })
    }

    /// Handle a change of the project descriptor.
    ///
    /// At most one migration runs at a time; a change notified while one is
    /// running yields [`ListenerOutcome::AlreadyRunning`].
    pub async fn on_descriptor_changed(
        &self,
        project: &Path,
        monitor: Arc<dyn ProgressMonitor>,
    ) -> ListenerOutcome {
        let check = match Self::check_version(project) {
            Ok(check) => check,
            Err(e) => {
                tracing::error!("Failed to read the version of {}: {}", project.display(), e);
                return ListenerOutcome::Failed(e.diagnostic());
            }
        };

        match check {
            VersionCheck::NotBonita => ListenerOutcome::Ignored,
            VersionCheck::UpToDate | VersionCheck::SameMinor(_) => ListenerOutcome::UpToDate,
            VersionCheck::Incompatible(version) => {
                tracing::warn!(
                    "Project {} is at version {} which cannot be migrated to {}",
                    project.display(),
                    version,
                    CURRENT_VERSION
                );
                ListenerOutcome::Incompatible {
                    version,
                    current: CURRENT_VERSION.to_string(),
                }
            }
            VersionCheck::MustMigrate(version) => {
                if self.in_progress.swap(true, Ordering::SeqCst) {
                    tracing::debug!("Migration already in progress, ignoring change");
                    return ListenerOutcome::AlreadyRunning;
                }
                let _guard = InProgress(&self.in_progress);

                tracing::info!(
                    "Project {} must be migrated from {} to {}",
                    project.display(),
                    version,
                    CURRENT_VERSION
                );
                match self.relocation.migrate(project, monitor).await {
                    Ok(report) => ListenerOutcome::Migrated(report),
                    Err(e) if e.is_cancelled() => ListenerOutcome::Cancelled,
                    Err(e) => ListenerOutcome::Failed(e.diagnostic()),
                }
            }
        }
    }
}

struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
