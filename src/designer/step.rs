//! Migration of UI Designer artifacts through the designer's REST endpoints.
//!
//! Provided widgets are deleted, then every custom widget, fragment and page
//! descriptor is sent to `PUT {url}/bonita/rest/migration/{kind}/{id}`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::client::{ArtifactMigrationClient, ArtifactResponse};
use crate::error::MigrationError;
use crate::fsutil;
use crate::maven::APP_MODULE;
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};

const TITLE: &str = "UI Designer artifacts";

pub const WIDGETS_FOLDER: &str = "web_widgets";
pub const FRAGMENTS_FOLDER: &str = "web_fragments";
pub const PAGES_FOLDER: &str = "web_page";

/// Prefix of the widget folders provided by the UI Designer itself.
const PROVIDED_WIDGET_PREFIX: &str = "pb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Widget,
    Fragment,
    Page,
}

impl ArtifactKind {
    fn folder(self) -> &'static str {
        match self {
            Self::Widget => WIDGETS_FOLDER,
            Self::Fragment => FRAGMENTS_FOLDER,
            Self::Page => PAGES_FOLDER,
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            Self::Widget => "widget",
            Self::Fragment => "fragment",
            Self::Page => "page",
        }
    }

    fn accepts(self, descriptor: &ArtifactDescriptor) -> bool {
        match self {
            Self::Widget => descriptor.kind == "widget" && descriptor.custom == Some(true),
            Self::Fragment => descriptor.kind == "fragment",
            Self::Page => matches!(descriptor.kind.as_str(), "page" | "layout" | "form"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactDescriptor {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    custom: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct MigrationStatus {
    #[serde(default)]
    status: Option<String>,
}

/// Asks a running UI Designer to migrate the custom widgets, fragments and
/// pages of the project.
pub struct UidArtifactsMigrationStep {
    base_url: String,
    client: Arc<dyn ArtifactMigrationClient>,
    retries: u32,
    retry_delay: Duration,
}

impl UidArtifactsMigrationStep {
    pub fn new(base_url: impl Into<String>, client: Arc<dyn ArtifactMigrationClient>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            retries: 10,
            retry_delay: Duration::from_secs(2),
        }
    }

    pub fn with_retries(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn migration_uri(&self, kind: ArtifactKind, id: &str) -> String {
        format!("{}/bonita/rest/migration/{}/{}", self.base_url, kind.endpoint(), id)
    }

    /// Initial attempt plus `retries` retries, a fixed delay apart.
    fn put_until_ok(&self, uri: &str) -> Result<ArtifactResponse, MigrationError> {
        for attempt in 0..=self.retries {
            match self.client.put(uri) {
                Ok(response) if response.status == 200 => return Ok(response),
                Ok(response) => {
                    tracing::debug!("PUT {} returned {} (attempt {})", uri, response.status, attempt + 1)
                }
                Err(e) => tracing::debug!("PUT {} failed (attempt {}): {}", uri, attempt + 1, e),
            }
            if attempt < self.retries {
                std::thread::sleep(self.retry_delay);
            }
        }
        Err(MigrationError::step_failed(format!("Failed to put on {}", uri)))
    }

    fn remove_provided_widgets(&self, widgets: &Path) -> Result<(), MigrationError> {
        if !widgets.is_dir() {
            return Ok(());
        }
        let provided = fs::read_dir(widgets)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_dir()
                    && path
                        .file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with(PROVIDED_WIDGET_PREFIX))
            });
        for widget in provided {
            fsutil::delete_dir(&widget)
                .map_err(|e| MigrationError::step_failed_with("Failed to delete provided widgets.", e))?;
        }
        Ok(())
    }

    fn migrate_kind(
        &self,
        workspace: &Path,
        kind: ArtifactKind,
        monitor: &dyn ProgressMonitor,
        report: &mut MigrationReport,
        errors: &mut Vec<String>,
    ) -> Result<(), MigrationError> {
        let folder = workspace.join(kind.folder());
        if !folder.is_dir() {
            return Ok(());
        }
        tracing::info!("Migrating UI Designer {}s...", kind.endpoint());

        let mut artifacts: Vec<PathBuf> = fs::read_dir(&folder)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        artifacts.sort();

        for artifact in artifacts {
            if monitor.is_cancelled() {
                return Err(MigrationError::Cancelled);
            }
            let Some(file) = descriptor_file(&artifact)? else {
                continue;
            };
            let descriptor: ArtifactDescriptor = serde_json::from_str(&fs::read_to_string(&file)?)?;
            if !kind.accepts(&descriptor) {
                continue;
            }

            monitor.sub_task(&format!("Migrating {} {}", kind.endpoint(), descriptor.id));
            let uri = self.migration_uri(kind, &descriptor.id);
            let response = self.put_until_ok(&uri)?;
            match parse_status(&response.body).as_deref() {
                Some("incompatible") => {
                    tracing::info!("{} cannot be migrated", descriptor.id);
                    errors.push(format!(
                        "`{}` is not compatible with this version of the UI Designer.",
                        descriptor.id
                    ));
                }
                Some("error") => {
                    tracing::info!("{} migration failed", descriptor.id);
                    errors.push(format!("An error occurred while migrating `{}`.", descriptor.id));
                }
                Some("warning") => {
                    tracing::warn!("{} migrated with warnings", descriptor.id);
                    report.updated(format!(
                        "`{}` has been migrated with warnings. Check it in the UI Designer.",
                        descriptor.id
                    ));
                }
                Some("success") => tracing::info!("{} migrated successfully", descriptor.id),
                _ => {}
            }
        }
        Ok(())
    }
}

/// The JSON descriptor of an artifact folder: `<name>/<name>.json`, else the
/// first JSON file by name. Nested folders are not visited.
fn descriptor_file(artifact: &Path) -> Result<Option<PathBuf>, MigrationError> {
    if let Some(name) = artifact.file_name() {
        let preferred = artifact.join(format!("{}.json", name.to_string_lossy()));
        if preferred.is_file() {
            return Ok(Some(preferred));
        }
    }
    let mut candidates: Vec<PathBuf> = fs::read_dir(artifact)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "json"))
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}

fn parse_status(body: &str) -> Option<String> {
    serde_json::from_str::<MigrationStatus>(body)
        .ok()
        .and_then(|s| s.status)
}

impl MigrationStep for UidArtifactsMigrationStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(TITLE);
        let workspace = project.join(APP_MODULE);
        let mut report = MigrationReport::empty_report();
        let mut errors = Vec::new();

        self.remove_provided_widgets(&workspace.join(WIDGETS_FOLDER))?;
        for kind in [ArtifactKind::Widget, ArtifactKind::Fragment, ArtifactKind::Page] {
            self.migrate_kind(&workspace, kind, monitor, &mut report, &mut errors)?;
        }

        if !errors.is_empty() {
            return Err(MigrationError::step_failed(errors.join("\n")));
        }
        Ok(report)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        let workspace = project.join(APP_MODULE);
        Ok([WIDGETS_FOLDER, FRAGMENTS_FOLDER, PAGES_FOLDER]
            .iter()
            .any(|folder| workspace.join(folder).is_dir()))
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "Custom widgets, fragments and pages are migrated by the UI Designer to its current model version.",
        )
    }
}
