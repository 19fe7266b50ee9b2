//! UI Designer artifact migration.
//!
//! Contributed to the pipeline through the step registry: when a designer URL
//! is configured, [`register`] installs [`UidArtifactsMigrationStep`] under
//! [`UID_MIGRATION_STEP_ID`], which the post list looks up.

pub mod client;
pub mod step;

use std::sync::Arc;

pub use client::{ArtifactMigrationClient, ArtifactResponse, HttpArtifactClient};
pub use step::{ArtifactKind, UidArtifactsMigrationStep};

use crate::config::DesignerConfig;
use crate::migrations::registry;
pub use crate::migrations::steps::UID_MIGRATION_STEP_ID;

/// Register the UI Designer step when `config` names a designer.
///
/// Returns whether a step was registered.
pub fn register(config: &DesignerConfig) -> bool {
    let Some(url) = &config.url else {
        tracing::debug!("No UI Designer configured, artifacts will not be migrated");
        return false;
    };
    let step = UidArtifactsMigrationStep::new(url.as_str(), Arc::new(HttpArtifactClient::default()))
        .with_retries(config.retries, config.retry_delay());
    registry::register(UID_MIGRATION_STEP_ID, step);
    true
}
