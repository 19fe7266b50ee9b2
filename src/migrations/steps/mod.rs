//! Concrete migration steps.
//!
//! Steps are listed in [`primary_steps`] in the order they must run: later
//! steps check the project content left by earlier ones. Never reorder them.

mod community_to_enterprise;
mod delete_project_settings;
mod extensions_module;
mod git_ignore;
mod notices;
mod parent_version;
mod remove_flatten_plugin;
mod reporting_app;
mod split_groovy_all;
mod update_project_description;

use std::sync::Arc;

pub use community_to_enterprise::CommunityToEnterpriseMigrationStep;
pub use delete_project_settings::DeleteProjectSettingsMigrationStep;
pub use extensions_module::{ExtensionsModuleMigrationStep, LEGACY_EXTENSION_FOLDERS};
pub use git_ignore::{GitIgnoreMigrationStep, GITIGNORE_ENTRIES, GITIGNORE_FILE_NAME};
pub use notices::{Java17UpdateStep, ProvidedGroovyScriptRemovedStep};
pub use parent_version::BonitaProjectParentVersionStep;
pub use remove_flatten_plugin::RemoveFlattenPluginExecutionStep;
pub use reporting_app::ReportingAppUpdateMigrationStep;
pub use split_groovy_all::{
    SplitGroovyAllIntoModulesStep, CODEHAUS_GROOVY_GROUP_ID, GROOVY_ALL_ARTIFACT_ID,
    GROOVY_MODULES,
};
pub use update_project_description::UpdateProjectDescriptionMigrationStep;

use crate::config::Edition;
use crate::migrations::registry;
use crate::migrations::traits::MigrationStep;

/// Registry id of the UI Designer artifacts step.
pub const UID_MIGRATION_STEP_ID: &str = "UidMigrationStep";

/// The primary list, in execution order.
pub fn primary_steps() -> Vec<Arc<dyn MigrationStep>> {
    vec![
        Arc::new(SplitGroovyAllIntoModulesStep),
        Arc::new(GitIgnoreMigrationStep),
        Arc::new(DeleteProjectSettingsMigrationStep),
        Arc::new(UpdateProjectDescriptionMigrationStep),
        Arc::new(ExtensionsModuleMigrationStep),
        Arc::new(ProvidedGroovyScriptRemovedStep),
        Arc::new(BonitaProjectParentVersionStep),
        Arc::new(RemoveFlattenPluginExecutionStep),
        Arc::new(Java17UpdateStep),
        Arc::new(ReportingAppUpdateMigrationStep),
    ]
}

/// Steps that assume the layout produced by the primary list.
///
/// The registry is queried at call time, so contributions registered before
/// the pipeline is assembled are picked up.
pub fn post_steps(edition: Edition) -> Vec<Arc<dyn MigrationStep>> {
    vec![
        Arc::new(CommunityToEnterpriseMigrationStep::new(edition)),
        registry::lookup(UID_MIGRATION_STEP_ID),
    ]
}
