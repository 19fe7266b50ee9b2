//! Bonita project migration pipeline.
//!
//! Steps are:
//! - **Idempotent**: re-running a step after success is a no-op (`applies_to_project` turns false)
//! - **Ordered**: the primary list runs in a fixed order, later steps rely on earlier ones
//! - **Version-gated**: each step declares the source versions it is needed for
//! - **Forward-only**: no rollback; safety comes from running on a copy (see [`crate::relocation`])
//!
//! [`Pipeline`] plans the steps for a source version, the [`command`]
//! boundary hands the plan to a wizard, and [`BonitaProjectMigrator`] ties
//! both to a project directory.

pub mod command;
pub mod migrator;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod steps;
pub mod traits;

pub use command::{
    CommandContext, CommandHandler, CommandService, MigrateProjectHandler, ParameterizedCommand,
    MIGRATE_PROJECT_COMMAND_ID, PROJECT_PATH_PARAMETER,
};
pub use migrator::BonitaProjectMigrator;
pub use pipeline::{MigrationPlan, Pipeline, PlannedStep};
pub use report::{MigrationReport, StepDescription};
pub use traits::{CancellationFlag, MigrationStep, NoopStep, ProgressMonitor, TracingProgress};
