//! Migration step contract.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::MigrationError;
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::version::ProductVersion;

// =============================================================================
// Progress
// =============================================================================

/// Progress sink handed to running steps.
pub trait ProgressMonitor: Send + Sync {
    fn begin_task(&self, name: &str);

    fn sub_task(&self, name: &str);

    fn done(&self) {}

    /// Steps should poll this between units of work and return
    /// [`MigrationError::Cancelled`] once it turns true.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared user-cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reports progress through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingProgress {
    cancellation: CancellationFlag,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancellation: CancellationFlag) -> Self {
        Self { cancellation }
    }
}

impl ProgressMonitor for TracingProgress {
    fn begin_task(&self, name: &str) {
        tracing::info!("{}", name);
    }

    fn sub_task(&self, name: &str) {
        tracing::debug!("  {}", name);
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

// =============================================================================
// Migration Step
// =============================================================================

/// An idempotent transformation of a project tree.
///
/// Steps are constructed once and reused. A step only relies on what earlier
/// steps left on disk, never on in-memory state from a previous run.
pub trait MigrationStep: Send + Sync {
    /// Apply the transformation. Callers check [`MigrationStep::applies_to_project`] first.
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError>;

    /// Whether the step is needed for a project at `source_version`.
    ///
    /// Must fail with [`MigrationError::InvalidVersion`] on an unparsable
    /// version rather than answer `false`.
    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        ProductVersion::parse(source_version)?;
        Ok(true)
    }

    /// Whether the project content needs the step.
    ///
    /// An error here means applicability could not be determined (missing or
    /// corrupt prerequisite); it is not the same as `Ok(false)`.
    fn applies_to_project(&self, _project: &Path) -> Result<bool, MigrationError> {
        Ok(true)
    }

    fn description(&self) -> StepDescription {
        let name = std::any::type_name_of_val(self);
        let short = name.rsplit("::").next().unwrap_or(name);
        StepDescription::new(short, "")
    }
}

/// Step standing in for an id nobody registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStep;

impl MigrationStep for NoopStep {
    fn run(
        &self,
        _project: &Path,
        _monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        Ok(MigrationReport::empty_report())
    }
}
