//! Ordered step lists and version planning.

use std::sync::Arc;

use crate::config::Edition;
use crate::error::MigrationError;
use crate::migrations::report::StepDescription;
use crate::migrations::steps;
use crate::migrations::traits::MigrationStep;
use crate::version::ProductVersion;

/// A step selected for a migration run.
#[derive(Clone)]
pub struct PlannedStep {
    pub step: Arc<dyn MigrationStep>,
    /// Source version still to be checked against the step, for steps that
    /// were not filtered at planning time.
    pub version_gate: Option<String>,
    pub post: bool,
}

impl PlannedStep {
    pub fn description(&self) -> StepDescription {
        self.step.description()
    }
}

/// Steps to run for one source version, in execution order.
#[derive(Clone)]
pub struct MigrationPlan {
    pub source_version: String,
    pub steps: Vec<PlannedStep>,
}

impl MigrationPlan {
    pub fn primary_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.post).count()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn descriptions(&self) -> Vec<StepDescription> {
        self.steps.iter().map(PlannedStep::description).collect()
    }
}

/// Primary steps filtered by version, followed by post steps.
///
/// Post steps are kept as-is at planning time; the wizard checks them against
/// the version and the project content when it reaches them.
#[derive(Clone, Default)]
pub struct Pipeline {
    primary: Vec<Arc<dyn MigrationStep>>,
    post: Vec<Arc<dyn MigrationStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, step: Arc<dyn MigrationStep>) -> Self {
        self.primary.push(step);
        self
    }

    pub fn register_post(mut self, step: Arc<dyn MigrationStep>) -> Self {
        self.post.push(step);
        self
    }

    /// The Bonita project pipeline.
    ///
    /// Registry-contributed post steps are resolved now: register them before
    /// calling this.
    pub fn bonita(edition: Edition) -> Self {
        let pipeline = steps::primary_steps()
            .into_iter()
            .fold(Self::new(), Self::register);
        steps::post_steps(edition)
            .into_iter()
            .fold(pipeline, Self::register_post)
    }

    pub fn primary(&self) -> &[Arc<dyn MigrationStep>] {
        &self.primary
    }

    pub fn post(&self) -> &[Arc<dyn MigrationStep>] {
        &self.post
    }

    pub fn plan(&self, source_version: &str) -> Result<MigrationPlan, MigrationError> {
        ProductVersion::parse(source_version)?;

        let mut steps = Vec::with_capacity(self.primary.len() + self.post.len());
        for step in &self.primary {
            if step.applies_to_version(source_version)? {
                steps.push(PlannedStep {
                    step: Arc::clone(step),
                    version_gate: None,
                    post: false,
                });
            } else {
                tracing::debug!(
                    "Step '{}' does not apply to version {}",
                    step.description().title,
                    source_version
                );
            }
        }
        steps.extend(self.post.iter().map(|step| PlannedStep {
            step: Arc::clone(step),
            version_gate: Some(source_version.to_string()),
            post: true,
        }));

        Ok(MigrationPlan {
            source_version: source_version.to_string(),
            steps,
        })
    }
}
