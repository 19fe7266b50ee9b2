//! Ways of walking a wizard to completion.

use async_trait::async_trait;

use super::{MigrationStepPage, ProjectMigrationWizard};

/// Outcome of a wizard dialog.
///
/// `Ok` means every visited page ended executed or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Ok,
    Cancel,
}

#[async_trait]
pub trait WizardPresenter: Send + Sync {
    async fn present(&self, wizard: &ProjectMigrationWizard) -> DialogResult;
}

/// Runs every remaining page, then finishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteAllPresenter;

#[async_trait]
impl WizardPresenter for ExecuteAllPresenter {
    async fn present(&self, wizard: &ProjectMigrationWizard) -> DialogResult {
        if wizard.execute_all().await && wizard.perform_finish().await {
            DialogResult::Ok
        } else {
            DialogResult::Cancel
        }
    }
}

/// What the observer wants after seeing a finished page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    Continue,
    Cancel,
}

type PageObserver = dyn Fn(&MigrationStepPage) -> PageDecision + Send + Sync;

/// Visits pages one by one and asks an observer before moving on.
pub struct StepByStepPresenter {
    observer: Box<PageObserver>,
}

impl StepByStepPresenter {
    pub fn new<F>(observer: F) -> Self
    where
        F: Fn(&MigrationStepPage) -> PageDecision + Send + Sync + 'static,
    {
        Self {
            observer: Box::new(observer),
        }
    }
}

#[async_trait]
impl WizardPresenter for StepByStepPresenter {
    async fn present(&self, wizard: &ProjectMigrationWizard) -> DialogResult {
        let mut current = wizard.start();
        while let Some(page) = current {
            page.wait_while_in_progress().await;
            if (self.observer)(page.as_ref()) == PageDecision::Cancel {
                wizard.cancel();
                return DialogResult::Cancel;
            }
            if !page.is_page_complete() {
                return DialogResult::Cancel;
            }
            current = wizard.next();
        }

        if wizard.perform_finish().await {
            DialogResult::Ok
        } else {
            DialogResult::Cancel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::migrations::pipeline::{MigrationPlan, PlannedStep};
    use crate::migrations::report::MigrationReport;
    use crate::migrations::traits::{MigrationStep, ProgressMonitor, TracingProgress};
    use crate::wizard::StepState;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct Step(bool);

    impl MigrationStep for Step {
        fn run(
            &self,
            _project: &Path,
            _monitor: &dyn ProgressMonitor,
        ) -> Result<MigrationReport, MigrationError> {
            if self.0 {
                Ok(MigrationReport::empty_report())
            } else {
                Err(MigrationError::step_failed("nope"))
            }
        }
    }

    fn wizard(steps: &[bool]) -> ProjectMigrationWizard {
        let plan = MigrationPlan {
            source_version: "8.0.0".to_string(),
            steps: steps
                .iter()
                .map(|&ok| PlannedStep {
                    step: Arc::new(Step(ok)),
                    version_gate: None,
                    post: false,
                })
                .collect(),
        };
        ProjectMigrationWizard::new(Path::new("/p"), &plan, Arc::new(TracingProgress::new()))
    }

    #[tokio::test]
    async fn test_execute_all_result() {
        assert_eq!(ExecuteAllPresenter.present(&wizard(&[true, true])).await, DialogResult::Ok);
        assert_eq!(
            ExecuteAllPresenter.present(&wizard(&[true, false])).await,
            DialogResult::Cancel
        );
    }

    #[tokio::test]
    async fn test_step_by_step_observes_each_page() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let presenter = StepByStepPresenter::new(move |page| {
            sink.lock().unwrap().push(page.state());
            PageDecision::Continue
        });
        assert_eq!(presenter.present(&wizard(&[true, true])).await, DialogResult::Ok);
        assert_eq!(*seen.lock().unwrap(), vec![StepState::Executed, StepState::Executed]);
    }

    #[tokio::test]
    async fn test_step_by_step_cancel() {
        let presenter = StepByStepPresenter::new(|_| PageDecision::Cancel);
        let wizard = wizard(&[true, true]);
        assert_eq!(presenter.present(&wizard).await, DialogResult::Cancel);
        assert!(wizard.is_cancelled());
        assert_eq!(wizard.pages()[1].state(), StepState::Initial);
    }
}
