//! Step-at-a-time driver of a migration plan.
//!
//! The wizard wraps every planned step into a [`MigrationStepPage`]. Pages
//! are visited strictly forward: applicability of a page is only evaluated
//! once the pages before it have run, so it sees their on-disk effects.
//!
//! How the pages are walked is up to a [`WizardPresenter`]:
//! [`ExecuteAllPresenter`] runs everything and stops at the first error,
//! [`StepByStepPresenter`] hands each finished page to an observer.

pub mod page;
pub mod presenter;

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub use page::{
    InvalidTransition, MessageKind, MigrationStepPage, PageMessage, StepEvent, StepState,
    CANCELLED_MESSAGE,
};
pub use presenter::{DialogResult, ExecuteAllPresenter, PageDecision, StepByStepPresenter, WizardPresenter};

use crate::migrations::pipeline::MigrationPlan;
use crate::migrations::report::MigrationReport;
use crate::migrations::traits::{CancellationFlag, ProgressMonitor};

// =============================================================================
// Progress accounting
// =============================================================================

/// Counts finished pages, skipped ones included.
#[derive(Debug)]
pub struct JobCounter {
    total: usize,
    done: AtomicUsize,
}

impl JobCounter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
        }
    }

    pub fn one_job_done(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let done = self.done().min(self.total);
        (done * 100 / self.total) as u8
    }
}

/// Monitor handed to steps: the caller's monitor plus the wizard's cancel flag.
struct CancellableMonitor {
    inner: Arc<dyn ProgressMonitor>,
    cancellation: CancellationFlag,
}

impl ProgressMonitor for CancellableMonitor {
    fn begin_task(&self, name: &str) {
        self.inner.begin_task(name);
    }

    fn sub_task(&self, name: &str) {
        self.inner.sub_task(name);
    }

    fn done(&self) {
        self.inner.done();
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled() || self.inner.is_cancelled()
    }
}

// =============================================================================
// Wizard
// =============================================================================

pub struct ProjectMigrationWizard {
    pages: Vec<Arc<MigrationStepPage>>,
    current: Mutex<Option<usize>>,
    report: Arc<Mutex<MigrationReport>>,
    jobs: Arc<JobCounter>,
    cancellation: CancellationFlag,
    monitor: Arc<dyn ProgressMonitor>,
    finishing: AtomicBool,
}

impl ProjectMigrationWizard {
    pub fn new(project: &Path, plan: &MigrationPlan, monitor: Arc<dyn ProgressMonitor>) -> Self {
        let pages: Vec<_> = plan
            .steps
            .iter()
            .map(|planned| {
                Arc::new(MigrationStepPage::new(
                    Arc::clone(&planned.step),
                    project,
                    planned.version_gate.clone(),
                ))
            })
            .collect();
        let cancellation = CancellationFlag::new();
        let monitor: Arc<dyn ProgressMonitor> = Arc::new(CancellableMonitor {
            inner: monitor,
            cancellation: cancellation.clone(),
        });

        Self {
            jobs: Arc::new(JobCounter::new(pages.len())),
            pages,
            current: Mutex::new(None),
            report: Arc::new(Mutex::new(MigrationReport::empty_report())),
            cancellation,
            monitor,
            finishing: AtomicBool::new(false),
        }
    }

    pub fn pages(&self) -> &[Arc<MigrationStepPage>] {
        &self.pages
    }

    pub fn current_page(&self) -> Option<Arc<MigrationStepPage>> {
        self.current_index().map(|i| Arc::clone(&self.pages[i]))
    }

    fn current_index(&self) -> Option<usize> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show the first page to display, triggering its step.
    pub fn start(&self) -> Option<Arc<MigrationStepPage>> {
        if self.current_index().is_some() {
            return self.current_page();
        }
        self.show_next_from(0)
    }

    /// Move forward to the next page to display, triggering its step.
    ///
    /// Returns `None` when the current page is not complete yet or when no
    /// page remains.
    pub fn next(&self) -> Option<Arc<MigrationStepPage>> {
        if !self.can_flip_to_next() {
            return None;
        }
        let from = self.current_index().map_or(0, |i| i + 1);
        self.show_next_from(from)
    }

    fn show_next_from(&self, from: usize) -> Option<Arc<MigrationStepPage>> {
        let index = (from..self.pages.len()).find(|&i| self.pages[i].display_for_project(&self.jobs))?;
        self.show(index);
        Some(Arc::clone(&self.pages[index]))
    }

    fn show(&self, index: usize) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(index);
        let page = &self.pages[index];
        tracing::debug!("Showing migration page '{}'", page.title());
        page.trigger(
            Arc::clone(&self.monitor),
            Arc::clone(&self.report),
            Arc::clone(&self.jobs),
        );
    }

    pub fn can_flip_to_next(&self) -> bool {
        match self.current_index() {
            Some(index) => self.pages[index].is_page_complete() && index + 1 < self.pages.len(),
            None => !self.pages.is_empty(),
        }
    }

    /// True when the current page is complete and no finish is running.
    ///
    /// Later pages need not have run: finishing runs them.
    pub fn can_finish(&self) -> bool {
        !self.finishing.load(Ordering::SeqCst)
            && self
                .current_page()
                .is_some_and(|page| page.is_page_complete())
    }

    /// Run every remaining page in order, waiting for each.
    ///
    /// Stops at the first page that does not succeed and leaves it current.
    pub async fn execute_all(&self) -> bool {
        let from = self.current_index().unwrap_or(0);
        for index in from..self.pages.len() {
            let page = Arc::clone(&self.pages[index]);
            if !page.display_for_project(&self.jobs) {
                continue;
            }
            self.show(index);
            let state = page.wait_while_in_progress().await;
            if !state.is_successful() {
                tracing::warn!("Migration stopped at step '{}' ({})", page.title(), state);
                return false;
            }
        }
        true
    }

    /// Run every remaining page and check each one ended successfully.
    ///
    /// Pages not shown yet are shown, which triggers their step. Re-entrant
    /// calls while a finish is running return `false` right away. Fails fast:
    /// pages after the first unsuccessful one are neither run nor inspected.
    pub async fn perform_finish(&self) -> bool {
        if self.finishing.swap(true, Ordering::SeqCst) {
            tracing::debug!("Finish already in progress");
            return false;
        }
        let _latch = FinishLatch(&self.finishing);

        for (index, page) in self.pages.iter().enumerate() {
            if !page.display_for_project(&self.jobs) {
                continue;
            }
            self.show(index);
            if !page.wait_while_in_progress().await.is_successful() {
                return false;
            }
        }
        true
    }

    pub fn cancel(&self) {
        tracing::info!("Project migration cancelled by user");
        self.cancellation.cancel();
    }

    /// Cancelled here or through the caller's monitor.
    pub fn is_cancelled(&self) -> bool {
        self.monitor.is_cancelled()
    }

    /// Message of the first page in error, if any.
    pub fn failure(&self) -> Option<String> {
        self.pages.iter().find_map(|p| match p.state() {
            StepState::Error(message) => Some(message),
            _ => None,
        })
    }

    /// Aggregate report of the steps executed so far.
    pub fn report(&self) -> MigrationReport {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn progress_percent(&self) -> u8 {
        self.jobs.percent()
    }

    pub fn window_title(&self) -> String {
        format!("Project migration ({}%)", self.progress_percent())
    }
}

struct FinishLatch<'a>(&'a AtomicBool);

impl Drop for FinishLatch<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::migrations::pipeline::PlannedStep;
    use crate::migrations::report::StepDescription;
    use crate::migrations::traits::{MigrationStep, TracingProgress};

    struct Scripted {
        title: &'static str,
        applies: bool,
        fails: bool,
    }

    impl MigrationStep for Scripted {
        fn run(
            &self,
            _project: &Path,
            _monitor: &dyn ProgressMonitor,
        ) -> Result<MigrationReport, MigrationError> {
            if self.fails {
                return Err(MigrationError::step_failed(format!("{} failed", self.title)));
            }
            let mut report = MigrationReport::empty_report();
            report.updated(self.title);
            Ok(report)
        }

        fn applies_to_project(&self, _project: &Path) -> Result<bool, MigrationError> {
            Ok(self.applies)
        }

        fn description(&self) -> StepDescription {
            StepDescription::new(self.title, "")
        }
    }

    fn wizard(steps: Vec<Scripted>) -> ProjectMigrationWizard {
        let plan = MigrationPlan {
            source_version: "9.0.0".to_string(),
            steps: steps
                .into_iter()
                .map(|s| PlannedStep {
                    step: Arc::new(s),
                    version_gate: None,
                    post: false,
                })
                .collect(),
        };
        ProjectMigrationWizard::new(Path::new("/project"), &plan, Arc::new(TracingProgress::new()))
    }

    fn ok(title: &'static str) -> Scripted {
        Scripted {
            title,
            applies: true,
            fails: false,
        }
    }

    #[test]
    fn test_job_counter_percent() {
        let jobs = JobCounter::new(4);
        assert_eq!(jobs.percent(), 0);
        jobs.one_job_done();
        assert_eq!(jobs.percent(), 25);
        assert_eq!(JobCounter::new(0).percent(), 100);
    }

    #[tokio::test]
    async fn test_step_by_step_navigation() {
        let wizard = wizard(vec![ok("one"), ok("two")]);
        let first = wizard.start().unwrap();
        assert_eq!(first.title(), "one");
        assert_eq!(first.wait_while_in_progress().await, StepState::Executed);
        assert!(wizard.can_flip_to_next());
        assert!(wizard.can_finish());

        let second = wizard.next().unwrap();
        assert_eq!(second.wait_while_in_progress().await, StepState::Executed);
        assert!(!wizard.can_flip_to_next());
        assert!(wizard.next().is_none());
        assert!(wizard.can_finish());
        assert_eq!(wizard.report().updates(), ["one", "two"]);
        assert_eq!(wizard.window_title(), "Project migration (100%)");
    }

    #[tokio::test]
    async fn test_next_is_disabled_until_page_complete() {
        let wizard = wizard(vec![
            Scripted {
                title: "broken",
                applies: true,
                fails: true,
            },
            ok("two"),
        ]);
        let page = wizard.start().unwrap();
        page.wait_while_in_progress().await;
        assert!(!wizard.can_flip_to_next());
        assert!(wizard.next().is_none());
        assert_eq!(wizard.failure().as_deref(), Some("broken failed"));
    }

    #[tokio::test]
    async fn test_execute_all_skips_pages_not_applicable() {
        let wizard = wizard(vec![
            ok("one"),
            Scripted {
                title: "two",
                applies: false,
                fails: false,
            },
            ok("three"),
        ]);
        assert!(wizard.execute_all().await);
        assert!(wizard.perform_finish().await);
        assert_eq!(wizard.pages()[1].state(), StepState::Skipped);
        assert_eq!(wizard.progress_percent(), 100);
    }

    #[tokio::test]
    async fn test_finish_runs_pages_not_shown_yet() {
        let wizard = wizard(vec![ok("one"), ok("two"), ok("three")]);
        assert!(!wizard.can_finish());
        let first = wizard.start().unwrap();
        first.wait_while_in_progress().await;
        assert!(wizard.can_finish());

        assert!(wizard.perform_finish().await);
        assert!(wizard.pages().iter().all(|p| p.state() == StepState::Executed));
        assert_eq!(wizard.report().updates(), ["one", "two", "three"]);
        assert_eq!(wizard.progress_percent(), 100);
    }

    #[tokio::test]
    async fn test_finish_stops_at_first_failure() {
        let wizard = wizard(vec![
            ok("one"),
            Scripted {
                title: "two",
                applies: true,
                fails: true,
            },
            ok("three"),
        ]);
        wizard.start().unwrap().wait_while_in_progress().await;
        assert!(!wizard.perform_finish().await);
        assert_eq!(wizard.pages()[1].state(), StepState::Error("two failed".to_string()));
        assert_eq!(wizard.pages()[2].state(), StepState::Initial);
    }

    #[tokio::test]
    async fn test_finish_latch_is_released() {
        let wizard = wizard(vec![ok("one")]);
        assert!(wizard.execute_all().await);
        assert!(wizard.perform_finish().await);
        assert!(wizard.perform_finish().await);
    }

    #[tokio::test]
    async fn test_cancel_stops_next_step() {
        let wizard = wizard(vec![ok("one"), ok("two")]);
        wizard.cancel();
        assert!(!wizard.execute_all().await);
        assert_eq!(
            wizard.pages()[0].state(),
            StepState::Error(CANCELLED_MESSAGE.to_string())
        );
        assert_eq!(wizard.pages()[1].state(), StepState::Initial);
        assert!(wizard.is_cancelled());
    }
}
