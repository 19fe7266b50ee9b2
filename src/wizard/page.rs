//! Per-step state machine.
//!
//! ```text
//! Initial ──Applicable──▶ PrerequisiteChecked ──Trigger──▶ Triggered ──Start──▶ Running ──Succeed──▶ Executed
//!    │                                                        │                   │
//!    ├──NotApplicable──▶ Skipped                              └──Cancel──┐        ├──Fail───▶ Error
//!    └──PrerequisiteFailed──▶ Error                                      └────────┴──Cancel─▶ Error
//! ```
//!
//! Each page publishes its state through a `watch` channel so callers can
//! block until the step leaves its in-progress states.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::MigrationError;
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::wizard::JobCounter;

/// Message shown when the user interrupts a running step.
pub const CANCELLED_MESSAGE: &str = "Migration step has been cancelled.";

// =============================================================================
// State machine
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState {
    Initial,
    PrerequisiteChecked,
    Triggered,
    Running,
    Executed,
    Skipped,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    Applicable,
    NotApplicable,
    PrerequisiteFailed(String),
    Trigger,
    Start,
    Succeed,
    Fail(String),
    Cancel(String),
}

/// An event that the current state does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply {event} in state {from}")]
pub struct InvalidTransition {
    pub from: String,
    pub event: String,
}

impl StepState {
    /// The state reached by applying `event`, or an error for any transition
    /// not in the table.
    pub fn transition(&self, event: StepEvent) -> Result<StepState, InvalidTransition> {
        use StepEvent as E;
        use StepState as S;

        match (self, event) {
            (S::Initial, E::Applicable) => Ok(S::PrerequisiteChecked),
            (S::Initial, E::NotApplicable) => Ok(S::Skipped),
            (S::Initial, E::PrerequisiteFailed(message)) => Ok(S::Error(message)),
            (S::PrerequisiteChecked, E::Trigger) => Ok(S::Triggered),
            (S::Triggered, E::Start) => Ok(S::Running),
            (S::Running, E::Succeed) => Ok(S::Executed),
            (S::Running, E::Fail(message)) => Ok(S::Error(message)),
            (S::Triggered | S::Running, E::Cancel(message)) => Ok(S::Error(message)),
            (from, event) => Err(InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            }),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Triggered | Self::Running)
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Executed | Self::Skipped)
    }

    pub fn is_to_be_displayed(&self) -> bool {
        matches!(self, Self::PrerequisiteChecked | Self::Error(_))
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "INITIAL",
            Self::PrerequisiteChecked => "PREREQUISITE_CHECKED",
            Self::Triggered => "TRIGGERED",
            Self::Running => "RUNNING",
            Self::Executed => "EXECUTED",
            Self::Skipped => "SKIPPED",
            Self::Error(_) => "ERROR",
        };
        f.write_str(name)
    }
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Applicable => "applicable",
            Self::NotApplicable => "not-applicable",
            Self::PrerequisiteFailed(_) => "prerequisite-failed",
            Self::Trigger => "trigger",
            Self::Start => "start",
            Self::Succeed => "succeed",
            Self::Fail(_) => "fail",
            Self::Cancel(_) => "cancel",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Page
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// Inline message of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMessage {
    pub kind: MessageKind,
    pub text: String,
    /// Offer a link to the full log next to the message.
    pub show_log_link: bool,
}

/// Wizard page driving one migration step.
pub struct MigrationStepPage {
    step: Arc<dyn MigrationStep>,
    description: StepDescription,
    project: PathBuf,
    version_gate: Option<String>,
    state: watch::Sender<StepState>,
    relevance: OnceCell<bool>,
    message: Mutex<Option<PageMessage>>,
}

impl MigrationStepPage {
    /// `version_gate` is the source version for steps that still have to be
    /// checked against it (post steps); `None` for pre-filtered steps.
    pub fn new(step: Arc<dyn MigrationStep>, project: &Path, version_gate: Option<String>) -> Self {
        let description = step.description();
        let (state, _) = watch::channel(StepState::Initial);
        Self {
            step,
            description,
            project: project.to_path_buf(),
            version_gate,
            state,
            relevance: OnceCell::new(),
            message: Mutex::new(None),
        }
    }

    pub fn title(&self) -> &str {
        &self.description.title
    }

    pub fn description(&self) -> &StepDescription {
        &self.description
    }

    pub fn state(&self) -> StepState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StepState> {
        self.state.subscribe()
    }

    pub fn message(&self) -> Option<PageMessage> {
        self.message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_page_complete(&self) -> bool {
        self.state().is_successful()
    }

    /// Whether the page must be shown, evaluating applicability on first call.
    ///
    /// The result is memoized. A skipped page counts as one job done on
    /// `jobs`; a prerequisite failure leaves the page in `Error`, displayed.
    pub fn display_for_project(&self, jobs: &JobCounter) -> bool {
        *self.relevance.get_or_init(|| {
            let event = match self.check_applicability() {
                Ok(true) => StepEvent::Applicable,
                Ok(false) => StepEvent::NotApplicable,
                Err(e) => {
                    tracing::error!("Prerequisite check of '{}' failed: {}", self.title(), e);
                    let message = e.diagnostic();
                    self.set_message(MessageKind::Error, message.clone(), true);
                    StepEvent::PrerequisiteFailed(message)
                }
            };
            let skipped = event == StepEvent::NotApplicable;
            if let Err(e) = self.apply(event) {
                tracing::error!("{}", e);
            }
            if skipped {
                tracing::debug!("Skipping '{}': not applicable to project", self.title());
                jobs.one_job_done();
            }
            !skipped
        })
    }

    fn check_applicability(&self) -> Result<bool, MigrationError> {
        if let Some(version) = &self.version_gate {
            if !self.step.applies_to_version(version)? {
                return Ok(false);
            }
        }
        self.step.applies_to_project(&self.project)
    }

    /// Start the step on a blocking worker.
    ///
    /// Fires at most once: only the caller that moves the page from
    /// `PrerequisiteChecked` to `Triggered` gets a handle.
    pub fn trigger(
        self: &Arc<Self>,
        monitor: Arc<dyn ProgressMonitor>,
        report: Arc<Mutex<MigrationReport>>,
        jobs: Arc<JobCounter>,
    ) -> Option<JoinHandle<()>> {
        let triggered = self.state.send_if_modified(|state| {
            if *state != StepState::PrerequisiteChecked {
                return false;
            }
            match state.transition(StepEvent::Trigger) {
                Ok(next) => {
                    *state = next;
                    true
                }
                Err(_) => false,
            }
        });
        if !triggered {
            return None;
        }

        let page = Arc::clone(self);
        Some(tokio::task::spawn_blocking(move || {
            page.execute(monitor.as_ref(), &report, &jobs)
        }))
    }

    fn execute(&self, monitor: &dyn ProgressMonitor, report: &Mutex<MigrationReport>, jobs: &JobCounter) {
        if monitor.is_cancelled() {
            self.cancelled();
            return;
        }
        if let Err(e) = self.apply(StepEvent::Start) {
            tracing::error!("{}", e);
            return;
        }

        tracing::info!("Running migration step '{}'", self.title());
        let result = self.step.run(&self.project, monitor);
        match result {
            Ok(_) if monitor.is_cancelled() => self.cancelled(),
            Ok(step_report) => {
                report
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .merge(step_report);
                self.set_message(
                    MessageKind::Info,
                    format!(
                        "Migration step {} successful.\nProceed to next step.",
                        self.title()
                    ),
                    false,
                );
                if let Err(e) = self.apply(StepEvent::Succeed) {
                    tracing::error!("{}", e);
                }
                jobs.one_job_done();
                tracing::info!("Migration step '{}' completed", self.title());
            }
            Err(e) if e.is_cancelled() => self.cancelled(),
            Err(e) => {
                tracing::error!("Migration step '{}' failed: {:?}", self.title(), e);
                let message = e.diagnostic();
                self.set_message(MessageKind::Error, message.clone(), true);
                if let Err(e) = self.apply(StepEvent::Fail(message)) {
                    tracing::error!("{}", e);
                }
            }
        }
    }

    fn cancelled(&self) {
        tracing::warn!("Migration step '{}' cancelled", self.title());
        self.set_message(MessageKind::Error, CANCELLED_MESSAGE.to_string(), false);
        if let Err(e) = self.apply(StepEvent::Cancel(CANCELLED_MESSAGE.to_string())) {
            tracing::error!("{}", e);
        }
    }

    /// Block until the page leaves `Triggered`/`Running`; returns the state reached.
    pub async fn wait_while_in_progress(&self) -> StepState {
        let mut receiver = self.state.subscribe();
        let reached = match receiver.wait_for(|state| !state.is_in_progress()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        reached
    }

    fn apply(&self, event: StepEvent) -> Result<(), InvalidTransition> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match state.transition(event) {
            Ok(next) => {
                *state = next;
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    fn set_message(&self, kind: MessageKind, text: String, show_log_link: bool) {
        *self.message.lock().unwrap_or_else(PoisonError::into_inner) = Some(PageMessage {
            kind,
            text,
            show_log_link,
        });
    }
}

impl fmt::Debug for MigrationStepPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStepPage")
            .field("title", &self.description.title)
            .field("state", &self.state())
            .finish()
    }
}
