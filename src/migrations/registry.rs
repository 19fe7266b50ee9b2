//! Process-wide step registry.
//!
//! Optional subsystems register their steps here at startup; the pipeline
//! looks them up by id. An unknown id resolves to [`NoopStep`] so the pipeline
//! can always be assembled.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::migrations::traits::{MigrationStep, NoopStep};

static STEPS: Lazy<RwLock<HashMap<String, Arc<dyn MigrationStep>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Insert or replace the step registered under `id`; last write wins.
pub fn register<S>(id: &str, step: S) -> Arc<dyn MigrationStep>
where
    S: MigrationStep + 'static,
{
    let step: Arc<dyn MigrationStep> = Arc::new(step);
    STEPS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(id.to_string(), Arc::clone(&step));
    tracing::debug!("Registered migration step '{}'", id);
    step
}

/// The step registered under `id`, or a no-op step.
pub fn lookup(id: &str) -> Arc<dyn MigrationStep> {
    let steps = STEPS.read().unwrap_or_else(PoisonError::into_inner);
    match steps.get(id) {
        Some(step) => Arc::clone(step),
        None => {
            tracing::debug!("No migration step registered for '{}', using no-op", id);
            Arc::new(NoopStep)
        }
    }
}

pub fn is_registered(id: &str) -> bool {
    STEPS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(id)
}

pub fn unregister(id: &str) -> bool {
    STEPS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(id)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::migrations::report::MigrationReport;
    use crate::migrations::traits::{ProgressMonitor, TracingProgress};
    use serial_test::serial;
    use std::path::Path;

    struct Tagged(&'static str);

    impl MigrationStep for Tagged {
        fn run(
            &self,
            _project: &Path,
            _monitor: &dyn ProgressMonitor,
        ) -> Result<MigrationReport, MigrationError> {
            let mut report = MigrationReport::empty_report();
            report.updated(self.0);
            Ok(report)
        }
    }

    fn run(step: &dyn MigrationStep) -> MigrationReport {
        step.run(Path::new("/nowhere"), &TracingProgress::new())
            .unwrap()
    }

    #[test]
    #[serial]
    fn test_unknown_id_resolves_to_noop() {
        unregister("registry-test");
        assert!(!is_registered("registry-test"));
        assert!(run(lookup("registry-test").as_ref()).is_empty());
    }

    #[test]
    #[serial]
    fn test_last_write_wins() {
        register("registry-test", Tagged("first"));
        register("registry-test", Tagged("second"));
        assert_eq!(run(lookup("registry-test").as_ref()).updates(), ["second"]);
        assert!(unregister("registry-test"));
    }
}
