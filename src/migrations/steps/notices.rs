//! Report-only steps: nothing changes on disk, the user is told what changed
//! in the platform.

use std::path::Path;

use crate::error::MigrationError;
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::VersionRange;

pub struct ProvidedGroovyScriptRemovedStep;

impl MigrationStep for ProvidedGroovyScriptRemovedStep {
    fn run(
        &self,
        _project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(&self.description().title);
        let mut report = MigrationReport::empty_report();
        report.removed(
            "Deprecated provided groovy classes `BonitaUsers`, `BonitaSql`, `BonitaXML` and `BonitaTypes` have been removed.",
        );
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before("9.0.0").contains(source_version)
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            "Provided Groovy scripts removed",
            "Deprecated provided Groovy script classes are no longer available. Scripts using them must be updated.",
        )
    }
}

pub struct Java17UpdateStep;

impl MigrationStep for Java17UpdateStep {
    fn run(
        &self,
        _project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        monitor.sub_task(&self.description().title);
        let mut report = MigrationReport::empty_report();
        report.updated(
            "Required Java version updated to `17`. Make sure that your third party dependencies are compliant with Java 17.",
        );
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before("10.0.0").contains(source_version)
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            "Java 17",
            "Bonita now runs on Java 17. Third party dependencies must be compatible with it.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;

    #[test]
    fn test_groovy_scripts_notice() {
        let step = ProvidedGroovyScriptRemovedStep;
        assert!(step.applies_to_version("8.9.9").unwrap());
        assert!(!step.applies_to_version("9.0.0").unwrap());
        let report = step.run(Path::new("."), &TracingProgress::new()).unwrap();
        assert_eq!(report.removals().len(), 1);
        assert!(report.updates().is_empty());
    }

    #[test]
    fn test_java17_notice() {
        let step = Java17UpdateStep;
        assert!(step.applies_to_version("9.0.0").unwrap());
        assert!(!step.applies_to_version("10.0.0").unwrap());
        let report = step.run(Path::new("."), &TracingProgress::new()).unwrap();
        assert!(report.updates()[0].contains("Java version updated to `17`"));
    }
}
