//! Move REST API extensions and themes into their own `extensions` module.
//!
//! Legacy layouts keep extension projects under `app/restAPIExtensions/*` and
//! `app/themes/*`. Each folder holding a `pom.xml` becomes a module of the new
//! `extensions/pom.xml` aggregator and a `zip` dependency of the app module.

use std::fs;
use std::path::Path;

use crate::error::MigrationError;
use crate::fsutil;
use crate::maven::{self, Dependency, Parent, PomModel, APP_MODULE, EXTENSIONS_MODULE, POM_FILE_NAME};
use crate::migrations::report::{MigrationReport, StepDescription};
use crate::migrations::traits::{MigrationStep, ProgressMonitor};
use crate::version::VersionRange;

const TITLE: &str = "Extensions module";

/// Folders of the app module that used to hold extension projects.
pub const LEGACY_EXTENSION_FOLDERS: &[&str] = &["restAPIExtensions", "themes"];

const FAILURE_MESSAGE: &str = "Failed to update project layout to multi-module.";

pub struct ExtensionsModuleMigrationStep;

impl ExtensionsModuleMigrationStep {
    fn migrate(project: &Path, report: &mut MigrationReport) -> Result<(), MigrationError> {
        let extensions = project.join(EXTENSIONS_MODULE);
        let extensions_pom = extensions.join(POM_FILE_NAME);
        let existing_model = if extensions_pom.is_file() {
            Some(PomModel::load(&extensions_pom)?)
        } else {
            if extensions.is_dir() {
                fsutil::delete_dir(&extensions)?;
            }
            None
        };

        let app_pom = maven::module_pom(project, APP_MODULE);
        let mut app_model = PomModel::load(&app_pom)?;
        let root_pom = project.join(POM_FILE_NAME);
        let root_model = if root_pom.is_file() {
            Some(PomModel::load(&root_pom)?)
        } else {
            None
        };

        let mut extensions_model = match existing_model {
            Some(model) => model,
            None => Self::new_extensions_model(root_model.as_ref(), &app_model)?,
        };
        fs::create_dir_all(&extensions)?;

        let app = project.join(APP_MODULE);
        for folder_name in LEGACY_EXTENSION_FOLDERS {
            let folder = app.join(folder_name);
            if !folder.is_dir() {
                continue;
            }
            for source in fsutil::subdirs_containing(&folder, POM_FILE_NAME)? {
                Self::move_extension(&source, &extensions, &mut extensions_model, &mut app_model)?;
            }
            Self::delete_legacy_folder(&folder, project)?;
        }

        app_model.save(&app_pom)?;
        extensions_model.save(&extensions_pom)?;

        if let Some(mut root_model) = root_model {
            if root_model.add_module(EXTENSIONS_MODULE) {
                root_model.save(&root_pom)?;
            }
        }

        report.updated(
            "Project's extensions are now built in their own maven module. \
             While it does not impact the design usage, this internal change allows the usage of a standard Maven build lifecycle. \
             All extensions share the same `version` and `groupId` of the parent project. \
             It is enforced by the format of the Bonita project and must not be changed.",
        );
        Ok(())
    }

    fn new_extensions_model(
        root_model: Option<&PomModel>,
        app_model: &PomModel,
    ) -> Result<PomModel, MigrationError> {
        let parent = root_model
            .and_then(|root| {
                Some(Parent {
                    group_id: root.group_id()?,
                    artifact_id: root.artifact_id()?.to_string(),
                    version: root.version()?,
                })
            })
            .or_else(|| app_model.parent())
            .ok_or_else(|| {
                MigrationError::step_failed("Cannot resolve the parent project of the extensions module.")
            })?;

        let mut model = PomModel::empty()?;
        model.set_parent(&parent);
        model.set_artifact_id(&format!("{}-extensions", parent.artifact_id));
        model.set_name("Extensions");
        model.set_packaging("pom");
        Ok(model)
    }

    fn move_extension(
        source: &Path,
        extensions: &Path,
        extensions_model: &mut PomModel,
        app_model: &mut PomModel,
    ) -> Result<(), MigrationError> {
        let Some(name) = source.file_name().and_then(|n| n.to_str()) else {
            return Ok(());
        };
        let target = extensions.join(name);
        fsutil::move_dir(source, &target)?;
        extensions_model.add_module(name);

        let extension_model = PomModel::load(&target.join(POM_FILE_NAME))?;
        let artifact_id = extension_model.artifact_id().ok_or_else(|| {
            MigrationError::step_failed(format!("{name}/pom.xml has no artifactId."))
        })?;
        app_model.add_dependency(
            &Dependency::new("${project.groupId}", artifact_id)
                .version("${project.version}")
                .kind("zip"),
        );
        tracing::debug!("Moved extension '{}' to the extensions module", name);
        Ok(())
    }

    fn delete_legacy_folder(folder: &Path, project: &Path) -> Result<(), MigrationError> {
        let folder_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut leftovers = Vec::new();
        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            if path.is_dir() && !path.join(POM_FILE_NAME).exists() {
                tracing::error!(
                    "{}/{}/pom.xml not found! Modules migration step cannot be performed.",
                    folder_name,
                    path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
                );
            }
            let relative = path.strip_prefix(project).unwrap_or(&path);
            leftovers.push(relative.display().to_string());
        }
        if !leftovers.is_empty() {
            leftovers.sort();
            return Err(MigrationError::step_failed(format!(
                "{FAILURE_MESSAGE} Unexpected files are still present in '{folder_name}' folder post update ({}).\n\
                 Make sure only folders containing pom.xml file are present in '{folder_name}' folder before migrating.",
                leftovers.join(", ")
            )));
        }
        fs::remove_dir(folder)?;
        Ok(())
    }
}

impl MigrationStep for ExtensionsModuleMigrationStep {
    fn run(
        &self,
        project: &Path,
        monitor: &dyn ProgressMonitor,
    ) -> Result<MigrationReport, MigrationError> {
        if !self.applies_to_project(project)? {
            return Ok(MigrationReport::empty_report());
        }
        monitor.sub_task(TITLE);
        let mut report = MigrationReport::empty_report();
        report.updated(
            "Rest API Extensions and Themes projects have been moved in the project layout to benefit from the Maven multi module approach. \
             It means that files location inside the project have changed. \
             It is a technical change and will not impact the design usage in Bonita Studio. \
             New maven modules and their respective `pom.xml` files are *reserved for internal Studio use*.",
        );
        Self::migrate(project, &mut report).map_err(|e| match e {
            e @ MigrationError::StepFailed { .. } => e,
            other => MigrationError::step_failed_with(FAILURE_MESSAGE, other),
        })?;
        Ok(report)
    }

    fn applies_to_version(&self, source_version: &str) -> Result<bool, MigrationError> {
        VersionRange::before("9.0.0").contains(source_version)
    }

    fn applies_to_project(&self, project: &Path) -> Result<bool, MigrationError> {
        let app_pom = maven::module_pom(project, APP_MODULE);
        if !app_pom.is_file() {
            return Err(MigrationError::prerequisite(format!(
                "{} not found. The extensions module cannot be created.",
                Path::new(APP_MODULE).join(POM_FILE_NAME).display()
            )));
        }
        let has_module = maven::module_pom(project, EXTENSIONS_MODULE).is_file();
        let has_legacy = LEGACY_EXTENSION_FOLDERS
            .iter()
            .any(|f| project.join(APP_MODULE).join(f).exists());
        Ok(!has_module || has_legacy)
    }

    fn description(&self) -> StepDescription {
        StepDescription::new(
            TITLE,
            "REST API extensions and themes are moved to a dedicated extensions Maven module.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::traits::TracingProgress;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        write(
            root.path(),
            "pom.xml",
            "<project><groupId>com.company</groupId><artifactId>procurement</artifactId><version>0.0.1</version><modules><module>app</module></modules></project>",
        );
        write(
            root.path(),
            "app/pom.xml",
            "<project><parent><groupId>com.company</groupId><artifactId>procurement</artifactId><version>0.0.1</version></parent><artifactId>procurement-app</artifactId></project>",
        );
        write(
            root.path(),
            "app/restAPIExtensions/userApi/pom.xml",
            "<project><artifactId>user-api</artifactId></project>",
        );
        write(root.path(), "app/restAPIExtensions/userApi/src/Index.groovy", "");
        write(
            root.path(),
            "app/themes/corporate/pom.xml",
            "<project><artifactId>corporate-theme</artifactId></project>",
        );
        root
    }

    #[test]
    fn test_moves_extensions() {
        let root = project();
        let step = ExtensionsModuleMigrationStep;
        assert!(step.applies_to_project(root.path()).unwrap());

        let report = step.run(root.path(), &TracingProgress::new()).unwrap();
        assert_eq!(report.updates().len(), 2);

        let p = root.path();
        assert!(p.join("extensions/userApi/src/Index.groovy").is_file());
        assert!(p.join("extensions/corporate/pom.xml").is_file());
        assert!(!p.join("app/restAPIExtensions").exists());
        assert!(!p.join("app/themes").exists());

        let extensions = PomModel::load(&p.join("extensions/pom.xml")).unwrap();
        assert_eq!(extensions.artifact_id(), Some("procurement-extensions"));
        assert_eq!(extensions.modules(), vec!["userApi", "corporate"]);

        let app = PomModel::load(&p.join("app/pom.xml")).unwrap();
        let user_api = app.find_dependency("${project.groupId}", "user-api").unwrap();
        assert_eq!(user_api.kind.as_deref(), Some("zip"));
        assert!(app.has_dependency("${project.groupId}", "corporate-theme"));

        let root_model = PomModel::load(&p.join("pom.xml")).unwrap();
        assert_eq!(root_model.modules(), vec!["app", "extensions"]);

        assert!(!step.applies_to_project(p).unwrap());
    }

    fn write_existing_module(root: &Path) {
        write(
            root,
            "extensions/pom.xml",
            "<project><artifactId>procurement-extensions</artifactId><packaging>pom</packaging><modules><module>myApi</module></modules></project>",
        );
        write(root, "extensions/myApi/pom.xml", "<project><artifactId>my-api</artifactId></project>");
        write(root, "extensions/myApi/Api.groovy", "class Api {}");
    }

    #[test]
    fn test_existing_module_is_left_untouched() {
        let root = tempfile::tempdir().unwrap();
        write(
            root.path(),
            "app/pom.xml",
            "<project><artifactId>procurement-app</artifactId></project>",
        );
        write_existing_module(root.path());
        let before = fsutil::tree_snapshot(root.path()).unwrap();

        let step = ExtensionsModuleMigrationStep;
        assert!(!step.applies_to_project(root.path()).unwrap());
        let report = step.run(root.path(), &TracingProgress::new()).unwrap();

        assert!(report.is_empty());
        assert_eq!(fsutil::tree_snapshot(root.path()).unwrap(), before);
    }

    #[test]
    fn test_legacy_folders_join_existing_module() {
        let root = project();
        write_existing_module(root.path());

        ExtensionsModuleMigrationStep
            .run(root.path(), &TracingProgress::new())
            .unwrap();

        let p = root.path();
        assert!(p.join("extensions/myApi/Api.groovy").is_file());
        assert!(p.join("extensions/userApi/pom.xml").is_file());
        let extensions = PomModel::load(&p.join("extensions/pom.xml")).unwrap();
        assert_eq!(extensions.modules(), vec!["myApi", "userApi", "corporate"]);
    }

    #[test]
    fn test_unexpected_files_fail_the_step() {
        let root = project();
        write(root.path(), "app/themes/readme.txt", "stray");

        let err = ExtensionsModuleMigrationStep
            .run(root.path(), &TracingProgress::new())
            .unwrap_err();
        let message = err.diagnostic();
        assert!(message.contains("Unexpected files"), "{message}");
        assert!(message.contains("readme.txt"), "{message}");
    }

    #[test]
    fn test_missing_app_pom_is_a_prerequisite_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            ExtensionsModuleMigrationStep.applies_to_project(root.path()),
            Err(MigrationError::Prerequisite { .. })
        ));
    }
}
