//! Build descriptors of a Bonita project.
//!
//! A Bonita project is a multi-module Maven build:
//!
//! ```text
//! <root>/pom.xml            aggregator, parent org.bonitasoft:bonita-project
//! <root>/.project           descriptor, `comment` holds the Bonita version
//! <root>/app/pom.xml        application module
//! <root>/bdm/pom.xml        business data model module
//! <root>/extensions/pom.xml extension projects (REST API, themes)
//! ```

pub mod descriptor;
pub mod pom;
pub mod xml;

use std::path::{Path, PathBuf};

pub use descriptor::{ProjectDescription, BONITA_NATURE_ID, DESCRIPTOR_FILE_NAME};
pub use pom::{Dependency, Parent, PomModel, POM_FILE_NAME};

pub const APP_MODULE: &str = "app";
pub const BDM_MODULE: &str = "bdm";
pub const EXTENSIONS_MODULE: &str = "extensions";

/// Path of the app model: `app/pom.xml`, else the root `pom.xml` of
/// single-module layouts. `None` when neither exists.
pub fn app_model_path(project_root: &Path) -> Option<PathBuf> {
    [
        project_root.join(APP_MODULE).join(POM_FILE_NAME),
        project_root.join(POM_FILE_NAME),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// `<root>/<module>/pom.xml`
pub fn module_pom(project_root: &Path, module: &str) -> PathBuf {
    project_root.join(module).join(POM_FILE_NAME)
}

/// Whether `project_root` looks like a Bonita project: it has an `app`
/// module or its descriptor carries the Bonita nature.
pub fn is_bonita_project(project_root: &Path) -> bool {
    if project_root.join(APP_MODULE).is_dir() {
        return true;
    }
    ProjectDescription::load(project_root)
        .map(|d| d.has_nature(BONITA_NATURE_ID))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_model_path_prefers_app_module() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(app_model_path(root.path()), None);

        std::fs::write(root.path().join(POM_FILE_NAME), "<project/>").unwrap();
        assert_eq!(app_model_path(root.path()), Some(root.path().join(POM_FILE_NAME)));

        std::fs::create_dir(root.path().join(APP_MODULE)).unwrap();
        std::fs::write(module_pom(root.path(), APP_MODULE), "<project/>").unwrap();
        assert_eq!(
            app_model_path(root.path()),
            Some(module_pom(root.path(), APP_MODULE))
        );
    }

    #[test]
    fn test_is_bonita_project() {
        let root = tempfile::tempdir().unwrap();
        assert!(!is_bonita_project(root.path()));

        ProjectDescription::new("p", "7.12.0").save(root.path()).unwrap();
        assert!(is_bonita_project(root.path()));
    }
}
