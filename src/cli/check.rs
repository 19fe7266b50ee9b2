//! Check command handler.

use std::path::Path;

use color_eyre::Result;

use crate::listener::{ProjectMigrationListener, VersionCheck};
use crate::version::CURRENT_VERSION;

use super::App;

impl App {
    /// Print the version verdict for the project at `path`.
    pub async fn run_check(&self, path: &Path) -> Result<()> {
        match ProjectMigrationListener::check_version(path)? {
            VersionCheck::NotBonita => println!("{} is not a Bonita project", path.display()),
            VersionCheck::UpToDate | VersionCheck::SameMinor(_) => {
                println!("Project is up to date ({})", CURRENT_VERSION)
            }
            VersionCheck::MustMigrate(version) => println!(
                "Project must be migrated from {} to {}",
                version, CURRENT_VERSION
            ),
            VersionCheck::Incompatible(version) => println!(
                "Project version {} is not compatible with {} and cannot be migrated",
                version, CURRENT_VERSION
            ),
        }
        Ok(())
    }
}
