//! CLI module for bonita-migrate.
//!
//! Subcommands:
//! - `check`: Report whether a project must be migrated
//! - `plan`: List the steps a migration would go through
//! - `migrate`: Migrate a project on a copy and promote it on success

mod check;
mod migrate;
mod plan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// bonita-migrate - Bonita project migration
#[derive(Parser)]
#[command(name = "bonita-migrate")]
#[command(about = "Migrate Bonita projects to the current product version")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the Bonita version of a project
    Check {
        /// Project root directory
        path: PathBuf,
    },

    /// Print the migration steps planned for a project
    Plan {
        /// Project root directory
        path: PathBuf,
    },

    /// Migrate a project to the current version
    Migrate {
        /// Project root directory
        path: PathBuf,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match &self.command {
            Command::Check { path } => self.run_check(path).await,
            Command::Plan { path } => self.run_plan(path).await,
            Command::Migrate { path } => self.run_migrate(path).await,
        }
    }
}
