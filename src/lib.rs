//! bonita-migrate - Bonita project migration engine
//!
//! Upgrades a Bonita project tree to the current product version through an
//! ordered pipeline of idempotent steps, run on a disposable copy and
//! promoted only on success.

pub mod cli;
pub mod config;
pub mod context;
pub mod designer;
pub mod error;
pub mod fsutil;
pub mod listener;
pub mod maven;
pub mod migrations;
pub mod relocation;
pub mod report_writer;
pub mod version;
pub mod wizard;
