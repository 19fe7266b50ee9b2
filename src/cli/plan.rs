//! Plan command handler.

use std::path::Path;

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;

use super::App;

impl App {
    /// Print the planned steps without touching the project.
    pub async fn run_plan(&self, path: &Path) -> Result<()> {
        let config = Config::load()?;
        let ctx = Context::new(config);
        let plan = ctx.migrator(path).plan(&ctx.pipeline)?;

        println!("Source version: {}", plan.source_version);
        if plan.is_empty() {
            println!("No migration step planned");
            return Ok(());
        }
        for (index, planned) in plan.steps.iter().enumerate() {
            let description = planned.description();
            let marker = if planned.post { " (checked on run)" } else { "" };
            println!("{:>2}. {}{}", index + 1, description.title, marker);
            if !description.description.is_empty() {
                println!("    {}", description.description);
            }
        }
        Ok(())
    }
}
