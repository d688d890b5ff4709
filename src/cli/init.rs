use std::path::Path;

use clap::Parser;
use tracing::instrument;
use typology::Config;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Command {
    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        if path.exists() && !self.force {
            anyhow::bail!(
                "Configuration already exists at {} (use --force to overwrite)",
                path.display()
            );
        }

        Config::default()
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))?;

        println!("{} {}", "Created".success(), path.display());
        println!();
        println!("Next steps:");
        println!(
            "  {}",
            "mqm-typology convert typology.xlsx typology.xml".info()
        );

        Ok(())
    }
}
