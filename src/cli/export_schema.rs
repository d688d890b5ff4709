use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;
use typology::Config;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Command {
    /// File or directory to write the schema to
    ///
    /// A directory receives a file named mqmTypology.xsd.
    #[arg(default_value = ".")]
    destination: PathBuf,
}

impl Command {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let written = typology::convert::export_schema(config, &self.destination).map_err(|e| {
            anyhow::anyhow!(
                "Failed to export schema to {}: {e}",
                self.destination.display()
            )
        })?;

        println!("{} {}", "Exported schema to".success(), written.display());
        Ok(())
    }
}
