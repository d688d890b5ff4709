use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Command {
    /// The workbook to inspect
    source: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "plain")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl Command {
    #[instrument(level = "debug")]
    pub fn run(self) -> anyhow::Result<()> {
        let names = typology::convert::sheet_names(&self.source)?;

        match self.format {
            OutputFormat::Plain => {
                if names.is_empty() {
                    println!("{}", "No worksheets found".warning());
                }
                for (index, name) in names.iter().enumerate() {
                    println!("{} {name}", format!("{:>3}.", index + 1).dim());
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
        }

        Ok(())
    }
}
