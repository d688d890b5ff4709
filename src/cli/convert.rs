use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::instrument;
use typology::{Config, Outcome, convert::ConvertError};

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Command {
    /// The workbook to read
    source: PathBuf,

    /// Where to write the XML document
    destination: PathBuf,

    /// The worksheet holding the typology
    ///
    /// If omitted, the worksheet is chosen from an interactive list.
    #[arg(long, short)]
    sheet: Option<String>,
}

impl Command {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let sheet = match self.sheet {
            Some(sheet) => Some(sheet),
            None => choose_sheet(&self.source)?,
        };

        let outcome = sheet.map_or(Outcome::Aborted, |sheet| {
            typology::convert(&self.source, &sheet, &self.destination, config)
        });

        report(&outcome);

        match outcome.success() {
            Some(false) => std::process::exit(1),
            Some(true) | None => Ok(()),
        }
    }
}

/// Asks the user to pick a worksheet. Returns `None` if they cancel.
fn choose_sheet(source: &Path) -> anyhow::Result<Option<String>> {
    let mut names = typology::convert::sheet_names(source)?;
    if names.is_empty() {
        anyhow::bail!("{} contains no worksheets", source.display());
    }

    let selection = dialoguer::Select::new()
        .with_prompt("Select the worksheet containing the typology to convert")
        .items(&names)
        .default(0)
        .interact_opt()?;

    Ok(selection.map(|index| names.swap_remove(index)))
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Aborted => println!("{}", outcome.message().dim()),
        Outcome::Succeeded(conversion) => {
            println!("{}", outcome.message().success());
            println!(
                "  {} issue types ({} root-level, {} levels) written to {}",
                conversion.records,
                conversion.roots,
                conversion.max_depth + 1,
                conversion.destination.display()
            );
            for duplicate in &conversion.duplicates {
                println!(
                    "  {}",
                    format!("Duplicate id '{}' stored as '{}'", duplicate.id, duplicate.key)
                        .warning()
                );
            }
            for orphan in &conversion.orphans {
                println!(
                    "  {}",
                    format!("'{orphan}' is not connected to the root and was skipped").warning()
                );
            }
        }
        Outcome::Failed(error) => {
            println!("{}", outcome.message().failure());
            if let ConvertError::Validation { violations, .. } = error {
                for violation in violations {
                    println!("  {}", violation.to_string().dim());
                }
            }
        }
    }
}
