use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;
use typology::Config;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Validate a typology document against the schema")]
pub struct Command {
    /// The XML document to check
    document: PathBuf,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

impl Command {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let verdict = typology::convert::validate(&self.document, config)?;

        if verdict.is_valid() {
            if !self.quiet {
                println!(
                    "{} {}",
                    "✓".success(),
                    format!("{} is valid", self.document.display()).success()
                );
            }
            return Ok(());
        }

        println!(
            "{} {}",
            "✗".failure(),
            format!(
                "{} has {} schema violation(s)",
                self.document.display(),
                verdict.violations().len()
            )
            .failure()
        );
        for violation in verdict.violations() {
            println!("  {} {}", violation.path.info(), violation.message);
        }

        std::process::exit(2);
    }
}
