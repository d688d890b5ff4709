use std::path::{Path, PathBuf};

mod convert;
mod export_schema;
mod init;
mod sheets;
mod terminal;
mod validate;

use clap::ArgAction;
use typology::Config;

/// Default location of the configuration file.
const CONFIG_FILE: &str = "typology.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List the worksheets of a workbook
    Sheets(sheets::Command),

    /// Convert a typology worksheet to XML
    ///
    /// Without --sheet, the worksheet is picked from an interactive list.
    Convert(convert::Command),

    /// Validate an existing typology document against the schema
    Validate(validate::Command),

    /// Write the schema to a file or directory
    ExportSchema(export_schema::Command),

    /// Write a configuration file with default settings
    Init(init::Command),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Sheets(command) => command.run()?,
            Self::Convert(command) => command.run(&load_config(config_path)?)?,
            Self::Validate(command) => command.run(&load_config(config_path)?)?,
            Self::ExportSchema(command) => command.run(&load_config(config_path)?)?,
            Self::Init(command) => command.run(config_path)?,
        }
        Ok(())
    }
}

/// Loads the configuration, falling back to defaults if there is no file.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    Config::load(path).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}
