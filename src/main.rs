//! Command-line front end for converting MQM typology spreadsheets to XML.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
