//! The `inspect` command.

use std::path::PathBuf;

use clap::Args;
use repoupgrade::{summarize, DocumentSummary};

use super::common::read_input;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Repository JSON file, or - for stdin
    pub input: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the inspect command.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let summary = summarize(&read_input(&args.input)?)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render(&summary));
    }
    Ok(())
}

fn render(summary: &DocumentSummary) -> String {
    let mut out = format!(
        "Schema version: {}\nPackages:       {}\nReleases:       {}\n",
        summary.schema_version, summary.packages, summary.releases
    );
    for name in &summary.package_names {
        out.push_str(&format!("  - {}\n", name));
    }
    out
}
