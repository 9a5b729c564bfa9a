//! `cmdsec print`

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cmdsec::args::ModuleArgs;
use cmdsec::module_check::enforce;
use cmdsec::{render, OutputFormat};

#[derive(Parser, Debug)]
pub struct PrintCmd {
    #[command(flatten)]
    module: ModuleArgs,

    /// Output format: summary, wiki, csv or json. Unknown names fall back to summary.
    #[arg(long, default_value = "summary")]
    format: String,

    /// Write the report to a file instead of stdout
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl PrintCmd {
    pub fn execute(&self, json: bool) -> Result<()> {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::from_name_or_summary(&self.format)
        };
        let (report, failure_fatal) = super::analyze(&self.module)?;
        let rendered = render(format, std::slice::from_ref(&report))?;

        match &self.output {
            Some(path) => {
                fs::write(path, &rendered)
                    .with_context(|| format!("Unable to write command list to {}", path.display()))?;
                tracing::info!(path = %path.display(), %format, "wrote command list");
            }
            None => print!("{rendered}"),
        }
        enforce(&report, failure_fatal)
    }
}
