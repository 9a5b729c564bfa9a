//! `cmdsec check`

use anyhow::Result;
use clap::Parser;
use cmdsec::args::ModuleArgs;
use cmdsec::module_check::enforce;
use cmdsec::ModuleReport;

#[derive(Parser, Debug)]
pub struct CheckCmd {
    #[command(flatten)]
    module: ModuleArgs,
}

impl CheckCmd {
    pub fn execute(&self, json: bool, verbose: bool) -> Result<()> {
        let (report, failure_fatal) = super::analyze(&self.module)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", format_check(&report, verbose));
        }
        enforce(&report, failure_fatal)
    }
}

fn format_check(report: &ModuleReport, verbose: bool) -> String {
    let mut out = format!(
        "{} ({}): {} command(s), {} with authorization, {} without\n",
        report.module_name,
        report.module_dir,
        report.commands.len(),
        report.compliant.len(),
        report.offending.len()
    );
    for name in &report.offending {
        out.push_str(&format!("  missing authorization: {name}\n"));
    }
    if verbose {
        for line in &report.trace {
            out.push_str(&format!("  {line}\n"));
        }
    }
    out
}
