//! Subcommands of the `cmdsec` binary.

pub mod check;
pub mod print;

use anyhow::Result;
use cmdsec::args::ModuleArgs;
use cmdsec::{analyze_module, AnalysisSession, ModuleReport};

/// Analyze the module named by `args` in a fresh session.
///
/// Returns the report together with the `failure_fatal` setting in effect.
pub(crate) fn analyze(args: &ModuleArgs) -> Result<(ModuleReport, bool)> {
    let session = AnalysisSession::new(args.config());
    let input = args.module_input(session.config())?;
    let overrides = args.overrides();
    let report = analyze_module(&session, &input, &overrides)?;
    Ok((report, session.config().failure_fatal))
}
