//! Command Authorization Compliance
//!
//! Checks that every administrative command in a module declares, inherits or
//! delegates its authorization requirements, and renders the catalogue of
//! what each command needs:
//!
//! - **Module check**: read a module's descriptors, pick out its commands and
//!   resolve each against the module classpath ([`module_check`])
//! - **Overrides**: hand-maintained replacement resource/action lists
//!   ([`overrides`])
//! - **Reports**: summary, wiki table, CSV and JSON renderings ([`report`])
//!
//! The analysis itself lives in the workspace crates re-exported below; see
//! [`cmdsec_analyzer::AnalysisSession`] for the session-wide state shared by
//! every module checked in one run.

pub mod args;
pub mod module_check;
pub mod overrides;
pub mod report;

pub use cmdsec_analyzer::{AnalysisConfig, AnalysisSession};
pub use module_check::{analyze_module, check_module, DescriptorFile, ModuleInput, ModuleReport};
pub use overrides::{OverrideSet, OVERRIDE_FILE_NAME};
pub use report::{render, OutputFormat};
