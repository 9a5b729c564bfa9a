use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use cmdsec_analyzer::AnalysisConfig;

use crate::module_check::ModuleInput;
use crate::overrides::{OverrideSet, OVERRIDE_FILE_NAME};

/// Which module to analyze and how strictly.
#[derive(Debug, Clone, Args)]
pub struct ModuleArgs {
    /// Classpath root. The first one holds the module's own classes and
    /// descriptors; the rest are its dependencies. Can be provided multiple times.
    #[arg(long = "classpath", value_name = "DIR", required = true)]
    pub classpath: Vec<PathBuf>,

    /// Module name shown in reports (defaults to the module directory's name).
    #[arg(long, value_name = "NAME")]
    pub module_name: Option<String>,

    /// Module directory shown in reports (defaults to the first classpath root).
    #[arg(long, value_name = "DIR")]
    pub module_dir: Option<PathBuf>,

    /// Override file (defaults to `commandSecurityOverride.txt` in the module directory).
    #[arg(long, value_name = "PATH")]
    pub override_file: Option<PathBuf>,

    /// Warn about commands without authorization instead of failing.
    #[arg(long, default_value_t = false)]
    pub no_fail: bool,

    /// Parse every descriptor with both parsers and require identical results.
    #[arg(long, default_value_t = false)]
    pub check_parsers: bool,

    /// Collect the per-class analysis trace.
    #[arg(long, default_value_t = false)]
    pub trace: bool,
}

impl ModuleArgs {
    /// Environment defaults with command-line flags applied on top.
    pub fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::from_env();
        if self.no_fail {
            config.failure_fatal = false;
        }
        if self.check_parsers {
            config.check_parsers = true;
        }
        if self.trace {
            config.trace = true;
        }
        config
    }

    pub fn module_dir(&self) -> PathBuf {
        self.module_dir
            .clone()
            .or_else(|| self.classpath.first().cloned())
            .unwrap_or_default()
    }

    pub fn module_name(&self) -> String {
        if let Some(name) = &self.module_name {
            return name.clone();
        }
        let dir = self.module_dir();
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string())
    }

    pub fn overrides(&self) -> OverrideSet {
        let path = self
            .override_file
            .clone()
            .unwrap_or_else(|| self.module_dir().join(OVERRIDE_FILE_NAME));
        OverrideSet::load(&path)
    }

    pub fn module_input(&self, config: &AnalysisConfig) -> Result<ModuleInput> {
        ModuleInput::from_classpath(
            self.module_name(),
            self.module_dir().display().to_string(),
            &self.classpath,
            &config.descriptor_paths,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        module: ModuleArgs,
    }

    #[test]
    fn test_defaults_from_first_root() {
        let args = Harness::parse_from(["cmdsec", "--classpath", "build/core", "--classpath", "lib/dep"]).module;
        assert_eq!(args.classpath.len(), 2);
        assert_eq!(args.module_dir(), PathBuf::from("build/core"));
        assert_eq!(args.module_name(), "core");
    }

    #[test]
    fn test_flags_override_config() {
        let args = Harness::parse_from([
            "cmdsec",
            "--classpath",
            "x",
            "--no-fail",
            "--check-parsers",
            "--trace",
            "--module-name",
            "named",
        ])
        .module;
        let config = args.config();
        assert!(!config.failure_fatal);
        assert!(config.check_parsers);
        assert!(config.trace);
        assert_eq!(args.module_name(), "named");
    }

    #[test]
    fn test_classpath_is_required() {
        assert!(Harness::try_parse_from(["cmdsec"]).is_err());
    }
}
