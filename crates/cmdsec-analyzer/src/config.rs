//! Analysis settings.

use cmdsec_types::env_utils::env_flag;
use serde::{Deserialize, Serialize};

pub const ENV_FAILURE_FATAL: &str = "CMDSEC_FAILURE_FATAL";
pub const ENV_CHECK_PARSERS: &str = "CMDSEC_CHECK_PARSERS";
pub const ENV_TRACE: &str = "CMDSEC_TRACE";

/// Descriptor locations searched inside every classpath root.
pub const DEFAULT_DESCRIPTOR_PATHS: &[&str] = &[
    "META-INF/hk2-locator/default",
    "META-INF/hk2-locator/tenant-scoped",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Offending commands fail the module check instead of only warning.
    pub failure_fatal: bool,
    /// Run both descriptor parsers and require identical graphs.
    pub check_parsers: bool,
    /// Collect per-class narration lines.
    pub trace: bool,
    pub descriptor_paths: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            failure_fatal: true,
            check_parsers: false,
            trace: false,
            descriptor_paths: DEFAULT_DESCRIPTOR_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults overridden by `CMDSEC_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_flag(ENV_FAILURE_FATAL) {
            config.failure_fatal = v;
        }
        if let Some(v) = env_flag(ENV_CHECK_PARSERS) {
            config.check_parsers = v;
        }
        if let Some(v) = env_flag(ENV_TRACE) {
            config.trace = v;
        }
        config
    }

    pub fn with_failure_fatal(mut self, failure_fatal: bool) -> Self {
        self.failure_fatal = failure_fatal;
        self
    }

    pub fn with_check_parsers(mut self, check_parsers: bool) -> Self {
        self.check_parsers = check_parsers;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
