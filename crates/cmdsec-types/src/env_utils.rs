//! Environment variable parsing utilities.
//!
//! Configuration structs start from their defaults and layer environment
//! overrides on top, so these helpers distinguish "unset" from "set to a
//! falsy value":
//!
//! ```
//! use cmdsec_types::env_utils::{env_flag, env_var};
//!
//! // `None` when unset, so the caller keeps its own default
//! let fatal = env_flag("CMDSEC_FAILURE_FATAL").unwrap_or(true);
//!
//! let limit: Option<usize> = env_var("CMDSEC_SOME_LIMIT");
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a boolean flag.
///
/// `1`, `true`, `yes`, `on` are true and `0`, `false`, `no`, `off` are false
/// (case-insensitive). Unset or unrecognized values yield `None`.
pub fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|v| parse_flag(&v))
}

/// Check if an environment variable is set to a truthy value.
pub fn env_bool(key: &str) -> bool {
    env_flag(key).unwrap_or(false)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
