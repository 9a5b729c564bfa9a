#![allow(unused_imports)]
//! Shared test utilities for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: synthetic class files and on-disk classpath roots
//! - `assertions`: report lookups and checks with module-aware failure messages

pub mod assertions;
pub mod fixtures;

pub use assertions::{assert_failure_names, assert_offending, command};
pub use fixtures::{
    access_required, admin_module, command_class, config_module, module_input, ClasspathDir,
    ADMIN_DESCRIPTOR, CONFIG_DESCRIPTOR,
};
