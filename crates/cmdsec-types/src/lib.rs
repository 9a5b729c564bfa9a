//! Shared types for the cmdsec workspace.
//!
//! This crate holds the authorization data model produced by the analyzer and
//! consumed by the reporting layer, plus small naming and environment helpers
//! used across crates.
//!
//! - [`auth`]: [`AuthorizationInfo`] and its parts (flags, params, REST endpoints,
//!   resource/action pairs, generic CRUD metadata)
//! - [`naming`]: class-name to path-segment conversions
//! - [`env_utils`]: environment variable parsing for configuration overrides

pub mod auth;
pub mod env_utils;
pub mod naming;

// Re-export commonly used items at crate root
pub use auth::{
    AuthFlags, AuthorizationInfo, AuthorizationInfoBuilder, GenericCommand, GenericInfo, Param,
    ParamValue, ResourceAction, RestEndpoint, ORIGIN_ACCESS_REQUIRED,
    ORIGIN_ACCESS_REQUIRED_NEW_CHILD, ORIGIN_ACCESS_REQUIRED_TO,
};
pub use naming::{convert_name, last_part, rest_op_type_to_action};
