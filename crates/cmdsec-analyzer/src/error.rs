//! Typed failures of a resolution pass.

use cmdsec_classfile::ClassFileError;
use cmdsec_descriptor::DescriptorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The classpath has no bytes for a type some command depends on.
    #[error("cannot locate byte code for {type_name}")]
    MissingType { type_name: String },

    #[error("malformed class bytes for {type_name}")]
    MalformedClass {
        type_name: String,
        #[source]
        source: ClassFileError,
    },

    /// Reading bytes that exist failed.
    #[error("error reading byte code for {type_name}")]
    ClassSource {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// `type_name` turned up again while its own ancestry was being resolved.
    #[error("ancestry cycle at {type_name}: {}", chain.join(" -> "))]
    AncestryCycle { type_name: String, chain: Vec<String> },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
