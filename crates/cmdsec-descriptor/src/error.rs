//! Errors raised while building the inhabitant graph.

use cmdsec_classfile::ClassFileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Linking `child` under `parent` would make `child` its own ancestor.
    #[error("ancestry cycle: cannot make {parent} the parent of {child}")]
    AncestryCycle { child: String, parent: String },

    /// The two parsing strategies disagreed on the same descriptor text.
    #[error("descriptor parsers disagree for {origin}:\n{detail}")]
    ConsistencyMismatch { origin: String, detail: String },

    #[error("malformed class bytes for {class_name}")]
    MalformedClass {
        class_name: String,
        #[source]
        source: ClassFileError,
    },

    #[error("failed to read class bytes for {class_name}: {message}")]
    ClassSource { class_name: String, message: String },

    #[error("invalid descriptor line pattern")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, DescriptorError>;
