//! Authorization analysis engine
//!
//! Decides, type by type, whether an administrative command declares
//! authorization metadata itself or inherits it from an ancestor.
//!
//! - [`scanner`]: recognized-annotation table applied to one class
//! - [`resolver`]: superclass walk with the session verdict cache
//! - [`session`]: [`AnalysisSession`], the state shared across modules
//! - [`config`]: [`AnalysisConfig`] and its environment overrides
//!
//! # Example
//!
//! ```
//! use cmdsec_analyzer::{AnalysisConfig, AnalysisSession};
//! use cmdsec_analyzer::scanner::ADMIN_COMMAND;
//! use cmdsec_classfile::{ClassWriter, MapClassSource};
//!
//! let session = AnalysisSession::new(AnalysisConfig::default());
//! let ids = session
//!     .load_descriptor(
//!         "example",
//!         "[com.example.Cmd]\ncontract={org.glassfish.api.admin.AdminCommand}\nname=cmd\n",
//!     )
//!     .unwrap();
//! let source = MapClassSource::new().with_class(
//!     "com/example/Cmd",
//!     ClassWriter::new("com/example/Cmd").interface(ADMIN_COMMAND).to_bytes(),
//! );
//! let resolution = session
//!     .resolve_commands(&source, &session.command_inhabitants(&ids))
//!     .unwrap();
//! assert_eq!(resolution.offending, vec!["com/example/Cmd"]);
//! ```

pub mod config;
pub mod error;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod trace;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use resolver::{TypeResolver, Verdict, VerdictCache};
pub use scanner::{scan_class, ClassAnnotation, FieldAnnotation, ScannedType};
pub use session::{generic_command_info, AnalysisSession, Resolution, ADMIN_COMMAND_CONTRACT};
pub use trace::TraceLog;
