//! hk2 service descriptors and the config-bean graph
//!
//! Descriptor files list cataloged services one record at a time. Reading
//! them builds an [`InhabitantGraph`]: every service record, every config
//! bean named as a `target`, and the parent/child edges between beans that
//! later give commands their resource paths.
//!
//! - [`structured`]: record reader with a decoded metadata map (production path)
//! - [`manual`]: line-pattern parser kept as a reference implementation
//! - [`checker`]: runs both and fails on any difference
//! - [`graph`]: node arena, cycle-checked parent links, full paths
//! - [`extension`]: parents implied by `*Extension` marker interfaces

pub mod checker;
pub mod error;
pub mod extension;
pub mod graph;
pub mod manual;
pub mod structured;

pub use checker::check_consistency;
pub use error::{DescriptorError, Result};
pub use extension::{discover_extension_parents, EXTENSION_PARENTS};
pub use graph::{
    ChildEdge, GenericCommandInfo, Inhabitant, InhabitantGraph, InhabitantId, NodeSnapshot,
    WILDCARD_SUBPATH,
};
pub use manual::{parse_manual, ManualParser};
pub use structured::{parse_structured, read_records, DescriptorRecord};

use tracing::debug;

/// Which descriptor parser to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseStrategy {
    #[default]
    Structured,
    Manual,
}

/// Parse descriptor text into `graph` with the chosen strategy.
pub fn parse_descriptor(
    graph: &mut InhabitantGraph,
    text: &str,
    strategy: ParseStrategy,
) -> Result<Vec<InhabitantId>> {
    match strategy {
        ParseStrategy::Structured => parse_structured(text, graph),
        ParseStrategy::Manual => parse_manual(text, graph),
    }
}

/// Load one descriptor file's text into `graph`.
///
/// With `check` set the text goes through [`check_consistency`] instead of a
/// single parse.
pub fn load_descriptor(
    graph: &mut InhabitantGraph,
    text: &str,
    origin: &str,
    check: bool,
) -> Result<Vec<InhabitantId>> {
    let records = if check {
        check_consistency(graph, text, origin)?
    } else {
        parse_descriptor(graph, text, ParseStrategy::Structured)?
    };
    debug!(origin, records = records.len(), nodes = graph.len(), "loaded descriptor");
    Ok(records)
}
