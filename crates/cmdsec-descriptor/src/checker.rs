//! Cross-check of the two descriptor parsers.
//!
//! Both strategies run over the same text, each on its own copy of the
//! current graph. Their results are compared as sets of structural
//! snapshots, so record order and node ids do not matter.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tracing::info;

use crate::error::{DescriptorError, Result};
use crate::graph::{InhabitantGraph, InhabitantId, NodeSnapshot};
use crate::manual::ManualParser;
use crate::structured::parse_structured;

/// What one strategy did to a graph.
#[derive(Debug)]
struct Outcome {
    graph: InhabitantGraph,
    added: BTreeSet<NodeSnapshot>,
    records: BTreeSet<NodeSnapshot>,
    record_ids: Vec<InhabitantId>,
}

fn run(
    base: &InhabitantGraph,
    before: &BTreeSet<NodeSnapshot>,
    parse: impl FnOnce(&mut InhabitantGraph) -> Result<Vec<InhabitantId>>,
) -> Result<Outcome> {
    let mut graph = base.clone();
    let record_ids = parse(&mut graph)?;
    let added = graph.snapshots().difference(before).cloned().collect();
    let records = record_ids.iter().map(|&id| graph.snapshot(id)).collect();
    Ok(Outcome {
        graph,
        added,
        records,
        record_ids,
    })
}

fn describe(out: &mut String, label: &str, items: &[&NodeSnapshot]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {label}:");
    for item in items {
        let _ = writeln!(out, "    {item:?}");
    }
}

/// Parse `text` with both strategies and require identical results.
///
/// On agreement, `graph` is replaced by the structured result and the record
/// ids from that parse are returned. On disagreement `graph` is left as it
/// was and a [`DescriptorError::ConsistencyMismatch`] lists what each
/// strategy produced that the other did not.
pub fn check_consistency(
    graph: &mut InhabitantGraph,
    text: &str,
    origin: &str,
) -> Result<Vec<InhabitantId>> {
    let before = graph.snapshots();
    let manual_parser = ManualParser::new()?;
    let structured = run(graph, &before, |g| parse_structured(text, g))?;
    let manual = run(graph, &before, |g| manual_parser.parse(text, g))?;

    if structured.added == manual.added && structured.records == manual.records {
        info!(
            origin,
            records = structured.record_ids.len(),
            added = structured.added.len(),
            "descriptor parsers agree"
        );
        *graph = structured.graph;
        return Ok(structured.record_ids);
    }

    let mut detail = String::new();
    let only_structured: Vec<_> = structured.added.difference(&manual.added).collect();
    let only_manual: Vec<_> = manual.added.difference(&structured.added).collect();
    describe(&mut detail, "nodes only from structured parser", &only_structured);
    describe(&mut detail, "nodes only from manual parser", &only_manual);
    let rec_structured: Vec<_> = structured.records.difference(&manual.records).collect();
    let rec_manual: Vec<_> = manual.records.difference(&structured.records).collect();
    describe(&mut detail, "records only from structured parser", &rec_structured);
    describe(&mut detail, "records only from manual parser", &rec_manual);

    Err(DescriptorError::ConsistencyMismatch {
        origin: origin.to_string(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# generated
[com.example.DomainInjector]
contract={org.jvnet.hk2.config.ConfigInjector}
metadata=target={com.example.Domain},<servers>={com.example.Servers},@name={optional},key=name

[com.example.ServersInjector]
contract={org.jvnet.hk2.config.ConfigInjector}
metadata=target={com.example.Servers},<*>={collection\\:com.example.Server},keyed-as=com.example.Server

[com.example.CreateThing]
contract={org.glassfish.api.admin.AdminCommand}
name=create-thing

[org.glassfish.config.support.GenericDeleteCommand]
contract={org.glassfish.api.admin.AdminCommand}
name=delete-server
metadata=MethodListActual={com.example.Server},MethodName={delete},ParentConfigured={com.example.Servers}
";

    #[test]
    fn test_parsers_agree_on_sample() {
        let mut graph = InhabitantGraph::new();
        let ids = check_consistency(&mut graph, SAMPLE, "sample").unwrap();
        assert_eq!(ids.len(), 4);
        let server = graph.find("com.example.Server").unwrap();
        assert_eq!(graph.full_path(server), "servers");
        assert_eq!(graph.full_path(ids[3]), "servers");
    }

    #[test]
    fn test_agreement_is_relative_to_existing_graph() {
        let mut graph = InhabitantGraph::new();
        check_consistency(&mut graph, SAMPLE, "first").unwrap();
        let size = graph.len();
        // re-reading merges into existing nodes, apart from the detached generic record
        check_consistency(&mut graph, SAMPLE, "second").unwrap();
        assert_eq!(graph.len(), size + 1);
    }

    #[test]
    fn test_mismatch_reports_both_sides() {
        // target not first: only the structured reader picks up the bean
        let text = "[a.Inj]\nmetadata=@x={y},target={a.Bean}\n";
        let mut graph = InhabitantGraph::new();
        let err = check_consistency(&mut graph, text, "odd").unwrap_err();
        match err {
            DescriptorError::ConsistencyMismatch { origin, detail } => {
                assert_eq!(origin, "odd");
                assert!(detail.contains("only from structured parser"));
                assert!(detail.contains("a.Bean"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(graph.is_empty());
    }
}
