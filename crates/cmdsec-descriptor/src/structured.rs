//! Record-oriented descriptor parser.
//!
//! Reads each record into a [`DescriptorRecord`] first (implementation,
//! contracts, name and a fully decoded metadata map) and only then applies
//! it to the graph. This is the production strategy; [`crate::manual`] is
//! kept as the reference the consistency checker compares against.

use cmdsec_types::GenericCommand;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::{InhabitantGraph, InhabitantId};
use crate::manual::clean_line;

const COLLECTION_PREFIX: &str = "collection:";

pub const META_TARGET: &str = "target";
pub const META_METHOD_LIST_ACTUAL: &str = "MethodListActual";
pub const META_METHOD_NAME: &str = "MethodName";
pub const META_PARENT_CONFIGURED: &str = "ParentConfigured";

/// One `[implementation]` block of a descriptor file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptorRecord {
    pub implementation: String,
    pub contracts: Vec<String>,
    pub name: Option<String>,
    pub scope: Option<String>,
    pub qualifiers: Vec<String>,
    /// Metadata entries in the order first seen; repeated keys are merged.
    pub metadata: Vec<(String, Vec<String>)>,
}

impl DescriptorRecord {
    pub fn new(implementation: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
            ..Default::default()
        }
    }

    pub fn metadata(&self, key: &str) -> Option<&[String]> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn first_metadata(&self, key: &str) -> Option<&str> {
        self.metadata(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    fn add_metadata(&mut self, key: String, values: Vec<String>) {
        match self.metadata.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(values),
            None => self.metadata.push((key, values)),
        }
    }

    /// `<label>` metadata keys: `(label, child class, is_collection)`.
    pub fn child_declarations(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.metadata.iter().filter_map(|(key, values)| {
            let label = key.strip_prefix('<')?.strip_suffix('>')?;
            let value = values.first()?;
            Some(match value.strip_prefix(COLLECTION_PREFIX) {
                Some(class) => (label, class, true),
                None => (label, value.as_str(), false),
            })
        })
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Split descriptor text into records.
///
/// Lines that cannot be decoded are logged and skipped; they never abort
/// the read.
pub fn read_records(text: &str) -> Vec<DescriptorRecord> {
    let mut records = Vec::new();
    let mut current: Option<DescriptorRecord> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = clean_line(raw);
        if line.is_empty() {
            records.extend(current.take());
            continue;
        }

        if let Some(implementation) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            records.extend(current.take());
            if implementation.is_empty() || implementation.contains(['[', ']']) {
                warn!(line = lineno + 1, text = line, "malformed record header; skipping");
                continue;
            }
            current = Some(DescriptorRecord::new(implementation));
            continue;
        }

        let Some(record) = current.as_mut() else {
            warn!(line = lineno + 1, text = line, "descriptor line outside of a record; skipping");
            continue;
        };

        let Some((key, value)) = line.split_once('=') else {
            warn!(line = lineno + 1, text = line, "descriptor line is not key=value; skipping");
            continue;
        };

        match key {
            "contract" => match parse_set(value) {
                Ok(contracts) => record.contracts.extend(contracts),
                Err(reason) => warn!(line = lineno + 1, %reason, "bad contract list; skipping"),
            },
            "qualifier" => match parse_set(value) {
                Ok(qualifiers) => record.qualifiers.extend(qualifiers),
                Err(reason) => warn!(line = lineno + 1, %reason, "bad qualifier list; skipping"),
            },
            "name" => record.name = Some(value.to_string()),
            "scope" => record.scope = Some(value.to_string()),
            "metadata" => match parse_metadata(value) {
                Ok(entries) => {
                    for (k, v) in entries {
                        record.add_metadata(k, v);
                    }
                }
                Err(reason) => warn!(line = lineno + 1, %reason, "bad metadata; skipping"),
            },
            other => debug!(line = lineno + 1, key = other, "descriptor key not used"),
        }
    }
    records.extend(current);
    records
}

/// `{a,b,c}` into its trimmed members.
fn parse_set(value: &str) -> std::result::Result<Vec<String>, String> {
    let inner = value
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .ok_or_else(|| format!("expected {{...}}, found {value:?}"))?;
    Ok(inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// Decode `k1={v1,v2},k2=v3` with backslash escapes.
pub fn parse_metadata(text: &str) -> std::result::Result<Vec<(String, Vec<String>)>, String> {
    let mut entries = Vec::new();
    let mut chars = text.chars().peekable();

    while chars.peek().is_some() {
        let mut key = String::new();
        loop {
            match chars.next() {
                Some('=') => break,
                Some(c) => key.push(c),
                None => return Err(format!("metadata key {key:?} has no value")),
            }
        }
        if key.is_empty() {
            return Err("empty metadata key".to_string());
        }

        let mut values = Vec::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => value.extend(chars.next()),
                    ',' => values.push(std::mem::take(&mut value)),
                    '}' => {
                        values.push(std::mem::take(&mut value));
                        closed = true;
                        break;
                    }
                    c => value.push(c),
                }
            }
            if !closed {
                return Err(format!("unterminated value list for {key:?}"));
            }
            match chars.next() {
                None | Some(',') => {}
                Some(c) => return Err(format!("unexpected {c:?} after value list for {key:?}")),
            }
        } else {
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => value.extend(chars.next()),
                    ',' => break,
                    c => value.push(c),
                }
            }
            values.push(value);
        }
        entries.push((key, values));
    }
    Ok(entries)
}

// =============================================================================
// Applying to the graph
// =============================================================================

/// Merge one record into the graph.
pub fn apply_record(graph: &mut InhabitantGraph, record: &DescriptorRecord) -> Result<InhabitantId> {
    let id = graph.begin_record(&record.implementation);
    graph.add_contracts(id, &record.contracts);
    if let Some(name) = &record.name {
        graph.set_service_name(id, name);
    }

    if GenericCommand::from_class_name(&record.implementation).is_some() {
        let fields = (
            record.first_metadata(META_METHOD_LIST_ACTUAL),
            record.first_metadata(META_METHOD_NAME),
            record.first_metadata(META_PARENT_CONFIGURED),
        );
        match fields {
            (Some(target), Some(method), Some(parent)) => {
                graph.apply_generic(id, target, method, parent)?;
            }
            (_, Some(_), _) => debug!(
                class = %record.implementation,
                service = ?record.name,
                "generic command metadata incomplete"
            ),
            _ => {}
        }
    }

    if let Some(target) = record.first_metadata(META_TARGET) {
        let bean = graph.declare_config_bean(target);
        for (label, class, is_collection) in record.child_declarations() {
            graph.add_child(bean, class, label, is_collection)?;
        }
    }
    Ok(id)
}

/// Parse descriptor text into `graph`, returning the record nodes in order.
pub fn parse_structured(text: &str, graph: &mut InhabitantGraph) -> Result<Vec<InhabitantId>> {
    read_records(text)
        .iter()
        .map(|record| apply_record(graph, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_basic_record() {
        let records = read_records("[com.example.Foo]\ncontract={X,Y}\nname=fooName\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].implementation, "com.example.Foo");
        assert_eq!(records[0].contracts, vec!["X", "Y"]);
        assert_eq!(records[0].name.as_deref(), Some("fooName"));
    }

    #[test]
    fn test_record_closed_at_end_of_input_and_by_header() {
        let records = read_records("[a.One]\nname=one\n[a.Two]\nname=two");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name.as_deref(), Some("two"));
    }

    #[test]
    fn test_metadata_escapes_and_bare_values() {
        let entries =
            parse_metadata(r"target={a.B},<c>={collection\:a.C},@name={optional,default\:x},key=name")
                .unwrap();
        assert_eq!(entries[0], ("target".into(), vec!["a.B".into()]));
        assert_eq!(entries[1], ("<c>".into(), vec!["collection:a.C".into()]));
        assert_eq!(
            entries[2],
            ("@name".into(), vec!["optional".into(), "default:x".into()])
        );
        assert_eq!(entries[3], ("key".into(), vec!["name".into()]));
    }

    #[test]
    fn test_metadata_errors() {
        assert!(parse_metadata("target={a.B").is_err());
        assert!(parse_metadata("novalue").is_err());
        assert!(parse_metadata("=x").is_err());
    }

    #[test]
    fn test_bad_metadata_line_is_skipped() {
        let records = read_records("[a.One]\nmetadata=target={a.B\nname=one\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].metadata.is_empty());
        assert_eq!(records[0].name.as_deref(), Some("one"));
    }

    #[test]
    fn test_repeated_metadata_keys_merge() {
        let records = read_records("[a.One]\nmetadata=k={1}\nmetadata=k={2},j=3\n");
        assert_eq!(records[0].metadata("k").unwrap(), ["1", "2"]);
        assert_eq!(records[0].first_metadata("j"), Some("3"));
    }

    #[test]
    fn test_apply_children_and_generic() {
        let text = "[com.example.ServersInjector]\n\
            metadata=target={com.example.Servers},<*>={collection\\:com.example.Server},@name={optional}\n\
            \n\
            [org.glassfish.config.support.GenericListCommand]\n\
            contract={org.glassfish.api.admin.AdminCommand}\n\
            name=list-servers\n\
            metadata=MethodListActual={com.example.Server},MethodName={list},ParentConfigured={com.example.Servers}\n";
        let mut graph = InhabitantGraph::new();
        let ids = parse_structured(text, &mut graph).unwrap();
        assert_eq!(ids.len(), 2);

        let servers = graph.find("com.example.Servers").unwrap();
        let edge = graph.get(servers).child_edge("com.example.Server").unwrap();
        assert_eq!(edge.subpath, "*");
        assert!(edge.is_collection);

        let generic = graph.get(ids[1]).generic.as_ref().unwrap();
        assert_eq!(generic.action, GenericCommand::List);
        assert_eq!(graph.full_path(ids[1]), "server");
    }
}
