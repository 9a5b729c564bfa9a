//! Line-oriented descriptor parser.
//!
//! Matches each (comment-stripped, trimmed) line against a small family of
//! patterns. Anything it does not recognize is ignored, which is what lets it
//! cope with the irregular metadata lines of real descriptor files.

use cmdsec_types::GenericCommand;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::{InhabitantGraph, InhabitantId};

/// Compiled line patterns.
pub struct ManualParser {
    impl_class: Regex,
    contracts: Regex,
    name: Regex,
    config_bean_prefix: Regex,
    config_bean_child: Regex,
    generic_info: Regex,
}

impl ManualParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            impl_class: Regex::new(r"^\[([^\]]+)\]$")?,
            contracts: Regex::new(r"^contract=\{([^}]+)\}$")?,
            name: Regex::new(r"^name=(.+)$")?,
            config_bean_prefix: Regex::new(r"^metadata=target=\{([^}]+)\}(.*)$")?,
            // ,<element-name>={class-name} or ,<element-name>={collection\:class-name};
            // attribute (@x={..}) and key declarations are matched so they are skipped
            config_bean_child: Regex::new(
                r",(?:<([^>]+)>=\{(collection\\:)?([^,}]+)[},])|(?:@[^}]+\})|(?:key=[^}]+)|(?:keyed-as=[^}]+)",
            )?,
            generic_info: Regex::new(
                r"^metadata=MethodListActual=\{([^}]+)\},MethodName=\{([^}]+)\},ParentConfigured=\{([^}]+)\}$",
            )?,
        })
    }

    /// Parse descriptor text into `graph`, returning the record nodes in order.
    pub fn parse(&self, text: &str, graph: &mut InhabitantGraph) -> Result<Vec<InhabitantId>> {
        let mut records = Vec::new();
        let mut current: Option<InhabitantId> = None;

        for (lineno, raw) in text.lines().enumerate() {
            let line = clean_line(raw);
            if line.is_empty() {
                current = None;
                continue;
            }

            if let Some(caps) = self.impl_class.captures(line) {
                let id = graph.begin_record(&caps[1]);
                records.push(id);
                current = Some(id);
                continue;
            }

            let Some(id) = current else {
                warn!(line = lineno + 1, text = line, "descriptor line outside of a record; skipping");
                continue;
            };

            if let Some(caps) = self.contracts.captures(line) {
                graph.add_contracts(id, caps[1].split(','));
            } else if let Some(caps) = self.name.captures(line) {
                graph.set_service_name(id, &caps[1]);
            } else if GenericCommand::from_class_name(&graph.get(id).class_name).is_some() {
                if let Some(caps) = self.generic_info.captures(line) {
                    graph.apply_generic(id, &caps[1], &caps[2], &caps[3])?;
                }
            }

            if let Some(caps) = self.config_bean_prefix.captures(line) {
                let bean = graph.declare_config_bean(&caps[1]);
                let rest = caps.get(2).map_or("", |m| m.as_str());
                for child in self.config_bean_child.captures_iter(rest) {
                    // only the <element>= variant captures; the rest are skipped declarations
                    let (Some(label), Some(class)) = (child.get(1), child.get(3)) else {
                        continue;
                    };
                    let is_collection = child.get(2).is_some();
                    graph.add_child(bean, class.as_str(), label.as_str(), is_collection)?;
                }
            } else if line.starts_with('[') {
                warn!(line = lineno + 1, text = line, "malformed record header; skipping");
            } else {
                debug!(line = lineno + 1, text = line, "descriptor line not used");
            }
        }
        Ok(records)
    }
}

/// Strip a `#` comment and surrounding whitespace.
pub(crate) fn clean_line(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => line[..idx].trim(),
        None => line.trim(),
    }
}

/// Parse with a freshly compiled [`ManualParser`].
pub fn parse_manual(text: &str, graph: &mut InhabitantGraph) -> Result<Vec<InhabitantId>> {
    ManualParser::new()?.parse(text, graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_record() {
        let mut graph = InhabitantGraph::new();
        let ids = parse_manual("[com.example.Foo]\ncontract={X,Y}\nname=fooName\n\n", &mut graph)
            .unwrap();
        assert_eq!(ids.len(), 1);
        let node = graph.get(ids[0]);
        assert_eq!(node.class_name, "com.example.Foo");
        assert_eq!(node.contracts, vec!["X", "Y"]);
        assert_eq!(node.service_name.as_deref(), Some("fooName"));
    }

    #[test]
    fn test_comments_and_missing_blank_separator() {
        let text = "# header comment\n[a.One] # trailing\nname=one\n[a.Two]\nname=two # note\n";
        let mut graph = InhabitantGraph::new();
        let ids = parse_manual(text, &mut graph).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(graph.get(ids[0]).service_name.as_deref(), Some("one"));
        assert_eq!(graph.get(ids[1]).service_name.as_deref(), Some("two"));
    }

    #[test]
    fn test_lines_outside_records_are_skipped() {
        let text = "name=orphan\n\n[a.One]\nname=one\n\ncontract={Z}\n";
        let mut graph = InhabitantGraph::new();
        let ids = parse_manual(text, &mut graph).unwrap();
        assert_eq!(ids.len(), 1);
        assert!(graph.get(ids[0]).contracts.is_empty());
    }

    #[test]
    fn test_config_bean_children() {
        let text = "[com.example.ServersInjector]\n\
            contract={org.jvnet.hk2.config.ConfigInjector}\n\
            metadata=target={com.example.Servers},<server>={collection\\:com.example.Server},@name={optional},key=name\n";
        let mut graph = InhabitantGraph::new();
        parse_manual(text, &mut graph).unwrap();
        let servers = graph.find("com.example.Servers").unwrap();
        assert!(graph.get(servers).is_config_bean);
        let edge = graph.get(servers).child_edge("com.example.Server").unwrap();
        assert_eq!(edge.subpath, "server");
        assert!(edge.is_collection);
        assert_eq!(graph.get(servers).children().count(), 1);
    }

    #[test]
    fn test_generic_command_record() {
        let text = "[org.glassfish.config.support.GenericCreateCommand]\n\
            contract={org.glassfish.api.admin.AdminCommand}\n\
            name=create-server\n\
            metadata=MethodListActual={com.example.Server},MethodName={create},ParentConfigured={com.example.Servers}\n";
        let mut graph = InhabitantGraph::new();
        let ids = parse_manual(text, &mut graph).unwrap();
        let node = graph.get(ids[0]);
        let generic = node.generic.as_ref().unwrap();
        assert_eq!(generic.action, GenericCommand::Create);
        assert_eq!(generic.method_list_actual, "com.example.Server");
        assert_eq!(generic.parent_configured, "com.example.Servers");
        assert!(node.config_bean_for_command.is_some());
    }

    #[test]
    fn test_generic_info_ignored_for_other_classes() {
        let text = "[com.example.Custom]\n\
            metadata=MethodListActual={com.example.Server},MethodName={create},ParentConfigured={com.example.Servers}\n";
        let mut graph = InhabitantGraph::new();
        let ids = parse_manual(text, &mut graph).unwrap();
        assert!(graph.get(ids[0]).generic.is_none());
        assert!(graph.find("com.example.Server").is_none());
    }

    #[test]
    fn test_cycle_in_descriptor_is_error() {
        let text = "[a.InjA]\nmetadata=target={a.A},<b>={a.B}\n\n[a.InjB]\nmetadata=target={a.B},<a>={a.A}\n";
        let mut graph = InhabitantGraph::new();
        assert!(parse_manual(text, &mut graph).is_err());
    }
}
