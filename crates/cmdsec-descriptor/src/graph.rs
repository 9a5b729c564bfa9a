//! Inhabitant graph: cataloged services and the config-bean tree.
//!
//! Nodes live in an arena and refer to each other by [`InhabitantId`], so a
//! child's `parent` link and a parent's `children` edges never form owning
//! cycles. Nodes are looked up by class name; a class seen again merges into
//! its existing node. Generic CRUD records are the exception: many services
//! share the same three implementation classes, so each of their records gets
//! a fresh node that is never indexed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use cmdsec_types::naming::path_segment;
use cmdsec_types::GenericCommand;
use serde::Serialize;
use tracing::debug;

use crate::error::{DescriptorError, Result};

/// Wildcard child label; contributes no segment to a full path.
pub const WILDCARD_SUBPATH: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InhabitantId(usize);

/// How a child config bean hangs under its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildEdge {
    /// Element name under the parent, or [`WILDCARD_SUBPATH`].
    pub subpath: String,
    pub is_collection: bool,
    pub child: InhabitantId,
}

/// Metadata carried by a generic CRUD command record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GenericCommandInfo {
    pub action: GenericCommand,
    /// Dotted class name of the bean the command operates on.
    pub method_list_actual: String,
    pub method_name: String,
    /// Dotted class name of the bean that owns the target collection.
    pub parent_configured: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Inhabitant {
    /// Dotted implementation (or bean) class name.
    pub class_name: String,
    pub service_name: Option<String>,
    pub contracts: Vec<String>,
    pub generic: Option<GenericCommandInfo>,
    /// Target bean of a generic command.
    pub config_bean_for_command: Option<InhabitantId>,
    /// Named as the `target` of some descriptor record.
    pub is_config_bean: bool,
    parent: Option<InhabitantId>,
    /// Keyed by child class name.
    children: BTreeMap<String, ChildEdge>,
    #[serde(skip)]
    pub(crate) extension_checked: bool,
}

impl Inhabitant {
    fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            service_name: None,
            contracts: Vec::new(),
            generic: None,
            config_bean_for_command: None,
            is_config_bean: false,
            parent: None,
            children: BTreeMap::new(),
            extension_checked: false,
        }
    }

    pub fn parent(&self) -> Option<InhabitantId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ChildEdge)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn child_edge(&self, child_class: &str) -> Option<&ChildEdge> {
        self.children.get(child_class)
    }

    pub fn has_contract(&self, contract: &str) -> bool {
        self.contracts.iter().any(|c| c == contract)
    }
}

/// Structural, id-free view of a node used to compare graphs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeSnapshot {
    pub class_name: String,
    pub service_name: Option<String>,
    pub contracts: Vec<String>,
    pub generic: Option<GenericCommandInfo>,
    pub config_bean_for_command: Option<String>,
    pub parent: Option<String>,
    /// `(child class, subpath, is_collection)`
    pub children: Vec<(String, String, bool)>,
}

#[derive(Debug, Clone, Default)]
pub struct InhabitantGraph {
    nodes: Vec<Inhabitant>,
    by_class: HashMap<String, InhabitantId>,
}

impl InhabitantGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: InhabitantId) -> &Inhabitant {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: InhabitantId) -> &mut Inhabitant {
        &mut self.nodes[id.0]
    }

    /// Indexed node for a class name.
    pub fn find(&self, class_name: &str) -> Option<InhabitantId> {
        self.by_class.get(class_name).copied()
    }

    pub fn find_node(&self, class_name: &str) -> Option<&Inhabitant> {
        self.find(class_name).map(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (InhabitantId, &Inhabitant)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (InhabitantId(i), n))
    }

    /// Existing node for `class_name`, or a new indexed one.
    pub fn find_or_insert(&mut self, class_name: &str) -> InhabitantId {
        if let Some(id) = self.find(class_name) {
            return id;
        }
        let id = self.push(Inhabitant::new(class_name));
        self.by_class.insert(class_name.to_string(), id);
        id
    }

    /// A node that is reachable only through the returned id.
    pub fn insert_detached(&mut self, class_name: &str) -> InhabitantId {
        self.push(Inhabitant::new(class_name))
    }

    fn push(&mut self, node: Inhabitant) -> InhabitantId {
        let id = InhabitantId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn parent(&self, id: InhabitantId) -> Option<InhabitantId> {
        self.get(id).parent
    }

    /// `id` followed by each of its ancestors.
    pub fn ancestors(&self, id: InhabitantId) -> impl Iterator<Item = InhabitantId> + '_ {
        std::iter::successors(Some(id), move |&cur| self.get(cur).parent)
    }

    /// Make `parent` the parent of `child`.
    ///
    /// The candidate's own ancestry is walked first; if `child` appears in it
    /// the graph is left untouched and an error is returned.
    pub fn set_parent(&mut self, child: InhabitantId, parent: InhabitantId) -> Result<()> {
        if self.ancestors(parent).any(|a| a == child) {
            return Err(DescriptorError::AncestryCycle {
                child: self.get(child).class_name.clone(),
                parent: self.get(parent).class_name.clone(),
            });
        }
        if let Some(previous) = self.get(child).parent {
            if previous != parent {
                debug!(
                    child = %self.get(child).class_name,
                    from = %self.get(previous).class_name,
                    to = %self.get(parent).class_name,
                    "reassigning config bean parent"
                );
            }
        }
        self.get_mut(child).parent = Some(parent);
        Ok(())
    }

    // =========================================================================
    // Record-building primitives shared by both parsing strategies
    // =========================================================================

    /// Node that receives the facts of a record for `class_name`.
    pub fn begin_record(&mut self, class_name: &str) -> InhabitantId {
        debug!(class = class_name, "start of inhabitant record");
        if GenericCommand::from_class_name(class_name).is_some() {
            self.insert_detached(class_name)
        } else {
            self.find_or_insert(class_name)
        }
    }

    pub fn add_contracts<I, S>(&mut self, id: InhabitantId, contracts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let node = self.get_mut(id);
        for contract in contracts {
            let contract = contract.as_ref().trim();
            if !contract.is_empty() && !node.has_contract(contract) {
                node.contracts.push(contract.to_string());
            }
        }
    }

    pub fn set_service_name(&mut self, id: InhabitantId, name: &str) {
        self.get_mut(id).service_name = Some(name.to_string());
    }

    /// Attach generic CRUD metadata to a record and link its target bean
    /// under the configured parent bean when the target has no parent yet.
    pub fn apply_generic(
        &mut self,
        id: InhabitantId,
        method_list_actual: &str,
        method_name: &str,
        parent_configured: &str,
    ) -> Result<()> {
        let class_name = self.get(id).class_name.clone();
        let Some(action) = GenericCommand::from_class_name(&class_name) else {
            debug!(class = %class_name, "generic metadata on a non-generic class ignored");
            return Ok(());
        };
        debug!(
            service = ?self.get(id).service_name,
            target = method_list_actual,
            "recognized generic command"
        );
        let parent = self.find_or_insert(parent_configured);
        let target = self.find_or_insert(method_list_actual);
        if self.parent(target).is_none() && target != parent {
            self.set_parent(target, parent)?;
        }
        let node = self.get_mut(id);
        node.generic = Some(GenericCommandInfo {
            action,
            method_list_actual: method_list_actual.to_string(),
            method_name: method_name.to_string(),
            parent_configured: parent_configured.to_string(),
        });
        node.config_bean_for_command = Some(target);
        Ok(())
    }

    /// Node for a class named as a descriptor `target`.
    pub fn declare_config_bean(&mut self, class_name: &str) -> InhabitantId {
        debug!(class = class_name, "recognized config bean");
        let id = self.find_or_insert(class_name);
        self.get_mut(id).is_config_bean = true;
        id
    }

    /// Link `child_class` under `parent` with the given element name.
    ///
    /// The first edge recorded for a child class wins; the parent link is
    /// always updated.
    pub fn add_child(
        &mut self,
        parent: InhabitantId,
        child_class: &str,
        subpath: &str,
        is_collection: bool,
    ) -> Result<InhabitantId> {
        let child = self.find_or_insert(child_class);
        self.set_parent(child, parent)?;
        let node = self.get_mut(parent);
        node.children
            .entry(child_class.to_string())
            .or_insert_with(|| ChildEdge {
                subpath: subpath.to_string(),
                is_collection,
                child,
            });
        debug!(
            child = child_class,
            subpath,
            is_collection,
            parent = %self.get(parent).class_name,
            "added config bean child"
        );
        Ok(child)
    }

    // =========================================================================
    // Paths
    // =========================================================================

    /// Hierarchical resource path of a node (or of a generic command's target).
    ///
    /// Each node that has a parent contributes the label its parent recorded
    /// for it, or its hyphenated simple name when there is no edge. Wildcard
    /// labels contribute nothing and the parentless root contributes nothing.
    /// A path that comes out empty falls back to the start node's own name.
    pub fn full_path(&self, id: InhabitantId) -> String {
        let start = self.get(id).config_bean_for_command.unwrap_or(id);
        let mut segments: Vec<String> = Vec::new();
        let mut current = start;
        while let Some(parent) = self.get(current).parent {
            let class_name = &self.get(current).class_name;
            match self.get(parent).children.get(class_name) {
                Some(edge) if edge.subpath == WILDCARD_SUBPATH => {}
                Some(edge) => segments.push(edge.subpath.clone()),
                None => segments.push(path_segment(class_name)),
            }
            current = parent;
        }
        if segments.is_empty() {
            return path_segment(&self.get(start).class_name);
        }
        segments.reverse();
        segments.join("/")
    }

    /// Full path of the indexed node for a dotted class name.
    pub fn full_path_of(&self, class_name: &str) -> Option<String> {
        self.find(class_name).map(|id| self.full_path(id))
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn snapshot(&self, id: InhabitantId) -> NodeSnapshot {
        let node = self.get(id);
        let mut contracts = node.contracts.clone();
        contracts.sort();
        NodeSnapshot {
            class_name: node.class_name.clone(),
            service_name: node.service_name.clone(),
            contracts,
            generic: node.generic.clone(),
            config_bean_for_command: node
                .config_bean_for_command
                .map(|t| self.get(t).class_name.clone()),
            parent: node.parent.map(|p| self.get(p).class_name.clone()),
            children: node
                .children
                .iter()
                .map(|(class, edge)| (class.clone(), edge.subpath.clone(), edge.is_collection))
                .collect(),
        }
    }

    pub fn snapshots(&self) -> BTreeSet<NodeSnapshot> {
        self.iter().map(|(id, _)| self.snapshot(id)).collect()
    }
}
