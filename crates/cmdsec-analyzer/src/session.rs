//! Session-wide analysis state.
//!
//! One [`AnalysisSession`] lives for a whole build: every module analyzed in
//! it shares the verdict cache, the inhabitant graph and the set of
//! descriptor files already read. Hosts that analyze modules in parallel can
//! share it by reference; each field sits behind its own lock.

use std::collections::HashMap;
use std::sync::Arc;

use cmdsec_classfile::ClassSource;
use cmdsec_descriptor::{discover_extension_parents, load_descriptor, Inhabitant, InhabitantGraph, InhabitantId};
use cmdsec_types::{AuthorizationInfo, GenericInfo, Param, ParamValue};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::resolver::{TypeResolver, VerdictCache};
use crate::trace::TraceLog;

/// Contract advertised by every command inhabitant.
pub const ADMIN_COMMAND_CONTRACT: &str = "org.glassfish.api.admin.AdminCommand";

/// Result of resolving one batch of command inhabitants.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One entry per command, in request order.
    pub infos: Vec<Arc<AuthorizationInfo>>,
    /// Commands with authorization: internal class names for bytecode
    /// commands, service names for generic CRUD commands.
    pub compliant: Vec<String>,
    /// Internal class names of commands without authorization. Generic
    /// commands are never offending.
    pub offending: Vec<String>,
    pub trace: Vec<String>,
}

#[derive(Debug, Default)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    cache: RwLock<VerdictCache>,
    graph: RwLock<InhabitantGraph>,
    /// Descriptor origin -> records it contributed.
    processed: Mutex<HashMap<String, Vec<InhabitantId>>>,
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Read one descriptor file into the shared graph.
    ///
    /// An origin already read in this session is not parsed again; its
    /// earlier records are returned.
    pub fn load_descriptor(&self, origin: &str, text: &str) -> Result<Vec<InhabitantId>> {
        let mut processed = self.processed.lock();
        if let Some(records) = processed.get(origin) {
            debug!(origin, "descriptor already loaded in this session");
            return Ok(records.clone());
        }
        let records = load_descriptor(&mut self.graph.write(), text, origin, self.config.check_parsers)?;
        processed.insert(origin.to_string(), records.clone());
        Ok(records)
    }

    pub fn is_descriptor_loaded(&self, origin: &str) -> bool {
        self.processed.lock().contains_key(origin)
    }

    /// Attach extension-point parents to config beans that still lack one.
    pub fn discover_extension_parents(&self, source: &dyn ClassSource) -> Result<usize> {
        let attached = discover_extension_parents(&mut self.graph.write(), source)?;
        if attached > 0 {
            debug!(attached, "attached extension parents");
        }
        Ok(attached)
    }

    /// Snapshot of the nodes behind the given ids.
    pub fn inhabitants(&self, ids: &[InhabitantId]) -> Vec<Inhabitant> {
        let graph = self.graph.read();
        ids.iter().map(|&id| graph.get(id).clone()).collect()
    }

    /// Command inhabitants among `ids`, in order.
    pub fn command_inhabitants(&self, ids: &[InhabitantId]) -> Vec<InhabitantId> {
        let graph = self.graph.read();
        ids.iter()
            .copied()
            .filter(|&id| graph.get(id).has_contract(ADMIN_COMMAND_CONTRACT))
            .collect()
    }

    /// Full path of a config bean by dotted class name.
    pub fn full_path_of(&self, class_name: &str) -> Option<String> {
        self.graph.read().full_path_of(class_name)
    }

    /// Read access to the shared graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&InhabitantGraph) -> R) -> R {
        f(&self.graph.read())
    }

    /// `(cached types, of which commands)`
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read();
        (cache.len(), cache.command_count())
    }

    /// Resolve a batch of command inhabitants.
    ///
    /// Generic CRUD commands are described by their descriptor record alone;
    /// every other command is resolved from bytecode through `source`.
    pub fn resolve_commands(&self, source: &dyn ClassSource, ids: &[InhabitantId]) -> Result<Resolution> {
        let graph = self.graph.read();
        let mut cache = self.cache.write();
        let mut resolver = TypeResolver::new(source, &graph, &mut cache, TraceLog::new(self.config.trace));

        let mut infos = Vec::with_capacity(ids.len());
        let mut generic_names = Vec::new();
        for &id in ids {
            if let Some(info) = generic_command_info(&graph, id) {
                debug!(command = info.display_name(), "generic command needs no byte code");
                generic_names.push(info.display_name().to_string());
                infos.push(Arc::new(info));
                continue;
            }
            let class_name = &graph.get(id).class_name;
            let verdict = resolver.resolve_command(class_name)?;
            match verdict.info() {
                Some(info) => infos.push(Arc::clone(info)),
                None => debug!(class = %class_name, "platform type listed as a command"),
            }
        }

        let (mut compliant, offending, trace) = resolver.finish();
        compliant.extend(generic_names);
        info!(
            commands = infos.len(),
            compliant = compliant.len(),
            offending = offending.len(),
            "resolved command inhabitants"
        );
        for line in &trace {
            debug!("{line}");
        }
        Ok(Resolution {
            infos,
            compliant,
            offending,
            trace,
        })
    }
}

/// Info for a generic CRUD record, or `None` for any other inhabitant.
pub fn generic_command_info(graph: &InhabitantGraph, id: InhabitantId) -> Option<AuthorizationInfo> {
    let node = graph.get(id);
    let generic = node.generic.as_ref()?;
    let mut builder = AuthorizationInfo::builder(node.class_name.clone());
    builder
        .add_param(Param::new("name", "").with_value("primary", ParamValue::Bool(true)))
        .local(false)
        .generic(GenericInfo {
            action: generic.action,
            method_list_actual: generic.method_list_actual.clone(),
            method_name: generic.method_name.clone(),
            full_path: graph.full_path(id),
        });
    if let Some(name) = &node.service_name {
        builder.name(name.clone());
    }
    Some(builder.build())
}
