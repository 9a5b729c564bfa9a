//! Per-module compliance pass.
//!
//! A module is checked against a session that may already hold the
//! descriptors of earlier modules:
//!
//! ```text
//! dependency descriptors ──┐
//!                          ├──> session graph ──> command inhabitants ──> resolver
//! module descriptors ──────┘         │                                      │
//!                                    └── extension parents                  v
//!                                                                      ModuleReport
//! ```
//!
//! Only inhabitants that come from the module's own descriptors are treated
//! as the module's commands; dependency descriptors contribute config beans
//! and ancestry for path computation.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use cmdsec_analyzer::AnalysisSession;
use cmdsec_classfile::{ClassSource, DirectoryClassSource};
use cmdsec_types::naming::internal_to_dotted;
use cmdsec_types::AuthorizationInfo;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::overrides::OverrideSet;

/// Message logged (and used as the failure cause) for offending commands.
pub const OFFENDING_MESSAGE: &str = "Following command classes neither provide nor inherit authorization";

// =============================================================================
// Inputs
// =============================================================================

/// One descriptor file's text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorFile {
    /// Unique per session; a repeated origin is not parsed again.
    pub origin: String,
    pub text: String,
}

impl DescriptorFile {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }

    /// Descriptor files present under `root` at any of `locations`.
    pub fn discover(root: &Path, locations: &[String]) -> Result<Vec<Self>> {
        let mut found = Vec::new();
        for location in locations {
            let path = root.join(location);
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read descriptor {}", path.display()))?;
            debug!(path = %path.display(), "found descriptor");
            found.push(Self::new(path.display().to_string(), text));
        }
        Ok(found)
    }
}

/// Everything needed to check one module.
pub struct ModuleInput {
    pub name: String,
    /// Module location as shown in reports.
    pub dir: String,
    /// Bytes of the module's classes and of everything they extend.
    pub source: Box<dyn ClassSource>,
    pub descriptors: Vec<DescriptorFile>,
    pub dependency_descriptors: Vec<DescriptorFile>,
}

impl ModuleInput {
    pub fn new(name: impl Into<String>, dir: impl Into<String>, source: impl ClassSource + 'static) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            source: Box::new(source),
            descriptors: Vec::new(),
            dependency_descriptors: Vec::new(),
        }
    }

    pub fn with_descriptor(mut self, descriptor: DescriptorFile) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn with_dependency_descriptor(mut self, descriptor: DescriptorFile) -> Self {
        self.dependency_descriptors.push(descriptor);
        self
    }

    /// A module whose own classes sit under the first root; later roots are
    /// its dependencies.
    pub fn from_classpath(
        name: impl Into<String>,
        dir: impl Into<String>,
        roots: &[PathBuf],
        descriptor_locations: &[String],
    ) -> Result<Self> {
        let name = name.into();
        let (own, dependencies) = roots
            .split_first()
            .ok_or_else(|| anyhow!("Module {name} has an empty classpath"))?;
        if !own.is_dir() {
            bail!("Module classes directory {} does not exist", own.display());
        }

        let descriptors = DescriptorFile::discover(own, descriptor_locations)?;
        let mut dependency_descriptors = Vec::new();
        for root in dependencies {
            if root.is_dir() {
                dependency_descriptors.extend(DescriptorFile::discover(root, descriptor_locations)?);
            } else {
                warn!(root = %root.display(), "classpath entry is not a directory; skipping");
            }
        }

        Ok(Self {
            name,
            dir: dir.into(),
            source: Box::new(DirectoryClassSource::new(roots.iter().cloned())),
            descriptors,
            dependency_descriptors,
        })
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleReport {
    pub module_name: String,
    pub module_dir: String,
    /// One entry per command, overrides applied.
    pub commands: Vec<AuthorizationInfo>,
    /// Internal class names, plus service names of generic CRUD commands.
    pub compliant: Vec<String>,
    /// Internal class names.
    pub offending: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
    /// Full config path of every config bean named by an authorizing REST
    /// endpoint, keyed by dotted class name.
    pub bean_paths: BTreeMap<String, String>,
}

impl ModuleReport {
    pub fn is_compliant(&self) -> bool {
        self.offending.is_empty()
    }

    pub fn bean_path(&self, internal_name: &str) -> Option<&str> {
        self.bean_paths
            .get(&internal_to_dotted(internal_name))
            .map(String::as_str)
    }
}

// =============================================================================
// Check
// =============================================================================

/// Analyze a module without judging it.
pub fn analyze_module(
    session: &AnalysisSession,
    input: &ModuleInput,
    overrides: &OverrideSet,
) -> Result<ModuleReport> {
    for descriptor in &input.dependency_descriptors {
        session
            .load_descriptor(&descriptor.origin, &descriptor.text)
            .with_context(|| format!("Failed to load dependency descriptor {}", descriptor.origin))?;
    }

    let mut records = Vec::new();
    for descriptor in &input.descriptors {
        let ids = session
            .load_descriptor(&descriptor.origin, &descriptor.text)
            .with_context(|| format!("Failed to load descriptor {}", descriptor.origin))?;
        records.extend(ids);
    }
    let mut seen = HashSet::new();
    records.retain(|id| seen.insert(*id));

    session
        .discover_extension_parents(input.source.as_ref())
        .context("Failed to discover config bean extension parents")?;

    let commands = session.command_inhabitants(&records);
    let resolution = session
        .resolve_commands(input.source.as_ref(), &commands)
        .with_context(|| format!("Failed to resolve commands of module {}", input.name))?;

    let mut infos = Vec::with_capacity(resolution.infos.len());
    let mut bean_paths = BTreeMap::new();
    for shared in &resolution.infos {
        let mut info = AuthorizationInfo::clone(shared);
        overrides.adjust(&mut info);
        for endpoint in info.rest_endpoints.iter().filter(|e| e.use_for_authorization) {
            let Some(bean) = endpoint.config_bean.as_deref() else {
                continue;
            };
            let dotted = internal_to_dotted(bean);
            let path = session.with_graph(|graph| {
                graph
                    .find(&dotted)
                    .filter(|&id| graph.get(id).is_config_bean)
                    .map(|id| graph.full_path(id))
            });
            if let Some(path) = path {
                bean_paths.insert(dotted, path);
            }
        }
        infos.push(info);
    }

    debug!(compliant = ?resolution.compliant, "command classes with authorization");
    info!(
        module = %input.name,
        commands = infos.len(),
        offending = resolution.offending.len(),
        "module analyzed"
    );

    Ok(ModuleReport {
        module_name: input.name.clone(),
        module_dir: input.dir.clone(),
        commands: infos,
        compliant: resolution.compliant,
        offending: resolution.offending,
        trace: resolution.trace,
        bean_paths,
    })
}

/// Analyze a module and report offending commands.
///
/// Offenders are logged as errors and fail the call when the session is
/// configured with `failure_fatal`; otherwise they are logged as warnings.
pub fn check_module(
    session: &AnalysisSession,
    input: &ModuleInput,
    overrides: &OverrideSet,
) -> Result<ModuleReport> {
    let report = analyze_module(session, input, overrides)?;
    enforce(&report, session.config().failure_fatal)?;
    Ok(report)
}

/// Log a report's offenders; an error when `failure_fatal` and any exist.
pub fn enforce(report: &ModuleReport, failure_fatal: bool) -> Result<()> {
    if report.is_compliant() {
        return Ok(());
    }
    if failure_fatal {
        error!(module = %report.module_name, "{OFFENDING_MESSAGE}: {:?}", report.offending);
        bail!(
            "Command class(es) with no authorization in module {}: {}",
            report.module_name,
            report.offending.join(", ")
        );
    }
    warn!(module = %report.module_name, "{OFFENDING_MESSAGE}: {:?}", report.offending);
    Ok(())
}
