//! # Type Resolution
//!
//! Resolves the full authorization status of a type by combining its own
//! scanned facts with those of its superclass chain.
//!
//! ## Key Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Verdict`] | Command / non-command / platform outcome for one type |
//! | [`VerdictCache`] | Session-wide memo of verdicts, keyed by internal name |
//! | [`TypeResolver`] | One resolution pass over a [`ClassSource`] |
//!
//! ## Algorithm
//!
//! ```text
//! resolve(T)
//!   ├─ cached?            ──► return verdict
//!   ├─ java/*             ──► platform (no bytes fetched)
//!   ├─ T being resolved?  ──► AncestryCycle
//!   ├─ fetch + decode + scan
//!   ├─ resolve(super(T))  ──► attached as parent
//!   └─ command = declares marker || parent is command ──► cache
//! ```
//!
//! Only types requested through [`TypeResolver::resolve_command`] are
//! classified as compliant or offending; ancestors visited on the way are
//! cached but not reported.

use std::collections::HashMap;
use std::sync::Arc;

use cmdsec_classfile::{ClassFile, ClassSource};
use cmdsec_descriptor::InhabitantGraph;
use cmdsec_types::naming::dotted_to_internal;
use cmdsec_types::AuthorizationInfo;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::scanner::scan_class;
use crate::trace::TraceLog;

/// Prefix of platform types that never carry command metadata.
pub const PLATFORM_PREFIX: &str = "java/";

// =============================================================================
// Verdicts
// =============================================================================

#[derive(Debug, Clone)]
pub enum Verdict {
    Command(Arc<AuthorizationInfo>),
    NonCommand(Arc<AuthorizationInfo>),
    /// A `java/*` type; terminal and never fetched.
    Platform,
}

impl Verdict {
    pub fn is_command(&self) -> bool {
        matches!(self, Verdict::Command(_))
    }

    pub fn info(&self) -> Option<&Arc<AuthorizationInfo>> {
        match self {
            Verdict::Command(info) | Verdict::NonCommand(info) => Some(info),
            Verdict::Platform => None,
        }
    }
}

/// Verdicts for every type resolved in a session. Grows monotonically.
#[derive(Debug, Clone, Default)]
pub struct VerdictCache {
    verdicts: HashMap<String, Verdict>,
}

impl VerdictCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, internal_name: &str) -> Option<&Verdict> {
        self.verdicts.get(internal_name)
    }

    pub fn insert(&mut self, internal_name: impl Into<String>, verdict: Verdict) {
        self.verdicts.insert(internal_name.into(), verdict);
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn command_count(&self) -> usize {
        self.verdicts.values().filter(|v| v.is_command()).count()
    }

    pub fn non_command_count(&self) -> usize {
        self.len() - self.command_count()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// One resolution pass: borrows the session cache and graph, accumulates
/// the compliant/offending lists and trace for the types it was asked about.
pub struct TypeResolver<'a> {
    source: &'a dyn ClassSource,
    graph: &'a InhabitantGraph,
    cache: &'a mut VerdictCache,
    resolving: Vec<String>,
    trace: TraceLog,
    compliant: Vec<String>,
    offending: Vec<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        source: &'a dyn ClassSource,
        graph: &'a InhabitantGraph,
        cache: &'a mut VerdictCache,
        trace: TraceLog,
    ) -> Self {
        Self {
            source,
            graph,
            cache,
            resolving: Vec::new(),
            trace,
            compliant: Vec::new(),
            offending: Vec::new(),
        }
    }

    /// Resolve a directly requested type and classify it.
    ///
    /// Compliant means: a command whose info, or some ancestor's, is OK.
    pub fn resolve_command(&mut self, type_name: &str) -> Result<Verdict> {
        let internal = dotted_to_internal(type_name);
        let verdict = self.resolve(&internal)?;
        let ok = verdict.is_command() && verdict.info().is_some_and(|i| i.is_ok_deep());
        if ok {
            self.compliant.push(internal);
        } else {
            self.offending.push(internal);
        }
        Ok(verdict)
    }

    /// Resolve a type (dotted or internal name) without classifying it.
    pub fn resolve(&mut self, type_name: &str) -> Result<Verdict> {
        let internal = dotted_to_internal(type_name);

        if internal.starts_with(PLATFORM_PREFIX) {
            return Ok(Verdict::Platform);
        }
        if let Some(verdict) = self.cache.get(&internal) {
            debug!(
                class = %internal,
                command = verdict.is_command(),
                "recognized previously resolved class"
            );
            return Ok(verdict.clone());
        }
        if self.resolving.contains(&internal) {
            let mut chain = self.resolving.clone();
            chain.push(internal.clone());
            return Err(AnalysisError::AncestryCycle {
                type_name: internal,
                chain,
            });
        }

        let class = self.load(&internal)?;
        let mut scanned = scan_class(&class, self.graph, &mut self.trace);
        let own_ok = scanned.info.build().is_ok();
        let class_name = &class.this_class;
        if scanned.declares_command {
            if own_ok {
                self.trace.line(|| {
                    format!("  Recognized that {class_name} is a command and has authorization without checking ancestors")
                });
            } else {
                self.trace.line(|| {
                    format!("  Recognized that {class_name} is a command but itself has no authorization")
                });
            }
        } else {
            self.trace.line(|| {
                format!("  Recognized that {class_name} is not itself a command; an ancestor might be")
            });
        }

        let parent = match &scanned.super_class {
            Some(super_class) => {
                self.resolving.push(internal.clone());
                let parent = self.resolve(super_class);
                self.resolving.pop();
                Some(parent?)
            }
            None => None,
        };

        let parent_is_command = parent.as_ref().is_some_and(Verdict::is_command);
        let is_command = scanned.declares_command || parent_is_command;
        if parent_is_command {
            let deep = parent
                .as_ref()
                .and_then(Verdict::info)
                .is_some_and(|p| p.is_ok_deep());
            self.trace.line(|| {
                format!("  Detected that {class_name} is a command based on its ancestry; check of parent and its ancestry for auth: {deep}")
            });
        } else if !is_command {
            self.trace.line(|| {
                format!("  Detected that {class_name} is not a command, even including its ancestry")
            });
        }

        scanned
            .info
            .parent(parent.as_ref().and_then(Verdict::info).cloned());
        let info = Arc::new(scanned.info.build());
        let verdict = if is_command {
            self.trace
                .line(|| format!("Adding {internal} to knownCommandTypes"));
            Verdict::Command(info)
        } else {
            self.trace
                .line(|| format!("Adding {internal} to knownNonCommandTypes"));
            Verdict::NonCommand(info)
        };
        debug!(class = %internal, command = is_command, "resolved class");
        self.cache.insert(internal, verdict.clone());
        Ok(verdict)
    }

    fn load(&self, internal: &str) -> Result<ClassFile> {
        let bytes = self
            .source
            .class_bytes(internal)
            .map_err(|source| AnalysisError::ClassSource {
                type_name: internal.to_string(),
                source,
            })?
            .ok_or_else(|| AnalysisError::MissingType {
                type_name: internal.to_string(),
            })?;
        ClassFile::parse(&bytes).map_err(|source| AnalysisError::MalformedClass {
            type_name: internal.to_string(),
            source,
        })
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    pub fn compliant(&self) -> &[String] {
        &self.compliant
    }

    pub fn offending(&self) -> &[String] {
        &self.offending
    }

    /// `(compliant, offending, trace lines)`
    pub fn finish(mut self) -> (Vec<String>, Vec<String>, Vec<String>) {
        let lines = self.trace.take();
        (self.compliant, self.offending, lines)
    }
}
