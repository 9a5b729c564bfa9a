//! Hand-maintained replacements for computed resource/action lists.
//!
//! One command per line:
//!
//! ```text
//! create-thing | domain/things:create:manual, domain:update:manual
//! ```
//!
//! The part before `|` is the command name; the rest is a comma-separated
//! list of `resource:action:origin` triples that replaces whatever the
//! analysis found for that command.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cmdsec_types::{AuthorizationInfo, ResourceAction};
use tracing::{debug, warn};

/// Conventional override file name inside a module directory.
pub const OVERRIDE_FILE_NAME: &str = "commandSecurityOverride.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    overrides: HashMap<String, Vec<ResourceAction>>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an override file. A missing or unreadable file yields an empty set.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no readable override file");
                Self::default()
            }
        }
    }

    /// Parse override text. Malformed lines are skipped with a warning.
    pub fn parse(text: &str) -> Self {
        let mut overrides = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok((name, pairs)) => {
                    overrides.insert(name, pairs);
                }
                Err(e) => warn!(line = idx + 1, text = line, "ignoring override entry: {e}"),
            }
        }
        Self { overrides }
    }

    pub fn insert(&mut self, name: impl Into<String>, pairs: Vec<ResourceAction>) {
        self.overrides.insert(name.into(), pairs);
    }

    pub fn get(&self, name: &str) -> Option<&[ResourceAction]> {
        self.overrides.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Replace the info's pairs when an override names its command.
    ///
    /// Returns whether anything was replaced.
    pub fn adjust(&self, info: &mut AuthorizationInfo) -> bool {
        let Some(name) = info.name.as_deref() else {
            return false;
        };
        match self.overrides.get(name) {
            Some(pairs) => {
                debug!(command = name, pairs = pairs.len(), "applying override");
                info.override_resource_actions(pairs.clone());
                true
            }
            None => false,
        }
    }
}

fn parse_line(line: &str) -> Result<(String, Vec<ResourceAction>)> {
    let (name, list) = line
        .split_once('|')
        .ok_or_else(|| anyhow!("missing '|' separator"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("empty command name"));
    }
    let pairs = list
        .split(',')
        .map(|triple| parse_triple(triple).with_context(|| format!("in entry '{}'", triple.trim())))
        .collect::<Result<Vec<_>>>()?;
    Ok((name.to_string(), pairs))
}

fn parse_triple(triple: &str) -> Result<ResourceAction> {
    let mut parts = triple.split(':').map(str::trim);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(resource), Some(action), Some(origin), None) if !resource.is_empty() => {
            Ok(ResourceAction::new(resource, action, origin))
        }
        _ => Err(anyhow!("expected resource:action:origin")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let set = OverrideSet::parse(
            "create-thing | domain/things:create:manual, domain:update:manual\n\
             \n\
             # comment\n\
             list-things|domain/things:read:manual\n",
        );
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get("create-thing").unwrap(),
            &[
                ResourceAction::new("domain/things", "create", "manual"),
                ResourceAction::new("domain", "update", "manual"),
            ]
        );
        assert_eq!(set.get("list-things").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let set = OverrideSet::parse(
            "no separator here\n\
             bad | domain:read\n\
             | domain:read:x\n\
             good | domain:read:x\n",
        );
        assert_eq!(set.len(), 1);
        assert!(set.get("good").is_some());
        assert!(set.get("bad").is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let set = OverrideSet::load(Path::new("/nonexistent/commandSecurityOverride.txt"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_adjust_replaces_wholesale() {
        let mut set = OverrideSet::new();
        set.insert("cmd", vec![ResourceAction::new("x", "y", "z")]);

        let mut builder = AuthorizationInfo::builder("a/Cmd");
        builder
            .name("cmd")
            .add_resource_action(ResourceAction::new("a", "b", "c"))
            .add_resource_action(ResourceAction::new("d", "e", "f"));
        let mut info = builder.build();
        assert!(set.adjust(&mut info));
        assert_eq!(info.resource_actions, vec![ResourceAction::new("x", "y", "z")]);

        let mut unnamed = AuthorizationInfo::builder("a/Other").build();
        assert!(!set.adjust(&mut unnamed));
    }
}
