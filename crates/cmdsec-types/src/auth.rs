//! Authorization facts gathered for one analyzed type.
//!
//! An [`AuthorizationInfo`] is assembled once per type through
//! [`AuthorizationInfoBuilder`] and is immutable afterwards. Inheritance is
//! modelled as a singly-linked chain of shared parents: a subtype holds an
//! `Arc` to the info of its resolved superclass, and the `*_deep` queries
//! walk that chain.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Origin tag for resource/action pairs declared by a class-level `@AccessRequired`.
pub const ORIGIN_ACCESS_REQUIRED: &str = "@AccessRequired";
/// Origin tag for pairs synthesized from a field-level `@AccessRequired.To`.
pub const ORIGIN_ACCESS_REQUIRED_TO: &str = "@AccessRequired.To";
/// Origin tag for pairs synthesized from a field-level `@AccessRequired.NewChild`.
pub const ORIGIN_ACCESS_REQUIRED_NEW_CHILD: &str = "@AccessRequired.NewChild";

// =============================================================================
// Flags
// =============================================================================

/// Boolean authorization facts for a single type (not including ancestors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFlags {
    /// At least one REST endpoint with `useForAuthorization` set.
    pub has_rest_annotation: bool,
    /// A class-level `@AccessRequired` (single or list form).
    pub has_command_level_auth: bool,
    /// A field-level `@AccessRequired.To` / `@AccessRequired.NewChild`.
    pub has_field_level_auth: bool,
    /// Implements the access-check-provider interface.
    pub is_access_check_provider: bool,
    /// Runs in the client process rather than on the server.
    pub is_local: bool,
}

// =============================================================================
// Resource/action pairs and REST endpoints
// =============================================================================

/// A declaration that a command touches `resource` with verb `action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceAction {
    pub resource: String,
    pub action: String,
    /// Which declaration mechanism produced the pair.
    pub origin: String,
}

impl ResourceAction {
    pub fn new(
        resource: impl Into<String>,
        action: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            origin: origin.into(),
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.action, self.origin)
    }
}

/// One `@RestEndpoint` occurrence on a command class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestEndpoint {
    /// Internal (slash-separated) name of the config bean the endpoint hangs off.
    pub config_bean: Option<String>,
    /// Operation type; `GET` when the annotation omits it.
    pub op_type: String,
    /// Path below the bean; empty when omitted.
    pub path: String,
    pub use_for_authorization: bool,
}

impl RestEndpoint {
    pub fn new(
        config_bean: Option<String>,
        path: Option<String>,
        op_type: Option<String>,
        use_for_authorization: bool,
    ) -> Self {
        Self {
            config_bean,
            op_type: op_type.unwrap_or_else(|| "GET".to_string()),
            path: path.unwrap_or_default(),
            use_for_authorization,
        }
    }
}

impl fmt::Display for RestEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@RestEndpoint(configBean={},path={}, opType={})",
            self.config_bean.as_deref().unwrap_or("null"),
            self.path,
            self.op_type
        )
    }
}

// =============================================================================
// Params
// =============================================================================

/// A single annotation element value, kept only for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Enum { type_descriptor: String, constant: String },
    Class(String),
    Annotation(String),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A command parameter declared with `@Param` on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Friendly type name; empty for plain strings.
    pub type_name: String,
    /// Every element value present on the annotation, keyed by element name.
    pub values: BTreeMap<String, ParamValue>,
}

impl Param {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn is_optional(&self) -> bool {
        self.bool_value("optional")
    }

    pub fn is_primary(&self) -> bool {
        self.bool_value("primary")
    }

    fn bool_value(&self, key: &str) -> bool {
        self.values
            .get(key)
            .and_then(ParamValue::as_bool)
            .unwrap_or(false)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if self.is_optional() { ("[", "]") } else { ("", "") };
        let marker = if self.is_primary() { "**" } else { "--" };
        write!(f, "{open}{marker}{}", self.name)?;
        if !self.type_name.is_empty() {
            write!(f, " ({})", self.type_name)?;
        }
        write!(f, "{close}")
    }
}

// =============================================================================
// Generic CRUD commands
// =============================================================================

pub const GENERIC_CREATE_COMMAND: &str = "org.glassfish.config.support.GenericCreateCommand";
pub const GENERIC_DELETE_COMMAND: &str = "org.glassfish.config.support.GenericDeleteCommand";
pub const GENERIC_LIST_COMMAND: &str = "org.glassfish.config.support.GenericListCommand";

/// The generated command implementations that are parameterized by
/// descriptor metadata instead of bespoke annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenericCommand {
    Create,
    Delete,
    List,
}

impl GenericCommand {
    /// Match a dotted implementation class name.
    pub fn from_class_name(class_name: &str) -> Option<Self> {
        match class_name {
            GENERIC_CREATE_COMMAND => Some(Self::Create),
            GENERIC_DELETE_COMMAND => Some(Self::Delete),
            GENERIC_LIST_COMMAND => Some(Self::List),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Create => GENERIC_CREATE_COMMAND,
            Self::Delete => GENERIC_DELETE_COMMAND,
            Self::List => GENERIC_LIST_COMMAND,
        }
    }

    /// The verb shown to callers. Listing is a read of the collection.
    pub fn reported_action(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::List => "read",
        }
    }

    /// Resource path this action applies to, given the target bean's full path.
    ///
    /// `create` acts on the collection path itself, `delete` on a named
    /// element of it, and `list` on the enclosing path.
    pub fn subpath(&self, full_path: &str) -> String {
        match self {
            Self::Create => full_path.to_string(),
            Self::Delete => format!("{full_path}/$name"),
            Self::List => match full_path.rfind('/') {
                Some(idx) => full_path[..idx].to_string(),
                None => full_path.to_string(),
            },
        }
    }
}

impl fmt::Display for GenericCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::List => "list",
        };
        f.write_str(s)
    }
}

/// Descriptor-derived facts for a generic CRUD command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericInfo {
    pub action: GenericCommand,
    /// Dotted name of the config bean the command creates/deletes/lists.
    pub method_list_actual: String,
    pub method_name: String,
    /// Full path of the target bean in the config tree.
    pub full_path: String,
}

impl GenericInfo {
    pub fn subpath_per_action(&self) -> String {
        self.action.subpath(&self.full_path)
    }
}

// =============================================================================
// AuthorizationInfo
// =============================================================================

/// Aggregated authorization facts for one type plus a link to its superclass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationInfo {
    pub class_name: String,
    /// Human-readable command name; `None` for types that are not services.
    pub name: Option<String>,
    pub flags: AuthFlags,
    /// Internal name of a type that performs authorization instead.
    pub delegate: Option<String>,
    pub resource_actions: Vec<ResourceAction>,
    pub rest_endpoints: Vec<RestEndpoint>,
    pub params: Vec<Param>,
    pub generic: Option<GenericInfo>,
    pub parent: Option<Arc<AuthorizationInfo>>,
}

impl AuthorizationInfo {
    pub fn builder(class_name: impl Into<String>) -> AuthorizationInfoBuilder {
        AuthorizationInfoBuilder::new(class_name)
    }

    /// True when this type itself carries enough authorization metadata.
    pub fn is_ok(&self) -> bool {
        self.delegate.is_some()
            || self.flags.has_rest_annotation
            || self.flags.has_command_level_auth
            || self.flags.has_field_level_auth
            || self.flags.is_access_check_provider
    }

    /// True when this type or any ancestor is [`is_ok`](Self::is_ok).
    pub fn is_ok_deep(&self) -> bool {
        self.ancestry().any(AuthorizationInfo::is_ok)
    }

    pub fn is_local_deep(&self) -> bool {
        self.ancestry().any(|info| info.flags.is_local)
    }

    /// Iterate from this node up through every parent.
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry { next: Some(self) }
    }

    /// The chain ordered from the topmost ancestor down to this node.
    pub fn chain_root_first(&self) -> Vec<&AuthorizationInfo> {
        let mut levels: Vec<&AuthorizationInfo> = self.ancestry().collect();
        levels.reverse();
        levels
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.class_name)
    }

    /// Replace the computed resource/action list wholesale.
    pub fn override_resource_actions(&mut self, pairs: Vec<ResourceAction>) {
        self.resource_actions = pairs;
    }

    /// Multi-line human-readable rendering used by the summary output.
    pub fn summary(&self, indent: &str) -> String {
        let mut out = String::new();
        match &self.delegate {
            Some(delegate) => {
                out.push_str(&format!("{} delegates to {}", self.display_name(), delegate));
            }
            None => {
                let detail = match &self.generic {
                    Some(g) if !g.full_path.is_empty() => format!(
                        "[{}] {}",
                        g.action.reported_action(),
                        g.subpath_per_action()
                    ),
                    _ => self.class_name.clone(),
                };
                out.push_str(&format!("{} ({})", self.display_name(), detail));
            }
        }
        out.push('\n');
        for level in self.chain_root_first() {
            for p in &level.params {
                out.push_str(&format!("{indent}  {p}\n"));
            }
        }
        for endpoint in self.rest_endpoints.iter().filter(|e| e.use_for_authorization) {
            out.push_str(&format!("{indent}  {endpoint}\n"));
        }
        out
    }
}

/// Iterator over an [`AuthorizationInfo`] and its ancestors.
pub struct Ancestry<'a> {
    next: Option<&'a AuthorizationInfo>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a AuthorizationInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

/// Accumulates facts while a type is being scanned.
#[derive(Debug, Clone)]
pub struct AuthorizationInfoBuilder {
    info: AuthorizationInfo,
}

impl AuthorizationInfoBuilder {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            info: AuthorizationInfo {
                class_name: class_name.into(),
                name: None,
                flags: AuthFlags::default(),
                delegate: None,
                resource_actions: Vec::new(),
                rest_endpoints: Vec::new(),
                params: Vec::new(),
                generic: None,
                parent: None,
            },
        }
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.info.name = Some(name.into());
        self
    }

    pub fn delegate(&mut self, delegate: impl Into<String>) -> &mut Self {
        self.info.delegate = Some(delegate.into());
        self
    }

    pub fn command_level_auth(&mut self) -> &mut Self {
        self.info.flags.has_command_level_auth = true;
        self
    }

    pub fn field_level_auth(&mut self) -> &mut Self {
        self.info.flags.has_field_level_auth = true;
        self
    }

    pub fn access_check_provider(&mut self) -> &mut Self {
        self.info.flags.is_access_check_provider = true;
        self
    }

    pub fn local(&mut self, is_local: bool) -> &mut Self {
        self.info.flags.is_local = is_local;
        self
    }

    pub fn add_resource_action(&mut self, pair: ResourceAction) -> &mut Self {
        self.info.resource_actions.push(pair);
        self
    }

    /// Record an endpoint; authorization-bearing endpoints also set the REST flag.
    pub fn add_rest_endpoint(&mut self, endpoint: RestEndpoint) -> &mut Self {
        if endpoint.use_for_authorization {
            self.info.flags.has_rest_annotation = true;
        }
        self.info.rest_endpoints.push(endpoint);
        self
    }

    pub fn add_param(&mut self, param: Param) -> &mut Self {
        self.info.params.push(param);
        self
    }

    pub fn generic(&mut self, generic: GenericInfo) -> &mut Self {
        self.info.generic = Some(generic);
        self
    }

    pub fn parent(&mut self, parent: Option<Arc<AuthorizationInfo>>) -> &mut Self {
        self.info.parent = parent;
        self
    }

    pub fn build(&self) -> AuthorizationInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(class_name: &str) -> AuthorizationInfoBuilder {
        AuthorizationInfo::builder(class_name)
    }

    #[test]
    fn test_bare_info_is_not_ok() {
        let info = leaf("a/B").build();
        assert!(!info.is_ok());
        assert!(!info.is_ok_deep());
    }

    #[test]
    fn test_delegate_alone_is_ok() {
        let info = leaf("a/B").delegate("a/Checker").build();
        assert!(info.is_ok());
        assert_eq!(info.delegate.as_deref(), Some("a/Checker"));
        assert_eq!(info.flags, AuthFlags::default());
    }

    #[test]
    fn test_each_flag_makes_ok() {
        assert!(leaf("x").command_level_auth().build().is_ok());
        assert!(leaf("x").field_level_auth().build().is_ok());
        assert!(leaf("x").access_check_provider().build().is_ok());
        let rest = RestEndpoint::new(None, None, None, true);
        assert!(leaf("x").add_rest_endpoint(rest).build().is_ok());
    }

    #[test]
    fn test_rest_endpoint_without_authorization_does_not_count() {
        let rest = RestEndpoint::new(Some("a/Bean".into()), None, Some("POST".into()), false);
        let info = leaf("x").add_rest_endpoint(rest).build();
        assert!(!info.is_ok());
        assert_eq!(info.rest_endpoints.len(), 1);
        assert_eq!(info.rest_endpoints[0].op_type, "POST");
        assert_eq!(info.rest_endpoints[0].path, "");
    }

    #[test]
    fn test_is_ok_deep_walks_chain() {
        let grandparent = Arc::new(leaf("gp").command_level_auth().build());
        let parent = Arc::new(leaf("p").parent(Some(grandparent)).build());
        let child = leaf("c").parent(Some(parent.clone())).build();
        assert!(!child.is_ok());
        assert!(!parent.is_ok());
        assert!(child.is_ok_deep());
        assert_eq!(child.ancestry().count(), 3);
    }

    #[test]
    fn test_is_ok_deep_false_when_no_ancestor_ok() {
        let parent = Arc::new(leaf("p").build());
        let child = leaf("c").parent(Some(parent)).build();
        assert!(!child.is_ok_deep());
    }

    #[test]
    fn test_is_local_deep() {
        let base = Arc::new(leaf("cli/CLICommand").local(true).build());
        let child = leaf("cli/Login").parent(Some(base)).build();
        assert!(!child.flags.is_local);
        assert!(child.is_local_deep());
    }

    #[test]
    fn test_override_replaces_wholesale() {
        let mut info = leaf("x")
            .add_resource_action(ResourceAction::new("domain", "read", ORIGIN_ACCESS_REQUIRED))
            .add_resource_action(ResourceAction::new("domain", "update", ORIGIN_ACCESS_REQUIRED))
            .build();
        info.override_resource_actions(vec![ResourceAction::new("res1", "read", "manual")]);
        assert_eq!(
            info.resource_actions,
            vec![ResourceAction::new("res1", "read", "manual")]
        );
    }

    #[test]
    fn test_param_display() {
        let p = Param::new("target", "")
            .with_value("optional", ParamValue::Bool(true))
            .with_value("primary", ParamValue::Bool(false));
        assert_eq!(p.to_string(), "[--target]");

        let p = Param::new("name", "int").with_value("primary", ParamValue::Bool(true));
        assert_eq!(p.to_string(), "**name (int)");
    }

    #[test]
    fn test_generic_subpaths() {
        assert_eq!(GenericCommand::Create.subpath("servers/server"), "servers/server");
        assert_eq!(GenericCommand::Delete.subpath("servers/server"), "servers/server/$name");
        assert_eq!(GenericCommand::List.subpath("servers/server"), "servers");
        assert_eq!(GenericCommand::List.subpath("servers"), "servers");
        assert_eq!(GenericCommand::List.reported_action(), "read");
        assert_eq!(GenericCommand::List.to_string(), "list");
    }

    #[test]
    fn test_generic_from_class_name() {
        assert_eq!(
            GenericCommand::from_class_name(GENERIC_DELETE_COMMAND),
            Some(GenericCommand::Delete)
        );
        assert_eq!(GenericCommand::from_class_name("com.example.Other"), None);
    }

    #[test]
    fn test_summary_lists_params_ancestor_first() {
        let parent = Arc::new(
            leaf("base")
                .add_param(Param::new("target", "").with_value("optional", ParamValue::Bool(true)))
                .build(),
        );
        let info = leaf("com/example/Cmd")
            .name("do-thing")
            .add_param(Param::new("name", "").with_value("primary", ParamValue::Bool(true)))
            .add_rest_endpoint(RestEndpoint::new(Some("a/Domain".into()), None, None, true))
            .parent(Some(parent))
            .build();
        let text = info.summary("");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "do-thing (com/example/Cmd)");
        assert_eq!(lines[1], "  [--target]");
        assert_eq!(lines[2], "  **name");
        assert!(lines[3].contains("@RestEndpoint(configBean=a/Domain"));
    }

    #[test]
    fn test_summary_generic_and_delegate() {
        let info = leaf(GENERIC_LIST_COMMAND)
            .name("list-servers")
            .generic(GenericInfo {
                action: GenericCommand::List,
                method_list_actual: "com.example.Server".into(),
                method_name: "getServer".into(),
                full_path: "servers/server".into(),
            })
            .build();
        assert!(info.summary("").starts_with("list-servers ([read] servers)"));

        let info = leaf("x").name("proxy").delegate("com/example/Checker").build();
        assert!(info.summary("").starts_with("proxy delegates to com/example/Checker"));
    }
}
