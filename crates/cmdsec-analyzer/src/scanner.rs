//! Annotation and interface scanner.
//!
//! Interprets one decoded [`ClassFile`] against a closed table of recognized
//! annotations and produces the type's own [`AuthorizationInfoBuilder`].
//! Nothing here looks at ancestors; that is the resolver's job.
//!
//! | Annotation | Effect |
//! |------------|--------|
//! | `@AccessRequired` | command-level auth, `resource x action` pairs |
//! | `@AccessRequired.List` | the above for each nested element |
//! | `@AccessRequired.Delegate` | delegate type |
//! | `@RestEndpoint(s)` | endpoints; `useForAuthorization` ones set the REST flag |
//! | `@Service` | command name |
//! | `@Supplemental` | decorated name relative to another command |
//! | `@Param` (field) | [`Param`] |
//! | `@AccessRequired.To` / `.NewChild` (field) | field-level auth, synthesized pairs |

use cmdsec_classfile::{Annotation, ClassFile, ElementValue, FieldInfo};
use cmdsec_descriptor::InhabitantGraph;
use cmdsec_types::auth::{ORIGIN_ACCESS_REQUIRED, ORIGIN_ACCESS_REQUIRED_NEW_CHILD, ORIGIN_ACCESS_REQUIRED_TO};
use cmdsec_types::naming::{internal_to_dotted, path_segment};
use cmdsec_types::{AuthorizationInfo, AuthorizationInfoBuilder, Param, ParamValue, ResourceAction, RestEndpoint};
use tracing::debug;

use crate::trace::TraceLog;

/// Marker interface of every administrative command.
pub const ADMIN_COMMAND: &str = "org/glassfish/api/admin/AdminCommand";
/// Base class of commands that run in the client process.
pub const CLI_COMMAND: &str = "com/sun/enterprise/admin/cli/CLICommand";
/// Commands implementing this interface perform their own access checks.
pub const ACCESS_CHECK_PROVIDER: &str = "org/glassfish/api/admin/AdminCommandSecurity$AccessCheckProvider";

const STRING_DESCRIPTOR: &str = "Ljava/lang/String;";
const SUPPLEMENTAL_TIMING: &str = "Lorg/glassfish/api/admin/Supplemental$Timing;";

// =============================================================================
// Recognized annotations
// =============================================================================

/// Class-level annotations that carry authorization or naming facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassAnnotation {
    AccessRequired,
    AccessRequiredList,
    Delegate,
    RestEndpoint,
    RestEndpoints,
    Service,
    Supplemental,
}

impl ClassAnnotation {
    pub const ALL: [Self; 7] = [
        Self::AccessRequired,
        Self::AccessRequiredList,
        Self::Delegate,
        Self::RestEndpoint,
        Self::RestEndpoints,
        Self::Service,
        Self::Supplemental,
    ];

    pub fn descriptor(self) -> &'static str {
        match self {
            Self::AccessRequired => "Lorg/glassfish/api/admin/AccessRequired;",
            Self::AccessRequiredList => "Lorg/glassfish/api/admin/AccessRequired$List;",
            Self::Delegate => "Lorg/glassfish/api/admin/AccessRequired$Delegate;",
            Self::RestEndpoint => "Lorg/glassfish/api/admin/RestEndpoint;",
            Self::RestEndpoints => "Lorg/glassfish/api/admin/RestEndpoints;",
            Self::Service => "Lorg/jvnet/hk2/annotations/Service;",
            Self::Supplemental => "Lorg/glassfish/api/admin/Supplemental;",
        }
    }

    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.descriptor() == descriptor)
    }
}

/// Field-level annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAnnotation {
    Param,
    AccessRequiredTo,
    AccessRequiredNewChild,
}

impl FieldAnnotation {
    pub const ALL: [Self; 3] = [Self::Param, Self::AccessRequiredTo, Self::AccessRequiredNewChild];

    pub fn descriptor(self) -> &'static str {
        match self {
            Self::Param => "Lorg/glassfish/api/Param;",
            Self::AccessRequiredTo => "Lorg/glassfish/api/admin/AccessRequired$To;",
            Self::AccessRequiredNewChild => "Lorg/glassfish/api/admin/AccessRequired$NewChild;",
        }
    }

    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.descriptor() == descriptor)
    }
}

// =============================================================================
// Scan result
// =============================================================================

/// Direct facts about one class.
#[derive(Debug, Clone)]
pub struct ScannedType {
    pub info: AuthorizationInfoBuilder,
    pub super_class: Option<String>,
    /// Declares the command marker interface itself.
    pub declares_command: bool,
}

impl ScannedType {
    /// The type's own info, without a parent.
    pub fn own_info(&self) -> AuthorizationInfo {
        self.info.build()
    }
}

/// Naming facts collected while walking class annotations.
#[derive(Default)]
struct Naming {
    service: Option<String>,
    supplemental: Option<String>,
}

/// Scan a class against the recognized-annotation table.
///
/// `graph` supplies config-bean paths for field-level resource synthesis.
pub fn scan_class(class: &ClassFile, graph: &InhabitantGraph, trace: &mut TraceLog) -> ScannedType {
    trace.line(|| format!("  Starting to analyze class {}", class.this_class));

    let mut info = AuthorizationInfo::builder(class.this_class.clone());
    if class.implements(ACCESS_CHECK_PROVIDER) {
        info.access_check_provider();
    }
    if class.this_class == CLI_COMMAND {
        info.local(true);
    }

    let mut naming = Naming::default();
    for annotation in &class.annotations {
        let Some(kind) = ClassAnnotation::from_descriptor(&annotation.descriptor) else {
            continue;
        };
        apply_class_annotation(kind, annotation, &mut info, &mut naming, trace);
    }
    match (naming.service, naming.supplemental) {
        (Some(_), Some(relation)) => {
            info.name(relation);
        }
        (Some(service), None) => {
            info.name(service);
        }
        _ => {}
    }

    for field in &class.fields {
        scan_field(field, graph, &mut info, trace);
    }

    ScannedType {
        info,
        super_class: class.super_class.clone(),
        declares_command: class.implements(ADMIN_COMMAND),
    }
}

fn apply_class_annotation(
    kind: ClassAnnotation,
    annotation: &Annotation,
    info: &mut AuthorizationInfoBuilder,
    naming: &mut Naming,
    trace: &mut TraceLog,
) {
    match kind {
        ClassAnnotation::AccessRequired => {
            trace.line(|| "  Found @AccessRequired at class level".to_string());
            info.command_level_auth();
            add_access_pairs(annotation, info);
        }
        ClassAnnotation::AccessRequiredList => {
            for element in nested(annotation, ClassAnnotation::AccessRequired.descriptor()) {
                trace.line(|| "    Found @AccessRequired in list at class level".to_string());
                if add_access_pairs(element, info) > 0 {
                    info.command_level_auth();
                }
            }
        }
        ClassAnnotation::Delegate => {
            trace.line(|| "  Found @AccessRequired.Delegate at class level".to_string());
            match annotation.get("value").and_then(ElementValue::as_class_internal_name) {
                Some(delegate) => {
                    info.delegate(delegate);
                }
                None => debug!("@AccessRequired.Delegate without a class value"),
            }
        }
        ClassAnnotation::RestEndpoint => {
            trace.line(|| "  Found @RestEndpoint at class level".to_string());
            info.add_rest_endpoint(rest_endpoint(annotation));
        }
        ClassAnnotation::RestEndpoints => {
            for element in nested(annotation, ClassAnnotation::RestEndpoint.descriptor()) {
                trace.line(|| "    Found @RestEndpoint in list at class level".to_string());
                info.add_rest_endpoint(rest_endpoint(element));
            }
        }
        ClassAnnotation::Service => match annotation.get("name").and_then(ElementValue::as_str) {
            Some(name) => naming.service = Some(name.to_string()),
            None => debug!("@Service without a string name"),
        },
        ClassAnnotation::Supplemental => {
            naming.supplemental = supplemental_relation(annotation);
        }
    }
}

/// Nested annotations of the given type inside an annotation's `value` array.
fn nested<'a>(annotation: &'a Annotation, descriptor: &'a str) -> impl Iterator<Item = &'a Annotation> {
    annotation
        .get("value")
        .map(ElementValue::items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(ElementValue::as_annotation)
        .filter(move |a| a.descriptor == descriptor)
}

/// Every resource paired with every action. Returns the number of pairs added.
fn add_access_pairs(annotation: &Annotation, info: &mut AuthorizationInfoBuilder) -> usize {
    let resources = annotation.strings("resource");
    let actions = annotation.strings("action");
    for resource in &resources {
        for action in &actions {
            info.add_resource_action(ResourceAction::new(
                resource.as_str(),
                action.as_str(),
                ORIGIN_ACCESS_REQUIRED,
            ));
        }
    }
    resources.len() * actions.len()
}

fn rest_endpoint(annotation: &Annotation) -> RestEndpoint {
    let config_bean = annotation
        .get("configBean")
        .and_then(ElementValue::as_class_internal_name)
        .map(str::to_string);
    let path = annotation
        .get("path")
        .and_then(ElementValue::as_str)
        .map(str::to_string);
    let op_type = annotation
        .get("opType")
        .and_then(ElementValue::as_enum)
        .map(|(_, constant)| constant.to_string());
    let use_for_authorization = annotation
        .get("useForAuthorization")
        .and_then(ElementValue::as_bool)
        .unwrap_or(false);
    RestEndpoint::new(config_bean, path, op_type, use_for_authorization)
}

/// `[+related]`, `[related+]` or `[related++]` depending on timing.
fn supplemental_relation(annotation: &Annotation) -> Option<String> {
    let related = annotation.get("value").and_then(ElementValue::as_str)?;
    let timings: Vec<&str> = annotation
        .get("on")
        .map(ElementValue::items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(ElementValue::as_enum)
        .filter(|(desc, _)| *desc == SUPPLEMENTAL_TIMING)
        .map(|(_, constant)| constant)
        .collect();
    let before = timings.contains(&"Before");
    let suffix = if timings.contains(&"After") {
        "+"
    } else if timings.contains(&"AfterReplication") {
        "++"
    } else {
        ""
    };
    Some(format!("[{}{related}{suffix}]", if before { "+" } else { "" }))
}

// =============================================================================
// Fields
// =============================================================================

fn scan_field(
    field: &FieldInfo,
    graph: &InhabitantGraph,
    info: &mut AuthorizationInfoBuilder,
    trace: &mut TraceLog,
) {
    for annotation in &field.annotations {
        let Some(kind) = FieldAnnotation::from_descriptor(&annotation.descriptor) else {
            continue;
        };
        match kind {
            FieldAnnotation::Param => {
                info.add_param(param(field, annotation));
            }
            FieldAnnotation::AccessRequiredTo => {
                trace.line(|| format!("    Found anno {}", annotation.descriptor));
                info.field_level_auth();
                let base = bean_path(graph, &field.descriptor);
                let collection = annotation.get("collection").and_then(ElementValue::as_str);
                let resource = match collection.filter(|c| !c.is_empty()) {
                    Some(c) => format!("{base}/{c}/$xxx"),
                    None => format!("{base}/$xxx"),
                };
                for action in annotation.strings("value") {
                    info.add_resource_action(ResourceAction::new(
                        resource.as_str(),
                        action,
                        ORIGIN_ACCESS_REQUIRED_TO,
                    ));
                }
            }
            FieldAnnotation::AccessRequiredNewChild => {
                trace.line(|| format!("    Found anno {}", annotation.descriptor));
                info.field_level_auth();
                let mut resource = bean_path(graph, &field.descriptor);
                if let Some(child) = annotation
                    .get("type")
                    .and_then(ElementValue::as_class_internal_name)
                {
                    resource.push('/');
                    resource.push_str(&internal_to_dotted(child));
                }
                if let Some(c) = annotation
                    .get("collection")
                    .and_then(ElementValue::as_str)
                    .filter(|c| !c.is_empty())
                {
                    resource.push('/');
                    resource.push_str(c);
                }
                let mut actions = annotation.strings("action");
                if actions.is_empty() {
                    actions.push("create".to_string());
                }
                for action in actions {
                    info.add_resource_action(ResourceAction::new(
                        resource.as_str(),
                        action,
                        ORIGIN_ACCESS_REQUIRED_NEW_CHILD,
                    ));
                }
            }
        }
    }
}

/// Full path of the config bean a field refers to.
fn bean_path(graph: &InhabitantGraph, field_descriptor: &str) -> String {
    let internal = field_descriptor
        .strip_prefix('L')
        .and_then(|d| d.strip_suffix(';'))
        .unwrap_or(field_descriptor);
    let dotted = internal_to_dotted(internal);
    match graph.full_path_of(&dotted) {
        Some(path) => path,
        None => {
            debug!(bean = %dotted, "no config bean in graph; using its converted name");
            path_segment(&dotted)
        }
    }
}

/// Type name shown for a parameter: empty for strings, the simple name for
/// other object types, the raw descriptor otherwise.
pub fn friendly_type_name(descriptor: &str) -> String {
    if descriptor == STRING_DESCRIPTOR {
        return String::new();
    }
    match descriptor.strip_prefix('L').and_then(|d| d.strip_suffix(';')) {
        Some(internal) => internal.rsplit('/').next().unwrap_or(internal).to_string(),
        None => descriptor.to_string(),
    }
}

fn param(field: &FieldInfo, annotation: &Annotation) -> Param {
    let mut param = Param::new(field.name.as_str(), friendly_type_name(&field.descriptor));
    for (name, value) in &annotation.elements {
        if name == "name" {
            if let Some(explicit) = value.as_str() {
                param.name = explicit.to_string();
            }
        }
        param.values.insert(name.clone(), param_value(value));
    }
    param
}

fn param_value(value: &ElementValue) -> ParamValue {
    match value {
        ElementValue::Byte(v) => ParamValue::Int(i64::from(*v)),
        ElementValue::Short(v) => ParamValue::Int(i64::from(*v)),
        ElementValue::Int(v) => ParamValue::Int(i64::from(*v)),
        ElementValue::Long(v) => ParamValue::Int(*v),
        ElementValue::Char(c) => ParamValue::Char(*c),
        ElementValue::Float(v) => ParamValue::Float(f64::from(*v)),
        ElementValue::Double(v) => ParamValue::Float(*v),
        ElementValue::Boolean(b) => ParamValue::Bool(*b),
        ElementValue::String(s) => ParamValue::Str(s.clone()),
        ElementValue::Enum {
            type_descriptor,
            constant,
        } => ParamValue::Enum {
            type_descriptor: type_descriptor.clone(),
            constant: constant.clone(),
        },
        ElementValue::Class(desc) => ParamValue::Class(desc.clone()),
        ElementValue::Annotation(a) => ParamValue::Annotation(a.descriptor.clone()),
        ElementValue::Array(items) => ParamValue::Array(items.iter().map(param_value).collect()),
    }
}
