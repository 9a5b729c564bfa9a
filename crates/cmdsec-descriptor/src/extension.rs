//! Parent discovery for config beans that hang off an extension point.
//!
//! A bean that plugs into the configuration tree through one of the
//! `*Extension` marker interfaces never names its parent in a descriptor;
//! the parent is implied by the interface it implements.

use cmdsec_classfile::{ClassFile, ClassSource};
use cmdsec_types::naming::{dotted_to_internal, internal_to_dotted};
use tracing::debug;

use crate::error::{DescriptorError, Result};
use crate::graph::InhabitantGraph;

/// `(extension interface, extension point)` as internal names.
pub const EXTENSION_PARENTS: &[(&str, &str)] = &[
    (
        "com/sun/enterprise/config/serverbeans/DomainExtension",
        "com/sun/enterprise/config/serverbeans/Domain",
    ),
    (
        "com/sun/enterprise/config/serverbeans/ConfigExtension",
        "com/sun/enterprise/config/serverbeans/Config",
    ),
    (
        "com/oracle/cloudlogic/tenantmanager/entity/TenantExtension",
        "com/oracle/cloudlogic/tenantmanager/entity/Tenant",
    ),
    (
        "com/sun/enterprise/config/serverbeans/ApplicationExtension",
        "com/sun/enterprise/config/serverbeans/Application",
    ),
    (
        "com/oracle/cloudlogic/tenantmanager/entity/TenantEnvironmentExtension",
        "com/oracle/cloudlogic/tenantmanager/entity/TenantEnvironment",
    ),
];

/// Extension point implied by a class's interfaces, if any.
pub fn extension_parent(class: &ClassFile) -> Option<&'static str> {
    EXTENSION_PARENTS
        .iter()
        .find(|(iface, _)| class.implements(iface))
        .map(|(_, parent)| *parent)
}

/// Give every parentless config bean its extension-point parent.
///
/// Each bean whose bytes were found is inspected at most once per graph.
/// Beans whose bytes are not on this classpath stay candidates for a later
/// call with another source. Returns the number of parents attached.
pub fn discover_extension_parents(
    graph: &mut InhabitantGraph,
    source: &dyn ClassSource,
) -> Result<usize> {
    let candidates: Vec<_> = graph
        .iter()
        .filter(|(_, node)| node.is_config_bean && node.parent().is_none() && !node.extension_checked)
        .map(|(id, node)| (id, node.class_name.clone()))
        .collect();

    let mut attached = 0;
    for (id, class_name) in candidates {
        let internal = dotted_to_internal(&class_name);
        let bytes = source
            .class_bytes(&internal)
            .map_err(|e| DescriptorError::ClassSource {
                class_name: class_name.clone(),
                message: format!("{e:#}"),
            })?;
        let Some(bytes) = bytes else {
            debug!(class = %class_name, "no bytes for config bean; parent stays unknown");
            continue;
        };
        let class = ClassFile::parse(&bytes).map_err(|source| DescriptorError::MalformedClass {
            class_name: class_name.clone(),
            source,
        })?;
        graph.get_mut(id).extension_checked = true;

        if let Some(parent) = extension_parent(&class) {
            let parent_name = internal_to_dotted(parent);
            debug!(class = %class_name, parent = %parent_name, "config bean extends an extension point");
            let parent_id = graph.find_or_insert(&parent_name);
            graph.set_parent(id, parent_id)?;
            attached += 1;
        }
    }
    Ok(attached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdsec_classfile::{ClassWriter, MapClassSource};

    #[test]
    fn test_domain_extension_gets_domain_parent() {
        let mut graph = InhabitantGraph::new();
        let bean = graph.declare_config_bean("com.example.MyExt");
        let plain = graph.declare_config_bean("com.example.Plain");
        graph.declare_config_bean("com.example.Missing");

        let source = MapClassSource::new()
            .with_class(
                "com/example/MyExt",
                ClassWriter::new("com/example/MyExt")
                    .interface("com/sun/enterprise/config/serverbeans/DomainExtension")
                    .to_bytes(),
            )
            .with_class("com/example/Plain", ClassWriter::new("com/example/Plain").to_bytes());

        assert_eq!(discover_extension_parents(&mut graph, &source).unwrap(), 1);
        let parent = graph.parent(bean).unwrap();
        assert_eq!(
            graph.get(parent).class_name,
            "com.sun.enterprise.config.serverbeans.Domain"
        );
        assert_eq!(graph.parent(plain), None);
        assert_eq!(graph.full_path(bean), "my-ext");

        // already inspected
        assert_eq!(discover_extension_parents(&mut graph, &source).unwrap(), 0);
    }

    #[test]
    fn test_missing_bytes_leave_bean_for_a_later_source() {
        let mut graph = InhabitantGraph::new();
        let bean = graph.declare_config_bean("com.example.LateExt");

        let empty = MapClassSource::new();
        assert_eq!(discover_extension_parents(&mut graph, &empty).unwrap(), 0);
        assert!(!graph.get(bean).extension_checked);

        let later = MapClassSource::new().with_class(
            "com/example/LateExt",
            ClassWriter::new("com/example/LateExt")
                .interface("com/sun/enterprise/config/serverbeans/ConfigExtension")
                .to_bytes(),
        );
        assert_eq!(discover_extension_parents(&mut graph, &later).unwrap(), 1);
        assert!(graph.get(bean).extension_checked);
        let parent = graph.parent(bean).unwrap();
        assert_eq!(
            graph.get(parent).class_name,
            "com.sun.enterprise.config.serverbeans.Config"
        );
    }

    #[test]
    fn test_malformed_bean_bytes_are_an_error() {
        let mut graph = InhabitantGraph::new();
        graph.declare_config_bean("com.example.Bad");
        let source = MapClassSource::new().with_class("com/example/Bad", vec![0, 1, 2, 3]);
        let err = discover_extension_parents(&mut graph, &source).unwrap_err();
        assert!(matches!(err, DescriptorError::MalformedClass { .. }));
    }
}
