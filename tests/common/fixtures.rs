//! Synthetic modules for integration tests.
//!
//! Class files are produced with [`ClassWriter`]; nothing compiled is
//! checked in. A [`ClasspathDir`] lays them out on disk the way a build
//! output directory looks, descriptor included.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use cmdsec::ModuleInput;
use cmdsec_analyzer::config::DEFAULT_DESCRIPTOR_PATHS;
use cmdsec_analyzer::scanner::ADMIN_COMMAND;
use cmdsec_analyzer::{ClassAnnotation, FieldAnnotation};
use cmdsec_classfile::{Annotation, ClassWriter, ElementValue};
use tempfile::TempDir;

/// Config beans shared by every admin module: `Domain` owns `Servers`,
/// which holds a keyed collection of `Server`.
pub const CONFIG_DESCRIPTOR: &str = "\
[com.example.config.DomainInjector]
contract={org.jvnet.hk2.config.ConfigInjector}
metadata=target={com.example.config.Domain},<servers>={com.example.config.Servers}

[com.example.config.ServersInjector]
contract={org.jvnet.hk2.config.ConfigInjector}
metadata=target={com.example.config.Servers},<*>={collection\\:com.example.config.Server}
";

/// Commands of the admin module built by [`admin_module`].
pub const ADMIN_DESCRIPTOR: &str = "\
[com.example.admin.CreateServer]
contract={org.glassfish.api.admin.AdminCommand}
name=create-server

[com.example.admin.ListServers]
contract={org.glassfish.api.admin.AdminCommand}
name=list-servers

[com.example.admin.SetServer]
contract={org.glassfish.api.admin.AdminCommand}
name=set-server

[com.example.admin.ConfigureExt]
contract={org.glassfish.api.admin.AdminCommand}
name=configure-ext

[com.example.admin.Rogue]
contract={org.glassfish.api.admin.AdminCommand}
name=rogue

[com.example.admin.MyExtInjector]
contract={org.jvnet.hk2.config.ConfigInjector}
metadata=target={com.example.admin.MyExt}

[org.glassfish.config.support.GenericDeleteCommand]
contract={org.glassfish.api.admin.AdminCommand}
name=delete-server
metadata=MethodListActual={com.example.config.Server},MethodName={delete},ParentConfigured={com.example.config.Servers}
";

/// A build output directory that lives as long as the value.
pub struct ClasspathDir {
    dir: TempDir,
}

impl ClasspathDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp classpath dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn path_buf(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn add_class(&self, internal_name: &str, bytes: Vec<u8>) -> &Self {
        let path = self.path().join(format!("{internal_name}.class"));
        fs::create_dir_all(path.parent().expect("class path has a parent")).expect("create package dirs");
        fs::write(&path, bytes).expect("write class file");
        self
    }

    pub fn add_descriptor(&self, text: &str) -> &Self {
        let path = self.path().join(DEFAULT_DESCRIPTOR_PATHS[0]);
        fs::create_dir_all(path.parent().expect("descriptor path has a parent")).expect("create locator dir");
        fs::write(&path, text).expect("write descriptor");
        self
    }

    pub fn write_file(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, text).expect("write file");
        path
    }
}

/// Input for `module` with the given dependency roots, default descriptor locations.
pub fn module_input(name: &str, module: &ClasspathDir, dependencies: &[&ClasspathDir]) -> ModuleInput {
    let roots: Vec<PathBuf> = std::iter::once(module)
        .chain(dependencies.iter().copied())
        .map(ClasspathDir::path_buf)
        .collect();
    let locations: Vec<String> = DEFAULT_DESCRIPTOR_PATHS.iter().map(|p| p.to_string()).collect();
    ModuleInput::from_classpath(name, format!("{name}/"), &roots, &locations)
        .unwrap_or_else(|e| panic!("module input for {name}: {e:#}"))
}

fn strings(values: &[&str]) -> ElementValue {
    ElementValue::Array(
        values
            .iter()
            .map(|v| ElementValue::String(v.to_string()))
            .collect(),
    )
}

pub fn access_required(resources: &[&str], actions: &[&str]) -> Annotation {
    Annotation::new(ClassAnnotation::AccessRequired.descriptor())
        .with("resource", strings(resources))
        .with("action", strings(actions))
}

fn service(name: &str) -> Annotation {
    Annotation::new(ClassAnnotation::Service.descriptor()).with("name", ElementValue::String(name.into()))
}

/// A named command class; further annotations chain onto the writer.
pub fn command_class(internal_name: &str, name: &str) -> ClassWriter {
    ClassWriter::new(internal_name)
        .interface(ADMIN_COMMAND)
        .annotation(service(name))
}

/// Config bean classes; none of them carry annotations the analysis reads.
pub fn config_module() -> ClasspathDir {
    let dir = ClasspathDir::new();
    dir.add_descriptor(CONFIG_DESCRIPTOR);
    for bean in ["Domain", "Servers", "Server"] {
        let name = format!("com/example/config/{bean}");
        dir.add_class(&name, ClassWriter::new(name.as_str()).to_bytes());
    }
    dir
}

/// One command of each kind the analysis distinguishes, plus one offender.
pub fn admin_module() -> ClasspathDir {
    let dir = ClasspathDir::new();
    dir.add_descriptor(ADMIN_DESCRIPTOR);

    dir.add_class(
        "com/example/admin/CreateServer",
        command_class("com/example/admin/CreateServer", "create-server")
            .annotation(access_required(&["domain/servers"], &["create"]))
            .to_bytes(),
    );

    // authorization inherited from a plain base class
    dir.add_class(
        "com/example/admin/ServerCommandBase",
        ClassWriter::new("com/example/admin/ServerCommandBase")
            .annotation(access_required(&["domain/servers"], &["read"]))
            .to_bytes(),
    );
    dir.add_class(
        "com/example/admin/ListServers",
        command_class("com/example/admin/ListServers", "list-servers")
            .super_class("com/example/admin/ServerCommandBase")
            .to_bytes(),
    );

    let endpoint = Annotation::new(ClassAnnotation::RestEndpoint.descriptor())
        .with("configBean", ElementValue::Class("Lcom/example/config/Server;".into()))
        .with(
            "opType",
            ElementValue::Enum {
                type_descriptor: "Lorg/glassfish/api/admin/RestEndpoint$OpType;".into(),
                constant: "POST".into(),
            },
        )
        .with("useForAuthorization", ElementValue::Boolean(true));
    dir.add_class(
        "com/example/admin/SetServer",
        command_class("com/example/admin/SetServer", "set-server")
            .annotation(
                Annotation::new(ClassAnnotation::RestEndpoints.descriptor())
                    .with("value", ElementValue::Array(vec![ElementValue::Annotation(endpoint)])),
            )
            .to_bytes(),
    );

    dir.add_class(
        "com/example/admin/MyExt",
        ClassWriter::new("com/example/admin/MyExt")
            .interface("com/sun/enterprise/config/serverbeans/DomainExtension")
            .to_bytes(),
    );
    dir.add_class(
        "com/example/admin/ConfigureExt",
        command_class("com/example/admin/ConfigureExt", "configure-ext")
            .field(
                "ext",
                "Lcom/example/admin/MyExt;",
                vec![Annotation::new(FieldAnnotation::AccessRequiredTo.descriptor())
                    .with("value", strings(&["update"]))],
            )
            .to_bytes(),
    );

    dir.add_class(
        "com/example/admin/Rogue",
        command_class("com/example/admin/Rogue", "rogue").to_bytes(),
    );
    dir
}
