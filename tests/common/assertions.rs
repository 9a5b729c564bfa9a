//! Assertions over module reports and check failures.

#![allow(dead_code)]

use cmdsec::ModuleReport;
use cmdsec_types::AuthorizationInfo;

/// The command reported under `name`, failing with the names that were reported.
pub fn command<'a>(report: &'a ModuleReport, name: &str) -> &'a AuthorizationInfo {
    report
        .commands
        .iter()
        .find(|info| info.name.as_deref() == Some(name))
        .unwrap_or_else(|| {
            let names: Vec<_> = report.commands.iter().filter_map(|i| i.name.as_deref()).collect();
            panic!("{}: no command {name}; reported {names:?}", report.module_name)
        })
}

/// Assert the exact offenders of a report, in resolution order.
pub fn assert_offending(report: &ModuleReport, expected: &[&str]) {
    assert_eq!(
        report.offending, expected,
        "{}: offending commands differ (compliant: {:?})",
        report.module_name, report.compliant
    );
    assert_eq!(report.is_compliant(), expected.is_empty());
}

/// Assert that a failed check names `class` somewhere in its cause chain.
pub fn assert_failure_names(err: &anyhow::Error, class: &str) {
    let chain = format!("{err:#}");
    assert!(chain.contains(class), "failure should name {class}, got: {chain}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn report(commands: Vec<AuthorizationInfo>) -> ModuleReport {
        ModuleReport {
            module_name: "core".into(),
            commands,
            ..Default::default()
        }
    }

    #[test]
    fn test_command_lookup() {
        let mut builder = AuthorizationInfo::builder("com/example/Ping");
        builder.name("ping");
        let report = report(vec![builder.build()]);
        assert_eq!(command(&report, "ping").class_name, "com/example/Ping");
    }

    #[test]
    #[should_panic(expected = "core: no command pong")]
    fn test_command_lookup_names_the_module() {
        command(&report(Vec::new()), "pong");
    }

    #[test]
    fn test_failure_names_searches_the_chain() {
        let err = anyhow!("class com/example/Ghost not found").context("resolving commands");
        assert_failure_names(&err, "com/example/Ghost");
    }
}
