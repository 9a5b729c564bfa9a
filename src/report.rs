//! Report renderings.
//!
//! | Format | Shape |
//! |---|---|
//! | `summary` | per-module banner, then one block per command with its params |
//! | `wiki` | one table row per (command, resource, action) inside `{table-plus}` |
//! | `csv` | the same rows, comma separated, with a header line |
//! | `json` | the reports themselves |
//!
//! Types without a command name never produce output.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use anyhow::{anyhow, Result};
use cmdsec_types::naming::internal_to_dotted;
use cmdsec_types::{rest_op_type_to_action, AuthorizationInfo};
use tracing::{error, warn};

use crate::module_check::ModuleReport;

const SUMMARY_BANNER: &str =
    "=================================================================================";
const WIKI_TABLE: &str = "{table-plus}";
const WIKI_HEADER: &str = "|| Module Name || Module Dir || Command Name || Resource || Action || Origin ||";
const CSV_HEADER: &str = "Module Name,Module Dir, Command Name,Resource,Action,Origin";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Summary,
    Wiki,
    Csv,
    Json,
}

impl OutputFormat {
    pub const ALL: [Self; 4] = [Self::Summary, Self::Wiki, Self::Csv, Self::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Wiki => "wiki",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Like [`FromStr`], but an unknown name falls back to `summary`.
    pub fn from_name_or_summary(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("Unrecognized output type {name}; using human-readable instead");
            Self::Summary
        })
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown output format: {s}"))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render reports for several modules as one document.
pub fn render(format: OutputFormat, reports: &[ModuleReport]) -> Result<String> {
    match format {
        OutputFormat::Summary => Ok(render_summary(reports)),
        OutputFormat::Wiki => Ok(render_rows(reports, &WIKI)),
        OutputFormat::Csv => Ok(render_rows(reports, &CSV)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
    }
}

fn named(report: &ModuleReport) -> impl Iterator<Item = (&AuthorizationInfo, &str)> {
    report
        .commands
        .iter()
        .filter_map(|info| info.name.as_deref().map(|name| (info, name)))
}

// =============================================================================
// Summary
// =============================================================================

fn render_summary(reports: &[ModuleReport]) -> String {
    let indent = "  ";
    let mut out = String::new();
    for report in reports {
        let mut commands = named(report).peekable();
        if commands.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "{indent}{SUMMARY_BANNER}");
        let _ = writeln!(out, "{indent}{}({})", report.module_name, report.module_dir);
        out.push('\n');
        let nested = format!("{indent}  ");
        for (info, _) in commands {
            let _ = write!(out, "{nested}{}", info.summary(&nested));
        }
    }
    out
}

// =============================================================================
// One line per row
// =============================================================================

struct RowStyle {
    sep: &'static str,
    header: &'static [&'static str],
    footer: &'static [&'static str],
}

const WIKI: RowStyle = RowStyle {
    sep: " | ",
    header: &[WIKI_TABLE, WIKI_HEADER],
    footer: &[WIKI_TABLE],
};

const CSV: RowStyle = RowStyle {
    sep: ",",
    header: &[CSV_HEADER],
    footer: &[],
};

fn render_rows(reports: &[ModuleReport], style: &RowStyle) -> String {
    let mut body = String::new();
    let mut any = false;
    for report in reports {
        for (info, name) in named(report) {
            any = true;
            command_rows(&mut body, style.sep, report, info, name);
        }
    }
    if !any {
        return String::new();
    }

    let mut out = String::new();
    for line in style.header {
        let _ = writeln!(out, "{line}");
    }
    out.push_str(&body);
    for line in style.footer {
        let _ = writeln!(out, "{line}");
    }
    out
}

fn command_rows(out: &mut String, sep: &str, report: &ModuleReport, info: &AuthorizationInfo, name: &str) {
    let prefix = format!(
        "{sep}{}{sep}{}{sep}{name}{sep}",
        report.module_name, report.module_dir
    );
    let mut row = |resource: &str, action: &str, origin: &str| {
        let _ = writeln!(out, "{prefix}{resource}{sep}{action}{sep}{origin}{sep}");
    };

    if let Some(delegate) = &info.delegate {
        row("?", "?", &format!("Delegates to {}", internal_to_dotted(delegate)));
    }

    if let Some(generic) = &info.generic {
        row(
            &generic.subpath_per_action(),
            generic.action.reported_action(),
            "CRUD",
        );
    }

    for endpoint in info.rest_endpoints.iter().filter(|e| e.use_for_authorization) {
        let bean = endpoint.config_bean.as_deref().unwrap_or_default();
        match report.bean_path(bean) {
            Some(path) => row(path, rest_op_type_to_action(&endpoint.op_type), "ReST"),
            None => error!(
                command = name,
                "Could not find config bean for RestEndpoint with config bean class name {bean}"
            ),
        }
    }

    for pair in &info.resource_actions {
        row(&pair.resource, &pair.action, &pair.origin);
    }

    if info.flags.is_access_check_provider {
        row("?", "?", "AccessCheckProvider");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdsec_types::{GenericCommand, GenericInfo, ResourceAction, RestEndpoint};

    fn report(commands: Vec<AuthorizationInfo>) -> ModuleReport {
        ModuleReport {
            module_name: "core".into(),
            module_dir: "admin/core/".into(),
            commands,
            ..Default::default()
        }
    }

    fn named_info(name: &str) -> cmdsec_types::AuthorizationInfoBuilder {
        let mut builder = AuthorizationInfo::builder("com/example/Cmd");
        builder.name(name);
        builder
    }

    #[test]
    fn test_format_names() {
        assert_eq!("wiki".parse::<OutputFormat>().unwrap(), OutputFormat::Wiki);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::from_name_or_summary("xml"), OutputFormat::Summary);
    }

    #[test]
    fn test_csv_rows() {
        let mut builder = named_info("create-thing");
        builder
            .add_resource_action(ResourceAction::new("domain/things", "create", "@AccessRequired"))
            .access_check_provider();
        let out = render(OutputFormat::Csv, &[report(vec![builder.build()])]).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            ",core,admin/core/,create-thing,domain/things,create,@AccessRequired,"
        );
        assert_eq!(lines[2], ",core,admin/core/,create-thing,?,?,AccessCheckProvider,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_wiki_rows_for_delegate_and_crud() {
        let mut delegating = named_info("fwd");
        delegating.delegate("com/example/Checker");

        let mut generic = named_info("list-things");
        generic.generic(GenericInfo {
            action: GenericCommand::List,
            method_list_actual: "com.example.Thing".into(),
            method_name: "list".into(),
            full_path: "domain/things".into(),
        });

        let out = render(
            OutputFormat::Wiki,
            &[report(vec![delegating.build(), generic.build()])],
        )
        .unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], WIKI_TABLE);
        assert_eq!(lines[1], WIKI_HEADER);
        assert_eq!(
            lines[2],
            " | core | admin/core/ | fwd | ? | ? | Delegates to com.example.Checker | "
        );
        assert_eq!(lines[3], " | core | admin/core/ | list-things | domain | read | CRUD | ");
        assert_eq!(lines[4], WIKI_TABLE);
    }

    #[test]
    fn test_rest_rows_use_bean_path() {
        let endpoint = |bean: &str| {
            RestEndpoint::new(Some(bean.to_string()), None, Some("POST".into()), true)
        };
        let mut builder = named_info("set-thing");
        builder
            .add_rest_endpoint(endpoint("com/example/Thing"))
            .add_rest_endpoint(endpoint("com/example/Unknown"));
        let mut module = report(vec![builder.build()]);
        module
            .bean_paths
            .insert("com.example.Thing".into(), "domain/thing".into());

        let out = render(OutputFormat::Csv, &[module]).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], ",core,admin/core/,set-thing,domain/thing,update,ReST,");
    }

    #[test]
    fn test_unnamed_types_are_skipped() {
        let unnamed = AuthorizationInfo::builder("com/example/Base").build();
        assert_eq!(render(OutputFormat::Csv, &[report(vec![unnamed.clone()])]).unwrap(), "");
        assert_eq!(render(OutputFormat::Summary, &[report(vec![unnamed])]).unwrap(), "");
    }

    #[test]
    fn test_summary_block() {
        let out = render(OutputFormat::Summary, &[report(vec![named_info("bare").build()])]).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], format!("  {SUMMARY_BANNER}"));
        assert_eq!(lines[1], "  core(admin/core/)");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "    bare (com/example/Cmd)");
    }

    #[test]
    fn test_json_is_an_array_of_reports() {
        let out = render(OutputFormat::Json, &[report(vec![named_info("bare").build()])]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["module_name"], "core");
        assert_eq!(value[0]["commands"][0]["name"], "bare");
    }
}
