mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::{admin_module, config_module, ClasspathDir};

fn cmdsec() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cmdsec").unwrap();
    cmd.env_remove("CMDSEC_FAILURE_FATAL")
        .env_remove("CMDSEC_CHECK_PARSERS")
        .env_remove("CMDSEC_TRACE")
        .env_remove("RUST_LOG");
    cmd
}

fn with_classpath<'a>(cmd: &'a mut Command, module: &ClasspathDir, config: &ClasspathDir) -> &'a mut Command {
    cmd.arg("--classpath")
        .arg(module.path())
        .arg("--classpath")
        .arg(config.path())
        .arg("--module-name")
        .arg("admin")
}

#[test]
fn test_check_fails_on_offending_command() {
    let (admin, config) = (admin_module(), config_module());
    let mut cmd = cmdsec();
    cmd.arg("check");
    with_classpath(&mut cmd, &admin, &config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing authorization: com/example/admin/Rogue"))
        .stderr(predicate::str::contains(
            "Following command classes neither provide nor inherit authorization",
        ));
}

#[test]
fn test_check_no_fail_succeeds() {
    let (admin, config) = (admin_module(), config_module());
    let mut cmd = cmdsec();
    cmd.arg("check");
    with_classpath(&mut cmd, &admin, &config)
        .arg("--no-fail")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 command(s), 5 with authorization, 1 without"));
}

#[test]
fn test_check_json_output() {
    let (admin, config) = (admin_module(), config_module());
    let mut cmd = cmdsec();
    cmd.arg("--json").arg("check");
    let output = with_classpath(&mut cmd, &admin, &config)
        .arg("--no-fail")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["module_name"], "admin");
    assert_eq!(json["offending"][0], "com/example/admin/Rogue");
    assert_eq!(json["bean_paths"]["com.example.config.Server"], "servers");
}

#[test]
fn test_print_csv() {
    let (admin, config) = (admin_module(), config_module());
    let mut cmd = cmdsec();
    cmd.arg("print");
    with_classpath(&mut cmd, &admin, &config)
        .args(["--no-fail", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Module Name,Module Dir, Command Name,Resource,Action,Origin\n",
        ))
        .stdout(predicate::str::contains(",create-server,domain/servers,create,@AccessRequired,"))
        .stdout(predicate::str::contains(",set-server,servers,update,ReST,"))
        .stdout(predicate::str::contains(",delete-server,servers/$name,delete,CRUD,"))
        .stdout(predicate::str::contains(",configure-ext,my-ext/$xxx,update,@AccessRequired.To,"));
}

#[test]
fn test_print_unknown_format_falls_back_to_summary() {
    let (admin, config) = (admin_module(), config_module());
    let mut cmd = cmdsec();
    cmd.arg("print");
    with_classpath(&mut cmd, &admin, &config)
        .args(["--no-fail", "--format", "xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("======"))
        .stdout(predicate::str::contains("delete-server ([delete] servers/$name)"))
        .stderr(predicate::str::contains("Unrecognized output type xml"));
}

#[test]
fn test_print_to_file_with_overrides() {
    let (admin, config) = (admin_module(), config_module());
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("commandList.txt");
    let overrides = out_dir.path().join("overrides.txt");
    std::fs::write(&overrides, "rogue | domain/rogue:execute:manual\n").unwrap();

    let mut cmd = cmdsec();
    cmd.arg("print");
    with_classpath(&mut cmd, &admin, &config)
        .args(["--no-fail", "--format", "wiki"])
        .arg("--override-file")
        .arg(&overrides)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("{table-plus}\n"));
    assert!(content.trim_end().ends_with("{table-plus}"));
    assert!(content.contains(" | rogue | domain/rogue | execute | manual | "));
}

#[test]
fn test_classpath_is_required() {
    cmdsec()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--classpath"));
}
