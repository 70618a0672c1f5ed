//! The `jadis` binary: exit codes and which stream output lands on.

mod common;

use std::fs;
use std::process::Output;

use common::{jadis_cmd, path_arg, write_class};
use tempfile::TempDir;

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_no_arguments_prints_usage() {
    let output = jadis_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("Usage: jadis <options> <classes>\n"));
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_version() {
    let output = jadis_cmd().arg("-version").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_bad_combination_exits_two() {
    let output = jadis_cmd().args(["-public", "-private", "Foo"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    assert_eq!(
        stderr(&output),
        "Error: bad combination of options: -public -private\n"
    );
}

#[test]
fn test_no_classes_exits_two() {
    let output = jadis_cmd().arg("-s").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr(&output), "Error: no classes specified\n");
}

#[test]
fn test_missing_class_exits_one() {
    let dir = TempDir::new().unwrap();
    let output = jadis_cmd()
        .args(["-cp", &path_arg(dir.path()), "no.Such"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output), "Error: class not found: no.Such\n");
}

#[test]
fn test_disassembles_from_class_path_env() {
    let dir = TempDir::new().unwrap();
    write_class(dir.path(), "p/Hello", &["greet"]);

    let output = jadis_cmd()
        .env("CLASSPATH", dir.path())
        .arg("p.Hello")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "public class p.Hello {\n  public void greet();\n}\n"
    );
}

#[test]
fn test_config_supplies_class_path() {
    let classes = TempDir::new().unwrap();
    write_class(classes.path(), "Hello", &[]);
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[search]\nclass_path = [{:?}]\n",
            path_arg(classes.path())
        ),
    )
    .unwrap();

    let output = jadis_cmd()
        .env("JADIS_CONFIG", &config)
        .arg("Hello")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("public class Hello {"));
}

#[test]
fn test_invalid_config_exits_two() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[defaults]\nurl_timeout_seconds = 0\n").unwrap();

    let output = jadis_cmd()
        .env("JADIS_CONFIG", &config)
        .arg("Foo")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).starts_with("jadis: Config validation failed: "));
}

#[test]
fn test_locale_from_environment() {
    let output = jadis_cmd()
        .env("LC_ALL", "de_DE.UTF-8")
        .arg("-s")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr(&output), "Fehler: Keine Klassen angegeben\n");
}

#[test]
fn test_log_file_written_when_enabled() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("jadis.log");

    let output = jadis_cmd()
        .env("JADIS_LOG", &log)
        .env("RUST_LOG", "debug")
        .arg("-version")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let written: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("jadis.log."))
        .collect();
    assert_eq!(written.len(), 1, "{:?}", written);
    let text = fs::read_to_string(dir.path().join(&written[0])).unwrap();
    assert!(text.contains("Task state"));
}
