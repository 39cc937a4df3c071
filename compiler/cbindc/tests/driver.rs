//! End-to-end runs over headers in a scratch directory.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use std::fs;
use std::path::{Path, PathBuf};

use cbindc::{run_file, DriverError, RunOptions};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn project(dir: &Path, header: &str, translator: &str) -> PathBuf {
    fs::write(dir.join("foo.h"), header).unwrap();
    let config = format!(
        r#"{{
            "generator": {{ "package": "foo" }},
            "parser": {{ "targets": ["foo.h"] }},
            "translator": {translator}
        }}"#
    );
    let path = dir.join("cbind.json");
    fs::write(&path, config).unwrap();
    path
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn writes_primary_and_host_helpers() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let config = project(
        dir.path(),
        "#define FOO_MAX 10\nvoid foo_greet(const char *name);\n",
        "{}",
    );

    let written = run_file(&config, &RunOptions::new(&out)).unwrap();
    assert_eq!(names(&written), vec!["foo.go", "foo_helpers.go"]);

    let primary = fs::read_to_string(out.join("foo.go")).unwrap();
    assert!(primary.starts_with("// Code generated by cbind. DO NOT EDIT.\n\npackage foo\n"));
    assert!(primary.contains("#include \"foo.h\"\n"));
    assert!(primary.contains("FOO_MAX = 10\n"));
    assert!(primary.contains("func foo_greet(name string) {\n"));
    assert!(primary.contains("C.foo_greet(__cname)\n"));

    let helpers = fs::read_to_string(out.join("foo_helpers.go")).unwrap();
    assert!(helpers.contains("package foo\n"));
    assert!(helpers.contains("func unpackPCharString("));
    assert!(!out.join("foo_helpers.c").exists());
}

#[test]
fn callbacks_get_a_c_shim() {
    let dir = TempDir::new().unwrap();
    let config = project(
        dir.path(),
        "typedef void (*foo_cb)(int code);\nvoid foo_on_event(foo_cb cb);\n",
        "{}",
    );

    let written = run_file(&config, &RunOptions::new(dir.path())).unwrap();
    assert_eq!(names(&written), vec!["foo.go", "foo_helpers.go", "foo_helpers.c"]);

    let shim = fs::read_to_string(dir.path().join("foo_helpers.c")).unwrap();
    assert!(shim.contains("#include \"_cgo_export.h\"\n"));
    assert!(shim.contains("foo_cb_trampoline(int arg0)"));
    let host = fs::read_to_string(dir.path().join("foo_helpers.go")).unwrap();
    assert!(host.contains("//export foo_cb_go\n"));
}

#[test]
fn constants_only_need_no_helpers() {
    let dir = TempDir::new().unwrap();
    let config = project(
        dir.path(),
        "enum { FOO_X = 1, FOO_Y };\n",
        r#"{
            "const_rules": { "enum": "eval" },
            "rules": {
                "global": [
                    { "from": "^foo_", "action": "accept" },
                    { "transform": "lower" },
                    { "from": "^foo_", "to": "_" },
                    { "transform": "export" }
                ]
            }
        }"#,
    );

    let written = run_file(&config, &RunOptions::new(dir.path())).unwrap();
    assert_eq!(names(&written), vec!["foo.go"]);
    let primary = fs::read_to_string(dir.path().join("foo.go")).unwrap();
    assert!(primary.contains("\tX = 1\n"));
    assert!(primary.contains("\tY = 2\n"));
}

#[test]
fn parse_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let config = project(dir.path(), "#include \"missing.h\"\n", "{}");

    let err = run_file(&config, &RunOptions::new(&out)).unwrap_err();
    assert!(matches!(err, DriverError::Parse(_)), "{err}");
    assert!(!out.exists());
}

#[test]
fn collisions_write_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let config = project(
        dir.path(),
        "void Foo_Bar(void);\nvoid foo_bar(void);\n",
        r#"{ "rules": { "function": [ { "transform": "lower" } ] } }"#,
    );

    let err = run_file(&config, &RunOptions::new(&out)).unwrap_err();
    assert!(matches!(err, DriverError::Translate(_)), "{err}");
    assert!(!out.exists());
}

#[test]
fn missing_project_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = run_file(&dir.path().join("none.json"), &RunOptions::new(dir.path())).unwrap_err();
    assert!(matches!(err, DriverError::Read { .. }));
}

#[test]
fn failed_write_leaves_no_partial_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    // a directory where the helpers file belongs makes the last move fail
    fs::create_dir_all(out.join("foo_helpers.go").join("keep")).unwrap();
    let config = project(dir.path(), "void foo_greet(const char *name);\n", "{}");

    let err = run_file(&config, &RunOptions::new(&out)).unwrap_err();
    assert!(matches!(err, DriverError::Write { .. }), "{err}");
    assert!(!out.join("foo.go").exists());
    let left: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(left, vec!["foo_helpers.go"]);
}
