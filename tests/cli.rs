//! Drives the `lzb` binary for commands that never invoke a compiler.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn lzb(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lzb"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run lzb")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn test_init_then_dependency_report() {
    let tmp = TempDir::new().unwrap();
    let out = lzb(tmp.path(), &["init"]);
    assert!(out.status.success());
    assert!(tmp.path().join("default.lzb").is_file());
    assert!(tmp.path().join("obj").is_dir());

    fs::write(tmp.path().join("src/main.c"), "#include \"util.h\"\nint main(void){return 0;}\n")
        .unwrap();
    fs::write(tmp.path().join("src/util.h"), "").unwrap();

    let out = lzb(tmp.path(), &["-d"]);
    assert!(out.status.success(), "{}", stdout(&out));
    let text = stdout(&out);
    assert!(text.contains("src/main.c needs rebuild"));
    assert!(text.contains("1 of 1"));
}

#[test]
fn test_print_dependencies_shows_tree() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    fs::write(tmp.path().join("default.lzb"), "name = \"tree\"\n").unwrap();
    fs::write(tmp.path().join("src/main.c"), "#include \"a.h\"\n").unwrap();
    fs::write(tmp.path().join("src/a.h"), "#include \"main.c\"\n").unwrap();

    let out = lzb(tmp.path(), &["build", "--print-dependencies"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("└── "));
    assert!(text.contains("(seen)"));
    assert!(!text.contains("Compil"));
    assert!(!tmp.path().join("obj").exists());
    assert!(!tmp.path().join("bin").exists());
}

#[test]
fn test_malformed_config_exits_non_zero() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("default.lzb"), "name = \"x\"\nsource \"src\"\n").unwrap();

    let out = lzb(tmp.path(), &["-d"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("unexpected token"));
}

#[test]
fn test_missing_config_exits_non_zero() {
    let tmp = TempDir::new().unwrap();
    let out = lzb(tmp.path(), &["-c", "other.lzb", "-d"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("other.lzb"));
}

#[test]
fn test_script_is_written() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    fs::write(tmp.path().join("default.lzb"), "name = \"demo\"\n").unwrap();
    fs::write(tmp.path().join("src/main.cpp"), "int main(){}\n").unwrap();

    let out = lzb(tmp.path(), &["script", "build.sh"]);
    assert!(out.status.success());
    let script = fs::read_to_string(tmp.path().join("build.sh")).unwrap();
    assert!(script.contains("-c "));
    assert!(script.contains("bin/demo"));
}

#[test]
fn test_header_only_build_succeeds_without_compiler() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    fs::write(tmp.path().join("default.lzb"), "").unwrap();
    fs::write(tmp.path().join("src/api.hpp"), "").unwrap();

    let out = lzb(tmp.path(), &[]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Header only library ready"));
}

#[test]
fn test_completion_script() {
    let tmp = TempDir::new().unwrap();
    let out = lzb(tmp.path(), &["completion", "bash"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("lzb"));
}
