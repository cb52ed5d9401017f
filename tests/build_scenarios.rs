//! End-to-end build passes against a recording executor.
//!
//! The executor never runs a compiler. It writes the file named after `-o`
//! (or the archive for `ar`) so timestamps behave like a real build.

use lzbuild::build::{
    BuildOptions, BuildStatus, CommandExecutor, CommandLine, ExecOutput, Project,
};
use lzbuild::config::Platform;
use lzbuild::dsl::EvalContext;
use lzbuild::error::{BuildError, ConfigError};
use lzbuild::pkg_config::LinkOnly;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<CommandLine>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    fail_link: bool,
}

impl RecordingExecutor {
    fn failing_link() -> Self {
        Self {
            fail_link: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    fn compiles(&self) -> Vec<CommandLine> {
        self.calls().into_iter().filter(is_compile).collect()
    }

    fn links(&self) -> Vec<CommandLine> {
        self.calls().into_iter().filter(|c| !is_compile(c)).collect()
    }
}

fn is_compile(cmd: &CommandLine) -> bool {
    cmd.args.iter().any(|a| a == "-c")
}

fn output_of(cmd: &CommandLine) -> PathBuf {
    if cmd.program == "ar" {
        return PathBuf::from(&cmd.args[1]);
    }
    let at = cmd.args.iter().position(|a| a == "-o").unwrap();
    PathBuf::from(&cmd.args[at + 1])
}

impl CommandExecutor for RecordingExecutor {
    fn run(&self, cmd: &CommandLine) -> ExecOutput {
        self.calls.lock().unwrap().push(cmd.clone());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));

        let result = if cmd.args.iter().any(|a| a.contains("broken")) {
            ExecOutput::failed("broken.c:1:1: error: expected ';'")
        } else if !is_compile(cmd) && self.fail_link {
            ExecOutput::failed("undefined reference to `main'")
        } else {
            fs::write(output_of(cmd), "artifact").unwrap();
            ExecOutput::ok(if is_compile(cmd) { "" } else { "linked" })
        };
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn write(root: &Path, rel: &str, body: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    path
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

fn ago(secs: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(secs)
}

fn load(root: &Path, config: &str, platform: Platform) -> Result<Project, BuildError> {
    write(root, "default.lzb", config);
    let ctx = EvalContext::fixed(platform.name.clone(), Vec::<String>::new());
    Project::load_with(&BuildOptions::in_root(root), &ctx, platform, &LinkOnly)
}

fn project(root: &Path, config: &str) -> Project {
    load(root, config, Platform::linux()).unwrap()
}

#[test]
fn test_concurrency_stays_within_thread_budget() {
    let tmp = TempDir::new().unwrap();
    for i in 0..10 {
        write(tmp.path(), &format!("src/unit{i}.c"), "int f(void);\n");
    }
    let project = project(tmp.path(), "threads = \"2\"");
    let exec = RecordingExecutor::default();

    let summary = project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap();
    assert_eq!(summary.status, BuildStatus::Changed);
    assert_eq!(summary.compiled, 10);
    assert!(summary.linked);
    assert!(exec.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(exec.compiles().len(), 10);
    for i in 0..10 {
        assert!(tmp.path().join(format!("obj/default/src/unit{i}.o")).is_file());
    }
    assert!(tmp.path().join("compile_commands.json").is_file());
}

#[test]
fn test_single_failure_blocks_link() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/a.c", "");
    write(tmp.path(), "src/broken.c", "");
    write(tmp.path(), "src/c.c", "");
    let project = project(tmp.path(), "threads = \"4\"");
    let exec = RecordingExecutor::default();

    let err = project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap_err();
    assert!(matches!(err, BuildError::Compile { failed: 1 }));
    assert_eq!(exec.compiles().len(), 3);
    assert!(exec.links().is_empty());
    assert!(!tmp.path().join("bin/app").exists());
}

#[test]
fn test_second_pass_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "src/a.c", "#include \"a.h\"\n");
    let h = write(tmp.path(), "src/a.h", "");
    set_mtime(&a, ago(1000));
    set_mtime(&h, ago(1000));
    let options = BuildOptions::in_root(tmp.path());

    let first = RecordingExecutor::default();
    project(tmp.path(), "").build(&options, &first).unwrap();
    assert_eq!(first.calls().len(), 2);

    let second = RecordingExecutor::default();
    let summary = project(tmp.path(), "").build(&options, &second).unwrap();
    assert_eq!(summary.status, BuildStatus::NoChange);
    assert!(!summary.linked);
    assert!(second.calls().is_empty());
}

#[test]
fn test_only_modified_unit_is_recompiled() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "src/a.c", "");
    let b = write(tmp.path(), "src/b.c", "");
    let a_obj = write(tmp.path(), "obj/default/src/a.o", "");
    let b_obj = write(tmp.path(), "obj/default/src/b.o", "");
    let bin = write(tmp.path(), "bin/app", "");
    set_mtime(&a, ago(500));
    set_mtime(&a_obj, ago(400));
    set_mtime(&b_obj, ago(400));
    set_mtime(&b, ago(300));
    set_mtime(&bin, ago(350));

    let project = project(tmp.path(), "source = \"src\"\nthreads = \"4\"");
    let exec = RecordingExecutor::default();
    let summary = project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap();

    let compiles = exec.compiles();
    assert_eq!(compiles.len(), 1);
    assert!(compiles[0].args.iter().any(|arg| arg.ends_with("b.c")));
    assert_eq!(summary.status, BuildStatus::Changed);
    assert!(summary.linked);
    assert_eq!(exec.links().len(), 1);
}

#[test]
fn test_binary_newer_than_new_object_is_not_relinked() {
    let tmp = TempDir::new().unwrap();
    let b = write(tmp.path(), "src/b.c", "");
    let b_obj = write(tmp.path(), "obj/default/src/b.o", "");
    let bin = write(tmp.path(), "bin/app", "");
    set_mtime(&b_obj, ago(400));
    set_mtime(&b, ago(300));
    set_mtime(&bin, SystemTime::now() + Duration::from_secs(3600));

    let project = project(tmp.path(), "");
    let exec = RecordingExecutor::default();
    let summary = project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap();
    assert_eq!(summary.compiled, 1);
    assert!(!summary.linked);
    assert!(exec.links().is_empty());
}

#[test]
fn test_header_change_rebuilds_every_includer() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "src/a.cpp", "#include <shared.hpp>\n");
    let b = write(tmp.path(), "src/b.cpp", "#include <vector>\n");
    let header = write(tmp.path(), "include/shared.hpp", "");
    for file in [&a, &b] {
        set_mtime(file, ago(900));
    }
    set_mtime(&header, ago(900));
    let config = "include = \"include\"";
    let options = BuildOptions::in_root(tmp.path());
    project(tmp.path(), config)
        .build(&options, &RecordingExecutor::default())
        .unwrap();

    set_mtime(&header, SystemTime::now() + Duration::from_secs(60));
    let exec = RecordingExecutor::default();
    project(tmp.path(), config).build(&options, &exec).unwrap();
    let compiles = exec.compiles();
    assert_eq!(compiles.len(), 1);
    assert!(compiles[0].args.iter().any(|arg| arg.ends_with("a.cpp")));
    assert!(compiles[0].args.iter().any(|arg| arg.starts_with("-I")));
}

#[test]
fn test_full_rebuild_and_force_link() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "src/a.c", "");
    set_mtime(&a, ago(900));
    let mut options = BuildOptions::in_root(tmp.path());
    project(tmp.path(), "")
        .build(&options, &RecordingExecutor::default())
        .unwrap();

    options.full_rebuild = true;
    let exec = RecordingExecutor::default();
    project(tmp.path(), "").build(&options, &exec).unwrap();
    assert_eq!(exec.compiles().len(), 1);

    options.full_rebuild = false;
    options.force_linking = true;
    let exec = RecordingExecutor::default();
    let summary = project(tmp.path(), "").build(&options, &exec).unwrap();
    assert!(exec.compiles().is_empty());
    assert!(summary.linked);
}

#[test]
fn test_library_output_is_archived() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/a.c", "");
    write(tmp.path(), "src/b.c", "");
    let project = project(tmp.path(), "name = \"core\"\noutput = \"library\"");
    let exec = RecordingExecutor::default();

    project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap();
    let links = exec.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].program, "ar");
    assert_eq!(links[0].args[0], "rcs");
    assert_eq!(links[0].args.len(), 4);
    assert!(tmp.path().join("bin/libcore.a").is_file());
}

#[test]
fn test_link_failure_is_reported() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/a.c", "");
    let project = project(tmp.path(), "");
    let exec = RecordingExecutor::failing_link();

    let err = project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap_err();
    match err {
        BuildError::Link { output, .. } => assert!(output.contains("main")),
        other => panic!("expected link error, got {other:?}"),
    }
}

#[test]
fn test_header_only_project_compiles_nothing() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/only.hpp", "");
    let project = project(tmp.path(), "");
    let exec = RecordingExecutor::default();

    let summary = project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap();
    assert!(summary.header_only);
    assert!(exec.calls().is_empty());
}

#[test]
fn test_platform_conditionals_pick_libraries() {
    let tmp = TempDir::new().unwrap();
    let config = "if linux { lib = \"m\" } else { lib = \"ws2_32\" }";
    let names = |p: Project| -> Vec<String> {
        p.config.libraries.iter().map(|l| l.name.clone()).collect()
    };
    assert_eq!(names(load(tmp.path(), config, Platform::linux()).unwrap()), ["m"]);
    assert_eq!(
        names(load(tmp.path(), config, Platform::windows()).unwrap()),
        ["ws2_32"]
    );
}

#[test]
fn test_repeated_key_merges_values() {
    let tmp = TempDir::new().unwrap();
    let project = project(tmp.path(), "name = \"x\"\nname = \"y\"");
    assert_eq!(project.config.raw.get("name"), Some("x;y"));
}

#[test]
fn test_parse_error_aborts_loading() {
    let tmp = TempDir::new().unwrap();
    let err = load(tmp.path(), "name = \"x\"\nlib \"m\"", Platform::linux())
        .err()
        .unwrap();
    assert!(matches!(err, BuildError::Config(ConfigError::Parse { .. })));
}

#[test]
fn test_dependency_report_matches_plan() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "src/a.c", "");
    write(tmp.path(), "src/b.c", "");
    let a_obj = write(tmp.path(), "obj/default/src/a.o", "");
    set_mtime(&a, ago(100));
    set_mtime(&a_obj, ago(50));

    let project = project(tmp.path(), "");
    let report = project.dependency_report(false);
    assert_eq!(
        report,
        vec![
            (PathBuf::from("src/a.c"), false),
            (PathBuf::from("src/b.c"), true)
        ]
    );
    assert_eq!(project.plan(&BuildOptions::in_root(tmp.path())).len(), 1);
}

#[test]
fn test_foreign_source_root_keeps_objects_under_obj() {
    let tmp = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    write(elsewhere.path(), "x.c", "int x;\n");

    let config = format!("source = \"{}\"", elsewhere.path().display());
    let project = project(tmp.path(), &config);
    let file = project.registry.sources().next().unwrap();
    let object = project.object_for(file);
    assert!(object.starts_with(tmp.path().join("obj").join("default")));

    let exec = RecordingExecutor::default();
    project.build(&BuildOptions::in_root(tmp.path()), &exec).unwrap();
    assert!(object.is_file());
    assert!(!elsewhere.path().join("x.o").exists());
}

#[test]
fn test_exported_header_change_rebuilds_includer() {
    let tmp = TempDir::new().unwrap();
    let prefix = TempDir::new().unwrap();
    let main = write(tmp.path(), "src/main.cpp", "#include <mylib/api.h>\n");
    let header = write(prefix.path(), "include/mylib/api.h", "");
    set_mtime(&main, ago(900));
    set_mtime(&header, ago(900));
    write(tmp.path(), "default.lzb", "name = \"app\"");

    let options = BuildOptions {
        export_prefix: Some(prefix.path().to_path_buf()),
        ..BuildOptions::in_root(tmp.path())
    };
    let ctx = EvalContext::fixed("linux", Vec::<String>::new());
    let load = |options: &BuildOptions| {
        Project::load_with(options, &ctx, Platform::linux(), &LinkOnly).unwrap()
    };
    load(&options)
        .build(&options, &RecordingExecutor::default())
        .unwrap();

    set_mtime(&header, SystemTime::now() + Duration::from_secs(60));

    let without_prefix = BuildOptions::in_root(tmp.path());
    let exec = RecordingExecutor::default();
    load(&without_prefix).build(&without_prefix, &exec).unwrap();
    assert!(exec.compiles().is_empty());

    let exec = RecordingExecutor::default();
    load(&options).build(&options, &exec).unwrap();
    let compiles = exec.compiles();
    assert_eq!(compiles.len(), 1);
    assert!(compiles[0].args.iter().any(|arg| arg.ends_with("main.cpp")));
}
