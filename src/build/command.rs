use super::executor::CommandLine;
use crate::config::{Config, resolve};
use std::path::{Component, Path, PathBuf};

/// Builds compiler, linker and archiver invocations for one project.
pub struct CommandBuilder<'a> {
    config: &'a Config,
    root: &'a Path,
    debug: bool,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a Config, root: &'a Path, debug: bool) -> Self {
        Self {
            config,
            root,
            debug,
        }
    }

    /// Under `g++`, plain C sources are compiled by `gcc` with no `-std`.
    fn driver_for(&self, source: &Path) -> (&str, bool) {
        let is_c = source.extension().is_some_and(|e| e == "c");
        if self.config.compiler == "g++" && is_c {
            ("gcc", false)
        } else {
            (self.config.compiler.as_str(), true)
        }
    }

    pub fn compile(&self, source: &Path, object: &Path) -> CommandLine {
        let (driver, with_std) = self.driver_for(source);
        let mut cmd = CommandLine::new(driver);
        if self.debug {
            cmd.arg("-g");
        }
        cmd.args(["-Wfatal-errors", "-Wall", "-fdiagnostics-color=always"]);
        if with_std {
            cmd.arg(format!("-std={}", self.config.standard));
        }
        cmd.arg("-o")
            .arg(object.display().to_string())
            .arg("-c")
            .arg(source.display().to_string());
        for folder in &self.config.include_folders {
            cmd.arg(format!("-I{}", resolve(self.root, folder).display()));
        }
        cmd.args(self.config.cflags.iter().cloned());
        for lib in &self.config.libraries {
            cmd.args(lib.flags.cflags.iter().cloned());
        }
        for define in &self.config.macros {
            cmd.arg("-D").arg(define.clone());
        }
        cmd
    }

    pub fn link(&self, objects: &[PathBuf], binary: &Path) -> CommandLine {
        let mut cmd = CommandLine::new(self.config.compiler.clone());
        if self.debug {
            cmd.arg("-g");
        }
        cmd.args([
            "-Wfatal-errors",
            "-Wall",
            "-Wextra",
            "-fdiagnostics-color=always",
        ]);
        cmd.arg(format!("-std={}", self.config.standard))
            .arg("-o")
            .arg(binary.display().to_string());
        cmd.args(objects.iter().map(|o| o.display().to_string()));
        for path in &self.config.library_paths {
            cmd.arg(format!("-L{}", resolve(self.root, path).display()));
        }
        for lib in &self.config.libraries {
            cmd.args(lib.flags.cflags.iter().cloned());
            cmd.args(lib.flags.lib_flags.iter().cloned());
        }
        cmd.args(self.config.link_etc.iter().cloned());
        cmd
    }

    pub fn archive(&self, objects: &[PathBuf], library: &Path) -> CommandLine {
        let mut cmd = CommandLine::new("ar");
        cmd.arg("rcs").arg(library.display().to_string());
        cmd.args(objects.iter().map(|o| o.display().to_string()));
        cmd
    }

    /// The link or archive step, depending on the configured output.
    pub fn finish(&self, objects: &[PathBuf], binary: &Path) -> CommandLine {
        if self.config.is_library() {
            self.archive(objects, binary)
        } else {
            self.link(objects, binary)
        }
    }
}

/// `<root>/obj/<config stem>/<relative>` with the object extension. Only the
/// plain name components of `relative` are used, so the result always stays
/// under the object root.
pub fn object_path(root: &Path, config_stem: &str, relative: &Path, object_ext: &str) -> PathBuf {
    let mut path = root.join("obj").join(config_stem);
    path.extend(relative.components().filter(|c| matches!(c, Component::Normal(_))));
    path.with_extension(object_ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use crate::dsl::{self, EvalContext};
    use crate::pkg_config::{FlagResolver, LibraryFlags, LinkOnly};

    fn config_with(text: &str, resolver: &dyn FlagResolver) -> Config {
        let ctx = EvalContext::fixed("linux", Vec::<String>::new());
        Config::from_map(dsl::load_str(text, &ctx).unwrap(), Platform::linux(), resolver).unwrap()
    }

    fn config(text: &str) -> Config {
        config_with(text, &LinkOnly)
    }

    struct WithCflags;

    impl FlagResolver for WithCflags {
        fn resolve(&self, name: &str) -> LibraryFlags {
            LibraryFlags {
                cflags: vec![format!("-I/usr/include/{}", name)],
                lib_flags: vec![format!("-l{}", name)],
            }
        }
    }

    #[test]
    fn test_compile_command_layout() {
        let cfg = config_with(
            "include = \"include\"\ncflags = \"-O2\"\ndefine = \"VERSION=2\"\nlib = \"sdl2\"",
            &WithCflags,
        );
        let root = Path::new("/p");
        let cmd = CommandBuilder::new(&cfg, root, true)
            .compile(Path::new("/p/src/main.cpp"), Path::new("/p/obj/default/src/main.o"));
        assert_eq!(cmd.program, "g++");
        assert_eq!(
            cmd.args,
            vec![
                "-g",
                "-Wfatal-errors",
                "-Wall",
                "-fdiagnostics-color=always",
                "-std=c++20",
                "-o",
                "/p/obj/default/src/main.o",
                "-c",
                "/p/src/main.cpp",
                "-I/p/include",
                "-O2",
                "-I/usr/include/sdl2",
                "-D",
                "VERSION=2",
            ]
        );
    }

    #[test]
    fn test_c_sources_use_gcc_without_std() {
        let cfg = config("");
        let cmd = CommandBuilder::new(&cfg, Path::new("/p"), false)
            .compile(Path::new("/p/src/a.c"), Path::new("/p/obj/a.o"));
        assert_eq!(cmd.program, "gcc");
        assert!(!cmd.args.iter().any(|a| a.starts_with("-std=")));
        assert!(!cmd.args.contains(&"-g".to_string()));

        let cfg = config("compiler = \"clang\"\nstd = \"c17\"");
        let cmd = CommandBuilder::new(&cfg, Path::new("/p"), false)
            .compile(Path::new("/p/src/a.c"), Path::new("/p/obj/a.o"));
        assert_eq!(cmd.program, "clang");
        assert!(cmd.args.contains(&"-std=c17".to_string()));
    }

    #[test]
    fn test_link_command_layout() {
        let cfg = config("libpaths = \"vendor/lib\"\nlib = \"m\"\nlink_etc = \"-static -s\"");
        let objects = vec![PathBuf::from("/p/obj/a.o"), PathBuf::from("/p/obj/b.o")];
        let cmd = CommandBuilder::new(&cfg, Path::new("/p"), false)
            .finish(&objects, Path::new("/p/bin/app"));
        assert_eq!(cmd.program, "g++");
        assert_eq!(
            cmd.args,
            vec![
                "-Wfatal-errors",
                "-Wall",
                "-Wextra",
                "-fdiagnostics-color=always",
                "-std=c++20",
                "-o",
                "/p/bin/app",
                "/p/obj/a.o",
                "/p/obj/b.o",
                "-L/p/vendor/lib",
                "-lm",
                "-static",
                "-s",
            ]
        );
    }

    #[test]
    fn test_library_output_archives() {
        let cfg = config("output = \"library\"");
        let objects = vec![PathBuf::from("obj/a.o")];
        let cmd = CommandBuilder::new(&cfg, Path::new("."), false)
            .finish(&objects, Path::new("bin/libapp.a"));
        assert_eq!(cmd.to_shell(), "ar rcs bin/libapp.a obj/a.o");
    }

    #[test]
    fn test_object_path_mirrors_tree() {
        assert_eq!(
            object_path(Path::new("/p"), "default", Path::new("src/net/io.cpp"), "o"),
            PathBuf::from("/p/obj/default/src/net/io.o")
        );
    }

    #[test]
    fn test_object_path_stays_under_object_root() {
        let object = object_path(Path::new("/p"), "release", Path::new("/tmp/other/x.c"), "o");
        assert_eq!(object, PathBuf::from("/p/obj/release/tmp/other/x.o"));

        let object = object_path(Path::new("/p"), "release", Path::new("../shared/y.c"), "o");
        assert_eq!(object, PathBuf::from("/p/obj/release/shared/y.o"));
    }
}
