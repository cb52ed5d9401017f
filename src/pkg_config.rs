//! Turning library names into compiler and linker flags.

use crate::build::executor::{CommandExecutor, CommandLine};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFlags {
    pub cflags: Vec<String>,
    pub lib_flags: Vec<String>,
}

impl LibraryFlags {
    pub fn link_only(name: &str) -> Self {
        Self {
            cflags: Vec::new(),
            lib_flags: vec![format!("-l{}", name)],
        }
    }
}

pub trait FlagResolver {
    fn resolve(&self, name: &str) -> LibraryFlags;
}

/// Plain `-l<name>` for every library.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkOnly;

impl FlagResolver for LinkOnly {
    fn resolve(&self, name: &str) -> LibraryFlags {
        LibraryFlags::link_only(name)
    }
}

/// Asks `pkg-config`, trying `<name>` then `lib<name>`, and falls back to
/// `-l<name>` when neither package is known.
pub struct PkgConfig<'e> {
    executor: &'e dyn CommandExecutor,
}

impl<'e> PkgConfig<'e> {
    pub fn new(executor: &'e dyn CommandExecutor) -> Self {
        Self { executor }
    }

    fn query(&self, flag_kind: &str, package: &str) -> Option<Vec<String>> {
        let mut cmd = CommandLine::new("pkg-config");
        cmd.args([flag_kind, package]);
        let out = self.executor.run(&cmd);
        out.success.then(|| {
            out.output
                .split_whitespace()
                .map(ToOwned::to_owned)
                .collect()
        })
    }
}

impl FlagResolver for PkgConfig<'_> {
    fn resolve(&self, name: &str) -> LibraryFlags {
        let prefixed = format!("lib{}", name);
        let found = [name, prefixed.as_str()]
            .into_iter()
            .find_map(|package| self.query("--cflags", package).map(|c| (package, c)));

        let Some((package, cflags)) = found else {
            debug!(library = name, "not known to pkg-config, linking by name");
            return LibraryFlags::link_only(name);
        };
        let lib_flags = self.query("--libs", package).unwrap_or_default();
        debug!(library = name, package, ?cflags, ?lib_flags, "resolved via pkg-config");
        LibraryFlags { cflags, lib_flags }
    }
}
