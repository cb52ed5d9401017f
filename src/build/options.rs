use crate::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

/// Per-invocation switches for a build pass.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// List the file registry before building.
    pub verbose: bool,
    /// Report staleness decisions and stop before compiling.
    pub dependencies_only: bool,
    pub full_rebuild: bool,
    pub force_linking: bool,
    /// Compile and link with `-g`.
    pub debug: bool,
    pub echo_commands: bool,
    pub show_warnings: bool,
    pub print_dependencies: bool,
    /// Config file, relative to `root` unless absolute.
    pub config: PathBuf,
    pub root: PathBuf,
    pub export_dir: Option<PathBuf>,
    /// Prefix of previously exported headers. Its `include/` directory is
    /// searched after the configured include folders.
    pub export_prefix: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            dependencies_only: false,
            full_rebuild: false,
            force_linking: false,
            debug: false,
            echo_commands: false,
            show_warnings: false,
            print_dependencies: false,
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            root: PathBuf::from("."),
            export_dir: None,
            export_prefix: None,
        }
    }
}

impl BuildOptions {
    pub fn in_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Absolute or root-relative location of the config file.
    pub fn config_path(&self) -> PathBuf {
        crate::config::resolve(&self.root, &self.config)
    }
}
