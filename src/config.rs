//! Typed project configuration.
//!
//! A `.lzb` file is evaluated into a [`ConfigMap`] and then projected into a
//! [`Config`] by well-known key names:
//!
//! | Key          | Meaning                                  | Default         |
//! |--------------|------------------------------------------|-----------------|
//! | `name`       | artifact name                            | `app`           |
//! | `compiler`   | compiler driver                          | `g++`           |
//! | `std`        | language standard                        | `c++20`         |
//! | `output`     | `binary` or `library`                    | `binary`        |
//! | `is_library` | `true` forces library output             |                 |
//! | `source`     | source roots                             | `src`           |
//! | `include`    | include search paths                     |                 |
//! | `exclude`    | paths pruned from source scanning        |                 |
//! | `lib`        | libraries, resolved to compile/link flags|                 |
//! | `libpaths`   | library search paths                     |                 |
//! | `link_etc`   | raw extra linker arguments               |                 |
//! | `cflags`     | extra compiler flags                     |                 |
//! | `define`     | preprocessor macros                      |                 |
//! | `threads`    | parallel compile budget                  | available cores |

use crate::dsl::{self, ConfigMap, EvalContext};
use crate::error::ConfigError;
use crate::pkg_config::{FlagResolver, LibraryFlags};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "default.lzb";
pub const DEFAULT_SOURCE_ROOT: &str = "src";

/// Naming conventions of the machine the artifacts are built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Identity token tested by `if <name>` blocks.
    pub name: String,
    pub object_ext: String,
    pub static_lib_prefix: String,
    pub static_lib_ext: String,
    pub exe_suffix: String,
}

impl Platform {
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Self::windows()
        } else if cfg!(target_os = "macos") {
            Self::unix_like("macos")
        } else if cfg!(target_os = "linux") {
            Self::linux()
        } else if cfg!(target_os = "freebsd") {
            Self::unix_like("freebsd")
        } else {
            Self::unix_like("unknown")
        }
    }

    pub fn linux() -> Self {
        Self::unix_like("linux")
    }

    pub fn windows() -> Self {
        Self {
            name: "windows".into(),
            object_ext: "o".into(),
            static_lib_prefix: "lib".into(),
            static_lib_ext: "a".into(),
            exe_suffix: ".exe".into(),
        }
    }

    fn unix_like(name: &str) -> Self {
        Self {
            name: name.into(),
            object_ext: "o".into(),
            static_lib_prefix: "lib".into(),
            static_lib_ext: "a".into(),
            exe_suffix: String::new(),
        }
    }

    /// File name of a static library called `name`.
    pub fn static_lib_name(&self, name: &str) -> String {
        format!("{}{}.{}", self.static_lib_prefix, name, self.static_lib_ext)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    #[default]
    Binary,
    StaticLibrary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub flags: LibraryFlags,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub compiler: String,
    pub standard: String,
    pub include_folders: Vec<PathBuf>,
    pub libraries: Vec<Library>,
    pub library_paths: Vec<PathBuf>,
    pub source_folders: Vec<PathBuf>,
    pub exclude: Vec<PathBuf>,
    pub link_etc: Vec<String>,
    pub cflags: Vec<String>,
    pub macros: Vec<String>,
    pub threads: usize,
    pub output: OutputKind,
    pub platform: Platform,
    /// Everything the config file assigned, recognized or not.
    pub raw: ConfigMap,
}

impl Config {
    /// Read, parse and evaluate a config file.
    pub fn load(
        path: &Path,
        ctx: &EvalContext,
        platform: Platform,
        resolver: &dyn FlagResolver,
    ) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let map = dsl::load_str(&text, ctx).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), keys = map.len(), "loaded config");
        Self::from_map(map, platform, resolver)
    }

    pub fn from_map(
        map: ConfigMap,
        platform: Platform,
        resolver: &dyn FlagResolver,
    ) -> Result<Self, ConfigError> {
        let paths = |key: &str| -> Vec<PathBuf> {
            map.values(key).into_iter().map(PathBuf::from).collect()
        };
        let words = |key: &str| -> Vec<String> {
            map.values(key)
                .into_iter()
                .flat_map(str::split_whitespace)
                .map(str::to_string)
                .collect()
        };

        let threads = match map.last("threads") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "threads".into(),
                        value: raw.into(),
                    });
                }
            },
            None => default_threads(),
        };

        let mut output = match map.last("output") {
            None | Some("binary") | Some("bin") | Some("executable") => OutputKind::Binary,
            Some("library") | Some("lib") | Some("static") => OutputKind::StaticLibrary,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "output".into(),
                    value: other.into(),
                });
            }
        };
        if map
            .last("is_library")
            .is_some_and(|v| matches!(v, "true" | "1" | "yes"))
        {
            output = OutputKind::StaticLibrary;
        }

        let mut source_folders = paths("source");
        if source_folders.is_empty() {
            source_folders.push(PathBuf::from(DEFAULT_SOURCE_ROOT));
        }

        let libraries = map
            .values("lib")
            .into_iter()
            .map(|name| Library {
                name: name.to_string(),
                flags: resolver.resolve(name),
            })
            .collect();

        for key in map.keys().filter(|k| !KNOWN_KEYS.contains(k)) {
            warn!(key, "unused config key");
        }

        Ok(Self {
            name: map.last("name").unwrap_or("app").to_string(),
            compiler: map.last("compiler").unwrap_or("g++").to_string(),
            standard: map.last("std").unwrap_or("c++20").to_string(),
            include_folders: paths("include"),
            libraries,
            library_paths: paths("libpaths"),
            source_folders,
            exclude: paths("exclude"),
            link_etc: words("link_etc"),
            cflags: words("cflags"),
            macros: map.values("define").into_iter().map(str::to_string).collect(),
            threads,
            output,
            platform,
            raw: map,
        })
    }

    pub fn is_library(&self) -> bool {
        self.output == OutputKind::StaticLibrary
    }

    /// Artifact location relative to the project root.
    pub fn binary_path(&self) -> PathBuf {
        let file = match self.output {
            OutputKind::Binary => format!("{}{}", self.name, self.platform.exe_suffix),
            OutputKind::StaticLibrary => self.platform.static_lib_name(&self.name),
        };
        Path::new("bin").join(file)
    }

    /// Whether `path` lies at or under any `exclude` entry, after joining
    /// relative entries onto `root`.
    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        self.exclude
            .iter()
            .any(|excluded| path.starts_with(resolve(root, excluded)))
    }
}

const KNOWN_KEYS: &[&str] = &[
    "name",
    "compiler",
    "std",
    "include",
    "lib",
    "libpaths",
    "source",
    "exclude",
    "link_etc",
    "output",
    "cflags",
    "is_library",
    "define",
    "threads",
];

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Join `target` onto `root` unless it is already absolute.
pub fn resolve(root: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        root.join(target)
    }
}
