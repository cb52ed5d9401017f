use crate::config::{Config, resolve};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx"];
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx"];

/// Top-level directory for files that live outside the project root.
pub const EXTERNAL_DIR: &str = "_ext";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    Header,
}

impl FileKind {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if SOURCE_EXTENSIONS.contains(&ext) {
            Some(FileKind::Source)
        } else if HEADER_EXTENSIONS.contains(&ext) {
            Some(FileKind::Header)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: PathBuf,
    /// Location relative to the project root, used to mirror the tree
    /// under the object directory. Never absolute and never contains `..`.
    pub relative: PathBuf,
    pub kind: FileKind,
}

/// Every source and header under the configured source roots.
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: Vec<ProjectFile>,
}

impl FileRegistry {
    /// Walk the source roots of `config`. Excluded directories are not
    /// descended into. Missing roots are skipped.
    pub fn scan(root: &Path, config: &Config) -> Self {
        let mut files = Vec::new();
        for folder in &config.source_folders {
            let start = resolve(root, folder);
            if !start.exists() {
                debug!(root = %start.display(), "source root does not exist");
                continue;
            }
            let walker = WalkDir::new(&start)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    let keep = !config.is_excluded(root, entry.path());
                    if !keep {
                        trace!(path = %entry.path().display(), "excluded");
                    }
                    keep
                });
            for entry in walker.filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.into_path();
                let Some(kind) = FileKind::of(&path) else {
                    continue;
                };
                let relative = project_relative(root, &path);
                files.push(ProjectFile {
                    path,
                    relative,
                    kind,
                });
            }
        }
        debug!(files = files.len(), "registry scanned");
        Self { files }
    }

    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    pub fn sources(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.iter().filter(|f| f.kind == FileKind::Source)
    }

    pub fn headers(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.iter().filter(|f| f.kind == FileKind::Header)
    }

    /// No translation units at all.
    pub fn is_header_only(&self) -> bool {
        self.sources().next().is_none()
    }
}

/// Where `path` sits below `root`. A file outside the root, including one
/// reached through `..`, maps to `_ext/` followed by its own components.
pub fn project_relative(root: &Path, path: &Path) -> PathBuf {
    let path = normalize(path);
    if let Ok(rel) = path.strip_prefix(normalize(root))
        && rel.components().all(|c| matches!(c, Component::Normal(_)))
    {
        return rel.to_path_buf();
    }
    let mut external = PathBuf::from(EXTERNAL_DIR);
    external.extend(path.components().filter(|c| matches!(c, Component::Normal(_))));
    external
}

/// Folds `.` and `name/..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
