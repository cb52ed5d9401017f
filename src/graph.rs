//! Header include graph and transitive staleness queries.
//!
//! Every node is a canonical path (symlinks and `..` resolved), so two
//! spellings of the same file share one entry. Nodes are scanned once and
//! never removed.
//!
//! ```text
//! /proj/src/main.cpp
//! ├── /proj/src/app.hpp
//! │   └── /proj/include/util.hpp
//! └── /proj/include/util.hpp (seen)
//! ```

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;
use tracing::{debug, trace};

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#include *(?:"([^"]+)"|<([^>]+)>)"#).expect("include pattern is valid")
});

/// The target of an `#include` directive on `line`, if it has one.
pub fn parse_include(line: &str) -> Option<&str> {
    let caps = INCLUDE.captures(line)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<PathBuf, Vec<PathBuf>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `file` and, depth-first, everything it includes.
    ///
    /// A relative `file` that does not exist is looked up in
    /// `include_folders`. Files already in the graph are not rescanned.
    pub fn add(&mut self, file: &Path, include_folders: &[PathBuf]) {
        let located = if file.exists() {
            Some(file.to_path_buf())
        } else {
            include_folders
                .iter()
                .map(|folder| folder.join(file))
                .find(|candidate| candidate.exists())
        };
        let Some(start) = located.and_then(|p| fs::canonicalize(p).ok()) else {
            trace!(file = %file.display(), "not found, not added");
            return;
        };

        let mut pending = vec![start];
        while let Some(path) = pending.pop() {
            if self.nodes.contains_key(&path) {
                continue;
            }
            let deps = scan_includes(&path, include_folders);
            debug!(file = %path.display(), includes = deps.len(), "scanned");
            // Reverse so the first include is visited first.
            pending.extend(deps.iter().rev().cloned());
            self.nodes.insert(path, deps);
        }
    }

    /// Whether `file`, or anything it transitively includes, was modified
    /// after `reference`.
    ///
    /// Paths outside the graph, such as system headers, are never stale.
    pub fn need_rebuild(&self, file: &Path, reference: SystemTime) -> bool {
        let start = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
        let mut visited: HashSet<&Path> = HashSet::new();
        let mut pending: Vec<&Path> = Vec::new();

        let Some((root, _)) = self.nodes.get_key_value(&start) else {
            return false;
        };
        pending.push(root);

        while let Some(path) = pending.pop() {
            if !visited.insert(path) {
                continue;
            }
            let Some(deps) = self.nodes.get(path) else {
                continue;
            };
            if modified_after(path, reference) {
                debug!(file = %path.display(), "newer than object");
                return true;
            }
            pending.extend(deps.iter().rev().map(PathBuf::as_path));
        }
        false
    }

    /// Direct includes of `file`, if it has been scanned.
    pub fn dependencies(&self, file: &Path) -> Option<&[PathBuf]> {
        let key = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
        self.nodes.get(&key).map(Vec::as_slice)
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.dependencies(file).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render the include tree under `root`. A node already printed is shown
    /// again with `(seen)` and not expanded.
    pub fn render_tree(&self, root: &Path) -> String {
        let start = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let mut out = format!("{}\n", start.display());
        let mut seen = HashSet::new();
        seen.insert(start.clone());
        self.render_children(&start, "", &mut seen, &mut out);
        out
    }

    fn render_children(
        &self,
        node: &Path,
        prefix: &str,
        seen: &mut HashSet<PathBuf>,
        out: &mut String,
    ) {
        let Some(deps) = self.nodes.get(node) else {
            return;
        };
        for (i, dep) in deps.iter().enumerate() {
            let last = i + 1 == deps.len();
            let connector = if last { "└── " } else { "├── " };
            let fresh = seen.insert(dep.clone());
            let marker = if fresh { "" } else { " (seen)" };
            out.push_str(&format!("{prefix}{connector}{}{marker}\n", dep.display()));
            if fresh {
                let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
                self.render_children(dep, &child_prefix, seen, out);
            }
        }
    }
}

fn scan_includes(path: &Path, include_folders: &[PathBuf]) -> Vec<PathBuf> {
    let Ok(text) = fs::read_to_string(path) else {
        debug!(file = %path.display(), "unreadable, treated as having no includes");
        return Vec::new();
    };
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    text.lines()
        .filter_map(parse_include)
        .filter_map(|name| resolve_include(dir, name, include_folders))
        .collect()
}

fn resolve_include(dir: &Path, name: &str, include_folders: &[PathBuf]) -> Option<PathBuf> {
    let local = dir.join(name);
    let found = if local.exists() {
        Some(local)
    } else {
        include_folders
            .iter()
            .map(|folder| folder.join(name))
            .find(|candidate| candidate.exists())
    };
    let resolved = found.and_then(|p| fs::canonicalize(p).ok());
    if resolved.is_none() {
        trace!(include = name, "unresolved, assumed to be a system header");
    }
    resolved
}

fn modified_after(path: &Path, reference: SystemTime) -> bool {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified > reference,
        // A file we cannot stat any more is treated as changed.
        Err(_) => true,
    }
}
