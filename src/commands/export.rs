//! `lzb export`: install headers and the built artifact under a prefix.
//!
//! ```text
//! <dir>/include/<name>/...   headers, relative to their source root
//! <dir>/bin/<binary>         executables
//! <dir>/lib/lib<name>.a      static libraries
//! ```

use crate::build::Project;
use crate::config::resolve;
use crate::error::BuildError;
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub copied: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: usize,
}

/// Copy everything `project` exports into `target`. Individual copy
/// failures are printed and counted; they do not stop the export.
pub fn run(project: &Project, target: &Path) -> ExportReport {
    let mut report = ExportReport::default();
    let include_root = target.join("include").join(&project.config.name);

    for header in project.registry.headers() {
        let relative = source_relative(project, &header.path);
        let dest = include_root.join(relative);
        record(&mut report, &header.path, &dest);
    }

    let binary = project.binary();
    if binary.exists() {
        let dir = if project.config.is_library() { "lib" } else { "bin" };
        if let Some(name) = binary.file_name() {
            let dest = target.join(dir).join(name);
            record(&mut report, &binary, &dest);
        }
    } else {
        println!(
            "{} {} has not been built, only headers exported",
            "!".yellow(),
            binary.display()
        );
    }
    report
}

fn source_relative<'p>(project: &Project, path: &'p Path) -> &'p Path {
    project
        .config
        .source_folders
        .iter()
        .find_map(|folder| path.strip_prefix(resolve(&project.root, folder)).ok())
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path)
}

fn record(report: &mut ExportReport, source: &Path, dest: &Path) {
    match copy_if_newer(source, dest) {
        Ok(true) => {
            println!(
                "{} Exported {} to {}",
                "✓".green(),
                source.display(),
                dest.display()
            );
            report.copied.push(dest.to_path_buf());
        }
        Ok(false) => {
            debug!(dest = %dest.display(), "destination is newer, skipped");
            report.skipped += 1;
        }
        Err(e) => {
            println!("{} Could not export: {}", "x".red(), e);
            report.failed += 1;
        }
    }
}

/// Copy unless `dest` was modified after `source`. Returns whether a copy
/// happened.
fn copy_if_newer(source: &Path, dest: &Path) -> Result<bool, BuildError> {
    let modified = |path: &Path| {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| BuildError::fs(path, e))
    };
    if dest.exists() {
        if modified(dest)? > modified(source)? {
            return Ok(false);
        }
        fs::remove_file(dest).map_err(|e| BuildError::fs(dest, e))?;
    }
    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir).map_err(|e| BuildError::fs(dir, e))?;
    }
    fs::copy(source, dest).map_err(|e| BuildError::fs(dest, e))?;
    Ok(true)
}
