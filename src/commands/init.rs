//! `lzb init`: lay out a new project in an existing directory.

use crate::config::DEFAULT_CONFIG_FILE;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

const TEMPLATE: &str = r#"# Project configuration. Repeated keys add values; scalar keys keep the last one.
name = "app"
compiler = "g++"
std = "c++20"
source = "src"
# include = "include"
# lib = "pthread"
# libpaths = "vendor/lib"
# cflags = "-O2"
# define = "NDEBUG"
# output = "library"

if windows {
    # link_etc = "-static"
}
"#;

/// Create `src/`, `bin/`, `obj/` and a starter config under `root`. Existing
/// files are left alone.
pub fn run(root: &Path) -> Result<()> {
    for dir in ["src", "bin", "obj"] {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }

    let config = root.join(DEFAULT_CONFIG_FILE);
    if config.exists() {
        println!(
            "{} {} already exists, leaving it untouched.",
            "!".yellow(),
            DEFAULT_CONFIG_FILE
        );
    } else {
        fs::write(&config, TEMPLATE)
            .with_context(|| format!("Failed to write {}", config.display()))?;
    }

    println!(
        "{} Initialized project in {}. Run {} to build.",
        "✓".green(),
        root.display(),
        "lzb build".bold().white()
    );
    Ok(())
}
