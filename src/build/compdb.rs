//! `compile_commands.json` for editor tooling.

use super::executor::CommandLine;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

#[derive(Debug, Serialize)]
pub struct CompileCommand {
    pub directory: String,
    pub command: String,
    pub file: String,
}

impl CompileCommand {
    pub fn new(root: &Path, source: &Path, command: &CommandLine) -> Self {
        Self {
            directory: root.display().to_string(),
            command: command.to_shell(),
            file: source.display().to_string(),
        }
    }
}

/// Write `entries` to `<root>/compile_commands.json`, returning the path.
pub fn write(root: &Path, entries: &[CompileCommand]) -> std::io::Result<PathBuf> {
    let path = root.join(COMPILE_COMMANDS_FILE);
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(&path, json)?;
    Ok(path)
}
