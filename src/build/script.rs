use super::executor::shell_quote;
use super::project::Project;
use std::fs;
use std::io;
use std::path::Path;

fn quoted(path: &Path) -> String {
    shell_quote(&path.display().to_string())
}

/// A POSIX shell script that rebuilds the project from scratch without
/// this tool.
pub fn render(project: &Project, debug: bool) -> String {
    let commands = project.commands(debug);
    let mut out = String::from("#!/bin/sh\nset -e\n\n");
    let mut objects = Vec::new();

    for file in project.registry.sources() {
        let object = project.object_for(file);
        out.push_str(&format!("echo {}\n", quoted(&file.relative)));
        if let Some(dir) = object.parent() {
            out.push_str(&format!("mkdir -p {}\n", quoted(dir)));
        }
        out.push_str(&format!("{}\n\n", commands.compile(&file.path, &object)));
        objects.push(object);
    }

    if !objects.is_empty() {
        let binary = project.binary();
        out.push_str(&format!("echo {}\n", quoted(&binary)));
        if let Some(dir) = binary.parent() {
            out.push_str(&format!("mkdir -p {}\n", quoted(dir)));
        }
        if project.config.is_library() {
            out.push_str(&format!("rm -f {}\n", quoted(&binary)));
        }
        out.push_str(&format!("{}\n", commands.finish(&objects, &binary)));
    }
    out
}

pub fn write_script(project: &Project, output: &Path, debug: bool) -> io::Result<()> {
    fs::write(output, render(project, debug))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(output, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
