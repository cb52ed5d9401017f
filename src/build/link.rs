use crate::config::{Config, resolve};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Static libraries from the configured search paths that the artifact
/// depends on and that exist on disk.
pub fn library_files(config: &Config, root: &Path) -> Vec<PathBuf> {
    config
        .library_paths
        .iter()
        .flat_map(|dir| {
            config.libraries.iter().map(move |lib| {
                resolve(root, dir).join(config.platform.static_lib_name(&lib.name))
            })
        })
        .filter(|path| path.exists())
        .collect()
}

/// Whether the final link or archive step has to run.
pub fn link_required(
    binary: &Path,
    latest_object: Option<SystemTime>,
    libraries: &[PathBuf],
    force: bool,
) -> bool {
    if force {
        debug!("link forced");
        return true;
    }
    let Some(built) = modified(binary) else {
        debug!(binary = %binary.display(), "artifact missing");
        return true;
    };
    if latest_object.is_some_and(|object| object > built) {
        debug!("objects newer than artifact");
        return true;
    }
    if let Some(lib) = libraries
        .iter()
        .find(|lib| modified(lib).is_some_and(|t| t > built))
    {
        debug!(library = %lib.display(), "library newer than artifact");
        return true;
    }
    false
}
