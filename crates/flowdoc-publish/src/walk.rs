use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Collect all files under `base` as (`/`-separated relative path, absolute path),
/// sorted by relative path.
pub(crate) fn collect_files(base: &Path) -> Result<Vec<(String, PathBuf)>, io::Error> {
    let mut files = Vec::new();
    walk_dir(base, base, &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn walk_dir(base: &Path, current: &Path, files: &mut Vec<(String, PathBuf)>) -> Result<(), io::Error> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        // Directory symlinks are not followed, so cycles cannot recurse.
        if entry.file_type()?.is_dir() {
            walk_dir(base, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            let relative = relative.to_string_lossy().replace('\\', "/");
            files.push((relative, path));
        }
    }
    Ok(())
}

/// `/`-separated path of `path` relative to `base`.
pub(crate) fn relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
