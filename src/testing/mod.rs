//! Shared testing utilities for stackmerge tests
//!
//! Helpers to lay out stack/config fixture trees on disk and to inspect the
//! merged output, used by unit tests and the integration tests alike.

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Create files (and their parent directories) under `root`.
///
/// Each entry is a `/`-separated relative path and the file content.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("cannot create {}: {}", parent.display(), e));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("cannot write {}: {}", path.display(), e));
    }
}

/// Sorted, `/`-separated relative paths of every regular file under `root`,
/// the equivalent of `find root -type f -printf '%P\n' | sort`.
pub fn list_files(root: &Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }

    let mut files: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path().strip_prefix(root).ok().map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
        })
        .collect();
    files.sort();
    files
}

/// Read every file under `root` into `(relative path, bytes)` pairs, sorted.
pub fn snapshot_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    list_files(root)
        .into_iter()
        .map(|rel| {
            let bytes = fs::read(root.join(&rel))
                .unwrap_or_else(|e| panic!("cannot read {}: {}", rel, e));
            (rel, bytes)
        })
        .collect()
}
