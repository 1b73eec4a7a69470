use archive_core::ArchiveConfig;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Export files directly inside `dir`, sorted by file name. Subfolders are not searched.
/// An unreadable folder is reported and treated as empty.
pub fn discover_exports(dir: &Path, config: &ArchiveConfig) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && config.is_export_file(path))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovers_only_top_level_exports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.js"), "x = [];").unwrap();
        std::fs::write(dir.path().join("a.JS"), "x = [];").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "hi").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.js"), "x = [];").unwrap();
        std::fs::create_dir(dir.path().join("folder.js")).unwrap();

        let files = discover_exports(dir.path(), &ArchiveConfig::default());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JS", "b.js"]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover_exports(&dir.path().join("nope"), &ArchiveConfig::default());
        assert!(files.is_empty());
    }
}
