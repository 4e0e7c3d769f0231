//! Report file location under a root directory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Find files under `root` whose file name matches the glob `pattern`.
///
/// Results are sorted by path so every call on the same tree yields the
/// same order. A missing root, an invalid pattern, or unreadable entries
/// produce fewer (or no) matches rather than an error: absence of a report
/// is routine.
pub fn find(root: &Path, pattern: &str, recursive: bool) -> Vec<PathBuf> {
    let glob = match glob::Pattern::new(pattern) {
        Ok(glob) => glob,
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid report filename pattern");
            return Vec::new();
        }
    };

    // Symlinked reports are followed; walkdir reports link loops as errors.
    let walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut found: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| glob.matches(name))
        })
        .map(|entry| entry.into_path())
        .collect();

    found.sort();
    tracing::debug!(root = %root.display(), pattern, count = found.len(), "Located report files");
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn matches_file_names_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("DirBuster-Report-host.txt"));
        touch(&dir.path().join("other.txt"));

        let found = find(dir.path(), "DirBuster-Report*", false);
        assert_eq!(found, vec![dir.path().join("DirBuster-Report-host.txt")]);
    }

    #[test]
    fn recursion_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.xml"));
        touch(&dir.path().join("nested/a.xml"));

        assert_eq!(find(dir.path(), "*.xml", false).len(), 1);
        let all = find(dir.path(), "*.xml", true);
        assert_eq!(all, vec![dir.path().join("b.xml"), dir.path().join("nested/a.xml")]);
    }

    #[test]
    fn directories_never_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("report.xml")).unwrap();
        assert!(find(dir.path(), "*.xml", true).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_reports_are_found() {
        let store = tempfile::tempdir().unwrap();
        touch(&store.path().join("scan.xml"));
        touch(&store.path().join("runs/nested.xml"));

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(store.path().join("scan.xml"), dir.path().join("linked.xml"))
            .unwrap();
        std::os::unix::fs::symlink(store.path().join("runs"), dir.path().join("runs")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        assert_eq!(
            find(dir.path(), "*.xml", true),
            vec![dir.path().join("linked.xml"), dir.path().join("runs/nested.xml")]
        );
        assert_eq!(find(dir.path(), "*.xml", false), vec![dir.path().join("linked.xml")]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.xml"), dir.path().join("report.xml"))
            .unwrap();
        assert!(find(dir.path(), "*.xml", true).is_empty());
    }

    #[test]
    fn missing_root_finds_nothing() {
        assert!(find(Path::new("/nonexistent/reports"), "*.xml", true).is_empty());
    }

    #[test]
    fn invalid_pattern_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.xml"));
        assert!(find(dir.path(), "[", true).is_empty());
    }
}
