/*!
 * Bottom-up removal of emptied directories
 */

use std::path::Path;

use tracing::debug;

/// Remove now-empty directories from `start` upward.
///
/// Stops at the first non-empty directory, on any removal failure, or on
/// reaching `root`. The root itself is never removed, nor any ancestor;
/// the boundary comparison is case-insensitive over normalized absolute
/// paths.
pub fn reclaim_empty_dirs(start: &Path, root: &Path) {
    let mut current = Some(start);
    while let Some(dir) = current {
        if same_path_ci(dir, root) {
            break;
        }
        if !is_empty_dir(dir) {
            break;
        }
        if std::fs::remove_dir(dir).is_err() {
            break;
        }
        debug!(path = %dir.display(), "reclaimed empty directory");
        current = dir.parent();
    }
}

/// Unreadable counts as non-empty: the upward walk stops rather than guess.
fn is_empty_dir(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => false,
    }
}

/// Case-insensitive equality over component-normalized paths, so a trailing
/// separator or case difference in the configured root cannot defeat the
/// boundary.
fn same_path_ci(a: &Path, b: &Path) -> bool {
    normalized_ci(a) == normalized_ci(b)
}

fn normalized_ci(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_removes_empty_chain_up_to_the_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("src");
        let deep = root.join("sub").join("deep");
        std::fs::create_dir_all(&deep).unwrap();

        reclaim_empty_dirs(&deep, &root);

        assert!(!deep.exists());
        assert!(!root.join("sub").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_stops_at_the_first_non_empty_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("src");
        let deep = root.join("sub").join("deep");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(root.join("sub").join("keep.txt"), b"x").unwrap();

        reclaim_empty_dirs(&deep, &root);

        assert!(!deep.exists());
        assert!(root.join("sub").exists());
        assert!(root.join("sub").join("keep.txt").exists());
    }

    #[test]
    fn test_never_removes_the_root_itself() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("src");
        std::fs::create_dir_all(&root).unwrap();

        reclaim_empty_dirs(&root, &root);

        assert!(root.exists());
    }

    #[test]
    fn test_root_boundary_ignores_case_and_trailing_separators() {
        let a = PathBuf::from("/SRV/Scratch");
        let b = PathBuf::from("/srv/scratch/");
        assert!(same_path_ci(&a, &b));

        let c = PathBuf::from("/srv/other");
        assert!(!same_path_ci(&a, &c));
    }
}
