/*!
 * Path planning: classify the configured roots
 */

use std::path::PathBuf;

use tracing::debug;

use crate::config::RootEntry;

/// What a configured root turned out to be on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Directory,
    File,
}

/// A classified root, immutable for the rest of the run
#[derive(Debug, Clone)]
pub struct RootSpec {
    pub path: PathBuf,
    pub backup_enabled: bool,
    pub kind: RootKind,
    /// Position in the configured order; keys the per-root deleted counter
    pub index: usize,
}

/// Probe and classify each configured root, preserving input order.
///
/// A failed probe keeps the entry as a directory root; the walker logs and
/// skips it when the root is still unreachable at walk time. No dedup and
/// no sorting: with a `max_files` cap, the operator's ordering decides
/// which roots get swept first.
pub fn plan_roots(entries: &[RootEntry]) -> Vec<RootSpec> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let kind = match std::fs::metadata(&entry.path) {
                Ok(meta) if meta.is_file() => RootKind::File,
                Ok(_) => RootKind::Directory,
                Err(e) => {
                    debug!(
                        path = %entry.path.display(),
                        error = %e,
                        "root probe failed; treating as directory"
                    );
                    RootKind::Directory
                }
            };
            RootSpec {
                path: entry.path.clone(),
                backup_enabled: entry.backup,
                kind,
                index,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_classifies_directories_and_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("report.txt");
        std::fs::write(&file, b"data").unwrap();

        let entries = vec![
            RootEntry {
                path: dir.path().to_path_buf(),
                backup: true,
            },
            RootEntry {
                path: file.clone(),
                backup: false,
            },
        ];

        let roots = plan_roots(&entries);

        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].kind, RootKind::Directory);
        assert!(roots[0].backup_enabled);
        assert_eq!(roots[1].kind, RootKind::File);
        assert_eq!(roots[1].path, file);
        assert_eq!(roots[1].index, 1);
    }

    #[test]
    fn test_missing_root_defaults_to_directory() {
        let dir = tempdir().unwrap();
        let entries = vec![RootEntry {
            path: dir.path().join("gone"),
            backup: false,
        }];

        let roots = plan_roots(&entries);

        assert_eq!(roots[0].kind, RootKind::Directory);
    }

    #[test]
    fn test_preserves_input_order() {
        let dir = tempdir().unwrap();
        let entries: Vec<RootEntry> = ["b", "a", "c"]
            .iter()
            .map(|name| RootEntry {
                path: dir.path().join(name),
                backup: false,
            })
            .collect();

        let roots = plan_roots(&entries);

        for (i, root) in roots.iter().enumerate() {
            assert_eq!(root.index, i);
            assert_eq!(root.path, entries[i].path);
        }
    }
}
