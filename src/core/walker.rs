/*!
 * Bounded-concurrency discovery of aged files
 */

use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::error::BroomError;

use super::concurrency::WalkerLimiter;
use super::context::RunContext;
use super::plan::{RootKind, RootSpec};
use super::queue::{enqueue, FileJob};

/// Spawn one discovery thread per root, bounded by the walker semaphore.
///
/// Each thread takes a permit before touching the filesystem, so at most
/// `walker_count` roots are being scanned at once. The job queue closes on
/// its own once every walker has exited and dropped its sender.
pub fn spawn_walkers(
    roots: Vec<RootSpec>,
    tx: Sender<FileJob>,
    ctx: Arc<RunContext>,
    limiter: WalkerLimiter,
) -> Vec<JoinHandle<()>> {
    roots
        .into_iter()
        .map(|root| {
            let tx = tx.clone();
            let ctx = ctx.clone();
            let limiter = limiter.clone();
            thread::spawn(move || {
                let _permit = limiter.acquire();
                walk_root(&root, &tx, &ctx);
            })
        })
        .collect()
}

fn walk_root(root: &RootSpec, tx: &Sender<FileJob>, ctx: &RunContext) {
    if ctx.cancel.is_cancelled() || observe_stop(ctx) {
        return;
    }
    match root.kind {
        RootKind::File => forward_file_root(root, tx, ctx),
        RootKind::Directory => walk_directory_root(root, tx, ctx),
    }
}

/// Single-file root: one stat, at most one job, rooted at the parent
/// directory so backup layout and reclamation behave like a one-file walk.
fn forward_file_root(root: &RootSpec, tx: &Sender<FileJob>, ctx: &RunContext) {
    let meta = match std::fs::metadata(&root.path) {
        Ok(meta) => meta,
        Err(e) => {
            warn!(path = %root.path.display(), error = %e, "cannot stat file root; skipping");
            return;
        }
    };
    if !meta.is_file() || !is_aged(&root.path, &meta, ctx) {
        return;
    }

    let Some(parent) = root.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        warn!(path = %root.path.display(), "file root has no parent directory; skipping");
        return;
    };

    let job = FileJob {
        src: root.path.clone(),
        root: parent.to_path_buf(),
        root_index: root.index,
        backup: root.backup_enabled,
    };
    enqueue(tx, job, &ctx.cancel);
}

fn walk_directory_root(root: &RootSpec, tx: &Sender<FileJob>, ctx: &RunContext) {
    // A root that vanished since planning (an unmounted share, typically)
    // is skipped without failing the run.
    match std::fs::metadata(&root.path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %root.path.display(), "root does not exist; skipping");
            return;
        }
        _ => {}
    }

    debug!(path = %root.path.display(), "walking root");
    for entry in WalkDir::new(&root.path).follow_links(false) {
        if ctx.cancel.is_cancelled() || observe_stop(ctx) {
            return;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if is_root_failure(&e, &root.path) {
                    error!(
                        path = %root.path.display(),
                        error = %e,
                        "root cannot be walked; cancelling run"
                    );
                    ctx.latch_error(BroomError::WalkRoot {
                        path: root.path.clone(),
                        source: e.into(),
                    });
                    ctx.cancel.cancel();
                    return;
                }
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "cannot read metadata; skipping");
                continue;
            }
        };
        if !is_aged(entry.path(), &meta, ctx) {
            continue;
        }

        let job = FileJob {
            src: entry.into_path(),
            root: root.path.clone(),
            root_index: root.index,
            backup: root.backup_enabled,
        };
        if !enqueue(tx, job, &ctx.cancel) {
            return;
        }
    }
}

/// Strictly older than the cutoff; equal-to-cutoff is not eligible
fn is_aged(path: &Path, meta: &Metadata, ctx: &RunContext) -> bool {
    match meta.modified() {
        Ok(mtime) => mtime < ctx.cutoff,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "no modification time; skipping");
            false
        }
    }
}

/// The walk failed at the root itself rather than on some nested entry
fn is_root_failure(err: &walkdir::Error, root: &Path) -> bool {
    err.depth() == 0 || err.path() == Some(root)
}

fn observe_stop(ctx: &RunContext) -> bool {
    match ctx.stop_reason() {
        Some(reason) => {
            ctx.note_stop(reason);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaintenanceConfig;
    use crate::core::queue::{dequeue, job_queue};
    use filetime::FileTime;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn context(retention_days: u32) -> Arc<RunContext> {
        let config: MaintenanceConfig = toml::from_str(&format!(
            r#"
                retention_days = {}

                [[roots]]
                path = "/unused"
            "#,
            retention_days
        ))
        .unwrap();
        Arc::new(RunContext::new(&config, 4))
    }

    fn age_file(path: &Path, days: u64) {
        let past = FileTime::from_unix_time(
            FileTime::now().unix_seconds() - (days * 86_400) as i64,
            0,
        );
        filetime::set_file_mtime(path, past).unwrap();
    }

    fn drain(ctx: &RunContext, rx: &crossbeam_channel::Receiver<FileJob>) -> Vec<FileJob> {
        let mut jobs = Vec::new();
        while let Some(job) = dequeue(rx, &ctx.cancel) {
            jobs.push(job);
        }
        jobs
    }

    #[test]
    fn test_discovers_only_aged_files() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let fresh = dir.path().join("fresh.txt");
        std::fs::write(&old, b"old").unwrap();
        std::fs::write(&fresh, b"fresh").unwrap();
        age_file(&old, 10);

        let ctx = context(5);
        let (tx, rx) = job_queue(16);
        let root = RootSpec {
            path: dir.path().to_path_buf(),
            backup_enabled: true,
            kind: RootKind::Directory,
            index: 0,
        };

        for handle in spawn_walkers(vec![root], tx, ctx.clone(), WalkerLimiter::new(1)) {
            handle.join().unwrap();
        }

        let jobs = drain(&ctx, &rx);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].src, old);
        assert_eq!(jobs[0].root, dir.path());
        assert!(jobs[0].backup);
    }

    #[test]
    fn test_walks_nested_directories() {
        let dir = tempdir().unwrap();
        let deep = dir.path().join("sub").join("deep");
        std::fs::create_dir_all(&deep).unwrap();
        let old = deep.join("old.txt");
        std::fs::write(&old, b"old").unwrap();
        age_file(&old, 10);

        let ctx = context(5);
        let (tx, rx) = job_queue(16);
        let root = RootSpec {
            path: dir.path().to_path_buf(),
            backup_enabled: false,
            kind: RootKind::Directory,
            index: 0,
        };

        for handle in spawn_walkers(vec![root], tx, ctx.clone(), WalkerLimiter::new(1)) {
            handle.join().unwrap();
        }

        let jobs = drain(&ctx, &rx);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].src, old);
    }

    #[test]
    fn test_file_root_emits_one_job_rooted_at_the_parent() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("standalone.log");
        std::fs::write(&file, b"x").unwrap();
        age_file(&file, 10);

        let ctx = context(5);
        let (tx, rx) = job_queue(16);
        let root = RootSpec {
            path: file.clone(),
            backup_enabled: false,
            kind: RootKind::File,
            index: 0,
        };

        for handle in spawn_walkers(vec![root], tx, ctx.clone(), WalkerLimiter::new(1)) {
            handle.join().unwrap();
        }

        let jobs = drain(&ctx, &rx);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].src, file);
        assert_eq!(jobs[0].root, dir.path());
    }

    #[test]
    fn test_recent_file_root_emits_nothing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("standalone.log");
        std::fs::write(&file, b"x").unwrap();

        let ctx = context(5);
        let (tx, rx) = job_queue(16);
        let root = RootSpec {
            path: file,
            backup_enabled: false,
            kind: RootKind::File,
            index: 0,
        };

        for handle in spawn_walkers(vec![root], tx, ctx.clone(), WalkerLimiter::new(1)) {
            handle.join().unwrap();
        }

        assert!(drain(&ctx, &rx).is_empty());
    }

    #[test]
    fn test_missing_directory_root_is_skipped_without_error() {
        let ctx = context(5);
        let (tx, rx) = job_queue(16);
        let root = RootSpec {
            path: PathBuf::from("/definitely/not/here"),
            backup_enabled: false,
            kind: RootKind::Directory,
            index: 0,
        };

        for handle in spawn_walkers(vec![root], tx, ctx.clone(), WalkerLimiter::new(1)) {
            handle.join().unwrap();
        }

        assert!(drain(&ctx, &rx).is_empty());
        assert!(ctx.take_error().is_none());
        assert!(!ctx.cancel.is_cancelled());
    }

    #[test]
    fn test_cancellation_stops_discovery() {
        let dir = tempdir().unwrap();
        for i in 0..20 {
            let path = dir.path().join(format!("file-{}.txt", i));
            std::fs::write(&path, b"x").unwrap();
            age_file(&path, 10);
        }

        let ctx = context(5);
        ctx.cancel.cancel();
        let (tx, rx) = job_queue(16);
        let root = RootSpec {
            path: dir.path().to_path_buf(),
            backup_enabled: false,
            kind: RootKind::Directory,
            index: 0,
        };

        for handle in spawn_walkers(vec![root], tx, ctx.clone(), WalkerLimiter::new(1)) {
            handle.join().unwrap();
        }

        assert!(drain(&ctx, &rx).is_empty());
    }
}
