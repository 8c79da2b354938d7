/*!
 * The serialized file-operation stage
 */

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};

use super::context::RunContext;
use super::copy::copy_with_retry;
use super::queue::{dequeue, FileJob};
use super::reclaim::reclaim_empty_dirs;

/// Drain the job queue until it closes, a stop condition trips, or the run
/// is cancelled. Copy and delete are serialized here: exactly one processor
/// runs per maintenance run, so a slow network link is never saturated by
/// competing writes.
pub fn process_jobs(rx: Receiver<FileJob>, ctx: Arc<RunContext>) {
    loop {
        if let Some(reason) = ctx.stop_reason() {
            ctx.note_stop(reason);
            debug!(%reason, "processor stopping early");
            return;
        }

        let Some(job) = dequeue(&rx, &ctx.cancel) else {
            return;
        };

        handle_job(&job, &ctx);
        ctx.record_processed();

        if !ctx.cooldown.is_zero() && !ctx.cancel.sleep(ctx.cooldown) {
            return;
        }
    }
}

/// One job: optional backup, then delete, then reclamation.
/// Failures are logged and folded into counters; they never propagate.
fn handle_job(job: &FileJob, ctx: &RunContext) {
    let Some(rel) = relative_within(&job.src, &job.root) else {
        error!(
            src = %job.src.display(),
            root = %job.root.display(),
            "file resolves outside its root; skipping"
        );
        return;
    };

    if job.backup {
        let Some(backup_root) = ctx.backup_root.as_deref() else {
            error!(src = %job.src.display(), "backup requested without a backup root; skipping");
            return;
        };
        let dest = backup_root.join(&ctx.date_label).join(&rel);

        if dest.exists() {
            // left by an earlier run under the same date label
            warn!(dest = %dest.display(), "backup already exists; skipping copy");
        } else if let Err(e) = copy_with_retry(&job.src, &dest, ctx.retries, &ctx.cancel) {
            error!(
                src = %job.src.display(),
                dest = %dest.display(),
                error = %e,
                "backup failed; keeping source"
            );
            return;
        } else {
            info!(src = %job.src.display(), dest = %dest.display(), "backed up");
        }
    }

    match std::fs::remove_file(&job.src) {
        Ok(()) => {
            info!(path = %job.src.display(), "deleted");
            ctx.record_deleted(job.root_index);
            if let Some(parent) = job.src.parent() {
                reclaim_empty_dirs(parent, &job.root);
            }
        }
        Err(e) => {
            error!(path = %job.src.display(), error = %e, "delete failed");
        }
    }
}

/// Normalized path of `src` relative to `root`, with `.` and intra-root
/// `..` segments collapsed. `None` when the path escapes the root.
fn relative_within(src: &Path, root: &Path) -> Option<PathBuf> {
    let rel = src.strip_prefix(root).ok()?;

    let mut out = PathBuf::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}
