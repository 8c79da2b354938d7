/*!
 * Log-directory pruning
 */

use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::error::Result;

const SECS_PER_DAY: u64 = 86_400;

/// Remove log files older than `retention_days` from `log_dir`.
///
/// Non-recursive: subdirectories are skipped. Per-file failures are logged
/// and ignored. A missing log directory is created and counts as success;
/// there is nothing to prune in it.
pub fn prune_logs(log_dir: &Path, retention_days: u32) -> Result<()> {
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => {
            std::fs::create_dir_all(log_dir)?;
            return Ok(());
        }
    };

    let cutoff =
        SystemTime::now() - Duration::from_secs(u64::from(retention_days) * SECS_PER_DAY);

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "unreadable log directory entry; skipping");
                continue;
            }
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        if !meta.is_file() {
            continue;
        }
        let modified = match meta.modified() {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        if modified < cutoff {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => debug!(path = %entry.path().display(), "pruned old log"),
                Err(e) => warn!(path = %entry.path().display(), error = %e, "cannot prune log"),
            }
        }
    }

    Ok(())
}
