/*!
 * Pre-run writability check for the backup destination
 */

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{BroomError, Result};

/// Verify the backup destination before any walker starts.
///
/// Succeeds iff the path exists, is a directory, and accepts creation and
/// removal of a probe file. Best-effort at time of check: per-file copy
/// failures later in the run are still possible and handled by retries.
pub fn verify_backup_root(backup_root: &Path) -> Result<()> {
    let meta = fs::metadata(backup_root).map_err(|e| {
        BroomError::Gate(format!("{}: {}", backup_root.display(), e))
    })?;
    if !meta.is_dir() {
        return Err(BroomError::Gate(format!(
            "{} is not a directory",
            backup_root.display()
        )));
    }

    let probe = backup_root.join(format!(".broom-probe-{}", std::process::id()));
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|e| {
            BroomError::Gate(format!(
                "cannot create files under {}: {}",
                backup_root.display(),
                e
            ))
        })?;

    let written = file.write_all(b"probe");
    drop(file);
    let removed = fs::remove_file(&probe);

    written.map_err(|e| {
        BroomError::Gate(format!(
            "cannot write under {}: {}",
            backup_root.display(),
            e
        ))
    })?;
    removed.map_err(|e| {
        BroomError::Gate(format!(
            "cannot remove files under {}: {}",
            backup_root.display(),
            e
        ))
    })?;

    debug!(path = %backup_root.display(), "backup destination accepted");
    Ok(())
}
