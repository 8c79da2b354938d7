/*!
 * Copy-with-retry for backup placement
 */

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use filetime::FileTime;
use tracing::{debug, warn};

use crate::error::{BroomError, Result};

use super::cancel::CancelToken;

/// Fixed buffer for the streaming copy
const COPY_BUFFER_SIZE: usize = 256 * 1024;

/// Copy `src` to `dest` through a temporary sibling, retrying with a capped
/// backoff between attempts. The destination must not already exist; the
/// processor filters that case before calling.
pub fn copy_with_retry(
    src: &Path,
    dest: &Path,
    retries: u32,
    cancel: &CancelToken,
) -> Result<()> {
    let mut attempt = 0;
    loop {
        match copy_once(src, dest) {
            Ok(()) => {
                if attempt > 0 {
                    debug!(dest = %dest.display(), attempt, "copy succeeded after retry");
                }
                preserve_metadata(src, dest);
                return Ok(());
            }
            Err(e) => {
                if attempt >= retries {
                    return Err(BroomError::RetriesExhausted {
                        attempts: retries + 1,
                        source: e,
                    });
                }
                warn!(
                    src = %src.display(),
                    error = %e,
                    attempt,
                    "copy failed; backing off"
                );
                if !cancel.sleep(backoff_delay(attempt)) {
                    return Err(BroomError::Cancelled);
                }
                attempt += 1;
            }
        }
    }
}

/// Backoff schedule: 250 ms after the first failure, 1 s after the second,
/// then 3 s for every later attempt
fn backoff_delay(attempt: u32) -> Duration {
    match attempt {
        0 => Duration::from_millis(250),
        1 => Duration::from_secs(1),
        _ => Duration::from_secs(3),
    }
}

/// One streaming attempt: src -> `<dest>.tmp` -> rename into place.
/// The temp handle is closed before the rename; any failure removes the
/// partial temp file before the function returns.
fn copy_once(src: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(dest);
    let result = stream_to(src, &tmp).and_then(|_| fs::rename(&tmp, dest));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut raw = dest.as_os_str().to_os_string();
    raw.push(".tmp");
    PathBuf::from(raw)
}

fn stream_to(src: &Path, tmp: &Path) -> std::io::Result<()> {
    let mut reader = File::open(src)?;
    let mut writer = File::create(tmp)?;
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n])?;
    }
    // writer drops here, closing the temp handle ahead of the rename
    Ok(())
}

/// Carry the source's permissions and timestamps onto the finished backup.
/// Best-effort: failure leaves the copy in place and logs a warning.
fn preserve_metadata(src: &Path, dest: &Path) {
    let meta = match fs::metadata(src) {
        Ok(meta) => meta,
        Err(e) => {
            warn!(src = %src.display(), error = %e, "cannot read metadata for backup");
            return;
        }
    };

    if let Err(e) = fs::set_permissions(dest, meta.permissions()) {
        warn!(dest = %dest.display(), error = %e, "cannot preserve permissions");
    }

    let accessed = FileTime::from_last_access_time(&meta);
    let modified = FileTime::from_last_modification_time(&meta);
    if let Err(e) = filetime::set_file_times(dest, accessed, modified) {
        warn!(dest = %dest.display(), error = %e, "cannot preserve timestamps");
    }
}
