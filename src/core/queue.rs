/*!
 * Bounded hand-off between walkers and the processor
 */

use std::path::PathBuf;

use crossbeam_channel::{bounded, select, Receiver, Sender};

use super::cancel::CancelToken;

/// One candidate file, discovered by a walker and consumed exactly once by
/// the processor
#[derive(Debug, Clone)]
pub struct FileJob {
    /// Absolute path of the aged file
    pub src: PathBuf,
    /// The owning root; for single-file roots, the file's parent directory
    pub root: PathBuf,
    /// Position of the owning root in the configured order
    pub root_index: usize,
    /// Copy into the backup tree before deleting
    pub backup: bool,
}

/// Create the bounded FIFO connecting walkers to the processor.
/// Dropping every sender closes the queue and signals end of production.
pub fn job_queue(capacity: usize) -> (Sender<FileJob>, Receiver<FileJob>) {
    bounded(capacity)
}

/// Push a job, blocking on a full queue but racing the cancel signal.
/// Returns false when the run was cancelled or the consumer is gone.
pub fn enqueue(tx: &Sender<FileJob>, job: FileJob, cancel: &CancelToken) -> bool {
    select! {
        send(tx, job) -> res => res.is_ok(),
        recv(cancel.observer()) -> _ => false,
    }
}

/// Pop the next job, blocking on an empty queue but racing the cancel
/// signal. `None` means the queue closed and drained, or the run was
/// cancelled.
pub fn dequeue(rx: &Receiver<FileJob>, cancel: &CancelToken) -> Option<FileJob> {
    select! {
        recv(rx) -> job => job.ok(),
        recv(cancel.observer()) -> _ => None,
    }
}
