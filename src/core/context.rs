/*!
 * Run-scoped shared state: caps, counters, latches
 */

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

use chrono::Local;

use crate::config::MaintenanceConfig;
use crate::error::BroomError;

use super::cancel::CancelToken;

const SECS_PER_DAY: u64 = 86_400;

/// Which cap ended a run before the queue drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxFiles,
    MaxRuntime,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxFiles => write!(f, "file cap reached"),
            StopReason::MaxRuntime => write!(f, "runtime cap reached"),
        }
    }
}

/// The only shared mutable state of a run. Owned by the engine entry point
/// and passed explicitly to walkers and the processor; there are no globals.
pub struct RunContext {
    /// Files modified strictly before this instant are eligible
    pub cutoff: SystemTime,
    /// `DDMmmYY`, captured once at run start; shared by every backup
    pub date_label: String,
    pub start: Instant,
    pub max_files: u64,
    pub max_runtime: Option<Duration>,
    pub cooldown: Duration,
    pub retries: u32,
    pub backup_root: Option<PathBuf>,
    pub cancel: CancelToken,
    processed: AtomicU64,
    deleted: Mutex<Vec<u64>>,
    first_error: Mutex<Option<BroomError>>,
    stop_note: Mutex<Option<StopReason>>,
}

impl RunContext {
    pub fn new(config: &MaintenanceConfig, root_count: usize) -> Self {
        let retention = Duration::from_secs(u64::from(config.retention_days) * SECS_PER_DAY);
        Self {
            cutoff: SystemTime::now() - retention,
            date_label: Local::now().format("%d%b%y").to_string(),
            start: Instant::now(),
            max_files: config.max_files,
            max_runtime: config.max_runtime(),
            cooldown: config.cooldown(),
            retries: config.retries,
            backup_root: config.backup_root.clone(),
            cancel: CancelToken::new(),
            processed: AtomicU64::new(0),
            deleted: Mutex::new(vec![0; root_count]),
            first_error: Mutex::new(None),
            stop_note: Mutex::new(None),
        }
    }

    /// The stop predicate, evaluated by walkers and the processor at safe
    /// points: wall-clock cap first, then the file-count cap.
    pub fn stop_reason(&self) -> Option<StopReason> {
        if let Some(limit) = self.max_runtime {
            if self.start.elapsed() >= limit {
                return Some(StopReason::MaxRuntime);
            }
        }
        if self.max_files > 0 && self.processed() >= self.max_files {
            return Some(StopReason::MaxFiles);
        }
        None
    }

    /// Exactly once per job the processor handled, whatever the outcome
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    /// Only on a successful delete
    pub fn record_deleted(&self, root_index: usize) {
        if let Ok(mut deleted) = self.deleted.lock() {
            if let Some(count) = deleted.get_mut(root_index) {
                *count += 1;
            }
        }
    }

    pub fn deleted_counts(&self) -> Vec<u64> {
        self.deleted
            .lock()
            .map(|deleted| deleted.clone())
            .unwrap_or_default()
    }

    /// First writer wins; later errors were already logged at their site.
    pub fn latch_error(&self, err: BroomError) {
        if let Ok(mut slot) = self.first_error.lock() {
            if slot.is_none() {
                *slot = Some(err);
            }
        }
    }

    pub fn take_error(&self) -> Option<BroomError> {
        self.first_error.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Remember which cap ended the run early, for the end-of-run advisory
    pub fn note_stop(&self, reason: StopReason) {
        if let Ok(mut slot) = self.stop_note.lock() {
            if slot.is_none() {
                *slot = Some(reason);
            }
        }
    }

    pub fn stop_note(&self) -> Option<StopReason> {
        self.stop_note.lock().ok().and_then(|slot| *slot)
    }
}
