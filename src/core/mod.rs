/*!
 * The maintenance engine
 *
 * Bounded-concurrency discovery feeding a single serialized
 * backup-then-delete stage through a bounded queue:
 * walkers scan the configured roots in parallel (metadata reads hide
 * network round-trips), while one processor owns every copy and delete.
 */

pub mod cancel;
pub mod concurrency;
pub mod context;
pub mod copy;
pub mod gate;
pub mod plan;
pub mod process;
pub mod prune;
pub mod queue;
pub mod reclaim;
pub mod walker;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, info};

use crate::config::MaintenanceConfig;
use crate::error::Result;

use concurrency::WalkerLimiter;
use context::{RunContext, StopReason};
use plan::{plan_roots, RootKind, RootSpec};

/// Outcome of a maintenance run
#[derive(Debug)]
pub struct RunReport {
    /// Jobs the processor handled, whatever their outcome
    pub processed: u64,
    /// Per-root results, in configured order
    pub per_root: Vec<RootReport>,
    /// Set when a cap ended the run before the queue drained
    pub stopped: Option<StopReason>,
    /// Wall-clock duration of the engine phase
    pub duration: Duration,
}

/// Result for one configured root
#[derive(Debug)]
pub struct RootReport {
    pub spec: RootSpec,
    /// Successful deletions under this root
    pub deleted: u64,
}

/// Run the full maintenance pipeline over the configured roots.
///
/// Shutdown order is fixed: walkers join, the queue closes, the processor
/// drains (or exits early on a stop condition), and only then are per-root
/// totals reported, so no partial counts are ever emitted.
pub fn run(config: &MaintenanceConfig) -> Result<RunReport> {
    config.validate()?;
    let roots = plan_roots(&config.roots);

    if roots.iter().any(|r| r.backup_enabled) {
        // validate() guarantees backup_root is present on this path
        if let Some(backup_root) = &config.backup_root {
            gate::verify_backup_root(backup_root)?;
        }
    }

    let ctx = Arc::new(RunContext::new(config, roots.len()));
    info!(
        retention_days = config.retention_days,
        roots = roots.len(),
        date_label = %ctx.date_label,
        "maintenance run starting"
    );

    let (tx, rx) = queue::job_queue(config.queue_capacity);

    let processor = {
        let ctx = ctx.clone();
        thread::spawn(move || process::process_jobs(rx, ctx))
    };

    let limiter = WalkerLimiter::new(config.walker_count);
    let walkers = walker::spawn_walkers(roots.clone(), tx, ctx.clone(), limiter);

    for handle in walkers {
        if handle.join().is_err() {
            error!("walker thread panicked");
        }
    }
    // every sender is gone once the walkers exit; the queue is now closed
    if processor.join().is_err() {
        error!("processor thread panicked");
    }

    report(roots, &ctx)
}

fn report(roots: Vec<RootSpec>, ctx: &RunContext) -> Result<RunReport> {
    let deleted = ctx.deleted_counts();

    let mut per_root = Vec::with_capacity(roots.len());
    for spec in roots {
        let count = deleted.get(spec.index).copied().unwrap_or(0);
        match spec.kind {
            RootKind::Directory => {
                info!(root = %spec.path.display(), deleted = count, "files deleted from root");
            }
            RootKind::File => {
                if count > 0 {
                    info!(path = %spec.path.display(), "aged file removed");
                }
            }
        }
        per_root.push(RootReport {
            spec,
            deleted: count,
        });
    }

    if let Some(err) = ctx.take_error() {
        return Err(err);
    }

    let stopped = ctx.stop_note();
    if let Some(reason) = stopped {
        info!(%reason, "run ended early");
    }
    info!(processed = ctx.processed(), "maintenance run complete");

    Ok(RunReport {
        processed: ctx.processed(),
        per_root,
        stopped,
        duration: ctx.start.elapsed(),
    })
}
