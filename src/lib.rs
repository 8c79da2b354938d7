/*!
 * broom - scheduled cleanup of aged files
 *
 * Sweeps files older than a configured retention out of a set of roots
 * (local directories, single files, mounted shares), optionally copying
 * each one into a dated backup tree before deleting it. Built for
 * unattended cron / Task Scheduler runs:
 * - bounded-concurrency discovery with a single serialized file-operation
 *   stage
 * - copy-before-delete safety: a source is removed only after its backup
 *   landed
 * - run caps (wall clock, file count), pacing, and cooperative
 *   cancellation
 * - bottom-up reclamation of emptied directories, never above a root
 */

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod notify;

// Re-export commonly used types for convenience
pub use crate::config::{MaintenanceConfig, RootEntry};
pub use crate::core::context::StopReason;
pub use crate::core::plan::{RootKind, RootSpec};
pub use crate::core::{run, RootReport, RunReport};
pub use crate::error::{BroomError, Result};
pub use crate::notify::{DesktopNotifier, NoopNotifier, Notifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
