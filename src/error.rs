/*!
 * Error types for broom
 */

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BroomError>;

/// Errors that can end a maintenance run.
///
/// Per-file failures (a copy that exhausts its retries, a delete that is
/// refused) are logged and folded into counters by the processor; only the
/// first error latched by the run controller surfaces through this type.
#[derive(Debug, Error)]
pub enum BroomError {
    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Backup destination failed the pre-run writability check
    #[error("backup destination rejected: {0}")]
    Gate(String),

    /// A configured root exists but could not be walked at all
    #[error("cannot walk root {path}: {source}")]
    WalkRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A copy kept failing until its retries ran out
    #[error("copy failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// The run-scoped cancel signal fired while this operation was waiting
    #[error("run cancelled")]
    Cancelled,
}

impl BroomError {
    /// True for gate failures, which the binary escalates to a desktop popup.
    pub fn is_gate(&self) -> bool {
        matches!(self, BroomError::Gate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_are_detected() {
        assert!(BroomError::Gate("not a directory".to_string()).is_gate());
        assert!(!BroomError::Config("bad retention".to_string()).is_gate());
        assert!(!BroomError::Cancelled.is_gate());
    }

    #[test]
    fn test_display_includes_context() {
        let err = BroomError::RetriesExhausted {
            attempts: 4,
            source: io::Error::new(io::ErrorKind::TimedOut, "share unreachable"),
        };
        assert_eq!(
            err.to_string(),
            "copy failed after 4 attempts: share unreachable"
        );

        let err = BroomError::WalkRoot {
            path: PathBuf::from("/srv/scratch"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/srv/scratch"));
    }
}
