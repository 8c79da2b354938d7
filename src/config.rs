/*!
 * Configuration structures and defaults for broom
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BroomError, Result};

/// One configured input: a directory to sweep or a single file to age out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootEntry {
    /// Absolute path of the directory or file
    pub path: PathBuf,

    /// Copy each aged file into the backup tree before deleting it
    #[serde(default)]
    pub backup: bool,
}

/// Main configuration for a maintenance run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Files whose modification time is strictly older than this many days
    /// are eligible for removal
    pub retention_days: u32,

    /// Ordered list of roots to sweep; order matters when `max_files` caps
    /// the run
    pub roots: Vec<RootEntry>,

    /// Destination directory for backups; required when any root has
    /// `backup = true`
    pub backup_root: Option<PathBuf>,

    /// Number of concurrent discovery walkers
    #[serde(default = "default_walker_count")]
    pub walker_count: usize,

    /// Capacity of the walker-to-processor job queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Stop after this many files have been processed (0 = unlimited)
    #[serde(default)]
    pub max_files: u64,

    /// Stop after this much wall-clock time in seconds (0 = unlimited)
    #[serde(default)]
    pub max_runtime_secs: u64,

    /// Pause between processed files in milliseconds
    #[serde(default)]
    pub cooldown_ms: u64,

    /// Retry attempts for a failing backup copy, in addition to the first try
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Directory for run logs; logging falls back to stderr and pruning is
    /// skipped when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log files older than this many days are pruned after each run
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,

    /// Log at debug level
    #[serde(default)]
    pub verbose: bool,
}

fn default_walker_count() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    300
}

fn default_retries() -> u32 {
    3
}

fn default_log_retention_days() -> u32 {
    14
}

impl MaintenanceConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BroomError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| {
            BroomError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.walker_count < 1 {
            return Err(BroomError::Config(
                "walker_count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity < 1 {
            return Err(BroomError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.log_retention_days < 1 {
            return Err(BroomError::Config(
                "log_retention_days must be at least 1".to_string(),
            ));
        }
        for root in &self.roots {
            if !root.path.is_absolute() {
                return Err(BroomError::Config(format!(
                    "root path must be absolute: {}",
                    root.path.display()
                )));
            }
        }
        if self.roots.iter().any(|r| r.backup) {
            match &self.backup_root {
                None => {
                    return Err(BroomError::Config(
                        "backup_root is required when any root has backup = true".to_string(),
                    ));
                }
                Some(p) if !p.is_absolute() => {
                    return Err(BroomError::Config(format!(
                        "backup_root must be absolute: {}",
                        p.display()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Wall-clock cap as a duration; `None` when unlimited
    pub fn max_runtime(&self) -> Option<Duration> {
        (self.max_runtime_secs > 0).then(|| Duration::from_secs(self.max_runtime_secs))
    }

    /// Per-file pacing delay; zero disables pacing
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            retention_days = 5
            backup_root = "/mnt/archive"

            [[roots]]
            path = "/srv/scratch"
            backup = true
        "#
    }

    #[test]
    fn test_parses_minimal_config_with_defaults() {
        let config: MaintenanceConfig = toml::from_str(minimal_toml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.retention_days, 5);
        assert_eq!(config.walker_count, 1);
        assert_eq!(config.queue_capacity, 300);
        assert_eq!(config.max_files, 0);
        assert_eq!(config.max_runtime_secs, 0);
        assert_eq!(config.cooldown_ms, 0);
        assert_eq!(config.retries, 3);
        assert_eq!(config.log_retention_days, 14);
        assert!(config.roots[0].backup);
    }

    #[test]
    fn test_backup_root_required_when_backup_requested() {
        let config: MaintenanceConfig = toml::from_str(
            r#"
                retention_days = 5

                [[roots]]
                path = "/srv/scratch"
                backup = true
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backup_root"));
    }

    #[test]
    fn test_backup_root_optional_when_no_backup() {
        let config: MaintenanceConfig = toml::from_str(
            r#"
                retention_days = 5

                [[roots]]
                path = "/srv/scratch"
            "#,
        )
        .unwrap();

        config.validate().unwrap();
        assert!(!config.roots[0].backup);
    }

    #[test]
    fn test_rejects_relative_root() {
        let config: MaintenanceConfig = toml::from_str(
            r#"
                retention_days = 5

                [[roots]]
                path = "scratch"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_walker_count() {
        let mut config: MaintenanceConfig = toml::from_str(minimal_toml()).unwrap();
        config.walker_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_accessors() {
        let mut config: MaintenanceConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.max_runtime(), None);
        assert_eq!(config.cooldown(), Duration::ZERO);

        config.max_runtime_secs = 30;
        config.cooldown_ms = 250;
        assert_eq!(config.max_runtime(), Some(Duration::from_secs(30)));
        assert_eq!(config.cooldown(), Duration::from_millis(250));
    }
}
