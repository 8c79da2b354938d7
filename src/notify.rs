/*!
 * Operator notification on backup-gate failure
 */

use tracing::warn;

/// Narrow port for the platform popup. The engine never calls this; the
/// binary orchestrator does, and only when the backup gate rejects the
/// destination.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

/// Popup via the desktop notification service
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        match notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .show()
        {
            Ok(_) => {}
            Err(e) => warn!(title, error = %e, "desktop notification failed"),
        }
    }
}

/// Drops every message; for headless runs and tests
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}
