//! Notifications rendered on stderr

use codesearch_core::{Notification, NotificationLevel, Notifier};
use colored::Colorize;

/// Prints core notifications for the user
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let title = match notification.level {
            NotificationLevel::Info => notification.title.cyan(),
            NotificationLevel::Warning => notification.title.yellow(),
            NotificationLevel::Error => notification.title.red().bold(),
        };
        eprintln!("{}", title);
        if let Some(detail) = &notification.detail {
            eprintln!("  {}", detail);
        }
        if let Some(url) = &notification.url {
            eprintln!("  {}", url.underline());
        }
    }
}
