//! User-facing notification channel
//!
//! Core only provides the abstraction; the host decides how notifications are
//! shown.

use serde::{Deserialize, Serialize};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A dismissible message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub detail: Option<String>,
    /// Link to more information, e.g. installation instructions
    pub url: Option<String>,
}

impl Notification {
    /// An external tool could not be started because its executable is missing
    pub fn tool_not_found(tool: &str, install_url: Option<&str>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: format!("{} not found", tool),
            detail: Some(format!(
                "Install {} or configure its executable path to use this search engine.",
                tool
            )),
            url: install_url.map(str::to_string),
        }
    }
}

/// Receiver of user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that discards everything
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found() {
        let n = Notification::tool_not_found("rg", Some("https://example.com/install"));
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.title, "rg not found");
        assert_eq!(n.url.as_deref(), Some("https://example.com/install"));

        let n = Notification::tool_not_found("cindex", None);
        assert!(n.url.is_none());
    }
}
