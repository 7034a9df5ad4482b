//! Short-lived status messages shown in the footer.

use std::collections::VecDeque;

/// Oldest entries are dropped past this many
const MAX_NOTIFICATIONS: usize = 50;

/// A notification entry with message and timestamp
#[derive(Clone, Debug)]
pub struct NotificationEntry {
    pub message: String,
    pub level: NotificationLevel,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

impl NotificationEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_level(message, NotificationLevel::Info)
    }

    pub fn with_level(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: chrono::Local::now(),
        }
    }

    pub fn time_ago(&self) -> String {
        let now = chrono::Local::now();
        let duration = now.signed_duration_since(self.timestamp);
        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            self.timestamp.format("%m/%d %H:%M").to_string()
        }
    }
}

/// Append and trim to the retention limit
pub fn push_notification(notifications: &mut VecDeque<NotificationEntry>, entry: NotificationEntry) {
    match entry.level {
        NotificationLevel::Error => tracing::warn!("{}", entry.message),
        _ => tracing::info!("{}", entry.message),
    }
    notifications.push_back(entry);
    while notifications.len() > MAX_NOTIFICATIONS {
        notifications.pop_front();
    }
}
