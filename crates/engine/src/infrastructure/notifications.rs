//! Notification sink that forwards user notices to tracing.

use crate::infrastructure::ports::{Notice, NoticeLevel, NotificationPort};

pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationPort for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => {
                tracing::info!(permanent = notice.permanent, "{}", notice.message)
            }
            NoticeLevel::Warning => {
                tracing::warn!(permanent = notice.permanent, "{}", notice.message)
            }
            NoticeLevel::Error => {
                tracing::error!(permanent = notice.permanent, "{}", notice.message)
            }
        }
    }
}
