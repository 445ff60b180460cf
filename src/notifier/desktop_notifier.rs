use crate::notifier::{format_message, Notify};
use crate::{error::Error, Post};

use notify_rust::Notification;

/// Osの通知を用いた通知先
pub struct DesktopNotifier {
    summary: String,
}

impl DesktopNotifier {
    pub fn new(summary: String) -> Self {
        Self { summary }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("New post in the group".to_string())
    }
}

#[async_trait::async_trait]
impl Notify for DesktopNotifier {
    async fn notify(&self, post: &Post) -> Result<(), Error> {
        Notification::new()
            .summary(&self.summary)
            .body(&format_message(post))
            .show()?;

        Ok(())
    }
}
