mod desktop_notifier;
mod telegram_notifier;

pub use desktop_notifier::DesktopNotifier;
pub use telegram_notifier::{TelegramNotifier, DEFAULT_TELEGRAM_API_URL};

use crate::error::Error;
use crate::Post;

use std::sync::Arc;
use tracing::error;

/// 通知の本文
pub fn format_message(post: &Post) -> String {
    format!("{}: {}", post.author, post.body)
}

/// 新しいポストを通知するトレイト
#[async_trait::async_trait]
pub trait Notify {
    async fn notify(&self, post: &Post) -> Result<(), Error>;
}

/// 通知先のリスト．一つが失敗しても残りには送る．
pub struct NotifierList {
    inner_list: Vec<Arc<dyn Notify + Send + Sync>>,
}

impl NotifierList {
    pub fn new() -> Self {
        Self {
            inner_list: Vec::new(),
        }
    }
    pub fn append_notifier<N: Notify + Send + Sync + 'static>(&mut self, notifier: N) {
        self.inner_list
            .push(Arc::new(notifier) as Arc<dyn Notify + Send + Sync>);
    }
    pub fn len(&self) -> usize {
        self.inner_list.len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner_list.is_empty()
    }
}

impl Default for NotifierList {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Notify for NotifierList {
    async fn notify(&self, post: &Post) -> Result<(), Error> {
        let mut failed = 0;

        for notifier in self.inner_list.iter() {
            if let Err(e) = notifier.notify(post).await {
                error!("Notifier failed: {}", e);
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(Error::DeliveryError(format!(
                "{} of {} notifiers failed",
                failed,
                self.inner_list.len()
            )));
        }
        Ok(())
    }
}
