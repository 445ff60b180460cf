use crate::notifier::{format_message, Notify};
use crate::{error::Error, Post};

use reqwest::Client;
use serde::Serialize;
use std::borrow::Cow;
use tracing::{info, warn};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// sendMessageが受け付けるtextの上限(UTF-16の単位)
const MAX_MESSAGE_LEN: usize = 4096;

/// 上限を超える場合は末尾を省略記号に置き換える．
fn truncate_message(text: &str, max_len: usize) -> Cow<'_, str> {
    if text.encode_utf16().count() <= max_len {
        return Cow::Borrowed(text);
    }

    let ellipsis = '…';
    let budget = max_len - ellipsis.len_utf16();

    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        truncated.push(c);
    }
    truncated.push(ellipsis);

    Cow::Owned(truncated)
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Telegram Bot APIのsendMessageで通知する．
pub struct TelegramNotifier {
    api_url: String,
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self::with_api_url(DEFAULT_TELEGRAM_API_URL.to_string(), bot_token, chat_id)
    }

    pub fn with_api_url(api_url: String, bot_token: String, chat_id: String) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Notify for TelegramNotifier {
    async fn notify(&self, post: &Post) -> Result<(), Error> {
        // トークンを含むのでurlはログに出さない
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let message = format_message(post);
        let text = truncate_message(&message, MAX_MESSAGE_LEN);
        if let Cow::Owned(_) = text {
            warn!("Message is too long for sendMessage and was truncated.");
        }

        info!("Sending notification to chat {}.", self.chat_id);
        let res = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: &text,
            })
            .send()
            .await
            .map_err(|e| Error::DeliveryError(e.without_url().to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::DeliveryError(format!("{}: {}", status, body)));
        }

        info!("Finished sending notification to chat {}.", self.chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{truncate_message, TelegramNotifier, MAX_MESSAGE_LEN};
    use crate::error::Error;
    use crate::notifier::Notify;
    use crate::Post;

    use tracing_test::traced_test;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post() -> Post {
        Post {
            author: "Alice".to_string(),
            body: "Hello".to_string(),
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "-100200300",
                "text": "Alice: Hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::with_api_url(
            format!("{}/", server.uri()),
            "123:abc".to_string(),
            "-100200300".to_string(),
        );

        notifier.notify(&post()).await.unwrap();
    }

    #[traced_test]
    #[tokio::test]
    async fn test_error_status_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string(r#"{"ok":false,"description":"boom"}"#),
            )
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::with_api_url(
            server.uri(),
            "123:abc".to_string(),
            "-100200300".to_string(),
        );

        let err = notifier.notify(&post()).await.unwrap_err();
        match err {
            Error::DeliveryError(message) => {
                assert!(message.contains("500"), "{}", message);
                assert!(message.contains("boom"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("Alice: Hello", MAX_MESSAGE_LEN), "Alice: Hello");

        let long = "a".repeat(5000);
        let truncated = truncate_message(&long, MAX_MESSAGE_LEN);
        assert_eq!(truncated.encode_utf16().count(), MAX_MESSAGE_LEN);
        assert!(truncated.ends_with('…'));

        // サロゲートペアを途中で切らない
        let emoji = "😀".repeat(3000);
        let truncated = truncate_message(&emoji, MAX_MESSAGE_LEN);
        assert!(truncated.encode_utf16().count() <= MAX_MESSAGE_LEN);
        assert!(truncated.ends_with("😀…"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_long_post_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::with_api_url(
            server.uri(),
            "123:abc".to_string(),
            "-100200300".to_string(),
        );
        let post = Post {
            author: "Alice".to_string(),
            body: "a".repeat(5000),
        };

        notifier.notify(&post).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let text = sent["text"].as_str().unwrap();
        assert_eq!(text.encode_utf16().count(), MAX_MESSAGE_LEN);
        assert!(text.starts_with("Alice: aaa"));
        assert!(logs_contain("was truncated"));
    }
}
