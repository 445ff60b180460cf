pub mod cookie;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod notifier;
pub mod session;

pub use detector::{detect, Change, ObservedState};
pub use extractor::{extract_post, Extraction, NotFoundReason};
pub use notifier::{NotifierList, Notify};
pub use session::{Session, SessionFactory};

use error::Error;

use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// ポストを表す型．どちらもtrim済み．
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub author: String,
    pub body: String,
}

/// 監視の設定
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub group_url: Url,
    pub cookie_file: PathBuf,
    /// ページを開いてから描画を待つ時間
    pub settle: Duration,
    /// フィードのコンテナが現れるのを待つ上限
    pub feed_timeout: Duration,
    /// フィードの存在を確認する間隔
    pub feed_poll: Duration,
    /// イテレーション間の待ち時間
    pub interval: Duration,
}

impl WatchConfig {
    pub fn new(group_url: Url, cookie_file: PathBuf) -> Self {
        Self {
            group_url,
            cookie_file,
            settle: Duration::from_secs(5),
            feed_timeout: Duration::from_secs(15),
            feed_poll: Duration::from_millis(500),
            interval: Duration::from_secs(60),
        }
    }
}

/// 一回のポーリングの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub extraction: Extraction,
    pub change: Change,
    /// 通知しなかった場合はNone
    pub delivered: Option<bool>,
}

/// ページを開いて抽出するまで．セッションは閉じない．
async fn visit_and_extract(
    config: &WatchConfig,
    session: &mut dyn Session,
) -> Result<Extraction, Error> {
    let cookies = cookie::load_cookies(&config.cookie_file);
    let cookies = cookie::applicable_cookies(&cookies, &config.group_url, chrono::Utc::now());

    session.navigate(&config.group_url, &cookies).await?;
    info!("Accessed group page {}.", config.group_url);

    tokio::time::sleep(config.settle).await;

    let extraction =
        extractor::wait_and_extract(session, config.feed_timeout, config.feed_poll).await;

    match &extraction {
        Extraction::Found(post) => info!("Extracted post by {}.", post.author),
        Extraction::NotFound(reason) => warn!("Post not found: {}", reason),
        Extraction::TransientError(reason) => warn!("Error fetching posts: {}", reason),
    }

    Ok(extraction)
}

/// 抽出結果を判定し，新しければ通知する．
async fn detect_and_notify<N>(
    extraction: Extraction,
    notifier: &N,
    state: ObservedState,
) -> (PollOutcome, ObservedState)
where
    N: Notify + Sync + ?Sized,
{
    let (change, state) = detect(extraction.clone().into_post(), state);

    let delivered = match &change {
        Change::Novel(post) => {
            info!(
                "New post detected. Sender: {} Post: {}",
                post.author, post.body
            );
            match notifier.notify(post).await {
                Ok(()) => Some(true),
                Err(e) => {
                    // 状態は更新済みなので，ページが変わらない限り再送されない
                    error!("Failed to deliver notification, the post is dropped: {}", e);
                    Some(false)
                }
            }
        }
        Change::Absent | Change::Duplicate => None,
    };

    (
        PollOutcome {
            extraction,
            change,
            delivered,
        },
        state,
    )
}

/// 一回分のポーリングを行う．
/// セッションは通知の後，成否にかかわらず必ず閉じる．エラーの場合状態は変わらない．
pub async fn poll_once<F, N>(
    config: &WatchConfig,
    factory: &F,
    notifier: &N,
    state: ObservedState,
) -> (Result<PollOutcome, Error>, ObservedState)
where
    F: SessionFactory + ?Sized,
    N: Notify + Sync + ?Sized,
{
    let mut session = match factory.open().await {
        Ok(session) => session,
        Err(e) => return (Err(e), state),
    };

    let (res, state) = match visit_and_extract(config, session.as_mut()).await {
        Ok(extraction) => {
            let (outcome, state) = detect_and_notify(extraction, notifier, state).await;
            (Ok(outcome), state)
        }
        Err(e) => (Err(e), state),
    };

    if let Err(e) = session.close().await {
        warn!("Failed to close session: {}", e);
    }

    (res, state)
}

/// 外部から止められるまでポーリングを続ける．
pub async fn watch<F, N>(config: WatchConfig, factory: &F, notifier: &N)
where
    F: SessionFactory + ?Sized,
    N: Notify + Sync + ?Sized,
{
    let mut state = ObservedState::new();

    info!(
        "Watching {} every {}s.",
        config.group_url,
        config.interval.as_secs()
    );

    loop {
        let (res, next_state) = poll_once(&config, factory, notifier, state).await;
        state = next_state;

        if let Err(e) = res {
            error!("Error occurred. {:?}", e);
        }

        tokio::time::sleep(config.interval).await;
    }
}
