mod http_session;

pub use http_session::{HttpSession, HttpSessionFactory};

use crate::cookie::Cookie;
use crate::error::Error;

use reqwest::Url;

/// 一回のポーリングで使う，ページを描画するためのセッション．
/// キャッシュを避けるため，イテレーションごとに新しく開いて最後に必ず閉じる．
#[async_trait::async_trait]
pub trait Session: Send {
    /// クッキーを設定してurlを開く．
    async fn navigate(&mut self, url: &Url, cookies: &[Cookie]) -> Result<(), Error>;

    /// 現在のページのソース(html)を取得する．
    async fn page_source(&mut self) -> Result<String, Error>;

    /// セッションを閉じる．
    async fn close(&mut self) -> Result<(), Error>;
}

/// Sessionを新しく開くためのトレイト
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>, Error>;
}
