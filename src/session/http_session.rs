use crate::cookie::{cookie_header, Cookie};
use crate::error::Error;
use crate::session::{Session, SessionFactory};

use reqwest::header::{CACHE_CONTROL, COOKIE};
use reqwest::{Client, Url};
use tracing::{debug, info};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HttpSessionを開く．
pub struct HttpSessionFactory {
    user_agent: String,
}

impl HttpSessionFactory {
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Default for HttpSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>, Error> {
        // コネクションを含めて前回のセッションとは何も共有しない
        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .pool_max_idle_per_host(0)
            .build()?;

        debug!("Opened a new http session.");
        Ok(Box::new(HttpSession {
            client: Some(client),
            current: None,
            navigated_source: None,
        }))
    }
}

/// reqwestによるセッション．JavaScriptは実行しない．
pub struct HttpSession {
    client: Option<Client>,
    /// 開いているurlとCookieヘッダー
    current: Option<(Url, Option<String>)>,
    /// navigateで取得したソース．最初のpage_sourceで返す．
    navigated_source: Option<String>,
}

impl HttpSession {
    async fn fetch(&self, url: &Url, cookie: Option<&str>) -> Result<String, Error> {
        let client = self
            .client
            .as_ref()
            .ok_or(Error::RequestError("session is already closed".to_string()))?;

        let mut request = client.get(url.clone()).header(CACHE_CONTROL, "no-cache");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::RequestError(format!(
                "{} responded with {}",
                url, status
            )));
        }

        Ok(res.text().await?)
    }
}

#[async_trait::async_trait]
impl Session for HttpSession {
    async fn navigate(&mut self, url: &Url, cookies: &[Cookie]) -> Result<(), Error> {
        let cookie = cookie_header(cookies);

        info!("Attempting request to {}.", url);
        let source = self.fetch(url, cookie.as_deref()).await?;
        info!("Finished request to {}.", url);

        self.current = Some((url.clone(), cookie));
        self.navigated_source = Some(source);
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, Error> {
        if let Some(source) = self.navigated_source.take() {
            return Ok(source);
        }

        let (url, cookie) = self
            .current
            .as_ref()
            .ok_or(Error::RequestError("no page has been opened".to_string()))?;

        self.fetch(url, cookie.as_deref()).await
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.client = None;
        self.current = None;
        self.navigated_source = None;
        debug!("Closed http session.");
        Ok(())
    }
}
