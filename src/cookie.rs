use crate::error::Error;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

/// ブラウザからエクスポートされたクッキーの一要素．
/// 未知のキー(secure, httpOnly, sameSiteなど)は無視する．
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// unix秒．拡張機能によっては`expirationDate`として出力される．
    #[serde(alias = "expirationDate")]
    pub expiry: Option<f64>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expiry: None,
        }
    }

    /// 有効期限のないセッションクッキーは期限切れにならない．
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry < now.timestamp() as f64,
            None => false,
        }
    }

    /// urlに送るべきクッキーかどうか
    pub fn matches_url(&self, url: &Url) -> bool {
        let host_matches = match (self.domain.as_deref(), url.host_str()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(domain), Some(host)) => {
                let domain = domain.trim_start_matches('.').to_ascii_lowercase();
                let host = host.to_ascii_lowercase();
                host == domain || host.ends_with(&format!(".{}", domain))
            }
        };

        let path_matches = match self.path.as_deref() {
            None | Some("") | Some("/") => true,
            Some(path) => url.path().starts_with(path),
        };

        host_matches && path_matches
    }
}

/// クッキーファイルを読み込む．失敗はそのまま返す．
pub fn read_cookies(path: &Path) -> Result<Vec<Cookie>, Error> {
    let buf = std::fs::read_to_string(path)?;

    let mut deserializer = serde_json::Deserializer::from_str(&buf);
    let cookies: Vec<Cookie> = serde_path_to_error::deserialize(&mut deserializer)?;

    Ok(cookies)
}

/// クッキーファイルを読み込む．ファイルがない・壊れている場合はログを出して空を返す．
pub fn load_cookies(path: &Path) -> Vec<Cookie> {
    if !path.is_file() {
        error!("Cookie file not found: {:?}. Continuing without cookies.", path);
        return Vec::new();
    }

    match read_cookies(path) {
        Ok(cookies) => {
            info!("Loaded {} cookies from {:?}.", cookies.len(), path);
            cookies
        }
        Err(e) => {
            error!(
                "Failed to load cookie file {:?}: {}. Continuing without cookies.",
                path, e
            );
            Vec::new()
        }
    }
}

/// urlに送るべき，期限切れでないクッキーだけを残す．
pub fn applicable_cookies(cookies: &[Cookie], url: &Url, now: DateTime<Utc>) -> Vec<Cookie> {
    cookies
        .iter()
        .filter(|cookie| cookie.matches_url(url) && !cookie.is_expired(now))
        .cloned()
        .collect()
}

/// Cookieヘッダーの値．クッキーが一つもなければNone．
pub fn cookie_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    let header = cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name, cookie.value))
        .collect::<Vec<_>>()
        .join("; ");

    Some(header)
}
