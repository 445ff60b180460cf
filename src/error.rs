/// アプリケーション・ライブラリとして利用したときのエラー
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// scraperに関するエラー
    #[error("Error::ScraperError: {0}")]
    ScraperError(String),
    /// リクエストに関するエラー
    #[error("Error::RequestError: {0}")]
    RequestError(String),
    /// ファイルのI/Oに関するエラー
    #[error("Error::FileError: {0}")]
    FileError(String),
    /// クッキーファイルの内容が意図しないものであった場合のエラー
    #[error("Error::CookieError: {0}")]
    CookieError(String),
    /// 通知の送信に関するエラー
    #[error("Error::DeliveryError: {0}")]
    DeliveryError(String),
    /// OSに関するエラー
    #[error("Error::OsError: {0}")]
    OsError(String),
    /// 設定に関するエラー
    #[error("Error::ConfigError: {0}")]
    ConfigError(String),
}

impl<'token> From<scraper::error::SelectorErrorKind<'token>> for Error {
    fn from(value: scraper::error::SelectorErrorKind<'token>) -> Self {
        Self::ScraperError(value.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::RequestError(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::FileError(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::CookieError(value.to_string())
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for Error {
    fn from(value: serde_path_to_error::Error<serde_json::Error>) -> Self {
        Self::CookieError(format!("at `{}`: {}", value.path(), value.inner()))
    }
}

impl From<notify_rust::error::Error> for Error {
    fn from(value: notify_rust::error::Error) -> Self {
        Self::OsError(value.to_string())
    }
}
