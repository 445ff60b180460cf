/// 設定について．環境変数(.envも可)とコマンドライン引数から読み込む．
mod config {
    use group_watch::notifier::DEFAULT_TELEGRAM_API_URL;
    use group_watch::WatchConfig;

    use clap::Parser;
    use reqwest::Url;
    use std::path::PathBuf;
    use std::time::Duration;

    /// プロファイルディレクトリ内のデフォルトのクッキーファイル名
    const DEFAULT_COOKIE_FILE_NAME: &str = "fb_cookies.json";

    /// Config読み込みのエラー
    #[derive(Debug, thiserror::Error)]
    #[error("ConfigError: {0}")]
    pub struct ConfigError(pub String);

    #[derive(Debug, Parser)]
    #[command(about = "Watch a group page and forward new posts.")]
    pub struct Arg {
        /// group page url to watch.
        #[arg(long, env = "FACEBOOK_GROUP_URL")]
        pub group_url: String,

        /// local browser profile directory.
        #[arg(long, env = "CHROME_USER_DATA_DIR")]
        pub profile_dir: PathBuf,

        /// exported cookie file. defaults to <profile-dir>/fb_cookies.json.
        #[arg(long, env = "COOKIE_FILE")]
        pub cookie_file: Option<PathBuf>,

        /// notification destination.
        #[arg(long, env = "TELEGRAM_CHAT_ID")]
        pub chat_id: String,

        /// notification credential.
        #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
        pub bot_token: String,

        #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_TELEGRAM_API_URL)]
        pub telegram_api_url: String,

        /// seconds to sleep between polls.
        #[arg(
            long,
            env = "POLL_INTERVAL_SECS",
            default_value_t = 60,
            value_parser = clap::value_parser!(u64).range(30..=60)
        )]
        pub interval_secs: u64,

        /// also show os notifications.
        #[arg(long, env = "DESKTOP_NOTIFY", default_value_t = false)]
        pub desktop_notify: bool,
    }

    /// 検証済みの設定
    #[derive(Debug)]
    pub struct AppConfig {
        pub watch: WatchConfig,
        pub chat_id: String,
        pub bot_token: String,
        pub telegram_api_url: String,
        pub desktop_notify: bool,
    }

    impl TryFrom<Arg> for AppConfig {
        type Error = ConfigError;
        fn try_from(value: Arg) -> Result<Self, Self::Error> {
            let Arg {
                group_url,
                profile_dir,
                cookie_file,
                chat_id,
                bot_token,
                telegram_api_url,
                interval_secs,
                desktop_notify,
            } = value;

            let group_url = Url::parse(&group_url)
                .map_err(|e| ConfigError(format!("invalid group url {:?}: {}", group_url, e)))?;
            if !matches!(group_url.scheme(), "http" | "https") {
                return Err(ConfigError(format!(
                    "group url must be http(s): {}",
                    group_url
                )));
            }

            if !profile_dir.is_dir() {
                return Err(ConfigError(format!(
                    "profile directory does not exist: {:?}",
                    profile_dir
                )));
            }

            if chat_id.trim().is_empty() {
                return Err(ConfigError("chat id is empty.".to_string()));
            }
            if bot_token.trim().is_empty() {
                return Err(ConfigError("bot token is empty.".to_string()));
            }
            Url::parse(&telegram_api_url)
                .map_err(|e| ConfigError(format!("invalid telegram api url: {}", e)))?;

            let cookie_file =
                cookie_file.unwrap_or_else(|| profile_dir.join(DEFAULT_COOKIE_FILE_NAME));

            let mut watch = WatchConfig::new(group_url, cookie_file);
            watch.interval = Duration::from_secs(interval_secs);

            Ok(AppConfig {
                watch,
                chat_id,
                bot_token,
                telegram_api_url,
                desktop_notify,
            })
        }
    }

    #[cfg(test)]
    mod test {
        use super::{AppConfig, Arg};

        use clap::Parser;
        use std::time::Duration;
        use tracing_test::traced_test;

        fn parse(profile_dir: &str, extra: &[&str]) -> Result<Arg, clap::Error> {
            let mut args = vec![
                "main",
                "--group-url",
                "https://www.facebook.com/groups/123456",
                "--profile-dir",
                profile_dir,
                "--chat-id",
                "-100200300",
                "--bot-token",
                "123:abc",
            ];
            args.extend_from_slice(extra);
            Arg::try_parse_from(args)
        }

        #[traced_test]
        #[test]
        fn test_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let profile_dir = dir.path().to_str().unwrap();

            let config = AppConfig::try_from(parse(profile_dir, &[]).unwrap()).unwrap();

            assert_eq!(
                config.watch.group_url.as_str(),
                "https://www.facebook.com/groups/123456"
            );
            assert_eq!(config.watch.cookie_file, dir.path().join("fb_cookies.json"));
            assert_eq!(config.watch.settle, Duration::from_secs(5));
            assert_eq!(config.watch.feed_timeout, Duration::from_secs(15));
            assert_eq!(config.chat_id, "-100200300");
            assert_eq!(config.bot_token, "123:abc");
        }

        #[test]
        fn test_explicit_cookie_file_and_interval() {
            let dir = tempfile::tempdir().unwrap();
            let profile_dir = dir.path().to_str().unwrap();

            let config = AppConfig::try_from(
                parse(
                    profile_dir,
                    &["--cookie-file", "./my_cookies.json", "--interval-secs", "30"],
                )
                .unwrap(),
            )
            .unwrap();

            assert_eq!(
                config.watch.cookie_file,
                std::path::PathBuf::from("./my_cookies.json")
            );
            assert_eq!(config.watch.interval, Duration::from_secs(30));
        }

        #[test]
        fn test_interval_out_of_range() {
            let dir = tempfile::tempdir().unwrap();
            let profile_dir = dir.path().to_str().unwrap();

            assert!(parse(profile_dir, &["--interval-secs", "5"]).is_err());
            assert!(parse(profile_dir, &["--interval-secs", "61"]).is_err());
        }

        #[test]
        fn test_invalid_config_fails_fast() {
            let dir = tempfile::tempdir().unwrap();
            let profile_dir = dir.path().to_str().unwrap();

            let mut arg = parse(profile_dir, &[]).unwrap();
            arg.group_url = "not a url".to_string();
            assert!(AppConfig::try_from(arg).is_err());

            let mut arg = parse(profile_dir, &[]).unwrap();
            arg.group_url = "ftp://www.facebook.com/groups/123456".to_string();
            assert!(AppConfig::try_from(arg).is_err());

            let missing = dir.path().join("missing");
            let arg = parse(missing.to_str().unwrap(), &[]).unwrap();
            let err = AppConfig::try_from(arg).unwrap_err();
            assert!(err.to_string().contains("profile directory"));

            let mut arg = parse(profile_dir, &[]).unwrap();
            arg.bot_token = "  ".to_string();
            assert!(AppConfig::try_from(arg).is_err());
        }
    }
}

use group_watch::notifier::{DesktopNotifier, NotifierList, TelegramNotifier};
use group_watch::session::HttpSessionFactory;

use clap::Parser;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use config::{AppConfig, Arg};

    use tracing_subscriber::FmtSubscriber;

    // tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // .envがあれば読み込む
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {:?}.", path);
    }

    // 設定の不備はループに入る前に落とす
    let AppConfig {
        watch,
        chat_id,
        bot_token,
        telegram_api_url,
        desktop_notify,
    } = AppConfig::try_from(Arg::parse())?;

    let mut notifier = NotifierList::new();
    notifier.append_notifier(TelegramNotifier::with_api_url(
        telegram_api_url,
        bot_token,
        chat_id,
    ));
    if desktop_notify {
        notifier.append_notifier(DesktopNotifier::default());
    }
    info!("{} notifiers configured.", notifier.len());

    let factory = HttpSessionFactory::new();

    group_watch::watch(watch, &factory, &notifier).await;

    Ok(())
}
