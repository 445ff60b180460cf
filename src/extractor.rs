use crate::error::Error;
use crate::session::Session;
use crate::Post;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const FEED_SELECTOR: &str = r#"div[role='feed']"#;
const POST_SELECTOR: &str = r#"div[role='feed'] > div"#;
const AUTHOR_SELECTOR: &str = r#"div[data-ad-rendering-role='profile_name']"#;
const BODY_SELECTOR: &str = r#"div[data-ad-rendering-role='story_message']"#;

/// 先頭(ピン留め・広告の可能性が高い)を飛ばして2番目のポストを取る
const POST_INDEX: usize = 1;

static INLINE_SPACE_PAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static LINE_BREAK_PAT: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n[\s\u{a0}]*").unwrap());

/// ポストが見つからなかった理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    FewerThanTwoPosts { found: usize },
    MissingAuthor,
    MissingBody,
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FewerThanTwoPosts { found } => {
                write!(f, "expected at least two posts, found {}", found)
            }
            Self::MissingAuthor => write!(f, "{} is missing or empty", AUTHOR_SELECTOR),
            Self::MissingBody => write!(f, "{} is missing or empty", BODY_SELECTOR),
        }
    }
}

/// 抽出の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(Post),
    NotFound(NotFoundReason),
    TransientError(String),
}

impl Extraction {
    pub fn post(&self) -> Option<&Post> {
        match self {
            Self::Found(post) => Some(post),
            _ => None,
        }
    }

    pub fn into_post(self) -> Option<Post> {
        match self {
            Self::Found(post) => Some(post),
            _ => None,
        }
    }
}

/// 描画された文字列に近づけるため空白をまとめてtrimする．
fn normalize_text(raw: &str) -> String {
    let collapsed = INLINE_SPACE_PAT.replace_all(raw, " ");
    let collapsed = LINE_BREAK_PAT.replace_all(&collapsed, "\n");
    collapsed.trim().to_string()
}

/// 前後で改行される要素
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol",
    "p", "pre", "section", "table", "tr", "ul",
];

/// テキストノードを連結する．brとブロック要素の境界は改行にする．
fn push_rendered_text(element: ElementRef, buffer: &mut String) {
    for child in element.children() {
        if let Node::Text(text) = child.value() {
            buffer.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if name == "br" {
                buffer.push('\n');
                continue;
            }

            let is_block = BLOCK_ELEMENTS.contains(&name);
            if is_block {
                buffer.push('\n');
            }
            push_rendered_text(child, buffer);
            if is_block {
                buffer.push('\n');
            }
        }
    }
}

fn element_text(element: ElementRef) -> String {
    let mut buffer = String::new();
    push_rendered_text(element, &mut buffer);

    normalize_text(&buffer)
}

/// htmlにフィードのコンテナが存在するか
pub fn has_feed(source: &str) -> Result<bool, Error> {
    let document = Html::parse_document(source);
    let feed_selector = Selector::parse(FEED_SELECTOR)?;

    Ok(document.select(&feed_selector).next().is_some())
}

/// htmlから2番目のポストを抽出する．
pub fn extract_post(source: &str) -> Extraction {
    match try_extract_post(source) {
        Ok(extraction) => extraction,
        Err(e) => Extraction::TransientError(e.to_string()),
    }
}

fn try_extract_post(source: &str) -> Result<Extraction, Error> {
    let document = Html::parse_document(source);

    let post_selector = Selector::parse(POST_SELECTOR)?;
    let author_selector = Selector::parse(AUTHOR_SELECTOR)?;
    let body_selector = Selector::parse(BODY_SELECTOR)?;

    let posts = document.select(&post_selector).collect::<Vec<_>>();
    debug!("found {} post containers", posts.len());

    let Some(post) = posts.get(POST_INDEX) else {
        return Ok(Extraction::NotFound(NotFoundReason::FewerThanTwoPosts {
            found: posts.len(),
        }));
    };

    let author = match post.select(&author_selector).next().map(element_text) {
        Some(author) if !author.is_empty() => author,
        _ => return Ok(Extraction::NotFound(NotFoundReason::MissingAuthor)),
    };
    let body = match post.select(&body_selector).next().map(element_text) {
        Some(body) if !body.is_empty() => body,
        _ => return Ok(Extraction::NotFound(NotFoundReason::MissingBody)),
    };

    Ok(Extraction::Found(Post { author, body }))
}

/// フィードのコンテナが現れるまで待ってから抽出する．
/// 存在を確認するだけなので，描画途中の場合はNotFoundになりうる．
pub async fn wait_and_extract(
    session: &mut dyn Session,
    timeout: Duration,
    poll: Duration,
) -> Extraction {
    let deadline = Instant::now() + timeout;

    loop {
        let source = match session.page_source().await {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not read page source: {}", e);
                return Extraction::TransientError(e.to_string());
            }
        };

        match has_feed(&source) {
            Ok(true) => {
                info!("Parsing html source");
                let extraction = extract_post(&source);
                info!("Finished parsing source html.");
                return extraction;
            }
            Ok(false) => {}
            Err(e) => return Extraction::TransientError(e.to_string()),
        }

        let now = Instant::now();
        if now >= deadline {
            let reason = format!(
                "feed container did not appear within {}s",
                timeout.as_secs()
            );
            warn!("{}", reason);
            return Extraction::TransientError(reason);
        }

        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}
