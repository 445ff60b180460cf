use crate::Post;

use tracing::{info, warn};

/// 最後に抽出に成功したポスト．新しさの判定の基準になる．
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedState {
    pub last_author: Option<String>,
    pub last_body: Option<String>,
}

impl ObservedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 一度もポストを観測していないか
    pub fn is_empty(&self) -> bool {
        self.last_author.is_none() && self.last_body.is_none()
    }
}

impl From<&Post> for ObservedState {
    fn from(post: &Post) -> Self {
        Self {
            last_author: Some(post.author.clone()),
            last_body: Some(post.body.clone()),
        }
    }
}

/// 判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// ポストが取れなかった
    Absent,
    /// 新しいポスト
    Novel(Post),
    /// 前回と同じポスト
    Duplicate,
}

/// 新しいポストかどうかを判定する．投稿者と本文のどちらかが変わっていれば新しいとみなす．
pub fn detect(post: Option<Post>, state: ObservedState) -> (Change, ObservedState) {
    let Some(post) = post else {
        warn!("No post found.");
        return (Change::Absent, state);
    };

    let same_author = state.last_author.as_deref() == Some(post.author.as_str());
    let same_body = state.last_body.as_deref() == Some(post.body.as_str());

    if same_author && same_body {
        info!("No new post detected. Same post as last time.");
        (Change::Duplicate, state)
    } else {
        let state = ObservedState::from(&post);
        (Change::Novel(post), state)
    }
}
