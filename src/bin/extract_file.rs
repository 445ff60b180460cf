use group_watch::{extract_post, Extraction};

use std::fs::File;
use std::io::Read;

/// 保存したhtmlから抽出結果を表示する．セレクタの確認用．
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "row.html".to_string());

    let mut file = File::open(&path)?;
    let mut html_string = String::new();

    file.read_to_string(&mut html_string)?;

    match extract_post(&html_string) {
        Extraction::Found(post) => {
            println!("author: {:?}, body: {:?}", post.author, post.body);
        }
        Extraction::NotFound(reason) => println!("not found: {}", reason),
        Extraction::TransientError(reason) => println!("error: {}", reason),
    }

    Ok(())
}
