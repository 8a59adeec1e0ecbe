use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// The fields of a backend item that the feed prints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub comments: Vec<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

pub fn parse_posts(data: Value) -> serde_json::Result<Vec<Post>> {
    serde_json::from_value(data)
}

/// "just now", "5h ago", "3d ago", or the date for anything older than a week.
pub fn age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - created_at).num_hours();
    match hours {
        h if h < 1 => "just now".to_string(),
        h if h < 24 => format!("{}h ago", h),
        h if h < 168 => format!("{}d ago", h / 24),
        _ => created_at.format("%Y-%m-%d").to_string(),
    }
}

pub fn render(rank: usize, post: &Post, now: DateTime<Utc>) -> String {
    let mut line = format!("{:>3}. {}", rank, post.title);
    if let Some(url) = &post.url {
        line.push_str(&format!(" ({})", url));
    }

    let mut meta = format!("{} points", post.points);
    if let Some(author) = &post.author {
        meta.push_str(&format!(" by {}", author));
    }
    if let Some(created_at) = post.created_at {
        meta.push_str(&format!(" {}", age(created_at, now)));
    }
    meta.push_str(&format!(" | {} comments", post.comments.len()));

    format!("{}\n     {}", line, meta)
}

/// Render a page of posts ranked from 1. The backend does not report its
/// page size, so ranks restart on every page.
pub fn render_page(posts: &[Post], now: DateTime<Utc>) -> Vec<String> {
    posts
        .iter()
        .enumerate()
        .map(|(index, post)| render(index + 1, post, now))
        .collect()
}
