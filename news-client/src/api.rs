use crate::config::ClientConfig;
use crate::error::Result;
use crate::manager::{CacheManager, CacheStats};
use crate::request::ApiRequest;
use crate::transport::{SurfTransport, Transport};
use getset::Getters;
use serde_json::{json, Value};
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};

/// Which listing of items to page through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FeedType {
    #[default]
    Main,
    Newest,
    Ask,
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Vote {
    #[strum(serialize = "upVote")]
    Up,
    #[strum(serialize = "downVote")]
    Down,
}

impl From<bool> for Vote {
    fn from(is_upvote: bool) -> Self {
        if is_upvote {
            Vote::Up
        } else {
            Vote::Down
        }
    }
}

/// Client for the news board backend. Every call goes through one shared
/// [`CacheManager`], so repeated and concurrent identical calls hit the
/// network at most once per TTL.
#[derive(Clone, Getters)]
pub struct NewsClient {
    #[get = "pub"]
    api_base: String,
    #[get = "pub"]
    current_user: Option<String>,
    manager: CacheManager,
}

impl Default for NewsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsClient {
    /// Create a new NewsClient against the default backend
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let transport = Arc::new(SurfTransport::new(config.timeout));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            current_user: config.current_user,
            manager: CacheManager::new(transport, config.cache),
        }
    }

    pub fn set_current_user(&mut self, user: Option<String>) {
        self.current_user = user;
    }

    pub fn manager(&self) -> &CacheManager {
        &self.manager
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn page_request(&self, path: &str, category: &str, page: u32) -> ApiRequest {
        ApiRequest::put(self.url(path)).with_json(json!({
            "pageNumber": page,
            "cat": category,
        }))
    }

    fn vote_request(&self, collection: &str, id: &str, vote: Vote) -> ApiRequest {
        ApiRequest::put(self.url(&format!(
            "/{}/{}/{}",
            collection,
            vote,
            urlencoding::encode(id)
        )))
        .with_json(json!({ "currentUserName": self.current_user }))
    }

    /// Items of a category, one page at a time
    pub async fn items(&self, category: &str, page: u32, feed: FeedType) -> Result<Value> {
        let request = self.page_request(&format!("/items/{}/pages/cat", feed), category, page);
        self.manager.fetch(&request).await
    }

    pub async fn jobs(&self, category: &str, page: u32) -> Result<Value> {
        let request = self.page_request("/jobs/jobs/newest/pages/cat", category, page);
        self.manager.fetch(&request).await
    }

    pub async fn comments(&self, category: &str, page: u32) -> Result<Value> {
        let request = self.page_request("/comments/comments/newest/pages/cat", category, page);
        self.manager.fetch(&request).await
    }

    pub async fn vote_item(&self, item_id: &str, vote: Vote) -> Result<Value> {
        let request = self.vote_request("items", item_id, vote);
        self.manager.fetch(&request).await
    }

    pub async fn vote_comment(&self, comment_id: &str, vote: Vote) -> Result<Value> {
        let request = self.vote_request("comments", comment_id, vote);
        self.manager.fetch(&request).await
    }

    pub async fn submit_item(&self, item: Value) -> Result<Value> {
        let request = ApiRequest::post(self.url("/items")).with_json(item);
        self.manager.fetch(&request).await
    }

    pub async fn submit_comment(&self, comment: Value) -> Result<Value> {
        let request = ApiRequest::post(self.url("/comments")).with_json(comment);
        self.manager.fetch(&request).await
    }

    pub async fn submit_reply(&self, reply: Value) -> Result<Value> {
        let request = ApiRequest::post(self.url("/replies")).with_json(reply);
        self.manager.fetch(&request).await
    }

    /// Single item together with its comments
    pub async fn item_with_details(&self, item_id: &str) -> Result<Value> {
        let request =
            ApiRequest::get(self.url(&format!("/items/{}", urlencoding::encode(item_id))));
        self.manager.fetch(&request).await
    }

    /// Single comment together with its replies
    pub async fn comment_with_replies(&self, comment_id: &str) -> Result<Value> {
        let request =
            ApiRequest::get(self.url(&format!("/comments/{}", urlencoding::encode(comment_id))));
        self.manager.fetch(&request).await
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<Value> {
        let request =
            ApiRequest::delete(self.url(&format!("/items/{}", urlencoding::encode(item_id))));
        self.manager.fetch(&request).await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<Value> {
        let request =
            ApiRequest::delete(self.url(&format!("/comments/{}", urlencoding::encode(comment_id))));
        self.manager.fetch(&request).await
    }

    pub async fn delete_reply(&self, reply_id: &str) -> Result<Value> {
        let request =
            ApiRequest::delete(self.url(&format!("/replies/{}", urlencoding::encode(reply_id))));
        self.manager.fetch(&request).await
    }

    /// Clear cached responses whose key contains `pattern`, or all of them
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        self.manager.invalidate(pattern)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.manager.stats()
    }

    pub fn evict_expired_cache(&self) -> usize {
        self.manager.evict_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::MockTransport;
    use std::str::FromStr;
    use strum::IntoEnumIterator;
    use surf::http::Method;

    const BASE: &str = "https://api.example.com";

    fn client(transport: &Arc<MockTransport>) -> NewsClient {
        let config = ClientConfig {
            current_user: Some("alice".to_string()),
            ..ClientConfig::new(format!("{BASE}/"))
        };
        NewsClient::with_transport(config, transport.clone())
    }

    #[test]
    fn test_feed_type_names() {
        let names: Vec<_> = FeedType::iter().map(|feed| feed.to_string()).collect();
        assert_eq!(names, ["main", "newest", "ask", "show"]);
        assert_eq!(FeedType::from_str("ask").unwrap(), FeedType::Ask);
        assert_eq!(FeedType::default(), FeedType::Main);
        assert_eq!(Vote::from(true).to_string(), "upVote");
        assert_eq!(Vote::from(false).to_string(), "downVote");
    }

    #[tokio::test]
    async fn test_listing_requests() {
        let transport = Arc::new(MockTransport::returning(json!([])));
        let client = client(&transport);

        client.items("AI", 2, FeedType::Newest).await.unwrap();
        client.jobs("AI", 1).await.unwrap();
        client.comments("Crypto", 3).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(*sent[0].method(), Method::Put);
        assert_eq!(sent[0].url(), "https://api.example.com/items/newest/pages/cat");
        assert_eq!(sent[0].body(), &Some(json!({ "pageNumber": 2, "cat": "AI" })));
        assert_eq!(sent[1].url(), "https://api.example.com/jobs/jobs/newest/pages/cat");
        assert_eq!(sent[2].url(), "https://api.example.com/comments/comments/newest/pages/cat");
        assert_eq!(sent[2].body(), &Some(json!({ "pageNumber": 3, "cat": "Crypto" })));
    }

    #[tokio::test]
    async fn test_vote_requests_carry_user() {
        let transport = Arc::new(MockTransport::returning(json!({ "ok": true })));
        let mut client = client(&transport);

        client.vote_item("x1", Vote::Up).await.unwrap();
        client.set_current_user(None);
        client.vote_comment("c 1", Vote::Down).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].url(), "https://api.example.com/items/upVote/x1");
        assert_eq!(sent[0].body(), &Some(json!({ "currentUserName": "alice" })));
        assert_eq!(sent[1].url(), "https://api.example.com/comments/downVote/c%201");
        assert_eq!(sent[1].body(), &Some(json!({ "currentUserName": null })));
    }

    #[tokio::test]
    async fn test_submit_detail_and_delete_requests() {
        let transport = Arc::new(MockTransport::returning(json!({})));
        let client = client(&transport);

        client
            .submit_item(json!({ "title": "Rust 2.0", "url": "https://example.com" }))
            .await
            .unwrap();
        client.submit_comment(json!({ "text": "nice" })).await.unwrap();
        client.submit_reply(json!({ "text": "agreed" })).await.unwrap();
        client.item_with_details("x1").await.unwrap();
        client.comment_with_replies("c1").await.unwrap();
        client.delete_item("x1").await.unwrap();
        client.delete_comment("c1").await.unwrap();
        client.delete_reply("r1").await.unwrap();

        let sent: Vec<_> = transport
            .sent()
            .iter()
            .map(|request| (*request.method(), request.url().clone()))
            .collect();
        assert_eq!(
            sent,
            [
                (Method::Post, format!("{BASE}/items")),
                (Method::Post, format!("{BASE}/comments")),
                (Method::Post, format!("{BASE}/replies")),
                (Method::Get, format!("{BASE}/items/x1")),
                (Method::Get, format!("{BASE}/comments/c1")),
                (Method::Delete, format!("{BASE}/items/x1")),
                (Method::Delete, format!("{BASE}/comments/c1")),
                (Method::Delete, format!("{BASE}/replies/r1")),
            ]
        );
    }

    #[tokio::test]
    async fn test_detail_and_delete_do_not_share_cache() {
        let transport = Arc::new(MockTransport::returning(json!({ "id": "x1" })));
        let client = client(&transport);

        client.item_with_details("x1").await.unwrap();
        client.delete_item("x1").await.unwrap();
        client.item_with_details("x1").await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(client.cache_stats().size, 2);
    }

    #[tokio::test]
    async fn test_clear_cache_by_pattern() {
        let transport = Arc::new(MockTransport::returning(json!([])));
        let client = client(&transport);

        client.items("AI", 1, FeedType::Main).await.unwrap();
        client.comment_with_replies("c1").await.unwrap();
        assert_eq!(client.cache_stats().size, 2);

        assert_eq!(client.clear_cache(Some("/items/")), 1);
        assert_eq!(client.cache_stats().size, 1);

        client.items("AI", 1, FeedType::Main).await.unwrap();
        assert_eq!(transport.calls(), 3);

        assert_eq!(client.clear_cache(None), 2);
    }
}
