//! Paginated event feed.
//!
//! [`FeedClient`] threads the upstream cursor through successive page loads,
//! merges mapped events into one list and discards responses that arrive after
//! a reset or close. Pages come from an [`EventRepository`]: the remote
//! [`ApiClient`](crate::client::ApiClient) or the fixture-backed
//! [`InMemoryEventRepository`].

mod client;
mod mapping;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::client::ClientError;
use crate::models::{Cursor, FeedPage, FeedRequest};

pub use client::{FeedClient, FeedSnapshot, LoadOutcome};
pub use mapping::{map_event, normalize_date};
pub use memory::InMemoryEventRepository;

/// Page size requested when the filter does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Which upstream feed to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    #[default]
    TopStories,
    BreakingNews,
}

impl FeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::TopStories => "top-stories",
            FeedMode::BreakingNews => "breaking-news",
        }
    }
}

/// What a feed instance shows. Changing it means a full reset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedFilter {
    pub mode: FeedMode,
    /// Channel slug, sent upstream as the only tag.
    pub category: Option<String>,
    pub limit: Option<u32>,
}

impl FeedFilter {
    pub fn top_stories() -> Self {
        Self::default()
    }

    pub fn breaking_news() -> Self {
        Self {
            mode: FeedMode::BreakingNews,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Upstream request body for the page after `cursor`.
    pub fn to_request(&self, cursor: Option<Cursor>) -> FeedRequest {
        FeedRequest {
            last_event_key: cursor,
            min_significance: 0,
            limit: self.limit,
            tags: self.category.clone().map(|c| vec![c]),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),
}

/// Source of raw feed pages.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn fetch_page(&self, mode: FeedMode, request: &FeedRequest)
    -> Result<FeedPage, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_builds_upstream_body() {
        let req = FeedFilter::top_stories()
            .with_category("science")
            .with_limit(10)
            .to_request(Some(Cursor::from("k1")));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "last_event_key": "k1",
                "min_significance": 0,
                "limit": 10,
                "tags": ["science"],
            })
        );
    }

    #[test]
    fn unfiltered_request_omits_tags() {
        let req = FeedFilter::breaking_news().to_request(None);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("tags").is_none());
        assert_eq!(v["last_event_key"], serde_json::Value::Null);
    }
}
