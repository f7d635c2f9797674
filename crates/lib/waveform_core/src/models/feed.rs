//! Story API request and page shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque pagination token issued by the story API.
///
/// Usually a string, but kept as raw JSON so any upstream key shape threads
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub Value);

impl Cursor {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Cursor(Value::String(s.to_string()))
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Body sent to `top-stories` / `breaking-news`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRequest {
    /// `None` asks for the start of the feed.
    #[serde(default)]
    pub last_event_key: Option<Cursor>,
    #[serde(default)]
    pub min_significance: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// One page of raw upstream events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub events: Vec<Value>,
    /// `None` means there are no further pages.
    #[serde(default)]
    pub last_event_key: Option<Cursor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_request_sends_null_cursor() {
        let req = FeedRequest {
            last_event_key: None,
            min_significance: 0,
            limit: Some(20),
            tags: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({"last_event_key": null, "min_significance": 0, "limit": 20})
        );
    }

    #[test]
    fn null_cursor_in_page_means_no_more() {
        let page: FeedPage =
            serde_json::from_value(json!({"events": [], "last_event_key": null})).unwrap();
        assert!(page.last_event_key.is_none());
        let page: FeedPage = serde_json::from_value(json!({"events": []})).unwrap();
        assert!(page.last_event_key.is_none());
    }

    #[test]
    fn object_cursor_threads_through_unchanged() {
        let page: FeedPage = serde_json::from_value(
            json!({"events": [], "last_event_key": {"pk": "E#1", "sk": 42}}),
        )
        .unwrap();
        let cursor = page.last_event_key.unwrap();
        let req = FeedRequest {
            last_event_key: Some(cursor),
            min_significance: 0,
            limit: None,
            tags: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["last_event_key"], json!({"pk": "E#1", "sk": 42}));
    }

    #[test]
    fn cursor_displays_strings_bare() {
        assert_eq!(Cursor::from("abc").to_string(), "abc");
        assert_eq!(Cursor(json!({"k": 1})).to_string(), r#"{"k":1}"#);
    }
}
