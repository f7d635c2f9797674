//! Upstream record → [`Event`] mapping.
//!
//! The story APIs disagree on field names, so each target field has an ordered
//! list of candidate keys; the first non-empty candidate wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

use crate::models::{Event, EventLink, EventSource};

const ID: &[&str] = &["id", "event_id", "event_key"];
const TITLE: &[&str] = &["headline", "title"];
const SUMMARY: &[&str] = &["description", "summary"];
const CONTENT: &[&str] = &["content", "body"];
const URL: &[&str] = &["url", "link"];
const DATE: &[&str] = &["created_at", "date", "published_date", "timestamp"];
const SOURCE: &[&str] = &["publisher", "source"];
const IMAGE: &[&str] = &["imageUrl", "image_url", "image"];

/// Arrays scanned for an image URL when no image field is set.
const IMAGE_CONTAINERS: &[&str] = &["images", "media", "links"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Map one upstream record. Non-object records yield `None`.
pub fn map_event(raw: &Value) -> Option<Event> {
    let obj = raw.as_object()?;
    let url = first_string(obj, URL).unwrap_or_default();
    let id = first_string(obj, ID)
        .or_else(|| (!url.is_empty()).then(|| url.clone()))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Some(Event {
        id,
        title: first_string(obj, TITLE).unwrap_or_default(),
        summary: first_string(obj, SUMMARY).unwrap_or_default(),
        content: first_string(obj, CONTENT),
        url,
        image_url: first_string(obj, IMAGE).or_else(|| find_image(obj)),
        date: first_date(obj).unwrap_or_default(),
        source: first_string(obj, SOURCE),
        category: first_string(obj, &["category"]),
        tags: list(obj, "tags"),
        author: first_string(obj, &["author"]),
        links: list::<EventLink>(obj, "links"),
        article_ids: list(obj, "article_ids"),
        sources: list::<EventSource>(obj, "sources"),
    })
}

/// Normalize a timestamp so it carries an offset.
///
/// RFC 3339 input is kept verbatim, naive date-times are read as UTC, and
/// anything unrecognized passes through untouched.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    let has_offset = DateTime::parse_from_rfc3339(raw).is_ok();
    let date_only = NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok();
    if has_offset || date_only {
        return raw.to_string();
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_else(|| raw.to_string())
}

fn first_date(obj: &Map<String, Value>) -> Option<String> {
    DATE.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(normalize_date(s)),
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        _ => None,
    })
}

/// Epoch seconds, or milliseconds for values too large to be seconds.
fn from_epoch(value: i64) -> Option<String> {
    let dt = if value.abs() >= 100_000_000_000 {
        DateTime::<Utc>::from_timestamp_millis(value)
    } else {
        DateTime::<Utc>::from_timestamp(value, 0)
    }?;
    Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Elements of `obj[key]` that deserialize as `T`; others are skipped.
fn list<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Vec<T> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn find_image(obj: &Map<String, Value>) -> Option<String> {
    IMAGE_CONTAINERS
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(o) => o.get("url").and_then(Value::as_str),
            _ => None,
        })
        .find(|candidate| is_image_url(candidate))
        .map(str::to_string)
}

fn is_image_url(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    let path = url.path().to_ascii_lowercase();
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
}
