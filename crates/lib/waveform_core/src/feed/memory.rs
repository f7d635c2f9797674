//! Fixture-backed [`EventRepository`].

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{DEFAULT_PAGE_SIZE, EventRepository, FeedError, FeedMode, map_event};
use crate::models::{Cursor, FeedPage, FeedRequest};

/// Serves fixed event lists with offset cursors.
///
/// Used for offline reading and as the fallback data set when the story API
/// is unavailable. Category filters match an event's `category` or `tags`
/// case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    top_stories: Vec<Value>,
    breaking_news: Vec<Value>,
    fetches: AtomicUsize,
}

impl InMemoryEventRepository {
    pub fn new(top_stories: Vec<Value>, breaking_news: Vec<Value>) -> Self {
        Self {
            top_stories,
            breaking_news,
            fetches: AtomicUsize::new(0),
        }
    }

    /// The bundled sample events.
    pub fn with_fixtures() -> Self {
        let events = fixtures();
        let breaking = events.iter().take(3).cloned().collect();
        Self::new(events, breaking)
    }

    /// Number of pages served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn events_for(&self, mode: FeedMode) -> &[Value] {
        match mode {
            FeedMode::TopStories => &self.top_stories,
            FeedMode::BreakingNews => &self.breaking_news,
        }
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn fetch_page(
        &self,
        mode: FeedMode,
        request: &FeedRequest,
    ) -> Result<FeedPage, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let offset = match &request.last_event_key {
            None => 0,
            Some(cursor) => cursor
                .as_str()
                .and_then(|s| s.parse::<usize>().ok())
                .ok_or_else(|| FeedError::InvalidCursor(cursor.to_string()))?,
        };
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1) as usize;
        let tags = request.tags.as_deref().unwrap_or_default();

        let matching: Vec<&Value> = self
            .events_for(mode)
            .iter()
            .filter(|ev| {
                tags.is_empty()
                    || map_event(ev).is_some_and(|e| tags.iter().any(|t| e.matches_category(t)))
            })
            .collect();

        let events: Vec<Value> = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|ev| (*ev).clone())
            .collect();
        let next = offset + events.len();
        let last_event_key =
            (next < matching.len()).then(|| Cursor::from(next.to_string().as_str()));

        Ok(FeedPage {
            events,
            last_event_key,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn fixture(
    id: &str,
    title: &str,
    source: &str,
    date: &str,
    summary: &str,
    slug: &str,
    category: &str,
    image_text: &str,
) -> Value {
    json!({
        "id": id,
        "title": title,
        "source": source,
        "date": date,
        "summary": summary,
        "url": format!("https://example.com/{slug}"),
        "category": category,
        "imageUrl": format!("https://placehold.co/600x400/3498db/ffffff?text={image_text}"),
    })
}

fn fixtures() -> Vec<Value> {
    vec![
        fixture(
            "1",
            "Global Climate Summit Yields New Emissions Targets",
            "Reuters",
            "2023-05-12",
            "World leaders from 195 countries have agreed to more ambitious carbon emission reduction targets at the latest UN Climate Summit.",
            "climate-summit",
            "Politics",
            "Climate+Summit",
        ),
        fixture(
            "2",
            "Tech Giants Form AI Ethics Coalition",
            "The Verge",
            "2023-05-11",
            "Five major technology companies announced a coalition dedicated to establishing ethical guidelines for artificial intelligence development.",
            "ai-coalition",
            "Technology",
            "AI+Ethics",
        ),
        fixture(
            "3",
            "Global Chip Shortage Expected to Ease by Q4",
            "Bloomberg",
            "2023-05-10",
            "Industry analysts predict the global semiconductor shortage will begin to ease by the fourth quarter as new production capacity comes online.",
            "chip-shortage",
            "Business",
            "Chip+Shortage",
        ),
        fixture(
            "4",
            "New Breakthrough in Quantum Computing Announced",
            "Nature",
            "2023-05-09",
            "Researchers have achieved a significant breakthrough in quantum error correction, bringing fault-tolerant quantum computing closer to reality.",
            "quantum-breakthrough",
            "Science",
            "Quantum+Computing",
        ),
        fixture(
            "5",
            "European Parliament Passes Digital Markets Act",
            "Financial Times",
            "2023-05-08",
            "The Digital Markets Act introduces new obligations for gatekeeper platforms to ensure fair competition in digital markets.",
            "eu-digital-act",
            "Politics",
            "EU+Legislation",
        ),
        fixture(
            "6",
            "Space Tourism Company Completes First Commercial Flight",
            "CNN",
            "2023-05-07",
            "A space tourism company has completed its first commercial flight, carrying six passengers to the edge of space.",
            "space-tourism",
            "Technology",
            "Space+Tourism",
        ),
        fixture(
            "7",
            "Global Renewable Energy Investment Hits Record High",
            "The Economist",
            "2023-05-06",
            "Global investment in renewable energy reached a record $500 billion in 2022, with solar and wind accounting for more than 70% of the total.",
            "renewable-investment",
            "Business",
            "Renewable+Energy",
        ),
        fixture(
            "8",
            "Major Cybersecurity Breach Affects Financial Institutions",
            "Wall Street Journal",
            "2023-05-05",
            "A sophisticated cyber attack has compromised the systems of several major financial institutions.",
            "cybersecurity-breach",
            "Technology",
            "Cybersecurity",
        ),
    ]
}
