//! Feed categories.

use serde::Serialize;

/// A browsable feed category. The slug is sent upstream as a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub id: &'static str,
    pub name: &'static str,
    pub slug: &'static str,
}

const CHANNELS: &[Channel] = &[
    Channel {
        id: "1",
        name: "Technology",
        slug: "technology",
    },
    Channel {
        id: "2",
        name: "Business",
        slug: "business",
    },
    Channel {
        id: "3",
        name: "Science",
        slug: "science",
    },
    Channel {
        id: "4",
        name: "Health",
        slug: "health",
    },
    Channel {
        id: "5",
        name: "Entertainment",
        slug: "entertainment",
    },
    Channel {
        id: "6",
        name: "Sports",
        slug: "sports",
    },
    Channel {
        id: "7",
        name: "Politics",
        slug: "politics",
    },
    Channel {
        id: "8",
        name: "World",
        slug: "world",
    },
];

pub fn channels() -> &'static [Channel] {
    CHANNELS
}

pub fn channel_by_slug(slug: &str) -> Option<&'static Channel> {
    CHANNELS.iter().find(|c| c.slug.eq_ignore_ascii_case(slug))
}
