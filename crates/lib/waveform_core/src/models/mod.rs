//! Data model shared by the API, the feed client and the CLI.

pub mod channel;
pub mod event;
pub mod feed;
pub mod preview;

pub use channel::{Channel, channel_by_slug, channels};
pub use event::{Event, EventLink, EventSource};
pub use feed::{Cursor, FeedPage, FeedRequest};
pub use preview::{LinkPreview, LinkPreviewRequest, PreviewContext};
