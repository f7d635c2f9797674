//! Subcommand bodies. Each writes its output to stdout.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use waveform_core::client::ApiClient;
use waveform_core::feed::{
    EventRepository, FeedClient, FeedFilter, InMemoryEventRepository, LoadOutcome,
};
use waveform_core::models::{Event, LinkPreview, channel_by_slug, channels};
use waveform_core::transport::ReqwestTransport;

use crate::cli::ServerArgs;
use crate::{Error, Result};

pub struct FeedOptions {
    pub breaking: bool,
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub pages: u32,
    pub offline: bool,
    pub json: bool,
}

fn api_client(server: &ServerArgs) -> Result<ApiClient> {
    let transport = ReqwestTransport::new(Duration::from_secs(server.timeout.max(1)))?;
    let client = ApiClient::new(Arc::new(transport), &server.server)?;
    log::debug!("using server {}", client.base_url());
    Ok(client)
}

pub async fn feed(options: FeedOptions, server: &ServerArgs) -> Result<()> {
    let mut filter = if options.breaking {
        FeedFilter::breaking_news()
    } else {
        FeedFilter::top_stories()
    };
    if let Some(slug) = &options.category {
        let channel = channel_by_slug(slug)
            .ok_or_else(|| Error::Custom(format!("unknown category: {slug}")))?;
        filter = filter.with_category(channel.slug);
    }
    if let Some(limit) = options.limit {
        filter = filter.with_limit(limit);
    }

    let repository: Arc<dyn EventRepository> = if options.offline {
        Arc::new(InMemoryEventRepository::with_fixtures())
    } else {
        Arc::new(api_client(server)?)
    };
    let client = FeedClient::new(repository, filter);

    let mut outcome = client.load_page(true).await;
    let mut loaded = 1;
    while loaded < options.pages && matches!(outcome, LoadOutcome::Loaded { .. }) {
        if !client.snapshot().has_more {
            break;
        }
        outcome = client.on_sentinel_visible().await;
        loaded += 1;
    }
    client.close();

    let snapshot = client.snapshot();
    if let Some(error) = snapshot.error.filter(|_| snapshot.items.is_empty()) {
        return Err(Error::Custom(error));
    }
    log::info!(
        "loaded {} events, more available: {}",
        snapshot.items.len(),
        snapshot.has_more
    );

    if options.json {
        for event in &snapshot.items {
            println!("{}", serde_json::to_string(event)?);
        }
    } else {
        print!("{}", render_events(&snapshot.items)?);
    }
    Ok(())
}

pub async fn article(id: &str, server: &ServerArgs) -> Result<()> {
    let value = api_client(server)?.article(id).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub async fn event(id: &str, server: &ServerArgs) -> Result<()> {
    let value = api_client(server)?.event(id).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub async fn preview(url: &str, context: Option<&str>, server: &ServerArgs) -> Result<()> {
    let preview = api_client(server)?.link_preview(url, context).await?;
    print!("{}", render_preview(&preview)?);
    Ok(())
}

pub fn channels_list() -> Result<()> {
    let mut out = String::new();
    for channel in channels() {
        writeln!(out, "{:<14} {}", channel.slug, channel.name)?;
    }
    print!("{out}");
    Ok(())
}

pub fn render_events(events: &[Event]) -> Result<String> {
    let mut out = String::new();
    for (i, event) in events.iter().enumerate() {
        writeln!(out, "[{}] {}", i + 1, event.title)?;
        let mut meta = Vec::new();
        if let Some(source) = &event.source {
            meta.push(source.as_str());
        }
        if !event.date.is_empty() {
            meta.push(event.date.as_str());
        }
        if let Some(category) = &event.category {
            meta.push(category.as_str());
        }
        if !meta.is_empty() {
            writeln!(out, "    {}", meta.join(" | "))?;
        }
        if !event.url.is_empty() {
            writeln!(out, "    {}", event.url)?;
        }
    }
    Ok(out)
}

fn render_preview(preview: &LinkPreview) -> Result<String> {
    let mut out = String::new();
    let fields = [
        ("title", &preview.title),
        ("description", &preview.description),
        ("site", &preview.site_name),
        ("image", &preview.image),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            writeln!(out, "{label:<12} {value}")?;
        }
    }
    Ok(out)
}
