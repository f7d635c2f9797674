//! Link preview shapes.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/link-preview`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkPreviewRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Where the preview will be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewContext {
    #[default]
    Default,
    /// Compact card layout; the card already shows an image, so none is returned.
    Card,
}

impl PreviewContext {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("card") => PreviewContext::Card,
            _ => PreviewContext::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewContext::Default => "default",
            PreviewContext::Card => "card",
        }
    }
}

/// Open Graph / Twitter-card metadata scraped from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPreview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LinkPreview {
    /// Drop fields the given context must not receive.
    pub fn for_context(mut self, context: PreviewContext) -> Self {
        if context == PreviewContext::Card {
            self.image = None;
        }
        self
    }
}
