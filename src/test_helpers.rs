//! Shared test utilities.
//!
//! Provides an in-memory [`AssetSource`], sample `data.json` / `config.json`
//! documents, and a ready-made [`AppState`] built from them.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = sample_source();
//! let state = sample_state();
//! assert_eq!(state.catalog.main_links.len(), 3);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use crate::loader::{AssetSource, FetchError};
use crate::types::AppState;

/// In-memory asset source that records every fetch.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    pub fetches: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), content.into());
        self
    }

    /// Number of times `path` was requested.
    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|p| *p == path)
            .count()
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.fetches.lock().unwrap().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

/// A plain 24×24 icon without presentation attributes.
pub const PLAIN_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0h24v24H0z"/></svg>"#;

pub fn sample_data_json() -> &'static str {
    r#"{
  "mainLinks": [
    {"id": "github", "type": "external", "title": "GitHub", "description": "Code and experiments",
     "url": "https://github.com/ada", "icon": "github", "bgColor": "bg-gray-800"},
    {"id": "discord", "type": "discord", "title": "Discord", "description": "Click to copy username",
     "url": "", "icon": "discord", "bgColor": "bg-indigo-600", "discordUsername": "ada#1815"},
    {"id": "blog", "type": "external", "title": "Blog", "description": "Notes on engines",
     "url": "https://ada.dev", "icon": "blog", "bgColor": "bg-green-600"}
  ],
  "socialLinks": [
    {"id": "mastodon", "type": "external", "title": "Mastodon", "description": "",
     "url": "https://mastodon.social/@ada", "icon": "mastodon", "bgColor": "bg-purple-600"},
    {"id": "empty", "type": "external", "title": "Nowhere", "description": "",
     "url": "", "icon": "github", "bgColor": ""},
    {"id": "x", "type": "external", "title": "X", "description": "",
     "url": "https://x.com/ada", "icon": "x", "bgColor": "bg-black"}
  ],
  "projects": [
    {"id": "engine", "type": "external", "title": "Analytical Engine", "description": "A general purpose computer",
     "url": "https://example.com/engine", "icon": "engine", "bgColor": "bg-blue-600"},
    {"id": "notes", "type": "external", "title": "Notes", "description": "Annotated translation",
     "url": "https://example.com/notes", "icon": "book", "bgColor": "bg-yellow-600"}
  ],
  "affiliateLinks": [
    {"id": "host", "type": "external", "title": "Hosting", "description": "Where this page lives",
     "url": "https://example.com/host?ref=ada", "icon": "server", "bgColor": "bg-red-600"}
  ],
  "sponsorsAffiliates": [
    {"id": "sponsor", "type": "external", "title": "Sponsor me", "description": "Support the work",
     "url": "https://example.com/sponsor", "icon": "heart", "bgColor": "bg-pink-600"}
  ],
  "openSourceSoftware": [
    {"id": "loom", "type": "external", "title": "Loom", "description": "Punch card tooling",
     "url": "https://example.com/loom", "icon": "github", "bgColor": "bg-gray-700"}
  ],
  "books": [
    {"id": "sketch", "type": "external", "title": "Sketch of the Engine", "description": "1843",
     "url": "https://example.com/sketch", "icon": "book", "bgColor": "bg-amber-700"}
  ]
}"#
}

pub fn sample_config_json() -> &'static str {
    r##"{
  "site": {
    "title": "Ada's Links",
    "description": "Links to everything Ada",
    "keywords": "ada, engines",
    "author": "Ada Lovelace",
    "robots": "index, follow",
    "language": "English",
    "canonical": "https://links.ada.dev/",
    "url": "https://links.ada.dev/",
    "type": "website",
    "imageUrl": "https://links.ada.dev/og.png",
    "siteName": "Ada's Links",
    "locale": "en_GB",
    "twitterHandle": "@ada",
    "favicon": {"emoji": "🚀", "backgroundColor": "#112233"}
  },
  "profile": {
    "name": "Ada",
    "fullName": "Ada Lovelace",
    "username": "ada",
    "bio": "Writing programs for @babbage and friends",
    "title": "Analyst",
    "location": "London",
    "image": {"src": "assets/img/ada.jpg", "alt": "Portrait of Ada"}
  },
  "footer": {"text": "Made with care", "linkText": "Source", "linkUrl": "https://github.com/ada/links"}
}"##
}

/// Source with both JSON files and a handful of icons (some intentionally missing).
pub fn sample_source() -> MemorySource {
    MemorySource::new()
        .with("assets/js/data.json", sample_data_json())
        .with("assets/js/config.json", sample_config_json())
        .with("assets/img/icons/github.svg", PLAIN_ICON)
        .with(
            "assets/img/icons/discord.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><circle cx="8" cy="8" r="4"/></svg>"#,
        )
        .with("assets/img/icons/external-link.svg", PLAIN_ICON)
        .with("assets/img/icons/copy.svg", PLAIN_ICON)
}

/// The parsed sample documents.
pub fn sample_state() -> AppState {
    AppState {
        catalog: serde_json::from_str(sample_data_json()).unwrap(),
        config: serde_json::from_str(sample_config_json()).unwrap(),
    }
}
