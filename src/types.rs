//! Data model shared by every stage of the page pipeline.
//!
//! Two JSON documents feed the generator:
//!
//! - `config.json` → [`SiteConfig`]: page metadata, profile, footer.
//! - `data.json` → [`Catalog`]: ordered link collections, one per section.
//!
//! Both documents are owned by the page author, so every field is optional and
//! unknown keys are ignored. A missing field means "skip the corresponding
//! update"; the only defaults are the favicon background color and the
//! document title fallback, both resolved through accessors here rather than
//! scattered through the renderers.

use serde::{Deserialize, Serialize};

/// Favicon background used when `site.favicon.backgroundColor` is absent.
pub const DEFAULT_FAVICON_BACKGROUND: &str = "#667eea";

/// Parsed `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub site: Option<Site>,
    pub profile: Option<Profile>,
    pub footer: Option<Footer>,
}

/// Page-level metadata: title, SEO tags, social cards, favicon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Site {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    pub robots: Option<String>,
    pub language: Option<String>,
    pub canonical: Option<String>,
    pub url: Option<String>,
    /// Open Graph object type (`og:type`), e.g. `"website"`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub image_url: Option<String>,
    pub site_name: Option<String>,
    pub locale: Option<String>,
    pub twitter_handle: Option<String>,
    pub favicon: Option<Favicon>,
}

impl Site {
    /// The configured emoji favicon, if one is set and non-empty.
    pub fn favicon_emoji(&self) -> Option<&str> {
        self.favicon
            .as_ref()
            .and_then(|f| f.emoji.as_deref())
            .filter(|e| !e.is_empty())
    }

    /// Favicon background color, or `fallback` when none is set.
    pub fn favicon_background<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.favicon
            .as_ref()
            .and_then(|f| f.background_color.as_deref())
            .filter(|c| !c.is_empty())
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Favicon {
    pub emoji: Option<String>,
    pub background_color: Option<String>,
}

/// The person the page is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    /// Short display name shown in the header and used as manifest `short_name`.
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    /// Job title (`jobTitle` in structured data).
    pub title: Option<String>,
    pub location: Option<String>,
    pub image: Option<ProfileImage>,
}

impl Profile {
    /// Name for structured data: full name first, display name otherwise.
    pub fn person_name(&self) -> Option<&str> {
        self.full_name.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Footer {
    pub text: Option<String>,
    pub link_text: Option<String>,
    pub link_url: Option<String>,
}

impl Footer {
    /// Footer link target; `#` when no URL is configured.
    pub fn link_href(&self) -> &str {
        self.link_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or("#")
    }
}

/// How a link entry behaves when activated.
///
/// Only `discord` changes behavior (copy-to-clipboard instead of navigation).
/// Unrecognized kinds are kept verbatim so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkKind {
    #[default]
    External,
    Discord,
    Other(String),
}

impl LinkKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::External => "external",
            Self::Discord => "discord",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for LinkKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "external" => Self::External,
            "discord" => Self::Discord,
            _ => Self::Other(s),
        }
    }
}

impl Serialize for LinkKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LinkKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// One renderable row: a social link, project, sponsor, book, ...
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    /// Icon name, resolved to `{icons_dir}/{icon}.svg`.
    pub icon: String,
    /// CSS class(es) for the icon swatch background.
    pub bg_color: String,
    pub discord_username: Option<String>,
}

impl LinkEntry {
    pub fn is_discord(&self) -> bool {
        self.kind == LinkKind::Discord
    }

    /// The URL if present and non-blank.
    pub fn href(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// What the copy action puts on the clipboard for a discord entry.
    pub fn copy_text(&self) -> &str {
        self.discord_username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Parsed `data.json`: one ordered collection per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Catalog {
    pub main_links: Vec<LinkEntry>,
    pub social_links: Vec<LinkEntry>,
    pub projects: Vec<LinkEntry>,
    pub affiliate_links: Vec<LinkEntry>,
    pub sponsors_affiliates: Vec<LinkEntry>,
    pub open_source_software: Vec<LinkEntry>,
    pub books: Vec<LinkEntry>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Entry count across every collection.
    pub fn total(&self) -> usize {
        self.main_links.len()
            + self.social_links.len()
            + self.projects.len()
            + self.affiliate_links.len()
            + self.sponsors_affiliates.len()
            + self.open_source_software.len()
            + self.books.len()
    }

    /// URLs of externally navigating profile links (`sameAs` in structured data).
    pub fn profile_urls(&self) -> Vec<&str> {
        self.main_links
            .iter()
            .chain(&self.social_links)
            .filter(|l| l.kind == LinkKind::External)
            .filter_map(LinkEntry::href)
            .collect()
    }
}

/// Everything the loader produced, passed by reference to each stage.
///
/// Either fully loaded or fully empty; a failed load never leaves a partial
/// state behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: SiteConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_kind_parses_known_and_unknown() {
        let entries: Vec<LinkEntry> = serde_json::from_str(
            r#"[{"type": "external"}, {"type": "discord"}, {"type": "newsletter"}]"#,
        )
        .unwrap();
        assert_eq!(entries[0].kind, LinkKind::External);
        assert_eq!(entries[1].kind, LinkKind::Discord);
        assert_eq!(entries[2].kind, LinkKind::Other("newsletter".into()));
        assert_eq!(entries[2].kind.as_str(), "newsletter");
    }

    #[test]
    fn link_entry_uses_camel_case_keys() {
        let entry: LinkEntry = serde_json::from_str(
            r#"{"id": "discord", "type": "discord", "bgColor": "bg-indigo-600",
                "discordUsername": "someone#0001"}"#,
        )
        .unwrap();
        assert_eq!(entry.bg_color, "bg-indigo-600");
        assert_eq!(entry.copy_text(), "someone#0001");
    }

    #[test]
    fn copy_text_falls_back_to_id() {
        let entry = LinkEntry {
            id: "discord".into(),
            kind: LinkKind::Discord,
            ..Default::default()
        };
        assert_eq!(entry.copy_text(), "discord");
    }

    #[test]
    fn href_ignores_blank_urls() {
        let mut entry = LinkEntry::default();
        assert_eq!(entry.href(), None);
        entry.url = Some("   ".into());
        assert_eq!(entry.href(), None);
        entry.url = Some("https://example.com".into());
        assert_eq!(entry.href(), Some("https://example.com"));
    }

    #[test]
    fn catalog_missing_keys_are_empty() {
        let catalog: Catalog =
            serde_json::from_str(r#"{"projects": [{"id": "a", "title": "A"}]}"#).unwrap();
        assert_eq!(catalog.projects.len(), 1);
        assert!(catalog.social_links.is_empty());
        assert_eq!(catalog.total(), 1);
    }

    #[test]
    fn profile_urls_only_external_with_url() {
        let catalog: Catalog = serde_json::from_str(
            r#"{
                "mainLinks": [
                    {"type": "external", "url": "https://github.com/x"},
                    {"type": "discord"}
                ],
                "socialLinks": [
                    {"type": "external", "url": ""},
                    {"type": "external", "url": "https://x.com/x"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            catalog.profile_urls(),
            vec!["https://github.com/x", "https://x.com/x"]
        );
    }

    #[test]
    fn favicon_background_defaults() {
        let site = Site::default();
        assert_eq!(
            site.favicon_background(DEFAULT_FAVICON_BACKGROUND),
            "#667eea"
        );
        let site = Site {
            favicon: Some(Favicon {
                emoji: Some("🚀".into()),
                background_color: Some("#000".into()),
            }),
            ..Default::default()
        };
        assert_eq!(site.favicon_background(DEFAULT_FAVICON_BACKGROUND), "#000");
        assert_eq!(site.favicon_emoji(), Some("🚀"));
    }

    #[test]
    fn person_name_prefers_full_name() {
        let profile = Profile {
            name: Some("Ada".into()),
            full_name: Some("Ada Lovelace".into()),
            ..Default::default()
        };
        assert_eq!(profile.person_name(), Some("Ada Lovelace"));
    }

    #[test]
    fn footer_href_defaults_to_hash() {
        assert_eq!(Footer::default().link_href(), "#");
    }
}
