//! Document head publishing.
//!
//! [`Head`] is the page's `<head>` as a set of uniquely keyed tags: meta tags by
//! `name` or `property`, links by `rel` (plus `sizes` and `type`, so several
//! icon links can coexist), scripts by `id`. Every write is an upsert, which
//! makes [`publish`] idempotent: running it twice over the same state leaves
//! exactly one tag per key.
//!
//! ## What Gets Published
//!
//! | Source (`config.json`) | Tags |
//! |---|---|
//! | `site.title` (or fallback) | `<title>`, `meta[name=title]` |
//! | `site.description/keywords/author/robots/language` | `meta[name=…]` |
//! | `site.canonical` | `link[rel=canonical]` |
//! | `site.*` | Open Graph and Twitter `meta[property=…]` |
//! | `site.favicon.emoji` | SVG icon links, PNG fallback, `theme-color` |
//! | `site` + `profile` | `link[rel=manifest]`, `script#structured-data` |
//!
//! Absent values skip their tag; nothing is published with an empty value.
//! When `site` itself is missing only the fallback title is set.

use crate::config::BuildConfig;
use crate::favicon::{self, FaviconError, LINK_SIZES, MANIFEST_SIZES};
use crate::types::AppState;
use maud::{Markup, PreEscaped, html};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Id of the JSON-LD script tag.
pub const STRUCTURED_DATA_ID: &str = "structured-data";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("favicon: {0}")]
    Favicon(#[from] FaviconError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which attribute identifies a meta tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaAttr {
    Name,
    Property,
}

/// Identity of a head tag; at most one tag per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKey {
    Meta(MetaAttr, String),
    Link {
        rel: String,
        sizes: Option<String>,
        mime: Option<String>,
    },
    Script(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeadTag {
    Meta {
        attr: MetaAttr,
        name: String,
        content: String,
    },
    Link {
        rel: String,
        href: String,
        sizes: Option<String>,
        mime: Option<String>,
    },
    Script {
        id: String,
        mime: String,
        body: String,
    },
}

impl HeadTag {
    pub fn key(&self) -> TagKey {
        match self {
            Self::Meta { attr, name, .. } => TagKey::Meta(*attr, name.clone()),
            Self::Link {
                rel, sizes, mime, ..
            } => TagKey::Link {
                rel: rel.clone(),
                sizes: sizes.clone(),
                mime: mime.clone(),
            },
            Self::Script { id, .. } => TagKey::Script(id.clone()),
        }
    }

    fn render(&self) -> Markup {
        match self {
            Self::Meta {
                attr: MetaAttr::Name,
                name,
                content,
            } => html! { meta name=(name) content=(content); },
            Self::Meta {
                attr: MetaAttr::Property,
                name,
                content,
            } => html! { meta property=(name) content=(content); },
            Self::Link {
                rel,
                href,
                sizes,
                mime,
            } => html! { link rel=(rel) type=[mime.as_deref()] sizes=[sizes.as_deref()] href=(href); },
            Self::Script { id, mime, body } => html! {
                script id=(id) type=(mime) { (PreEscaped(script_safe(body))) }
            },
        }
    }
}

/// Keep `</script>` sequences inside embedded JSON from closing the tag.
pub(crate) fn script_safe(body: &str) -> String {
    body.replace("</", "<\\/")
}

/// The document head: title plus uniquely keyed tags in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Head {
    title: Option<String>,
    tags: Vec<HeadTag>,
}

impl Head {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    pub fn tags(&self) -> &[HeadTag] {
        &self.tags
    }

    pub fn get(&self, key: &TagKey) -> Option<&HeadTag> {
        self.tags.iter().find(|t| t.key() == *key)
    }

    /// Number of tags with the given key (0 or 1).
    pub fn count(&self, key: &TagKey) -> usize {
        self.tags.iter().filter(|t| t.key() == *key).count()
    }

    /// Insert a tag, or replace the existing tag with the same key in place.
    pub fn upsert(&mut self, tag: HeadTag) {
        let key = tag.key();
        match self.tags.iter_mut().find(|t| t.key() == key) {
            Some(existing) => *existing = tag,
            None => self.tags.push(tag),
        }
    }

    /// Set `meta[attr=name]`; skipped when `content` is absent or empty.
    pub fn upsert_meta(&mut self, attr: MetaAttr, name: &str, content: Option<&str>) {
        let Some(content) = content.filter(|c| !c.is_empty()) else {
            return;
        };
        self.upsert(HeadTag::Meta {
            attr,
            name: name.to_string(),
            content: content.to_string(),
        });
    }

    /// Set `link[rel]`; skipped when `href` is absent or empty.
    pub fn upsert_link(&mut self, rel: &str, href: Option<&str>) {
        self.upsert_icon_link(rel, None, None, href);
    }

    pub fn upsert_icon_link(
        &mut self,
        rel: &str,
        sizes: Option<&str>,
        mime: Option<&str>,
        href: Option<&str>,
    ) {
        let Some(href) = href.filter(|h| !h.is_empty()) else {
            return;
        };
        self.upsert(HeadTag::Link {
            rel: rel.to_string(),
            href: href.to_string(),
            sizes: sizes.map(str::to_string),
            mime: mime.map(str::to_string),
        });
    }

    pub fn upsert_script(&mut self, id: &str, mime: &str, body: String) {
        self.upsert(HeadTag::Script {
            id: id.to_string(),
            mime: mime.to_string(),
            body,
        });
    }

    /// Render every tag (not the title) in insertion order.
    pub fn render_tags(&self) -> Markup {
        html! {
            @for tag in &self.tags {
                (tag.render())
            }
        }
    }
}

/// Write every configured head tag for `state` into `head`.
pub fn publish(head: &mut Head, state: &AppState, options: &BuildConfig) -> Result<(), MetadataError> {
    let config = &state.config;
    let Some(site) = &config.site else {
        head.set_title(&options.page.fallback_title);
        return Ok(());
    };

    head.set_title(
        site.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&options.page.fallback_title),
    );
    use MetaAttr::{Name, Property};
    head.upsert_meta(Name, "title", site.title.as_deref());
    head.upsert_meta(Name, "description", site.description.as_deref());
    head.upsert_meta(Name, "keywords", site.keywords.as_deref());
    head.upsert_meta(Name, "author", site.author.as_deref());
    head.upsert_meta(Name, "robots", site.robots.as_deref());
    head.upsert_meta(Name, "language", site.language.as_deref());
    head.upsert_link("canonical", site.canonical.as_deref());

    let background = site.favicon_background(&options.favicon.default_background);
    if let Some(emoji) = site.favicon_emoji() {
        publish_favicon(head, emoji, background, options.favicon.png_size)?;
    }

    if config.profile.is_some() {
        let manifest = web_app_manifest(state, background);
        let json = serde_json::to_string_pretty(&manifest)?;
        head.upsert_link(
            "manifest",
            Some(&favicon::data_url("application/manifest+json", json.as_bytes())),
        );
    }

    head.upsert_meta(Property, "og:type", site.kind.as_deref());
    head.upsert_meta(Property, "og:url", site.url.as_deref());
    head.upsert_meta(Property, "og:title", site.title.as_deref());
    head.upsert_meta(Property, "og:description", site.description.as_deref());
    head.upsert_meta(Property, "og:image", site.image_url.as_deref());
    head.upsert_meta(Property, "og:site_name", site.site_name.as_deref());
    head.upsert_meta(Property, "og:locale", site.locale.as_deref());

    head.upsert_meta(Property, "twitter:card", Some("summary_large_image"));
    head.upsert_meta(Property, "twitter:url", site.url.as_deref());
    head.upsert_meta(Property, "twitter:title", site.title.as_deref());
    head.upsert_meta(Property, "twitter:description", site.description.as_deref());
    head.upsert_meta(Property, "twitter:image", site.image_url.as_deref());
    head.upsert_meta(Property, "twitter:creator", site.twitter_handle.as_deref());

    if let Some(data) = structured_data(state) {
        head.upsert_script(
            STRUCTURED_DATA_ID,
            "application/ld+json",
            serde_json::to_string(&data)?,
        );
    }
    Ok(())
}

fn publish_favicon(
    head: &mut Head,
    emoji: &str,
    background: &str,
    png_size: u32,
) -> Result<(), MetadataError> {
    let primary = favicon::svg_data_url(&favicon::primary_svg(emoji, background));
    head.upsert_link("icon", Some(&primary));
    head.upsert_link("shortcut icon", Some(&primary));

    for size in LINK_SIZES {
        let url = favicon::svg_data_url(&favicon::sized_svg(emoji, background, size));
        let sizes = format!("{size}x{size}");
        if size == 16 {
            // The generic icon ends up as the smallest variant
            head.upsert_link("icon", Some(&url));
        }
        if size == 180 {
            head.upsert_icon_link("apple-touch-icon", Some(&sizes), None, Some(&url));
        } else {
            head.upsert_icon_link("icon", Some(&sizes), Some("image/svg+xml"), Some(&url));
        }
    }

    let png = favicon::render_png(emoji, background, png_size)?;
    head.upsert_icon_link(
        "icon",
        Some(&format!("{png_size}x{png_size}")),
        Some("image/png"),
        Some(&favicon::data_url("image/png", &png)),
    );
    head.upsert_meta(MetaAttr::Name, "theme-color", Some(background));
    Ok(())
}

/// Web-app manifest for the page. Icons are listed only for emoji favicons.
pub fn web_app_manifest(state: &AppState, background: &str) -> Value {
    let site = state.config.site.as_ref();
    let profile = state.config.profile.as_ref();
    let emoji = site.and_then(|s| s.favicon_emoji());

    let icons: Vec<Value> = emoji
        .map(|emoji| {
            MANIFEST_SIZES
                .iter()
                .map(|&size| {
                    json!({
                        "src": favicon::svg_data_url(&favicon::sized_svg(emoji, background, size)),
                        "sizes": format!("{size}x{size}"),
                        "type": "image/svg+xml",
                        "purpose": if size == 192 { "any maskable" } else { "any" },
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut manifest = Map::new();
    insert_opt(&mut manifest, "name", site.and_then(|s| s.title.as_deref()));
    insert_opt(
        &mut manifest,
        "short_name",
        profile.and_then(|p| p.name.as_deref()),
    );
    insert_opt(
        &mut manifest,
        "description",
        site.and_then(|s| s.description.as_deref()),
    );
    manifest.insert("start_url".into(), json!("/"));
    manifest.insert("display".into(), json!("standalone"));
    manifest.insert("background_color".into(), json!(background));
    manifest.insert("theme_color".into(), json!(background));
    manifest.insert("icons".into(), Value::Array(icons));
    Value::Object(manifest)
}

/// JSON-LD `Person` describing the profile; `None` without both site and profile.
pub fn structured_data(state: &AppState) -> Option<Value> {
    let site = state.config.site.as_ref()?;
    let profile = state.config.profile.as_ref()?;

    let mut person = Map::new();
    person.insert("@context".into(), json!("https://schema.org"));
    person.insert("@type".into(), json!("Person"));
    insert_opt(&mut person, "name", profile.person_name());
    insert_opt(&mut person, "alternateName", profile.username.as_deref());
    insert_opt(&mut person, "description", profile.bio.as_deref());
    insert_opt(&mut person, "url", site.url.as_deref());
    insert_opt(&mut person, "image", site.image_url.as_deref());
    person.insert("sameAs".into(), json!(state.catalog.profile_urls()));
    insert_opt(&mut person, "jobTitle", profile.title.as_deref());
    person.insert(
        "worksFor".into(),
        json!({ "@type": "Organization", "name": "Self-employed" }),
    );
    if let Some(location) = profile.location.as_deref().filter(|l| !l.is_empty()) {
        person.insert(
            "homeLocation".into(),
            json!({ "@type": "Place", "name": location }),
        );
    }
    Some(Value::Object(person))
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        map.insert(key.to_string(), json!(v));
    }
}
