//! Page assembly and output.
//!
//! [`initialize`] runs the whole pipeline once against an [`AssetSource`]:
//!
//! 1. load `data.json` and `config.json` (failures leave an empty state)
//! 2. fill in the profile header and footer
//! 3. publish head metadata
//! 4. render every section into its mount
//! 5. wire interaction bindings
//! 6. stagger the card entrance animation
//!
//! Steps 3 onward sit behind a failure boundary: an error is logged and the
//! main region is replaced with [`FAILURE_MESSAGE`]. Head, profile and footer
//! keep whatever was already written.
//!
//! [`build`] writes the page to `index.html` and copies the site's static
//! assets next to it. [`check`] validates a site directory without writing.

use crate::config::{BuildConfig, CONFIG_FILENAME};
use crate::icons::IconProvider;
use crate::interaction::{
    self, AFFILIATE_SECTION_ID, AFFILIATE_TOGGLE_ID, BINDINGS_ID, Bindings, Collapsible,
    TOAST_ID, TOGGLE_ICON_ID,
};
use crate::loader::{AssetSource, DirSource, LoadError, load_data, try_load_data};
use crate::metadata::{self, Head, MetadataError, script_safe};
use crate::render::{
    COPY_ICON, Container, EXTERNAL_LINK_ICON, RenderContext, Section, render_section,
};
use crate::types::{AppState, Footer, Profile, SiteConfig};
use log::{error, info, warn};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const FAILURE_MESSAGE: &str = "Failed to load content. Please try again later.";

/// Id of the region the failure boundary replaces.
pub const MAIN_ID: &str = "main-content";

const CSS: &str = include_str!("../static/style.css");

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("walking site directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A section and the container it renders into.
#[derive(Debug, Clone)]
pub struct Mount {
    pub section: Section,
    pub container: Container,
}

/// The assembled page, ready to be serialized.
#[derive(Debug, Clone)]
pub struct Page {
    lang: String,
    stylesheets: Vec<String>,
    head: Head,
    profile: Option<Profile>,
    footer: Option<Footer>,
    mounts: Vec<Mount>,
    affiliate: Collapsible,
    bindings: Bindings,
    failure: Option<&'static str>,
}

impl Page {
    /// An empty page: fallback title, empty mounts, no bindings.
    pub fn new(options: &BuildConfig) -> Self {
        let mut head = Head::new();
        head.set_title(&options.page.fallback_title);
        Self {
            lang: options.page.lang.clone(),
            stylesheets: options.page.stylesheets.clone(),
            head,
            profile: None,
            footer: None,
            mounts: Section::ALL
                .iter()
                .map(|&section| Mount {
                    section,
                    container: Container::new(section.mount_id()),
                })
                .collect(),
            affiliate: Collapsible::default(),
            bindings: Bindings::empty(&options.interaction),
            failure: None,
        }
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    pub fn mounts_mut(&mut self) -> &mut [Mount] {
        &mut self.mounts
    }

    pub fn mount(&self, section: Section) -> Option<&Container> {
        self.mounts
            .iter()
            .find(|m| m.section == section)
            .map(|m| &m.container)
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure
    }

    /// Total cards and icons rendered across all sections.
    pub fn rendered(&self) -> usize {
        self.mounts.iter().map(|m| m.container.len()).sum()
    }

    /// Copy the profile header and footer text from the site config.
    pub fn populate(&mut self, config: &SiteConfig) {
        self.profile = config.profile.clone();
        self.footer = config.footer.clone();
    }

    /// Replace the main region with the failure message.
    pub fn fail(&mut self) {
        for mount in &mut self.mounts {
            if mount.section != Section::Social {
                mount.container.clear();
            }
        }
        self.bindings.clear_targets();
        self.failure = Some(FAILURE_MESSAGE);
    }

    /// Serialize the complete document.
    pub fn to_html(&self) -> Result<String, PageError> {
        let bindings = script_safe(&self.bindings.to_json()?);
        let title = self.head.title().unwrap_or_default();

        let markup = html! {
            (DOCTYPE)
            html lang=(self.lang) {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (title) }
                    (self.head.render_tags())
                    @for href in &self.stylesheets {
                        link rel="stylesheet" href=(href);
                    }
                    style { (PreEscaped(CSS)) }
                }
                body {
                    div.page {
                        (self.render_profile())
                        main id=(MAIN_ID) {
                            @if let Some(message) = self.failure {
                                p.load-error role="alert" { (message) }
                            } @else {
                                (self.render_sections())
                            }
                        }
                        (self.render_footer())
                    }
                    div.toast id=(TOAST_ID) role="status" aria-live="polite" {
                        span {}
                    }
                    script id=(BINDINGS_ID) type="application/json" { (PreEscaped(bindings)) }
                    script { (PreEscaped(interaction::SCRIPT)) }
                }
            }
        };
        Ok(markup.into_string())
    }

    fn render_profile(&self) -> Markup {
        let profile = self.profile.as_ref();
        let image = profile.and_then(|p| p.image.as_ref());
        let social = self.mount(Section::Social);
        html! {
            header.profile {
                img #profileImage.profile-image src=[image.map(|i| &i.src)] alt=[image.map(|i| &i.alt)];
                h1 #profileName.profile-name {
                    @if let Some(name) = profile.and_then(|p| p.name.as_deref()) { (name) }
                }
                p #profileBio.profile-bio {
                    @if let Some(bio) = profile.and_then(|p| p.bio.as_deref()) { (bio_markup(bio)) }
                }
                nav #socialIcons.social-icons aria-label="Social links" {
                    @if let Some(container) = social { (container.render()) }
                }
            }
        }
    }

    fn render_sections(&self) -> Markup {
        html! {
            @for mount in &self.mounts {
                @let container = &mount.container;
                @match mount.section {
                    Section::Social => {}
                    Section::Main => {
                        div.link-list id=(container.id()) { (container.render()) }
                    }
                    Section::Affiliates => {
                        section.link-section.affiliate-block hidden[container.is_empty()] {
                            button.section-toggle id=(AFFILIATE_TOGGLE_ID) type="button"
                                aria-controls=(AFFILIATE_SECTION_ID) {
                                h2 { (mount.section.heading().unwrap_or_default()) }
                                span class=(classes("toggle-icon", self.affiliate.icon_class()))
                                    id=(TOGGLE_ICON_ID) aria-hidden="true" { "▾" }
                            }
                            div class=(classes("collapsible", self.affiliate.section_class()))
                                id=(AFFILIATE_SECTION_ID) {
                                div.link-list id=(container.id()) { (container.render()) }
                            }
                        }
                    }
                    other => {
                        section.link-section hidden[container.is_empty()] {
                            h2 { (other.heading().unwrap_or_default()) }
                            div.link-list id=(container.id()) { (container.render()) }
                        }
                    }
                }
            }
        }
    }

    fn render_footer(&self) -> Markup {
        let footer = self.footer.as_ref();
        html! {
            footer.site-footer {
                span #footerText {
                    @if let Some(text) = footer.and_then(|f| f.text.as_deref()) { (text) }
                }
                " "
                a #footerLink href=(footer.map_or("#", Footer::link_href)) {
                    @if let Some(text) = footer.and_then(|f| f.link_text.as_deref()) { (text) }
                }
            }
        }
    }
}

fn classes(base: &str, extra: Option<&str>) -> String {
    match extra {
        Some(extra) => format!("{base} {extra}"),
        None => base.to_string(),
    }
}

/// Bio text with every `@handle` emphasized.
pub fn bio_markup(bio: &str) -> Markup {
    let mut parts: Vec<(bool, &str)> = Vec::new();
    let mut rest = bio;
    while let Some(at) = rest.find('@') {
        let after = &rest[at + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            parts.push((false, &rest[..=at]));
        } else {
            parts.push((false, &rest[..at]));
            parts.push((true, &rest[at..=at + len]));
        }
        rest = &after[len..];
    }
    parts.push((false, rest));

    html! {
        @for (handle, text) in parts {
            @if handle {
                span.font-semibold { (text) }
            } @else {
                (text)
            }
        }
    }
}

/// Build the page from `source`. Never fails; see the module docs.
pub fn initialize(source: &dyn AssetSource, options: &BuildConfig) -> Page {
    let mut page = Page::new(options);
    let state = load_data(source, &options.data);
    if state.catalog.is_empty() {
        warn!("no link entries to render");
    }
    page.populate(&state.config);
    if let Err(e) = assemble(&mut page, source, &state, options) {
        error!("Error initializing page: {e}");
        page.fail();
    }
    page
}

fn assemble(
    page: &mut Page,
    source: &dyn AssetSource,
    state: &AppState,
    options: &BuildConfig,
) -> Result<(), PageError> {
    metadata::publish(&mut page.head, state, options)?;

    let icons = IconProvider::new(source, &options.data.icons);
    let ctx = RenderContext {
        icons: &icons,
        policy: options.render.fetch_policy,
        min_placeholders: options.render.min_placeholders,
    };
    for mount in &mut page.mounts {
        render_section(&mut mount.container, mount.section, &state.catalog, &ctx);
    }

    page.bindings = interaction::wire(page, &options.interaction);
    interaction::apply_animations(page, options.interaction.stagger_ms);
    Ok(())
}

/// Result of a build, for CLI output.
#[derive(Debug)]
pub struct BuildReport {
    pub index: PathBuf,
    /// Rendered children per section, in page order.
    pub sections: Vec<(Section, usize)>,
    /// Copied assets, relative to the output directory.
    pub assets: Vec<PathBuf>,
    pub failed: bool,
}

/// Write `index.html` and copy static assets from `site_dir` into `output_dir`.
pub fn build(
    site_dir: &Path,
    output_dir: &Path,
    options: &BuildConfig,
) -> Result<BuildReport, PageError> {
    let source = DirSource::new(site_dir);
    let page = initialize(&source, options);

    fs::create_dir_all(output_dir)?;
    let index = output_dir.join("index.html");
    fs::write(&index, page.to_html()?)?;
    info!("wrote {}", index.display());

    let assets = copy_assets(site_dir, output_dir, options)?;
    Ok(BuildReport {
        index,
        sections: page
            .mounts
            .iter()
            .map(|m| (m.section, m.container.len()))
            .collect(),
        assets,
        failed: page.failure.is_some(),
    })
}

/// Copy every file under `site_dir` except the data files and build config.
fn copy_assets(
    site_dir: &Path,
    output_dir: &Path,
    options: &BuildConfig,
) -> Result<Vec<PathBuf>, PageError> {
    let skip = [
        normalized(Path::new(&options.data.links)),
        normalized(Path::new(&options.data.site)),
        PathBuf::from(CONFIG_FILENAME),
        PathBuf::from("index.html"),
    ];
    // Building into a directory inside the site must not copy the output into itself
    let output = output_dir.canonicalize().ok();

    let mut copied = Vec::new();
    let walker = WalkDir::new(site_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| output.is_none() || e.path().canonicalize().ok() != output);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(site_dir) else {
            continue;
        };
        if skip.iter().any(|s| s == rel) {
            continue;
        }
        let dest = output_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        copied.push(rel.to_path_buf());
    }
    Ok(copied)
}

/// `path` without `.` components, so `./assets/x` matches `assets/x`.
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// What `check` found in a site directory.
#[derive(Debug)]
pub struct CheckReport {
    /// Entries per section and how many of them would render.
    pub sections: Vec<(Section, usize, usize)>,
    /// Icons that would fall back to the circle, with the reason.
    pub missing_icons: Vec<(String, String)>,
    pub has_site: bool,
    pub has_profile: bool,
}

/// Load the site strictly and report what would be built.
///
/// Unlike [`initialize`], unreadable or malformed data files are an error here.
/// Missing icons are reported, not fatal.
pub fn check(site_dir: &Path, options: &BuildConfig) -> Result<CheckReport, PageError> {
    let source = DirSource::new(site_dir);
    let state = try_load_data(&source, &options.data)?;
    let catalog = &state.catalog;

    let sections = Section::ALL
        .iter()
        .map(|&s| (s, s.entries(catalog).len(), s.visible_entries(catalog).len()))
        .collect();

    let mut names: BTreeSet<&str> = Section::ALL
        .iter()
        .flat_map(|s| s.visible_entries(catalog))
        .map(|e| e.icon.as_str())
        .collect();
    names.insert(COPY_ICON);
    names.insert(EXTERNAL_LINK_ICON);

    let icons = IconProvider::new(&source, &options.data.icons);
    let missing_icons = names
        .into_iter()
        .filter_map(|name| match icons.try_load(name) {
            Ok(_) => None,
            Err(e) => {
                warn!("icon {name:?}: {e}");
                Some((name.to_string(), e.to_string()))
            }
        })
        .collect();

    Ok(CheckReport {
        sections,
        missing_icons,
        has_site: state.config.site.is_some(),
        has_profile: state.config.profile.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MemorySource, sample_config_json, sample_data_json, sample_source};
    use tempfile::TempDir;

    fn sample_page() -> Page {
        initialize(&sample_source(), &BuildConfig::default())
    }

    fn main_region(html: &str) -> &str {
        let start = html.find(r#"<main id="main-content">"#).unwrap();
        let end = html.find("</main>").unwrap();
        &html[start..end]
    }

    #[test]
    fn initialize_renders_every_section_in_order() {
        let page = sample_page();
        assert!(page.failure().is_none());
        let expect = [
            (Section::Social, 2),
            (Section::Main, 3),
            (Section::Projects, 2),
            (Section::OpenSource, 1),
            (Section::Books, 1),
            (Section::Sponsors, 1),
            (Section::Affiliates, 1),
        ];
        for (section, count) in expect {
            assert_eq!(page.mount(section).unwrap().len(), count, "{section:?}");
        }
        assert_eq!(page.rendered(), 11);
    }

    #[test]
    fn no_container_is_left_reserved() {
        let page = sample_page();
        assert!(page.mounts().iter().all(|m| !m.container.is_reserved()));
        let html = page.to_html().unwrap();
        assert!(!main_region(&html).contains(r#"class="skeleton-card""#));
    }

    #[test]
    fn document_has_profile_and_footer() {
        let html = sample_page().to_html().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Ada's Links</title>"));
        assert!(html.contains(r#"id="profileName""#));
        assert!(html.contains(">Ada</h1>"));
        assert!(html.contains(r#"src="assets/img/ada.jpg""#));
        assert!(html.contains(r#"<span class="font-semibold">@babbage</span>"#));
        assert!(html.contains(r#"href="https://github.com/ada/links""#));
        assert!(html.contains(">Made with care</span>"));
    }

    #[test]
    fn document_embeds_bindings_and_script() {
        let html = sample_page().to_html().unwrap();
        assert!(html.contains(r#"<script id="page-bindings" type="application/json">"#));
        assert!(html.contains(r#""durationMs":3000"#));
        assert!(html.contains(r#"id="toast""#));
        assert!(html.contains(r#"id="structured-data""#));
    }

    #[test]
    fn affiliate_section_starts_collapsed() {
        let html = sample_page().to_html().unwrap();
        assert!(html.contains(r#"id="affiliateToggle""#));
        assert!(html.contains(r#"<div class="collapsible" id="affiliateSection">"#));
    }

    #[test]
    fn data_load_failure_renders_empty_page() {
        let page = initialize(&MemorySource::new(), &BuildConfig::default());
        assert!(page.failure().is_none());
        assert_eq!(page.rendered(), 0);
        assert_eq!(page.head().title(), Some("Links"));
        let html = page.to_html().unwrap();
        assert!(html.contains(r#"<div class="link-list" id="mainLinks"></div>"#));
        assert!(html.contains(r##"id="footerLink" href="#""##));
    }

    #[test]
    fn empty_sections_are_hidden() {
        let source = MemorySource::new()
            .with("assets/js/data.json", r#"{"mainLinks": []}"#)
            .with("assets/js/config.json", sample_config_json());
        let html = initialize(&source, &BuildConfig::default()).to_html().unwrap();
        assert!(html.contains(r#"<section class="link-section" hidden>"#));
    }

    #[test]
    fn failure_boundary_replaces_only_main() {
        let mut options = BuildConfig::default();
        // A zero-sized PNG canvas can't be allocated, so publishing fails
        options.favicon.png_size = 0;
        let page = initialize(&sample_source(), &options);
        assert_eq!(page.failure(), Some(FAILURE_MESSAGE));
        assert!(page.bindings().copy.is_empty());

        let html = page.to_html().unwrap();
        let main = main_region(&html);
        assert!(main.contains(FAILURE_MESSAGE));
        assert!(!main.contains("link-card"));
        // Header, profile and footer survive
        assert!(html.contains("<title>Ada's Links</title>"));
        assert!(html.contains(">Ada</h1>"));
        assert!(html.contains(">Made with care</span>"));
    }

    #[test]
    fn initialize_is_repeatable() {
        let a = sample_page().to_html().unwrap();
        let b = sample_page().to_html().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bio_emphasizes_handles() {
        let html = bio_markup("Hi @ada_l, mail me@ host @ end").into_string();
        assert_eq!(
            html,
            r#"Hi <span class="font-semibold">@ada_l</span>, mail me@ host @ end"#
        );
    }

    #[test]
    fn bio_escapes_text() {
        let html = bio_markup("<b>@x</b>").into_string();
        assert_eq!(html, r#"&lt;b&gt;<span class="font-semibold">@x</span>&lt;/b&gt;"#);
    }

    fn write_site(dir: &Path) {
        fs::create_dir_all(dir.join("assets/js")).unwrap();
        fs::create_dir_all(dir.join("assets/img/icons")).unwrap();
        fs::write(dir.join("assets/js/data.json"), sample_data_json()).unwrap();
        fs::write(dir.join("assets/js/config.json"), sample_config_json()).unwrap();
        fs::write(
            dir.join("assets/img/icons/github.svg"),
            crate::test_helpers::PLAIN_ICON,
        )
        .unwrap();
        fs::write(dir.join("assets/img/ada.jpg"), b"jpeg").unwrap();
        fs::write(dir.join(CONFIG_FILENAME), "").unwrap();
    }

    #[test]
    fn build_writes_index_and_copies_assets() {
        let site = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_site(site.path());

        let report = build(site.path(), out.path(), &BuildConfig::default()).unwrap();
        assert!(!report.failed);
        assert!(out.path().join("index.html").exists());
        assert!(out.path().join("assets/img/ada.jpg").exists());
        assert!(out.path().join("assets/img/icons/github.svg").exists());
        assert!(!out.path().join("assets/js/data.json").exists());
        assert!(!out.path().join("assets/js/config.json").exists());
        assert!(!out.path().join(CONFIG_FILENAME).exists());
        assert_eq!(report.assets.len(), 2);
    }

    #[test]
    fn build_skips_data_files_given_with_dot_prefix() {
        let site = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_site(site.path());
        let mut options = BuildConfig::default();
        options.data.links = "./assets/js/data.json".into();
        options.data.site = "./assets/js/config.json".into();

        let report = build(site.path(), out.path(), &options).unwrap();
        assert!(!report.failed);
        assert!(!out.path().join("assets/js/data.json").exists());
        assert!(!out.path().join("assets/js/config.json").exists());
        assert_eq!(report.assets.len(), 2);
    }

    #[test]
    fn build_into_site_subdirectory_does_not_recurse() {
        let site = TempDir::new().unwrap();
        write_site(site.path());
        let out = site.path().join("dist");
        fs::create_dir_all(&out).unwrap();

        let report = build(site.path(), &out, &BuildConfig::default()).unwrap();
        assert!(report.assets.iter().all(|p| !p.starts_with("dist")));
        assert!(out.join("index.html").exists());
    }

    #[test]
    fn check_reports_sections_and_missing_icons() {
        let site = TempDir::new().unwrap();
        write_site(site.path());
        let report = check(site.path(), &BuildConfig::default()).unwrap();
        assert!(report.has_site && report.has_profile);
        let social = report
            .sections
            .iter()
            .find(|(s, _, _)| *s == Section::Social)
            .unwrap();
        assert_eq!((social.1, social.2), (3, 2));
        let missing: Vec<_> = report.missing_icons.iter().map(|(n, _)| n.as_str()).collect();
        assert!(missing.contains(&"blog"));
        assert!(!missing.contains(&"github"));
    }

    #[test]
    fn check_fails_on_malformed_data() {
        let site = TempDir::new().unwrap();
        write_site(site.path());
        fs::write(site.path().join("assets/js/data.json"), "{not json").unwrap();
        assert!(matches!(
            check(site.path(), &BuildConfig::default()),
            Err(PageError::Load(_))
        ));
    }
}
