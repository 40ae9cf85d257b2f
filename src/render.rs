//! Section rendering.
//!
//! Turns each catalog collection into markup for its mount point on the page.
//! Two variants exist:
//!
//! - **Cards** (`a.link-card`): icon swatch, title, description, and an
//!   affordance icon (`external-link` for navigable entries, `copy` for discord
//!   entries, which never navigate).
//! - **Icon row** (`a.social-icon`): icon only, labelled by the entry title.
//!   Entries without a URL are skipped.
//!
//! ## Layout Reservation
//!
//! A [`Container`] is first filled with skeleton rows (one per entry that will
//! render, at least `min_placeholders`) and then swapped to the finished
//! fragment in a single [`Container::commit`]. The container is never
//! observable half-built.
//!
//! Rendering order is input order. Nothing is sorted or deduplicated.

use crate::config::FetchPolicy;
use crate::icons::{Icon, IconProvider};
use crate::types::{Catalog, LinkEntry};
use log::debug;
use maud::{Markup, html};

/// Icon shown on cards that open a new tab.
pub const EXTERNAL_LINK_ICON: &str = "external-link";
/// Icon shown on cards that copy to the clipboard.
pub const COPY_ICON: &str = "copy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Cards,
    IconRow,
}

/// A page section: one catalog collection rendered into one mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Main,
    Social,
    Projects,
    Affiliates,
    Sponsors,
    OpenSource,
    Books,
}

impl Section {
    /// Every section, in page order.
    pub const ALL: [Section; 7] = [
        Section::Social,
        Section::Main,
        Section::Projects,
        Section::OpenSource,
        Section::Books,
        Section::Sponsors,
        Section::Affiliates,
    ];

    /// Id of the element the section renders into.
    pub fn mount_id(self) -> &'static str {
        match self {
            Self::Main => "mainLinks",
            Self::Social => "socialIcons",
            Self::Projects => "projectLinks",
            Self::Affiliates => "affiliateLinks",
            Self::Sponsors => "sponsorsAffiliateLinks",
            Self::OpenSource => "openSourceLinks",
            Self::Books => "bookLinks",
        }
    }

    /// Short name for CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Social => "Social",
            Self::Projects => "Projects",
            Self::Affiliates => "Affiliates",
            Self::Sponsors => "Sponsors",
            Self::OpenSource => "Open source",
            Self::Books => "Books",
        }
    }

    /// Visible heading; the main list and the icon row have none.
    pub fn heading(self) -> Option<&'static str> {
        match self {
            Self::Main | Self::Social => None,
            Self::Projects => Some("Projects"),
            Self::Affiliates => Some("Affiliate Links"),
            Self::Sponsors => Some("Sponsors & Affiliates"),
            Self::OpenSource => Some("Open Source Software"),
            Self::Books => Some("Books"),
        }
    }

    pub fn variant(self) -> Variant {
        match self {
            Self::Social => Variant::IconRow,
            _ => Variant::Cards,
        }
    }

    /// Affiliate and sponsor cards carry an accent border.
    pub fn is_accented(self) -> bool {
        matches!(self, Self::Affiliates | Self::Sponsors)
    }

    /// Sections hidden behind a toggle.
    pub fn is_collapsible(self) -> bool {
        self == Self::Affiliates
    }

    pub fn entries(self, catalog: &Catalog) -> &[LinkEntry] {
        match self {
            Self::Main => &catalog.main_links,
            Self::Social => &catalog.social_links,
            Self::Projects => &catalog.projects,
            Self::Affiliates => &catalog.affiliate_links,
            Self::Sponsors => &catalog.sponsors_affiliates,
            Self::OpenSource => &catalog.open_source_software,
            Self::Books => &catalog.books,
        }
    }

    /// The entries this section actually renders.
    pub fn visible_entries(self, catalog: &Catalog) -> Vec<&LinkEntry> {
        let entries = self.entries(catalog).iter();
        match self.variant() {
            Variant::Cards => entries.collect(),
            Variant::IconRow => entries
                .filter(|e| e.is_discord() || e.href().is_some())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    Empty,
    Reserved,
    Committed,
}

/// A link card and everything needed to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub entry: LinkEntry,
    pub icon: Icon,
    /// `external-link` or `copy`; absent on cards that do nothing.
    pub affordance: Option<Icon>,
    pub accent: bool,
    /// Entrance animation delay, set once the page is assembled.
    pub enter_delay_ms: Option<u64>,
}

impl Card {
    pub fn render(&self) -> Markup {
        let entry = &self.entry;
        let style = self.enter_delay_ms.map(|ms| format!("--enter-delay: {ms}ms"));
        let body = html! {
            div.card-row {
                div class=(swatch_class(&entry.bg_color)) {
                    (self.icon.to_markup(Some("card-icon")))
                }
                div.card-text {
                    h3.card-title { (entry.title) }
                    @if !entry.description.is_empty() {
                        p.card-description { (entry.description) }
                    }
                }
                @if let Some(affordance) = &self.affordance {
                    (affordance.to_markup(Some("card-affordance")))
                }
            }
        };

        if entry.is_discord() {
            html! {
                a.link-card.link-card--action.link-card--accent[self.accent]
                    href="#" role="button" style=[style] data-id=(entry.id)
                    data-action="copy" data-copy=(entry.copy_text()) {
                    (body)
                }
            }
        } else {
            let href = entry.href();
            html! {
                a.link-card.link-card--accent[self.accent]
                    href=[href]
                    target=[href.map(|_| "_blank")]
                    rel=[href.map(|_| "noopener noreferrer")]
                    style=[style]
                    data-id=(entry.id) {
                    (body)
                }
            }
        }
    }
}

fn swatch_class(bg_color: &str) -> String {
    match bg_color.trim() {
        "" => "icon-swatch".to_string(),
        color => format!("icon-swatch {color}"),
    }
}

/// One icon in the social row. Only built for entries with a URL, or
/// discord entries, which copy instead.
#[derive(Debug, Clone, PartialEq)]
pub struct IconLink {
    pub entry: LinkEntry,
    pub icon: Icon,
}

impl IconLink {
    pub fn render(&self) -> Markup {
        let entry = &self.entry;
        let swatch = html! {
            span class=(swatch_class(&entry.bg_color)) {
                (self.icon.to_markup(Some("social-icon-svg")))
            }
        };
        if entry.is_discord() {
            html! {
                a.social-icon href="#" role="button" aria-label=(entry.title)
                    title=(entry.title) data-id=(entry.id)
                    data-action="copy" data-copy=(entry.copy_text()) {
                    (swatch)
                }
            }
        } else {
            html! {
                a.social-icon href=[entry.href()] target="_blank" rel="noopener noreferrer"
                    aria-label=(entry.title) title=(entry.title) data-id=(entry.id) {
                    (swatch)
                }
            }
        }
    }
}

/// A child of a mount point.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Skeleton,
    Card(Card),
    IconLink(IconLink),
}

impl Node {
    pub fn render(&self) -> Markup {
        match self {
            Self::Skeleton => skeleton(),
            Self::Card(card) => card.render(),
            Self::IconLink(link) => link.render(),
        }
    }
}

/// A mount point's children.
#[derive(Debug, Clone)]
pub struct Container {
    id: &'static str,
    children: Vec<Node>,
    fill: Fill,
}

impl Container {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            children: Vec::new(),
            fill: Fill::Empty,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// True while skeleton rows are standing in for content.
    pub fn is_reserved(&self) -> bool {
        self.fill == Fill::Reserved
    }

    /// Replace the children with `max(expected, minimum)` skeleton rows.
    pub fn reserve(&mut self, expected: usize, minimum: usize) {
        self.children = vec![Node::Skeleton; expected.max(minimum)];
        self.fill = Fill::Reserved;
    }

    /// Swap in the finished fragment.
    pub fn commit(&mut self, fragment: Vec<Node>) {
        self.children = fragment;
        self.fill = Fill::Committed;
    }

    /// Drop all children.
    pub fn clear(&mut self) {
        self.children.clear();
        self.fill = Fill::Empty;
    }

    /// The cards in this container, in order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.children.iter().filter_map(|node| match node {
            Node::Card(card) => Some(card),
            _ => None,
        })
    }

    pub fn render(&self) -> Markup {
        html! {
            @for child in &self.children {
                (child.render())
            }
        }
    }
}

fn skeleton() -> Markup {
    html! {
        div.skeleton-card aria-hidden="true" {
            div.skeleton-icon {}
            div.skeleton-lines {
                span {}
                span {}
            }
        }
    }
}

/// Everything a section needs besides its entries.
pub struct RenderContext<'a, 'b> {
    pub icons: &'b IconProvider<'a>,
    pub policy: FetchPolicy,
    pub min_placeholders: usize,
}

/// Render `section`'s entries into `container`. Returns the number rendered.
pub fn render_section(
    container: &mut Container,
    section: Section,
    catalog: &Catalog,
    ctx: &RenderContext<'_, '_>,
) -> usize {
    let entries = section.visible_entries(catalog);
    container.reserve(entries.len(), ctx.min_placeholders);

    let names: Vec<&str> = entries.iter().map(|e| e.icon.as_str()).collect();
    let icons = ctx.icons.get_icons(&names, ctx.policy);

    let fragment: Vec<Node> = entries
        .into_iter()
        .zip(icons)
        .map(|(entry, icon)| match section.variant() {
            Variant::Cards => {
                let affordance = if entry.is_discord() {
                    Some(ctx.icons.get_icon(COPY_ICON))
                } else {
                    entry.href().map(|_| ctx.icons.get_icon(EXTERNAL_LINK_ICON))
                };
                Node::Card(Card {
                    entry: entry.clone(),
                    icon,
                    affordance,
                    accent: section.is_accented(),
                    enter_delay_ms: None,
                })
            }
            Variant::IconRow => Node::IconLink(IconLink {
                entry: entry.clone(),
                icon,
            }),
        })
        .collect();

    let count = fragment.len();
    container.commit(fragment);
    debug!("rendered {count} entries into #{}", container.id());
    count
}
