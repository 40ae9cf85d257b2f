//! Client-side behaviour.
//!
//! The generated page is static; the few things that must happen in the
//! browser (copy to clipboard, toast, collapsing the affiliate section, click
//! logging, entrance animation) are driven by `static/page.js`. The generator
//! decides *what* is bound: [`wire`] walks the rendered page and produces
//! [`Bindings`], which are embedded as JSON in `script#page-bindings`.
//!
//! Bindings address elements by mount id and child index, so two entries
//! sharing an id in different sections never collide.
//!
//! [`Collapsible`] is the toggle state the script flips; it also decides the
//! initial classes of the affiliate section in the emitted markup.

use crate::config::InteractionConfig;
use crate::page::Page;
use crate::render::Node;
use serde::{Deserialize, Serialize};

/// Id of the JSON bindings script tag.
pub const BINDINGS_ID: &str = "page-bindings";
pub const TOAST_ID: &str = "toast";
pub const TOAST_VISIBLE_CLASS: &str = "is-visible";
pub const COPY_MESSAGE: &str = "Discord username copied to clipboard!";

pub const AFFILIATE_TOGGLE_ID: &str = "affiliateToggle";
pub const AFFILIATE_SECTION_ID: &str = "affiliateSection";
pub const TOGGLE_ICON_ID: &str = "toggleIcon";
pub const EXPANDED_CLASS: &str = "expanded";
pub const ROTATED_CLASS: &str = "rotate-180";

/// Added to `<body>` on window load; starts the card entrance transition.
pub const LOADED_CLASS: &str = "is-loaded";

/// The page script, embedded verbatim after the bindings.
pub const SCRIPT: &str = include_str!("../static/page.js");

/// Position of a rendered child: `document.getElementById(mount).children[index]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub mount: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyBinding {
    #[serde(flatten)]
    pub target: Target,
    pub text: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBinding {
    pub trigger: String,
    pub section: String,
    pub section_class: String,
    pub icon: String,
    pub icon_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackBinding {
    #[serde(flatten)]
    pub target: Target,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastBinding {
    pub element: String,
    pub visible_class: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationBinding {
    pub loaded_class: String,
    pub stagger_ms: u64,
}

/// Everything `page.js` attaches behaviour to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pub copy: Vec<CopyBinding>,
    pub toggle: Vec<ToggleBinding>,
    pub track: Vec<TrackBinding>,
    pub toast: ToastBinding,
    pub animation: AnimationBinding,
}

impl Bindings {
    /// Bindings with no targets, only the page-wide toast and animation settings.
    pub fn empty(options: &InteractionConfig) -> Self {
        Self {
            copy: Vec::new(),
            toggle: Vec::new(),
            track: Vec::new(),
            toast: ToastBinding {
                element: TOAST_ID.to_string(),
                visible_class: TOAST_VISIBLE_CLASS.to_string(),
                duration_ms: options.toast_ms,
            },
            animation: AnimationBinding {
                loaded_class: LOADED_CLASS.to_string(),
                stagger_ms: options.stagger_ms,
            },
        }
    }

    /// Drop every element-specific binding.
    pub fn clear_targets(&mut self) {
        self.copy.clear();
        self.toggle.clear();
        self.track.clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Compute the bindings for a rendered page.
pub fn wire(page: &Page, options: &InteractionConfig) -> Bindings {
    let mut bindings = Bindings::empty(options);

    for mount in page.mounts() {
        if mount.section.is_collapsible() {
            bindings.toggle.push(ToggleBinding {
                trigger: AFFILIATE_TOGGLE_ID.to_string(),
                section: AFFILIATE_SECTION_ID.to_string(),
                section_class: EXPANDED_CLASS.to_string(),
                icon: TOGGLE_ICON_ID.to_string(),
                icon_class: ROTATED_CLASS.to_string(),
            });
        }

        for (index, node) in mount.container.children().iter().enumerate() {
            let entry = match node {
                Node::Card(card) => &card.entry,
                Node::IconLink(link) => &link.entry,
                Node::Skeleton => continue,
            };
            let target = Target {
                mount: mount.container.id().to_string(),
                index,
            };
            if entry.is_discord() {
                bindings.copy.push(CopyBinding {
                    target,
                    text: entry.copy_text().to_string(),
                    message: COPY_MESSAGE.to_string(),
                });
            } else if entry.href().is_some() {
                bindings.track.push(TrackBinding {
                    target,
                    label: entry.title.clone(),
                });
            }
        }
    }
    bindings
}

/// Give every card, in document order, its entrance delay.
pub fn apply_animations(page: &mut Page, stagger_ms: u64) {
    let mut index = 0u64;
    for mount in page.mounts_mut() {
        for node in mount.container.children_mut() {
            if let Node::Card(card) = node {
                card.enter_delay_ms = Some(index * stagger_ms);
                index += 1;
            }
        }
    }
}

/// Expanded/collapsed state of a toggleable section. Starts collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collapsible {
    expanded: bool,
}

impl Collapsible {
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    /// Class for the section element in this state.
    pub fn section_class(&self) -> Option<&'static str> {
        self.expanded.then_some(EXPANDED_CLASS)
    }

    /// Class for the chevron in this state.
    pub fn icon_class(&self) -> Option<&'static str> {
        self.expanded.then_some(ROTATED_CLASS)
    }
}
