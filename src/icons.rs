//! SVG icon loading and caching.
//!
//! Every link entry names an icon; the icon lives at `{icons_dir}/{name}.svg`.
//! [`IconProvider::get_icon`] fetches and parses the file once, normalizes the
//! root element so it inherits the surrounding text color, and keeps the parsed
//! tree in a per-build cache. Each caller receives its own clone, so markup
//! built from one icon never aliases another.
//!
//! ## Normalization
//!
//! The root `<svg>` always ends up with:
//!
//! - `fill="currentColor"` (icons follow the card's text color)
//! - `aria-hidden="true"` (icons are decorative; the card title is the label)
//! - `viewBox="0 0 24 24"` when the file has no `viewBox`
//!
//! ## Failure Policy
//!
//! A missing file, invalid XML, or a root element that isn't `<svg>` never
//! fails the build. The provider logs a warning and hands out a plain circle.
//! Fallbacks are not cached.
//!
//! ## Parsing
//!
//! Parsing uses `quick-xml` and keeps attribute values and text exactly as
//! written (still escaped), so serialization writes them back verbatim.

use crate::config::FetchPolicy;
use crate::loader::{AssetSource, FetchError};
use log::{debug, warn};
use maud::{Markup, PreEscaped};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// `viewBox` applied when an icon file doesn't declare one.
pub const DEFAULT_VIEW_BOX: &str = "0 0 24 24";

#[derive(Error, Debug)]
pub enum IconError {
    #[error("invalid icon name {0:?}")]
    InvalidName(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("icon is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed SVG: {0}")]
    Malformed(String),
}

/// A parsed SVG node. Text is stored raw (entities not decoded).
#[derive(Debug, Clone, PartialEq)]
pub enum SvgNode {
    Element(SvgElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<SvgNode>,
}

impl SvgElement {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value in place.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((key.to_string(), value.to_string())),
        }
    }

    fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", k, v.replace('"', "&quot;"));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                SvgNode::Element(el) => el.write_to(out),
                SvgNode::Text(text) => out.push_str(text),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

/// A parsed, normalized icon ready to inline into the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    root: SvgElement,
}

impl Icon {
    /// Parse and normalize SVG markup.
    pub fn parse(svg: &str) -> Result<Self, IconError> {
        let mut root = parse_tree(svg)?;
        let local = root.name.rsplit(':').next().unwrap_or_default();
        if local != "svg" {
            return Err(IconError::Malformed(format!(
                "root element is <{}>, expected <svg>",
                root.name
            )));
        }
        root.set_attr("fill", "currentColor");
        root.set_attr("aria-hidden", "true");
        if root.attr("viewBox").is_none() {
            root.set_attr("viewBox", DEFAULT_VIEW_BOX);
        }
        Ok(Self { root })
    }

    /// The glyph used when an icon can't be loaded: a filled circle.
    pub fn fallback() -> Self {
        let circle = SvgElement::new("circle")
            .with_attr("cx", "12")
            .with_attr("cy", "12")
            .with_attr("r", "10");
        let mut root = SvgElement::new("svg")
            .with_attr("xmlns", "http://www.w3.org/2000/svg")
            .with_attr("viewBox", DEFAULT_VIEW_BOX)
            .with_attr("fill", "currentColor")
            .with_attr("aria-hidden", "true");
        root.children.push(SvgNode::Element(circle));
        Self { root }
    }

    pub fn root(&self) -> &SvgElement {
        &self.root
    }

    /// Serialize, appending `class` to the root's existing classes.
    pub fn to_svg_string(&self, class: Option<&str>) -> String {
        let mut root = self.root.clone();
        if let Some(class) = class.filter(|c| !c.is_empty()) {
            let merged = match root.attr("class") {
                Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
                _ => class.to_string(),
            };
            root.set_attr("class", &merged);
        }
        let mut out = String::new();
        root.write_to(&mut out);
        out
    }

    pub fn to_markup(&self, class: Option<&str>) -> Markup {
        PreEscaped(self.to_svg_string(class))
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<SvgElement, IconError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = SvgElement::new(&name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| IconError::Malformed(e.to_string()))?;
        element.attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }
    Ok(element)
}

/// Attach a finished element to its parent, or make it the root.
fn attach(
    stack: &mut [SvgElement],
    root: &mut Option<SvgElement>,
    element: SvgElement,
) -> Result<(), IconError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(SvgNode::Element(element)),
        None if root.is_some() => {
            return Err(IconError::Malformed("multiple root elements".into()));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [SvgElement], text: &str) {
    // Text outside the root element is dropped.
    let Some(parent) = stack.last_mut() else {
        return;
    };
    // Adjacent pieces (split around entity references) merge into one node
    if let Some(SvgNode::Text(prev)) = parent.children.last_mut() {
        prev.push_str(text);
    } else {
        parent.children.push(SvgNode::Text(text.to_string()));
    }
}

/// Drop formatting whitespace left between elements.
fn drop_blank_text(stack: &mut [SvgElement]) {
    if let Some(parent) = stack.last_mut() {
        if matches!(parent.children.last(), Some(SvgNode::Text(t)) if t.trim().is_empty()) {
            parent.children.pop();
        }
    }
}

fn parse_tree(svg: &str) -> Result<SvgElement, IconError> {
    let mut reader = Reader::from_str(svg);

    let mut stack: Vec<SvgElement> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                drop_blank_text(&mut stack);
                stack.push(element_from(&e)?);
            }
            Event::Empty(e) => {
                drop_blank_text(&mut stack);
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                drop_blank_text(&mut stack);
                let element = stack
                    .pop()
                    .ok_or_else(|| IconError::Malformed("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => push_text(&mut stack, &String::from_utf8_lossy(&t)),
            Event::GeneralRef(r) => {
                push_text(&mut stack, &format!("&{};", String::from_utf8_lossy(&r)));
            }
            Event::CData(c) => {
                push_text(
                    &mut stack,
                    &format!("<![CDATA[{}]]>", String::from_utf8_lossy(&c)),
                );
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }
    if let Some(open) = stack.last() {
        return Err(IconError::Malformed(format!("unclosed <{}>", open.name)));
    }
    root.ok_or_else(|| IconError::Malformed("no root element".into()))
}

/// Reject names that would leave the icons directory.
fn validate_name(name: &str) -> Result<(), IconError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(IconError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Fetches icons by name, caching parsed trees for the life of the build.
pub struct IconProvider<'a> {
    source: &'a dyn AssetSource,
    dir: String,
    cache: RwLock<HashMap<String, Icon>>,
}

impl<'a> IconProvider<'a> {
    pub fn new(source: &'a dyn AssetSource, dir: &str) -> Self {
        Self {
            source,
            dir: dir.trim_end_matches('/').to_string(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Relative path of an icon file.
    pub fn icon_path(&self, name: &str) -> String {
        format!("{}/{}.svg", self.dir, name)
    }

    /// Return the named icon, or the fallback glyph if it can't be loaded.
    pub fn get_icon(&self, name: &str) -> Icon {
        if let Some(icon) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return icon.clone();
        }
        match self.try_load(name) {
            Ok(icon) => {
                // Racing misses may both land here; the last write wins.
                self.cache
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(name.to_string(), icon.clone());
                icon
            }
            Err(e) => {
                warn!("icon {name:?}: {e}; using fallback");
                Icon::fallback()
            }
        }
    }

    /// Resolve a batch of icons. The result is in `names` order for every policy.
    pub fn get_icons(&self, names: &[&str], policy: FetchPolicy) -> Vec<Icon> {
        match policy {
            FetchPolicy::Sequential => names.iter().map(|n| self.get_icon(n)).collect(),
            FetchPolicy::Concurrent => names.par_iter().map(|n| self.get_icon(n)).collect(),
        }
    }

    /// Number of icons currently cached.
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Fetch and parse an icon, bypassing the cache and the fallback.
    pub fn try_load(&self, name: &str) -> Result<Icon, IconError> {
        validate_name(name)?;
        let path = self.icon_path(name);
        let bytes = self.source.fetch(&path)?;
        let icon = Icon::parse(std::str::from_utf8(&bytes)?)?;
        debug!("loaded icon {path}");
        Ok(icon)
    }
}
