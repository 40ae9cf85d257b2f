//! Emoji favicon generation.
//!
//! A favicon is an emoji drawn over a rounded square. Browsers that accept SVG
//! icons get inline `data:image/svg+xml` URLs at several sizes; the SVG text
//! relies on the visitor's emoji font. For user agents that insist on a bitmap,
//! [`render_png`] rasterizes the same shape with `resvg`, drawing the emoji from
//! the bundled Twemoji set because no system font is involved.
//!
//! Geometry scales with the icon size: corner radius `0.1875 × size`, text
//! baseline at `0.7 × size`, font size `0.6 × size`. The primary 64px icon
//! keeps slightly tighter text metrics (baseline 44, font 36).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, Rgba, RgbaImage};
use log::warn;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use std::io::Cursor;
use thiserror::Error;

/// Sizes emitted as individual `<link>` tags: 16, 32 (`icon`) and 180 (`apple-touch-icon`).
pub const LINK_SIZES: [u32; 3] = [16, 32, 180];

/// Sizes listed in the web-app manifest.
pub const MANIFEST_SIZES: [u32; 2] = [192, 512];

#[derive(Error, Debug)]
pub enum FaviconError {
    #[error("SVG error: {0}")]
    Svg(#[from] resvg::usvg::Error),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("cannot allocate a {0}x{0} canvas")]
    Canvas(u32),
}

/// Escape text for use in SVG attribute values and text nodes.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format a coordinate with at most two decimals (`3`, `11.2`, `33.75`).
fn num(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    format!("{rounded}")
}

/// The 64px icon used for the generic `icon` and `shortcut icon` links.
pub fn primary_svg(emoji: &str, background: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64" width="64" height="64"><rect width="64" height="64" rx="12" fill="{bg}"/><text x="32" y="44" text-anchor="middle" font-size="36" font-family="Arial, sans-serif">{emoji}</text></svg>"#,
        bg = xml_escape(background),
        emoji = xml_escape(emoji),
    )
}

/// An emoji icon scaled to `size` pixels.
pub fn sized_svg(emoji: &str, background: &str, size: u32) -> String {
    let s = f64::from(size);
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {size} {size}" width="{size}" height="{size}"><rect width="{size}" height="{size}" rx="{rx}" fill="{bg}"/><text x="{x}" y="{y}" text-anchor="middle" font-size="{fs}" font-family="Arial, sans-serif">{emoji}</text></svg>"#,
        rx = num(s * 0.1875),
        x = num(s / 2.0),
        y = num(s * 0.7),
        fs = num(s * 0.6),
        bg = xml_escape(background),
        emoji = xml_escape(emoji),
    )
}

/// Encode arbitrary bytes as a base64 `data:` URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

pub fn svg_data_url(svg: &str) -> String {
    data_url("image/svg+xml", svg.as_bytes())
}

/// Look up the Twemoji SVG for an emoji, tolerating a missing or extra
/// variation selector.
#[cfg(feature = "twemoji")]
fn emoji_glyph(emoji: &str) -> Option<&'static str> {
    use twemoji_assets::svg::SvgTwemojiAsset;

    let stripped: String = emoji.chars().filter(|c| *c != '\u{FE0F}').collect();
    let asset = SvgTwemojiAsset::from_emoji(emoji)
        .or_else(|| SvgTwemojiAsset::from_emoji(&stripped))
        .or_else(|| SvgTwemojiAsset::from_emoji(&format!("{stripped}\u{FE0F}")))?;
    let svg: &'static str = asset.as_ref();
    Some(svg)
}

#[cfg(not(feature = "twemoji"))]
fn emoji_glyph(_emoji: &str) -> Option<&'static str> {
    None
}

/// Rasterize the favicon to PNG bytes.
///
/// The emoji covers the middle 60% of the square. If no glyph exists for it,
/// the PNG contains just the background and a warning is logged.
pub fn render_png(emoji: &str, background: &str, size: u32) -> Result<Vec<u8>, FaviconError> {
    let s = f64::from(size);
    let shape = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {size} {size}" width="{size}" height="{size}"><rect width="{size}" height="{size}" rx="{rx}" fill="{bg}"/></svg>"#,
        rx = num(s * 0.1875),
        bg = xml_escape(background),
    );
    let opts = Options::default();
    let mut pixmap = Pixmap::new(size, size).ok_or(FaviconError::Canvas(size))?;
    let tree = Tree::from_str(&shape, &opts)?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    match emoji_glyph(emoji) {
        Some(glyph) => {
            let glyph = Tree::from_str(glyph, &opts)?;
            let glyph_size = glyph.size();
            let target = size as f32 * 0.6;
            let scale = target / glyph_size.width().max(glyph_size.height());
            let offset = (size as f32 - target) / 2.0;
            let transform = Transform::from_scale(scale, scale).post_translate(offset, offset);
            resvg::render(&glyph, transform, &mut pixmap.as_mut());
        }
        None => warn!("no bitmap glyph for favicon emoji {emoji:?}; PNG has background only"),
    }

    let mut png = Vec::new();
    pixmap_to_rgba_image(&pixmap).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Converts a tiny_skia Pixmap (premultiplied) to a straight-alpha RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, out) in pixmap.pixels().iter().zip(img.pixels_mut()) {
        let c = pixel.demultiply();
        *out = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}
